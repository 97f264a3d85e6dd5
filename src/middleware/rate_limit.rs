//! Fixed-window per-client-IP rate limiter, mirroring `app/middleware.py`'s
//! `InMemoryRateLimitMiddleware`. Its own mutex, independent of the job cache's
//! (spec §5: "Rate-limit queues... use their own mutex").

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Duration,
    limit: u32,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(window_seconds: u64, requests_per_window: u32) -> Self {
        Self {
            window: Duration::from_secs(window_seconds),
            limit: requests_per_window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Err(retry_after_seconds)` if the caller has exhausted its
    /// quota for the current window.
    fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let mut guard = self.windows.lock().unwrap();
        let now = Instant::now();
        let entry = guard.entry(ip).or_insert(Window { started_at: now, count: 0 });

        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            let elapsed = now.duration_since(entry.started_at);
            let retry_after = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }
}

#[derive(Clone)]
pub struct RateLimitConfig {
    pub limiter: std::sync::Arc<RateLimiter>,
}

pub async fn rate_limit(
    State(config): State<RateLimitConfig>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match config.limiter.check(addr.ip()) {
        Ok(()) => Ok(next.run(req).await),
        Err(retry_after_seconds) => Err(AppError::RateLimitExceeded { retry_after_seconds }),
    }
}
