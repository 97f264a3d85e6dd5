//! C10 — boundary middleware, composed in `router::build_router` in the same
//! observable order as `app/main.py`'s Starlette middleware stack.

pub mod payload_limit;
pub mod rate_limit;
pub mod request_id;
pub mod timeout;
