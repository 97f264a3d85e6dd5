//! fiber-routing-server — standalone REST server for the fiber planning
//! routing service. Wires `fiber_core`'s domain logic and `fiber_postgres`'s
//! adapters behind an axum HTTP surface.

pub mod error;
pub mod executor;
pub mod extract;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod orchestrator;
pub mod router;
pub mod state;
