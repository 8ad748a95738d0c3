//! HTTP API layer.
//!
//! Routes live under `/api/` and everything except login requires a bearer
//! token. The router is composable so tests drive it with `tower::oneshot`
//! while the binary mounts it on a real listener.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use types::{ApiContext, AuthContext};
