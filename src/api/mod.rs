//! Portal HTTP API.
//!
//! Serves the navigation surface (`/`, `/login`, `/register`, `/user`,
//! `/doctor`) and the JSON endpoints behind each view under `/api/`.
//! `portal_router()` returns a `Router` that can be mounted on any axum
//! server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::portal_router;
pub use server::{start_portal_server, PortalServer};
pub use types::ApiContext;
