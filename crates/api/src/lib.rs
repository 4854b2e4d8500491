//! HTTP API layer for collexo-rs.
//!
//! - **Endpoints**: form management for societies and public submission
//! - **Extractors**: society identity and client metadata
//! - **Middleware**: application state and trusted identity header
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, trusted_society_header};
