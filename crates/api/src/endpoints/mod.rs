//! API endpoints.

mod forms;
mod submissions;

use axum::Router;

use crate::middleware::AppState;

pub use forms::{FormView, SubmissionView};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new().nest("/forms", forms::router().merge(submissions::router()))
}
