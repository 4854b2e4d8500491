//! API middleware.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use collexo_core::{FormService, SubmissionService};

use crate::extractors::AuthenticatedSociety;

/// Header carrying the society ID asserted by the authenticating gateway.
pub const SOCIETY_ID_HEADER: &str = "X-Society-Id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Form management.
    pub form_service: FormService,
    /// Public submissions.
    pub submission_service: SubmissionService,
}

/// Trust the society identity asserted by the gateway in front of this service.
///
/// Only mount this behind a proxy that strips the header from client requests.
pub async fn trusted_society_header(mut req: Request<Body>, next: Next) -> Response {
    let society_id = req
        .headers()
        .get(SOCIETY_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from);

    if let Some(id) = society_id {
        req.extensions_mut().insert(AuthenticatedSociety { id });
    }

    next.run(req).await
}
