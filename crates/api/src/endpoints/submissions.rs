//! Public submission endpoint.

use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    routing::post,
};
use collexo_common::{AppError, AppResult};
use collexo_core::{RawSubmission, SubmissionOutcome, UploadedFile, ValidationMode};
use serde::{Deserialize, Serialize};

use crate::{extractors::ClientMeta, middleware::AppState, response::ApiResponse};

/// Message returned for every accepted submission.
const SUCCESS_MESSAGE: &str = "Form submitted successfully! The society will contact you soon.";

/// Submit query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuery {
    #[serde(default)]
    pub mode: ValidationMode,
}

/// Submit response. Identical for stored and discarded submissions.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub message: &'static str,
}

/// Submit a form as multipart data.
async fn submit(
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    Query(query): Query<SubmitQuery>,
    ClientMeta(client): ClientMeta,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<SubmitResponse>> {
    let mut raw = RawSubmission::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }

        match field.file_name().map(ToString::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(ToString::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                raw.push_file(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data,
                    },
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                raw.push_value(name, text);
            }
        }
    }

    match state
        .submission_service
        .submit(&form_id, raw, client, query.mode)
        .await?
    {
        SubmissionOutcome::Recorded(_) | SubmissionOutcome::Discarded => {
            Ok(ApiResponse::ok(SubmitResponse {
                message: SUCCESS_MESSAGE,
            }))
        }
    }
}

/// Create the submissions router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/submit", post(submit))
}
