//! Form management endpoints.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use collexo_common::AppResult;
use collexo_core::{CreateFormInput, FormState, Page, Pagination, UpdateFormInput};
use collexo_db::entities::{form_response, society_form};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{extractors::AuthSociety, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Form response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: String,
    pub society_id: String,
    pub title: String,
    pub description: Option<String>,
    pub form_schema: Value,
    pub is_active: bool,
    pub is_accepting_submissions: bool,
    pub max_submissions: Option<i32>,
    pub submissions_count: i32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub created_at: String,
}

impl From<society_form::Model> for FormView {
    fn from(f: society_form::Model) -> Self {
        let is_accepting_submissions = FormState::from(&f).is_accepting(Utc::now());
        Self {
            id: f.id,
            society_id: f.society_id,
            title: f.title,
            description: f.description,
            form_schema: f.form_schema,
            is_active: f.is_active,
            is_accepting_submissions,
            max_submissions: f.max_submissions,
            submissions_count: f.submissions_count,
            start_date: f.start_date.map(|d| d.to_rfc3339()),
            end_date: f.end_date.map(|d| d.to_rfc3339()),
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

/// Submission response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: String,
    pub form_id: String,
    pub submission_data: Value,
    pub submitter_email: String,
    pub submitter_name: String,
    pub submitter_phone: Option<String>,
    pub files: Value,
    pub created_at: String,
}

impl From<form_response::Model> for SubmissionView {
    fn from(r: form_response::Model) -> Self {
        Self {
            id: r.id,
            form_id: r.form_id,
            submission_data: r.submission_data,
            submitter_email: r.submitter_email,
            submitter_name: r.submitter_name,
            submitter_phone: r.submitter_phone,
            files: r.files_json.unwrap_or_else(|| Value::Array(Vec::new())),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// Paginated listing.
#[derive(Serialize)]
pub struct PageResponse<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<M, T> From<Page<M>> for PageResponse<T>
where
    T: Serialize + From<M>,
{
    fn from(page: Page<M>) -> Self {
        Self {
            items: page.items.into_iter().map(Into::into).collect(),
            pagination: page.pagination,
        }
    }
}

/// Request naming a single form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormIdRequest {
    pub form_id: String,
}

/// Update form request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormRequest {
    pub form_id: String,
    #[serde(flatten)]
    pub changes: UpdateFormInput,
}

/// List own forms request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFormsRequest {
    #[serde(default = "default_page")]
    pub page: u64,
}

/// List submissions request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSubmissionsRequest {
    pub form_id: String,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

/// Deletion acknowledgement.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ==================== Handlers ====================

/// Create a form.
async fn create(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<CreateFormInput>,
) -> AppResult<ApiResponse<FormView>> {
    let form = state.form_service.create(&society.id, req).await?;
    Ok(ApiResponse::created(form.into()))
}

/// Show a form. Public.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<FormIdRequest>,
) -> AppResult<ApiResponse<FormView>> {
    let form = state.form_service.get(&req.form_id).await?;
    Ok(ApiResponse::ok(form.into()))
}

/// List forms open for submissions. Public.
async fn published(
    State(state): State<AppState>,
    Json(req): Json<ListFormsRequest>,
) -> AppResult<ApiResponse<PageResponse<FormView>>> {
    let page = state.form_service.list_published(req.page).await?;
    Ok(ApiResponse::ok(page.into()))
}

/// Edit one of the caller's forms.
async fn update(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<UpdateFormRequest>,
) -> AppResult<ApiResponse<FormView>> {
    let form = state
        .form_service
        .update(&req.form_id, &society.id, req.changes)
        .await?;
    Ok(ApiResponse::ok(form.into()))
}

/// List the caller's forms.
async fn list(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<ListFormsRequest>,
) -> AppResult<ApiResponse<PageResponse<FormView>>> {
    let page = state
        .form_service
        .list_by_society(&society.id, req.page)
        .await?;
    Ok(ApiResponse::ok(page.into()))
}

/// Activate or deactivate a form.
async fn toggle(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<FormIdRequest>,
) -> AppResult<ApiResponse<FormView>> {
    let form = state.form_service.toggle(&req.form_id, &society.id).await?;
    Ok(ApiResponse::ok(form.into()))
}

/// Delete a form and its submissions.
async fn delete(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<FormIdRequest>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    state.form_service.delete(&req.form_id, &society.id).await?;
    Ok(ApiResponse::ok(DeletedResponse { deleted: true }))
}

/// List submissions to one of the caller's forms.
async fn submissions(
    AuthSociety(society): AuthSociety,
    State(state): State<AppState>,
    Json(req): Json<ListSubmissionsRequest>,
) -> AppResult<ApiResponse<PageResponse<SubmissionView>>> {
    let page = state
        .form_service
        .list_submissions(&req.form_id, &society.id, req.page)
        .await?;
    Ok(ApiResponse::ok(page.into()))
}

/// Create the forms router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/list", post(list))
        .route("/published", post(published))
        .route("/update", post(update))
        .route("/toggle", post(toggle))
        .route("/delete", post(delete))
        .route("/submissions", post(submissions))
}
