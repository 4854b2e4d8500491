//! Form service.

use chrono::{DateTime, Utc};
use collexo_common::{AppError, AppResult, IdGenerator, config::FormsConfig};
use collexo_db::{
    entities::{form_response, society_form},
    repositories::{FormRepository, FormResponseRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use super::form_schema::FormSchema;
use super::pagination::{Page, Pagination};
use super::submission::CONTACT_FIELDS;

/// Input for creating a form.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    /// Untrusted field definitions, checked by [`FormSchema::parse`].
    pub form_schema: Value,
    #[validate(range(min = 1))]
    pub max_submissions: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Changes to a form's metadata. Absent keys keep their value, an explicit
/// `null` clears an optional one. The schema cannot be changed.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub max_submissions: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_active: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn clean_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title must not be blank".to_string()));
    }
    Ok(title.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}

/// Service for managing society forms.
#[derive(Clone)]
pub struct FormService {
    form_repo: FormRepository,
    response_repo: FormResponseRepository,
    forms_per_page: u64,
    submissions_per_page: u64,
    reserved_names: Vec<String>,
    id_gen: IdGenerator,
}

impl FormService {
    /// Create a new form service.
    #[must_use]
    pub fn new(
        form_repo: FormRepository,
        response_repo: FormResponseRepository,
        config: &FormsConfig,
    ) -> Self {
        let reserved_names = std::iter::once(config.honeypot_field.as_str())
            .chain(CONTACT_FIELDS)
            .map(String::from)
            .collect();

        Self {
            form_repo,
            response_repo,
            forms_per_page: config.forms_per_page,
            submissions_per_page: config.submissions_per_page,
            reserved_names,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a form owned by `society_id`.
    pub async fn create(
        &self,
        society_id: &str,
        input: CreateFormInput,
    ) -> AppResult<society_form::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let title = clean_title(&input.title)?;
        check_window(input.start_date, input.end_date)?;

        let schema = FormSchema::parse(&input.form_schema)?;
        schema.ensure_names_free(self.reserved_names.iter().map(String::as_str))?;

        let model = society_form::ActiveModel {
            id: Set(self.id_gen.generate()),
            society_id: Set(society_id.to_string()),
            title: Set(title),
            description: Set(clean_description(input.description)),
            form_schema: Set(schema.to_value()),
            is_active: Set(input.is_active),
            max_submissions: Set(input.max_submissions),
            submissions_count: Set(0),
            start_date: Set(input.start_date.map(Into::into)),
            end_date: Set(input.end_date.map(Into::into)),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let form = self.form_repo.create(model).await?;

        tracing::info!(
            form_id = %form.id,
            society_id = %society_id,
            fields = schema.fields().len(),
            "Form created"
        );

        Ok(form)
    }

    /// Get a form by ID.
    pub async fn get(&self, id: &str) -> AppResult<society_form::Model> {
        self.form_repo.get_by_id(id).await
    }

    /// Get a form by ID with ownership check.
    pub async fn get_for_owner(
        &self,
        id: &str,
        society_id: &str,
    ) -> AppResult<society_form::Model> {
        let form = self.form_repo.get_by_id(id).await?;

        if form.society_id != society_id {
            return Err(AppError::Forbidden("Not the form owner".to_string()));
        }

        Ok(form)
    }

    /// List a society's forms, newest first.
    pub async fn list_by_society(
        &self,
        society_id: &str,
        page: u64,
    ) -> AppResult<Page<society_form::Model>> {
        let total = self.form_repo.count_by_society(society_id).await?;
        let pagination = Pagination::new(page, self.forms_per_page, total);

        let items = self
            .form_repo
            .find_by_society(society_id, pagination.per_page, pagination.offset())
            .await?;

        Ok(Page { items, pagination })
    }

    /// Forms currently accepting submissions, newest first. Public.
    pub async fn list_published(&self, page: u64) -> AppResult<Page<society_form::Model>> {
        let now = Utc::now();
        let total = self.form_repo.count_accepting(now).await?;
        let pagination = Pagination::new(page, self.forms_per_page, total);

        let items = self
            .form_repo
            .find_accepting(now, pagination.per_page, pagination.offset())
            .await?;

        Ok(Page { items, pagination })
    }

    /// Edit a form's title, description, window, ceiling or activation flag.
    pub async fn update(
        &self,
        id: &str,
        society_id: &str,
        input: UpdateFormInput,
    ) -> AppResult<society_form::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let form = self.get_for_owner(id, society_id).await?;

        let start_date = input
            .start_date
            .unwrap_or_else(|| form.start_date.map(|d| d.with_timezone(&Utc)));
        let end_date = input
            .end_date
            .unwrap_or_else(|| form.end_date.map(|d| d.with_timezone(&Utc)));
        check_window(start_date, end_date)?;

        if let Some(Some(max)) = input.max_submissions {
            if max < 1 {
                return Err(AppError::Validation(
                    "Submission limit must be at least 1".to_string(),
                ));
            }
            if max < form.submissions_count {
                return Err(AppError::Validation(format!(
                    "Submission limit must not be below the {} submissions already received",
                    form.submissions_count
                )));
            }
        }

        let mut active: society_form::ActiveModel = form.into();
        if let Some(title) = &input.title {
            active.title = Set(clean_title(title)?);
        }
        if let Some(description) = input.description {
            active.description = Set(clean_description(description));
        }
        if let Some(max_submissions) = input.max_submissions {
            active.max_submissions = Set(max_submissions);
        }
        if input.start_date.is_some() {
            active.start_date = Set(start_date.map(Into::into));
        }
        if input.end_date.is_some() {
            active.end_date = Set(end_date.map(Into::into));
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        let form = self.form_repo.update(active).await?;
        tracing::info!(form_id = %id, society_id = %society_id, "Form updated");

        Ok(form)
    }

    /// Flip a form between active and inactive.
    pub async fn toggle(&self, id: &str, society_id: &str) -> AppResult<society_form::Model> {
        let form = self.get_for_owner(id, society_id).await?;
        let is_active = !form.is_active;

        let form = self.form_repo.set_active(form, is_active).await?;
        tracing::info!(form_id = %id, is_active, "Form toggled");

        Ok(form)
    }

    /// Delete a form together with its submissions.
    pub async fn delete(&self, id: &str, society_id: &str) -> AppResult<()> {
        self.get_for_owner(id, society_id).await?;

        if !self.form_repo.delete(id).await? {
            return Err(AppError::FormNotFound(id.to_string()));
        }

        tracing::info!(form_id = %id, "Form deleted");
        Ok(())
    }

    /// List submissions to a form, newest first.
    pub async fn list_submissions(
        &self,
        id: &str,
        society_id: &str,
        page: u64,
    ) -> AppResult<Page<form_response::Model>> {
        self.get_for_owner(id, society_id).await?;

        let total = self.response_repo.count_by_form(id).await?;
        let pagination = Pagination::new(page, self.submissions_per_page, total);

        let items = self
            .response_repo
            .find_by_form(id, pagination.per_page, pagination.offset())
            .await?;

        Ok(Page { items, pagination })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn create_test_form(id: &str, society_id: &str) -> society_form::Model {
        society_form::Model {
            id: id.to_string(),
            society_id: society_id.to_string(),
            title: "Core Team Recruitment".to_string(),
            description: None,
            form_schema: json!([
                {"name": "q1", "type": "text", "label": "Why?", "required": false}
            ]),
            is_active: true,
            max_submissions: None,
            submissions_count: 0,
            start_date: None,
            end_date: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: DatabaseConnection) -> FormService {
        let db = Arc::new(db);
        FormService::new(
            FormRepository::new(db.clone()),
            FormResponseRepository::new(db),
            &FormsConfig::default(),
        )
    }

    fn input(schema: Value) -> CreateFormInput {
        CreateFormInput {
            title: "Core Team Recruitment".to_string(),
            description: None,
            form_schema: schema,
            max_submissions: None,
            start_date: None,
            end_date: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create() {
        let form = create_test_form("form1", "soc1");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .into_connection(),
        );

        let result = service
            .create("soc1", input(json!([{"name": "q1", "type": "text", "label": "Why?"}])))
            .await
            .unwrap();

        assert_eq!(result.id, "form1");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_schema() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service
            .create("soc1", input(json!([{"name": "q1", "type": "select", "label": "Pick"}])))
            .await;

        assert!(matches!(result, Err(AppError::SchemaInvalid(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_window() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let now = Utc::now();

        let mut input = input(json!([]));
        input.start_date = Some(now);
        input.end_date = Some(now - chrono::Duration::days(1));

        let result = service.create("soc1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_zero_ceiling() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut input = input(json!([]));
        input.max_submissions = Some(0);

        let result = service.create("soc1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_for_owner_forbidden() {
        let form = create_test_form("form1", "soc1");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .into_connection(),
        );

        let result = service.get_for_owner("form1", "soc2").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_toggle() {
        let form = create_test_form("form1", "soc1");
        let mut toggled = form.clone();
        toggled.is_active = false;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .append_query_results([[toggled]])
                .into_connection(),
        );

        let result = service.toggle("form1", "soc1").await.unwrap();
        assert!(!result.is_active);
    }

    #[tokio::test]
    async fn test_delete() {
        let form = create_test_form("form1", "soc1");
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        assert!(service.delete("form1", "soc1").await.is_ok());
    }

    #[tokio::test]
    async fn test_list_by_society() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([[
                    create_test_form("form3", "soc1"),
                    create_test_form("form2", "soc1"),
                ]])
                .into_connection(),
        );

        let page = service.list_by_society("soc1", 2).await.unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.per_page, 10);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.pagination.total, 12);
    }

    #[tokio::test]
    async fn test_create_rejects_honeypot_named_field() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service
            .create(
                "soc1",
                input(json!([
                    {"name": "website", "type": "text", "label": "Portfolio", "required": true}
                ])),
            )
            .await;

        assert!(matches!(result, Err(AppError::SchemaInvalid(msg)) if msg.contains("website")));
    }

    #[tokio::test]
    async fn test_create_rejects_contact_named_field() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service
            .create(
                "soc1",
                input(json!([{"name": "submitter_phone", "type": "phone", "label": "Phone"}])),
            )
            .await;

        assert!(matches!(result, Err(AppError::SchemaInvalid(_))));
    }

    #[tokio::test]
    async fn test_list_published() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[create_test_form("form1", "soc1")]])
                .into_connection(),
        );

        let page = service.list_published(1).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.pages, 1);
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let form = create_test_form("form1", "soc1");
        let mut updated = form.clone();
        updated.title = "Core Team 2026".to_string();
        updated.max_submissions = Some(40);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let changes = UpdateFormInput {
            title: Some("  Core Team 2026 ".to_string()),
            max_submissions: Some(Some(40)),
            ..Default::default()
        };
        let result = service.update("form1", "soc1", changes).await.unwrap();

        assert_eq!(result.title, "Core Team 2026");
        assert_eq!(result.max_submissions, Some(40));
    }

    #[tokio::test]
    async fn test_update_rejects_ceiling_below_count() {
        let mut form = create_test_form("form1", "soc1");
        form.submissions_count = 12;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .into_connection(),
        );

        let changes = UpdateFormInput {
            max_submissions: Some(Some(10)),
            ..Default::default()
        };
        let result = service.update("form1", "soc1", changes).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_checks_window_against_stored_bound() {
        let now = Utc::now();
        let mut form = create_test_form("form1", "soc1");
        form.start_date = Some(now.into());

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[form]])
                .into_connection(),
        );

        let changes = UpdateFormInput {
            end_date: Some(Some(now - chrono::Duration::days(2))),
            ..Default::default()
        };
        let result = service.update("form1", "soc1", changes).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_by_other_society_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_form("form1", "soc1")]])
                .into_connection(),
        );

        let result = service
            .update("form1", "soc2", UpdateFormInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let changes: UpdateFormInput =
            serde_json::from_value(json!({"maxSubmissions": null, "title": "New"})).unwrap();

        assert_eq!(changes.max_submissions, Some(None));
        assert_eq!(changes.end_date, None);
        assert_eq!(changes.title.as_deref(), Some("New"));
    }
}
