//! Submission service.
//!
//! A submission passes through, in order: the acceptance window, the
//! duplicate/honeypot filter, submitter contact checks, per-field processing,
//! file storage and finally the counted insert. The first failing step wins
//! unless [`ValidationMode::Accumulate`] is requested, in which case contact
//! and field violations are reported together.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use collexo_common::{
    AppError, AppResult, FieldErrorKind, IdGenerator, StorageBackend,
    config::{FormsConfig, UploadConfig},
    generate_storage_key,
};
use collexo_db::{
    entities::form_response,
    repositories::{FormRepository, FormResponseRepository},
};
use sea_orm::Set;
use serde_json::{Value, json};

use super::acceptance::FormState;
use super::filter::{SubmissionFilter, Verdict};
use super::form_schema::FormSchema;
use super::processor::{
    PendingFile, RawSubmission, ValidationMode, Violations, is_valid_email, is_valid_phone,
    process_fields,
};

/// Storage category for submission uploads.
pub const UPLOAD_CATEGORY: &str = "form_submissions";

/// Part name carrying the submitter's email.
pub const SUBMITTER_EMAIL: &str = "submitter_email";
/// Part name carrying the submitter's name.
pub const SUBMITTER_NAME: &str = "submitter_name";
/// Part name carrying the submitter's phone number.
pub const SUBMITTER_PHONE: &str = "submitter_phone";

/// Part names a form schema may not reuse.
pub const CONTACT_FIELDS: [&str; 3] = [SUBMITTER_EMAIL, SUBMITTER_NAME, SUBMITTER_PHONE];

const MAX_USER_AGENT_CHARS: usize = 500;
const MAX_CONTACT_CHARS: usize = 255;
const MAX_HONEYPOT_CHARS: usize = 255;

/// Request metadata recorded with a submission.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Who submitted the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterContact {
    /// Lower-cased address.
    pub email: String,
    pub name: String,
    /// Digits only.
    pub phone: Option<String>,
}

impl SubmitterContact {
    /// Read and check the contact parts of a submission.
    pub fn extract(raw: &RawSubmission, violations: &mut Violations) -> AppResult<Self> {
        let email = raw
            .value(SUBMITTER_EMAIL)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let name = raw.value(SUBMITTER_NAME).unwrap_or_default().trim().to_string();
        let phone = raw
            .value(SUBMITTER_PHONE)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);

        if email.is_empty() {
            violations.reject(SUBMITTER_EMAIL, FieldErrorKind::Required)?;
        } else if email.chars().count() > MAX_CONTACT_CHARS || !is_valid_email(&email) {
            violations.reject(SUBMITTER_EMAIL, FieldErrorKind::InvalidFormat)?;
        }
        if name.is_empty() {
            violations.reject(SUBMITTER_NAME, FieldErrorKind::Required)?;
        } else if name.chars().count() > MAX_CONTACT_CHARS {
            violations.reject(SUBMITTER_NAME, FieldErrorKind::InvalidFormat)?;
        }
        if phone.as_deref().is_some_and(|p| !is_valid_phone(p)) {
            violations.reject(SUBMITTER_PHONE, FieldErrorKind::InvalidFormat)?;
        }

        let phone = phone.map(|p| p.chars().filter(char::is_ascii_digit).collect());

        Ok(Self { email, name, phone })
    }
}

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    /// The submission was stored.
    Recorded(form_response::Model),
    /// The honeypot was filled; nothing was stored.
    Discarded,
}

/// Service for accepting form submissions.
#[derive(Clone)]
pub struct SubmissionService {
    form_repo: FormRepository,
    response_repo: FormResponseRepository,
    filter: SubmissionFilter,
    storage: Arc<dyn StorageBackend>,
    allowed_extensions: BTreeSet<String>,
    honeypot_field: String,
    id_gen: IdGenerator,
}

impl SubmissionService {
    /// Create a new submission service.
    #[must_use]
    pub fn new(
        form_repo: FormRepository,
        response_repo: FormResponseRepository,
        storage: Arc<dyn StorageBackend>,
        uploads: &UploadConfig,
        forms: &FormsConfig,
    ) -> Self {
        Self {
            form_repo,
            filter: SubmissionFilter::new(response_repo.clone()),
            response_repo,
            storage,
            allowed_extensions: uploads.allowed_extensions.clone(),
            honeypot_field: forms.honeypot_field.clone(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Accept a submission to `form_id`.
    pub async fn submit(
        &self,
        form_id: &str,
        raw: RawSubmission,
        client: ClientInfo,
        mode: ValidationMode,
    ) -> AppResult<SubmissionOutcome> {
        let form = self.form_repo.get_by_id(form_id).await?;
        FormState::from(&form).check(Utc::now())?;

        let email = raw
            .value(SUBMITTER_EMAIL)
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        let honeypot = raw.value(&self.honeypot_field);
        let honeypot_value: String = honeypot
            .unwrap_or_default()
            .chars()
            .take(MAX_HONEYPOT_CHARS)
            .collect();

        match self.filter.check(form_id, &email, honeypot).await? {
            Verdict::Proceed => {}
            Verdict::SilentAccept => {
                tracing::info!(
                    form_id = %form_id,
                    ip = client.ip_address.as_deref().unwrap_or("-"),
                    "Honeypot filled, discarding submission"
                );
                return Ok(SubmissionOutcome::Discarded);
            }
            Verdict::Reject(reason) => return Err(reason.into()),
        }

        let schema = FormSchema::parse(&form.form_schema).map_err(|e| {
            AppError::Internal(format!("Stored schema of form {form_id} is unusable: {e}"))
        })?;

        let mut violations = Violations::new(mode);
        let contact = SubmitterContact::extract(&raw, &mut violations)?;
        let processed = process_fields(&schema, &raw, &self.allowed_extensions, &mut violations)?;
        violations.finish()?;

        let stored = self.store_files(form_id, &processed.files).await?;
        let files_json = (!stored.is_empty()).then(|| Value::Array(stored.clone()));

        let model = form_response::ActiveModel {
            id: Set(self.id_gen.generate()),
            form_id: Set(form_id.to_string()),
            submission_data: Set(processed.to_json()),
            submitter_email: Set(contact.email),
            submitter_name: Set(contact.name),
            submitter_phone: Set(contact.phone),
            files_json: Set(files_json),
            ip_address: Set(client.ip_address),
            user_agent: Set(client
                .user_agent
                .map(|ua| ua.chars().take(MAX_USER_AGENT_CHARS).collect())),
            honeypot_value: Set(Some(honeypot_value)),
            created_at: Set(Utc::now().into()),
        };

        match self.response_repo.create_counted(model).await {
            Ok(response) => {
                tracing::info!(
                    form_id = %form_id,
                    response_id = %response.id,
                    files = stored.len(),
                    "Submission recorded"
                );
                Ok(SubmissionOutcome::Recorded(response))
            }
            Err(e) => {
                if !stored.is_empty() {
                    tracing::warn!(
                        form_id = %form_id,
                        orphaned = ?stored,
                        error = %e,
                        "Submission failed after its files were stored"
                    );
                }
                Err(e)
            }
        }
    }

    /// Write pending uploads; returns one `files_json` entry per file.
    async fn store_files(&self, form_id: &str, files: &[PendingFile]) -> AppResult<Vec<Value>> {
        let mut stored = Vec::with_capacity(files.len());

        for pending in files {
            let key = generate_storage_key(UPLOAD_CATEGORY, &pending.file.file_name);

            let saved = match self.storage.save(&key, &pending.file.data).await {
                Ok(saved) => saved,
                Err(e) => {
                    if !stored.is_empty() {
                        tracing::warn!(
                            form_id = %form_id,
                            orphaned = ?stored,
                            "Upload failed after earlier files were stored"
                        );
                    }
                    return Err(e);
                }
            };

            stored.push(json!({
                "field": pending.field,
                "original_name": pending.file.file_name,
                "stored_path": saved.key,
                "content_type": pending.file.content_type,
                "size": saved.size,
                "md5": saved.md5,
            }));
        }

        Ok(stored)
    }
}
