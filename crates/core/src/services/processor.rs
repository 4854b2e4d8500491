//! Per-field validation of submitted values.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use bytes::Bytes;
use collexo_common::{AppError, AppResult, FieldErrorKind, FieldViolation, file_extension};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::form_schema::{FieldKind, FormSchema};

/// Email pattern accepted for email fields and submitter addresses.
#[allow(clippy::unwrap_used)]
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Check an email address against [`EMAIL_REGEX`].
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// A phone number is exactly ten digits once dashes and spaces are removed.
#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    let mut digits = 0usize;
    for c in value.chars().filter(|c| *c != '-' && *c != ' ') {
        if !c.is_ascii_digit() {
            return false;
        }
        digits += 1;
    }
    digits == 10
}

/// How field errors are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Stop at the first invalid field.
    #[default]
    FailFast,
    /// Report every invalid field at once.
    Accumulate,
}

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Values and files of a submission as received, keyed by part name.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    values: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl RawSubmission {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text value. Repeated names keep every value in order.
    pub fn push_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    /// Append a file part.
    pub fn push_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.entry(name.into()).or_default().push(file);
    }

    /// First value for `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Every value for `name`.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map_or(&[], Vec::as_slice)
    }

    /// First file for `name` that carries a file name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .get(name)
            .and_then(|files| files.iter().find(|f| !f.file_name.is_empty()))
    }
}

/// A validated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Choices(Vec<String>),
}

/// An accepted upload waiting to be written to storage.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub field: String,
    pub file: UploadedFile,
}

/// Outcome of a successful [`process`] run.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSubmission {
    /// Answers in schema order. Absent optional files have no entry.
    pub values: Vec<(String, FieldValue)>,
    pub files: Vec<PendingFile>,
}

impl ProcessedSubmission {
    /// Answers as the JSON object stored in `submission_data`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    FieldValue::Text(text) => Value::from(text.as_str()),
                    FieldValue::Choices(choices) => Value::from(choices.clone()),
                };
                (name.clone(), value)
            })
            .collect();
        Value::Object(map)
    }
}

/// Collects field violations according to a [`ValidationMode`].
#[derive(Debug)]
pub struct Violations {
    mode: ValidationMode,
    found: Vec<FieldViolation>,
}

impl Violations {
    #[must_use]
    pub const fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            found: Vec::new(),
        }
    }

    /// Record a violation. Fails immediately in fail-fast mode.
    pub fn reject(&mut self, field: &str, kind: FieldErrorKind) -> AppResult<()> {
        let violation = FieldViolation::new(field, kind);
        match self.mode {
            ValidationMode::FailFast => Err(AppError::InvalidField(violation)),
            ValidationMode::Accumulate => {
                self.found.push(violation);
                Ok(())
            }
        }
    }

    /// Fail with everything recorded so far, if anything.
    pub fn finish(self) -> AppResult<()> {
        if self.found.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.found))
        }
    }
}

/// Validate a raw submission against a schema.
pub fn process(
    schema: &FormSchema,
    raw: &RawSubmission,
    allowed_extensions: &BTreeSet<String>,
    mode: ValidationMode,
) -> AppResult<ProcessedSubmission> {
    let mut violations = Violations::new(mode);
    let processed = process_fields(schema, raw, allowed_extensions, &mut violations)?;
    violations.finish()?;
    Ok(processed)
}

/// Like [`process`], recording violations into a caller-owned collector.
pub fn process_fields(
    schema: &FormSchema,
    raw: &RawSubmission,
    allowed_extensions: &BTreeSet<String>,
    violations: &mut Violations,
) -> AppResult<ProcessedSubmission> {
    let mut processed = ProcessedSubmission::default();

    for field in schema.fields() {
        let name = field.name.as_str();

        match &field.kind {
            FieldKind::File => match raw.file(name) {
                Some(upload) => {
                    let allowed = file_extension(&upload.file_name)
                        .is_some_and(|ext| allowed_extensions.contains(&ext));
                    if !allowed {
                        violations.reject(name, FieldErrorKind::InvalidType)?;
                        continue;
                    }
                    processed
                        .values
                        .push((name.to_string(), FieldValue::Text(upload.file_name.clone())));
                    processed.files.push(PendingFile {
                        field: name.to_string(),
                        file: upload.clone(),
                    });
                }
                None if field.required => violations.reject(name, FieldErrorKind::Required)?,
                None => {}
            },
            FieldKind::Checkbox { .. } => {
                let selected = raw.values(name).to_vec();
                if field.required && selected.is_empty() {
                    violations.reject(name, FieldErrorKind::Required)?;
                    continue;
                }
                processed
                    .values
                    .push((name.to_string(), FieldValue::Choices(selected)));
            }
            kind => {
                let value = raw.value(name).unwrap_or_default().trim().to_string();
                if value.is_empty() {
                    if field.required {
                        violations.reject(name, FieldErrorKind::Required)?;
                        continue;
                    }
                } else if !matches_format(kind, &value) {
                    violations.reject(name, FieldErrorKind::InvalidFormat)?;
                    continue;
                }
                processed.values.push((name.to_string(), FieldValue::Text(value)));
            }
        }
    }

    Ok(processed)
}

fn matches_format(kind: &FieldKind, value: &str) -> bool {
    match kind {
        FieldKind::Email => is_valid_email(value),
        FieldKind::Phone => is_valid_phone(value),
        _ => true,
    }
}
