//! Dynamic form schemas.
//!
//! A schema is stored as a JSON array of field objects:
//!
//! ```json
//! [
//!   {"name": "why", "type": "textarea", "label": "Why join?", "required": true},
//!   {"name": "team", "type": "select", "label": "Team", "options": ["Tech", "Design"]}
//! ]
//! ```
//!
//! [`FormSchema::parse`] turns that untrusted value into typed
//! [`FieldDefinition`]s; [`validate`] is the boolean view of the same check.

use std::collections::HashSet;

use collexo_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of a form field, with the options of choice fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Textarea,
    Select { options: Vec<String> },
    Radio { options: Vec<String> },
    Checkbox { options: Vec<String> },
    File,
}

impl FieldKind {
    /// Name of the type as it appears in the stored schema.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Textarea => "textarea",
            Self::Select { .. } => "select",
            Self::Radio { .. } => "radio",
            Self::Checkbox { .. } => "checkbox",
            Self::File => "file",
        }
    }

    /// Options of a choice field.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Select { options } | Self::Radio { options } | Self::Checkbox { options } => {
                Some(options)
            }
            _ => None,
        }
    }

    fn from_parts(type_name: &str, options: Option<Value>) -> Result<Self, String> {
        let kind = match type_name {
            "text" => Self::Text,
            "email" => Self::Email,
            "phone" => Self::Phone,
            "textarea" => Self::Textarea,
            "file" => Self::File,
            "select" => Self::Select {
                options: parse_options(options)?,
            },
            "radio" => Self::Radio {
                options: parse_options(options)?,
            },
            "checkbox" => Self::Checkbox {
                options: parse_options(options)?,
            },
            other => return Err(format!("unknown field type `{other}`")),
        };
        Ok(kind)
    }
}

fn parse_options(options: Option<Value>) -> Result<Vec<String>, String> {
    let Some(Value::Array(items)) = options else {
        return Err("choice fields need an `options` list".to_string());
    };
    if items.is_empty() {
        return Err("`options` must not be empty".to_string());
    }

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err("`options` must contain only strings".to_string()),
        })
        .collect()
}

/// One question of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFieldDefinition", into = "RawFieldDefinition")]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
}

/// Wire shape of a field definition.
#[derive(Serialize, Deserialize)]
struct RawFieldDefinition {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    label: String,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

impl TryFrom<RawFieldDefinition> for FieldDefinition {
    type Error = String;

    fn try_from(raw: RawFieldDefinition) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err("field `name` must not be empty".to_string());
        }
        if raw.label.is_empty() {
            return Err(format!("field `{}` has an empty label", raw.name));
        }

        let kind = FieldKind::from_parts(&raw.field_type, raw.options)
            .map_err(|e| format!("field `{}`: {e}", raw.name))?;

        Ok(Self {
            name: raw.name,
            label: raw.label,
            required: raw.required,
            kind,
        })
    }
}

impl From<FieldDefinition> for RawFieldDefinition {
    fn from(field: FieldDefinition) -> Self {
        let field_type = field.kind.type_name().to_string();
        let options = field
            .kind
            .options()
            .map(|options| Value::from(options.to_vec()));

        Self {
            name: field.name,
            field_type,
            label: field.label,
            required: field.required,
            options,
        }
    }
}

/// Ordered list of field definitions with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormSchema {
    fields: Vec<FieldDefinition>,
}

impl FormSchema {
    /// Parse and validate an untrusted schema value.
    pub fn parse(value: &Value) -> AppResult<Self> {
        let fields = Vec::<FieldDefinition>::deserialize(value)
            .map_err(|e| AppError::SchemaInvalid(e.to_string()))?;

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(AppError::SchemaInvalid(format!(
                    "duplicate field name `{}`",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fail when a field is named after a part the submit endpoint reads for
    /// itself, such as the honeypot or the submitter contact parts.
    pub fn ensure_names_free<'a, I>(&self, reserved: I) -> AppResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match reserved.into_iter().find(|name| self.field(name).is_some()) {
            Some(name) => Err(AppError::SchemaInvalid(format!(
                "field name `{name}` is reserved"
            ))),
            None => Ok(()),
        }
    }

    /// Canonical JSON form, as persisted on the form row.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Array(Vec::new()))
    }
}

/// Check whether a value is an acceptable form schema.
#[must_use]
pub fn validate(schema: &Value) -> bool {
    FormSchema::parse(schema).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_array() {
        assert!(!validate(&json!({"name": "a", "type": "text", "label": "A"})));
        assert!(!validate(&json!("fields")));
        assert!(!validate(&Value::Null));
    }

    #[test]
    fn test_rejects_non_object_element() {
        assert!(!validate(&json!([42])));
        assert!(!validate(&json!([{"name": "a", "type": "text", "label": "A"}, "b"])));
    }

    #[test]
    fn test_rejects_missing_keys() {
        assert!(!validate(&json!([{"type": "text", "label": "A"}])));
        assert!(!validate(&json!([{"name": "a", "label": "A"}])));
        assert!(!validate(&json!([{"name": "a", "type": "text"}])));
        assert!(!validate(&json!([{"name": "", "type": "text", "label": "A"}])));
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(!validate(&json!([{"name": "a", "type": "date", "label": "A"}])));
    }

    #[test]
    fn test_rejects_bad_options() {
        let bad = [
            json!([{"name": "a", "type": "select", "label": "A"}]),
            json!([{"name": "a", "type": "radio", "label": "A", "options": "x,y"}]),
            json!([{"name": "a", "type": "checkbox", "label": "A", "options": []}]),
            json!([{"name": "a", "type": "select", "label": "A", "options": [1, 2]}]),
        ];
        for schema in &bad {
            assert!(!validate(schema), "{schema}");
        }
    }

    #[test]
    fn test_rejects_non_bool_required() {
        let schema = json!([{"name": "a", "type": "text", "label": "A", "required": "yes"}]);
        assert!(!validate(&schema));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let schema = json!([
            {"name": "a", "type": "text", "label": "A"},
            {"name": "a", "type": "email", "label": "Again"}
        ]);
        assert!(matches!(FormSchema::parse(&schema), Err(AppError::SchemaInvalid(_))));
    }

    #[test]
    fn test_accepts_single_text_field() {
        let schema = json!([{"name": "q1", "type": "text", "label": "Why?"}]);
        assert!(validate(&schema));

        let parsed = FormSchema::parse(&schema).unwrap();
        assert_eq!(parsed.fields().len(), 1);
        assert!(!parsed.fields()[0].required);
        assert_eq!(parsed.fields()[0].kind, FieldKind::Text);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let good = json!([{"name": "q1", "type": "text", "label": "Why?"}]);
        let bad = json!([{"name": "q1", "type": "select", "label": "Pick"}]);
        assert_eq!(validate(&good), validate(&good));
        assert_eq!(validate(&bad), validate(&bad));
    }

    #[test]
    fn test_options_ignored_on_plain_fields() {
        let schema = json!([{"name": "a", "type": "text", "label": "A", "options": 7}]);
        let parsed = FormSchema::parse(&schema).unwrap();
        assert_eq!(parsed.fields()[0].kind.options(), None);
    }

    #[test]
    fn test_to_value_keeps_wire_shape() {
        let schema = json!([
            {
                "name": "team", "type": "checkbox", "label": "Teams",
                "required": true, "options": ["Tech", "Design"]
            },
            {"name": "cv", "type": "file", "label": "CV", "required": false}
        ]);
        let parsed = FormSchema::parse(&schema).unwrap();

        assert_eq!(parsed.to_value(), schema);
        assert_eq!(
            parsed.field("team").unwrap().kind.options().unwrap(),
            ["Tech".to_string(), "Design".to_string()]
        );
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let schema = FormSchema::parse(&json!([
            {"name": "website", "type": "text", "label": "Portfolio site", "required": true}
        ]))
        .unwrap();

        let err = schema
            .ensure_names_free(["website", "submitter_email"])
            .unwrap_err();
        assert!(matches!(err, AppError::SchemaInvalid(msg) if msg.contains("website")));
        assert!(schema.ensure_names_free(["submitter_name"]).is_ok());
    }
}
