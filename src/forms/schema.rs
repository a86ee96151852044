//! Server-supplied form schemas.
//!
//! Form schemas are authored in the dashboard and pushed down
//! mid-conversation attached to an agent reply; the wire casing is the
//! dashboard's camelCase.

use serde::{Deserialize, Serialize};

/// A dynamic form pushed down mid-conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Schema identifier, echoed back on submission.
    pub id: String,
    /// Form title shown above the fields.
    pub title: String,
    /// Optional descriptive text under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields, rendered in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Message shown locally once the submission is accepted.
    #[serde(default)]
    pub success_message: String,
    /// Whether the visitor must tick a terms checkbox before submitting.
    #[serde(default)]
    pub require_terms_acceptance: bool,
    /// Terms text shown next to the checkbox.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_text: Option<String>,
}

impl FormSchema {
    /// Look up a field by id.
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// One form control.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Field identifier, unique within a schema.
    pub id: String,
    /// Control kind.
    pub kind: FieldKind,
    /// Human label, also used in validation messages.
    pub label: String,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Whether a value must be present at submit time.
    #[serde(default)]
    pub required: bool,
    /// Options for select/radio/checkbox kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Extra validation rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldRules>,
}

/// Supported control kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Numeric input.
    Number,
    /// Date input.
    Date,
    /// Multi-line text.
    Textarea,
    /// Single choice from a dropdown.
    Select,
    /// Single choice from radio buttons.
    Radio,
    /// Multi-select checkboxes; values accumulate into an array.
    Checkbox,
}

impl FieldKind {
    /// Whether min/max length rules apply to this kind.
    #[must_use]
    pub const fn is_text_like(self) -> bool {
        matches!(self, Self::Text | Self::Textarea)
    }
}

/// Validation rules attached to a field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRules {
    /// Minimum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<usize>,
    /// Maximum string length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    /// Regular expression the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// A submitted field value: a scalar, or an array of selected option
/// strings for checkbox fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Scalar value.
    Text(String),
    /// Checkbox multi-select.
    Many(Vec<String>),
}

impl FormValue {
    /// Whether this value counts as empty for `required` checks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Many(items) => items.is_empty(),
        }
    }

    /// The scalar text, if this is a scalar.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Many(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_wire_casing() {
        let json = r#"{
            "id": "lead-capture",
            "title": "Get in touch",
            "fields": [
                {"id": "email", "kind": "email", "label": "Email", "required": true}
            ],
            "successMessage": "Thanks!",
            "requireTermsAcceptance": true,
            "termsText": "I agree."
        }"#;
        let schema: FormSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.success_message, "Thanks!");
        assert!(schema.require_terms_acceptance);
        assert_eq!(schema.fields[0].kind, FieldKind::Email);
    }

    #[test]
    fn test_form_value_untagged() {
        let scalar: FormValue = serde_json::from_str(r#""hello""#).unwrap();
        assert_eq!(scalar, FormValue::Text("hello".to_string()));

        let many: FormValue = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        assert_eq!(
            many,
            FormValue::Many(vec!["A".to_string(), "B".to_string()])
        );
    }

    #[test]
    fn test_empty_values() {
        assert!(FormValue::Text("  ".to_string()).is_empty());
        assert!(FormValue::Many(Vec::new()).is_empty());
        assert!(!FormValue::Text("x".to_string()).is_empty());
    }
}
