//! Client-side form validation.
//!
//! Every rule is evaluated at submit time (not merely on blur) so untouched
//! required fields are still caught. Validation errors never travel over the
//! network; they are rendered inline and block submission until resolved.

use std::collections::BTreeMap;

use regex::Regex;

use super::fill::FormFill;
use super::schema::{FieldKind, FieldSpec, FormSchema, FormValue};

/// Per-field validation outcome, plus the terms error keyed separately.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    field_errors: BTreeMap<String, String>,
    terms_error: Option<String>,
}

impl ValidationErrors {
    /// Whether submission may proceed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty() && self.terms_error.is_none()
    }

    /// Number of failing fields (terms not included).
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.field_errors.len()
    }

    /// Error message for a field, if any.
    #[must_use]
    pub fn field_error(&self, field_id: &str) -> Option<&str> {
        self.field_errors.get(field_id).map(String::as_str)
    }

    /// The terms-acceptance error, if any.
    #[must_use]
    pub fn terms_error(&self) -> Option<&str> {
        self.terms_error.as_deref()
    }

    /// Iterate over (field id, message) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_errors
            .iter()
            .map(|(id, msg)| (id.as_str(), msg.as_str()))
    }

    fn push_field(&mut self, field_id: &str, message: String) {
        self.field_errors.insert(field_id.to_string(), message);
    }
}

/// Pattern-based form validator with precompiled field-kind patterns.
pub struct FormValidator {
    email_pattern: Regex,
    phone_pattern: Regex,
}

impl FormValidator {
    /// Create a new validator.
    ///
    /// # Errors
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Email: standard local@domain shape
            email_pattern: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")?,

            // Phone: international leading digit, no leading zero, 1-16
            // digits, optional +; evaluated after stripping separators
            phone_pattern: Regex::new(r"^\+?[1-9][0-9]{0,15}$")?,
        })
    }

    /// Validate a draft against a schema.
    ///
    /// Rules per field, in order: required/empty, kind-specific shape
    /// (email, phone), min/max length for text-like kinds, then the
    /// schema-supplied pattern. The first failing rule wins for a field.
    #[must_use]
    pub fn validate(&self, schema: &FormSchema, fill: &FormFill) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        for field in &schema.fields {
            if let Some(message) = self.check_field(field, fill.value(&field.id)) {
                errors.push_field(&field.id, message);
            }
        }

        if schema.require_terms_acceptance && !fill.terms_accepted() {
            errors.terms_error = Some("You must accept the terms to continue".to_string());
        }

        errors
    }

    fn check_field(&self, field: &FieldSpec, value: Option<&FormValue>) -> Option<String> {
        let empty = value.is_none_or(FormValue::is_empty);
        if empty {
            if field.required {
                return Some(format!("{} is required", field.label));
            }
            return None;
        }

        let text = value.and_then(FormValue::as_text).unwrap_or_default();

        match field.kind {
            FieldKind::Email => {
                if !self.email_pattern.is_match(text.trim()) {
                    return Some(format!("{} must be a valid email address", field.label));
                }
            }
            FieldKind::Phone => {
                let stripped: String = text
                    .chars()
                    .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
                    .collect();
                if !self.phone_pattern.is_match(&stripped) {
                    return Some(format!("{} must be a valid phone number", field.label));
                }
            }
            _ => {}
        }

        if let Some(rules) = &field.validation {
            if field.kind.is_text_like() {
                let len = text.chars().count();
                if let Some(min) = rules.min {
                    if len < min {
                        return Some(format!(
                            "{} must be at least {min} characters",
                            field.label
                        ));
                    }
                }
                if let Some(max) = rules.max {
                    if len > max {
                        return Some(format!(
                            "{} must be at most {max} characters",
                            field.label
                        ));
                    }
                }
            }

            if let Some(pattern) = &rules.pattern {
                // A broken server-supplied pattern counts as a failed match,
                // never a crash.
                let matched = Regex::new(pattern)
                    .map(|re| re.is_match(text))
                    .unwrap_or(false);
                if !matched {
                    return Some(format!("{} format is invalid", field.label));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::schema::{FieldKind, FieldRules};

    fn contact_schema() -> FormSchema {
        FormSchema {
            id: "contact".to_string(),
            title: "Contact us".to_string(),
            description: None,
            fields: vec![
                FieldSpec {
                    id: "name".to_string(),
                    kind: FieldKind::Text,
                    label: "Name".to_string(),
                    placeholder: None,
                    required: true,
                    options: None,
                    validation: Some(FieldRules {
                        min: Some(3),
                        max: Some(10),
                        pattern: None,
                    }),
                },
                FieldSpec {
                    id: "email".to_string(),
                    kind: FieldKind::Email,
                    label: "Email".to_string(),
                    placeholder: None,
                    required: true,
                    options: None,
                    validation: None,
                },
            ],
            success_message: "Thanks!".to_string(),
            require_terms_acceptance: false,
            terms_text: None,
        }
    }

    #[test]
    fn test_empty_submission_fails_both_required_fields() {
        let validator = FormValidator::new().unwrap();
        let errors = validator.validate(&contact_schema(), &FormFill::new());

        assert_eq!(errors.field_count(), 2);
        assert_eq!(errors.field_error("name"), Some("Name is required"));
        assert_eq!(errors.field_error("email"), Some("Email is required"));
    }

    #[test]
    fn test_short_name_fails_length_only() {
        let validator = FormValidator::new().unwrap();
        let mut fill = FormFill::new();
        fill.set_value("name", "ab");
        fill.set_value("email", "x@x.com");

        let errors = validator.validate(&contact_schema(), &fill);
        assert_eq!(errors.field_count(), 1);
        assert_eq!(
            errors.field_error("name"),
            Some("Name must be at least 3 characters")
        );
    }

    #[test]
    fn test_bad_email_fails_format_only() {
        let validator = FormValidator::new().unwrap();
        let mut fill = FormFill::new();
        fill.set_value("name", "abcdef");
        fill.set_value("email", "bad");

        let errors = validator.validate(&contact_schema(), &fill);
        assert_eq!(errors.field_count(), 1);
        assert_eq!(
            errors.field_error("email"),
            Some("Email must be a valid email address")
        );
    }

    #[test]
    fn test_valid_submission_has_no_errors() {
        let validator = FormValidator::new().unwrap();
        let mut fill = FormFill::new();
        fill.set_value("name", "abcdef");
        fill.set_value("email", "a@b.com");

        let errors = validator.validate(&contact_schema(), &fill);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_phone_strips_separators() {
        let validator = FormValidator::new().unwrap();
        let mut schema = contact_schema();
        schema.fields = vec![FieldSpec {
            id: "phone".to_string(),
            kind: FieldKind::Phone,
            label: "Phone".to_string(),
            placeholder: None,
            required: true,
            options: None,
            validation: None,
        }];

        let mut fill = FormFill::new();
        fill.set_value("phone", "+1 (415) 555-0132");
        assert!(validator.validate(&schema, &fill).is_empty());

        fill.set_value("phone", "0415 555");
        let errors = validator.validate(&schema, &fill);
        assert_eq!(
            errors.field_error("phone"),
            Some("Phone must be a valid phone number")
        );
    }

    #[test]
    fn test_terms_error_is_keyed_separately() {
        let validator = FormValidator::new().unwrap();
        let mut schema = contact_schema();
        schema.require_terms_acceptance = true;

        let mut fill = FormFill::new();
        fill.set_value("name", "abcdef");
        fill.set_value("email", "a@b.com");

        let errors = validator.validate(&schema, &fill);
        assert_eq!(errors.field_count(), 0);
        assert!(!errors.is_empty());
        assert_eq!(
            errors.terms_error(),
            Some("You must accept the terms to continue")
        );

        fill.set_terms_accepted(true);
        assert!(validator.validate(&schema, &fill).is_empty());
    }

    #[test]
    fn test_custom_pattern_yields_generic_error() {
        let validator = FormValidator::new().unwrap();
        let mut schema = contact_schema();
        schema.fields = vec![FieldSpec {
            id: "zip".to_string(),
            kind: FieldKind::Text,
            label: "Zip".to_string(),
            placeholder: None,
            required: false,
            options: None,
            validation: Some(FieldRules {
                min: None,
                max: None,
                pattern: Some(r"^\d{5}$".to_string()),
            }),
        }];

        let mut fill = FormFill::new();
        fill.set_value("zip", "abc");
        let errors = validator.validate(&schema, &fill);
        assert_eq!(errors.field_error("zip"), Some("Zip format is invalid"));
    }

    #[test]
    fn test_optional_empty_field_passes() {
        let validator = FormValidator::new().unwrap();
        let mut schema = contact_schema();
        for field in &mut schema.fields {
            field.required = false;
        }

        assert!(validator.validate(&schema, &FormFill::new()).is_empty());
    }
}
