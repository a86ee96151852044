//! Draft form submissions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::{FormSchema, FormValue};

/// A draft submission being assembled while the visitor fills the form.
///
/// Scalar fields are set wholesale; checkbox options are toggled in and out
/// and accumulate into an array value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormFill {
    values: BTreeMap<String, FormValue>,
    terms_accepted: bool,
}

impl FormFill {
    /// Create an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar field value, replacing any previous value.
    pub fn set_value(&mut self, field_id: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(field_id.into(), FormValue::Text(value.into()));
    }

    /// Toggle a checkbox option: adds it if absent, removes it if present.
    pub fn toggle_option(&mut self, field_id: impl Into<String>, option: impl Into<String>) {
        let option = option.into();
        let entry = self
            .values
            .entry(field_id.into())
            .or_insert_with(|| FormValue::Many(Vec::new()));

        // A scalar slot toggled as a checkbox becomes an array slot.
        if let FormValue::Text(s) = entry {
            let prior = s.clone();
            let mut items = Vec::new();
            if !prior.trim().is_empty() {
                items.push(prior);
            }
            *entry = FormValue::Many(items);
        }

        if let FormValue::Many(items) = entry {
            if let Some(pos) = items.iter().position(|o| *o == option) {
                items.remove(pos);
            } else {
                items.push(option);
            }
        }
    }

    /// Record whether the terms checkbox is ticked.
    pub const fn set_terms_accepted(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    /// Current value of a field, if any.
    #[must_use]
    pub fn value(&self, field_id: &str) -> Option<&FormValue> {
        self.values.get(field_id)
    }

    /// Whether the terms checkbox is ticked.
    #[must_use]
    pub const fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// Assemble the final submission for a schema.
    ///
    /// The terms-accepted boolean rides along only when the schema requires
    /// acceptance; validation has already guaranteed it is ticked by then.
    #[must_use]
    pub fn into_submission(self, schema: &FormSchema) -> FormSubmission {
        FormSubmission {
            form_id: schema.id.clone(),
            values: self.values,
            terms_accepted: schema.require_terms_acceptance.then_some(self.terms_accepted),
        }
    }
}

/// A validated, ready-to-send form submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    /// Schema id this submission answers.
    pub form_id: String,
    /// Field id to value mapping.
    pub values: BTreeMap<String, FormValue>,
    /// Terms acceptance, present only when the schema required it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_accepted: Option<bool>,
}

impl FormSubmission {
    /// Flatten into the `submitted_data` wire object: field values plus the
    /// terms flag under a reserved key when present.
    #[must_use]
    pub fn submitted_data(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (id, value) in &self.values {
            let json = match value {
                FormValue::Text(s) => serde_json::Value::String(s.clone()),
                FormValue::Many(items) => serde_json::Value::Array(
                    items
                        .iter()
                        .map(|o| serde_json::Value::String(o.clone()))
                        .collect(),
                ),
            };
            map.insert(id.clone(), json);
        }
        if let Some(accepted) = self.terms_accepted {
            map.insert(
                "terms_accepted".to_string(),
                serde_json::Value::Bool(accepted),
            );
        }
        serde_json::Value::Object(map)
    }
}
