//! Dynamic forms: server-supplied schemas, draft fills, and client-side
//! validation.

pub mod fill;
pub mod schema;
pub mod validate;

pub use fill::{FormFill, FormSubmission};
pub use schema::{FieldKind, FieldRules, FieldSpec, FormSchema, FormValue};
pub use validate::{FormValidator, ValidationErrors};
