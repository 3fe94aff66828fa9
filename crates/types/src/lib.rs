//! Shared vocabulary for dynaform crates: lifecycle events, option and value
//! maps, form errors, and the host contract consumed by the engine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod choice;
pub mod events;
pub mod host;
pub mod settings;

pub use events::{FormEventKind, Phase, UnsupportedPhaseError};
pub use host::{DataTransformer, FormBuilderHandle, FormEvent, FormHandle, Listener, TransformationFailure};
pub use settings::DynamicFormSettings;

/// Field configuration options, forwarded verbatim to the host.
pub type FieldOptions = IndexMap<String, Value>;

/// Field values keyed by field name, in arrival order.
pub type FieldValues = IndexMap<String, Value>;

/// A validation error attached to a form or field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormError {
    /// Human readable message.
    pub message: String,
    /// Field the error originated from when it bubbled to an ancestor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl FormError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{}: {}", origin, self.message),
            None => f.write_str(&self.message),
        }
    }
}
