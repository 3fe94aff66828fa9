//! Tunables for the dependency engine.

use serde::{Deserialize, Serialize};

/// Name of the hidden field that carries the synthetic invalidity marker.
pub const DEFAULT_ERROR_FIELD_NAME: &str = "__dynamic_error";

/// Host field type used for the tracking field.
pub const DEFAULT_ERROR_FIELD_TYPE: &str = "hidden";

/// Message stored on the hidden field when dependent errors were cleared.
pub const DEFAULT_ERROR_MESSAGE: &str = "Some dynamic fields have errors.";

/// Engine settings, usually loaded from `settings.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicFormSettings {
    /// Hidden tracking field added to every root form.
    pub error_field_name: String,
    /// Host type of the tracking field.
    pub error_field_type: String,
    /// Error asserted on the tracking field when a dependent field's error is cleared.
    pub error_message: String,
    /// Priority of the root initial-data listener; must run before ordinary listeners.
    pub initial_listener_priority: i32,
    /// Priority of the root cleanup listener; must run after host validation (priority 0).
    pub cleanup_listener_priority: i32,
}

impl Default for DynamicFormSettings {
    fn default() -> Self {
        Self {
            error_field_name: DEFAULT_ERROR_FIELD_NAME.to_string(),
            error_field_type: DEFAULT_ERROR_FIELD_TYPE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            initial_listener_priority: 100,
            cleanup_listener_priority: -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let settings: DynamicFormSettings =
            serde_json::from_str(r#"{"error_message": "Fix the highlighted choices."}"#).expect("parse settings");
        assert_eq!(settings.error_message, "Fix the highlighted choices.");
        assert_eq!(settings.error_field_name, DEFAULT_ERROR_FIELD_NAME);
        assert_eq!(settings.error_field_type, "hidden");
        assert_eq!(settings.initial_listener_priority, 100);
        assert_eq!(settings.cleanup_listener_priority, -1);
    }
}
