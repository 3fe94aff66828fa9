//! Error taxonomy of the dependency engine.

use dynaform_types::UnsupportedPhaseError;
use thiserror::Error;

/// Failures raised by dependent-field resolution.
///
/// Unknown dependency names are deliberately absent: a config whose
/// dependencies never show up simply never becomes ready.
#[derive(Debug, Error)]
pub enum DynamicFormError {
    /// An event that does not open a phase was used as one.
    #[error(transparent)]
    UnsupportedEvent(#[from] UnsupportedPhaseError),

    /// A dependency fired before the root form started its initial data population.
    #[error("dependent field '{field}' resolved before the root form was initialized")]
    FormNotInitialized { field: String },

    /// The host no longer knows a field the engine just declared or relies on.
    #[error("field '{name}' is missing from the form")]
    MissingField { name: String },

    /// A user callback failed; the pass that invoked it is aborted.
    #[error("callback for dependent field '{field}' failed")]
    Callback {
        field: String,
        #[source]
        source: anyhow::Error,
    },
}
