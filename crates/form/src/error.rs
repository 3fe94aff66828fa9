//! Errors raised by the reference host.

use thiserror::Error;

/// Host-level failures. Listener and callback failures pass through untouched
/// as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum FormHostError {
    #[error("unknown field type '{0}'")]
    UnknownType(String),

    #[error("field '{name}' is not compound and cannot hold children")]
    NotCompound { name: String },

    #[error("form '{name}' was already submitted")]
    AlreadySubmitted { name: String },

    #[error("form '{name}' cannot set data while its set-data listeners are running")]
    SetDataLocked { name: String },

    #[error("only root forms can be initialized, '{name}' has a parent")]
    NotRoot { name: String },

    #[error("could not transform data of field '{name}': {reason}")]
    Transformation { name: String, reason: String },
}
