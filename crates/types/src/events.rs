//! Form lifecycle events and the two phases the dependency engine observes.
//!
//! Hosts dispatch five lifecycle events per form. Only two of them carry
//! values the engine cares about: [`FormEventKind::PreSetData`] (initial data
//! population) and [`FormEventKind::PostSubmit`] (bound submitted data). Those
//! map onto [`Phase::Initial`] and [`Phase::Submitted`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle event identifiers dispatched by a form host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormEventKind {
    /// Dispatched before data is set on a form; listeners may replace the data.
    #[serde(rename = "form.pre_set_data")]
    PreSetData,
    /// Dispatched after data has been set and mapped to children.
    #[serde(rename = "form.post_set_data")]
    PostSetData,
    /// Dispatched with the raw submitted payload before binding.
    #[serde(rename = "form.pre_submit")]
    PreSubmit,
    /// Dispatched after children were submitted, before data is stored.
    #[serde(rename = "form.submit")]
    Submit,
    /// Dispatched once the submitted data is bound to the form.
    #[serde(rename = "form.post_submit")]
    PostSubmit,
}

impl FormEventKind {
    /// Canonical event name, e.g. `form.pre_set_data`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormEventKind::PreSetData => "form.pre_set_data",
            FormEventKind::PostSetData => "form.post_set_data",
            FormEventKind::PreSubmit => "form.pre_submit",
            FormEventKind::Submit => "form.submit",
            FormEventKind::PostSubmit => "form.post_submit",
        }
    }
}

impl fmt::Display for FormEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moment at which dependency values become available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Data population before any user interaction.
    Initial,
    /// Data population after input binding.
    Submitted,
}

impl Phase {
    /// Lifecycle event that opens this phase.
    pub fn event(&self) -> FormEventKind {
        match self {
            Phase::Initial => FormEventKind::PreSetData,
            Phase::Submitted => FormEventKind::PostSubmit,
        }
    }

    /// Stable slot used by per-phase tables.
    pub fn index(&self) -> usize {
        match self {
            Phase::Initial => 0,
            Phase::Submitted => 1,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initial => f.write_str("initial"),
            Phase::Submitted => f.write_str("submitted"),
        }
    }
}

/// Raised when an event that does not open a phase is used as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid event name \"{0}\": only form.pre_set_data and form.post_submit open a phase")]
pub struct UnsupportedPhaseError(pub FormEventKind);

impl TryFrom<FormEventKind> for Phase {
    type Error = UnsupportedPhaseError;

    fn try_from(event: FormEventKind) -> Result<Self, Self::Error> {
        match event {
            FormEventKind::PreSetData => Ok(Phase::Initial),
            FormEventKind::PostSubmit => Ok(Phase::Submitted),
            other => Err(UnsupportedPhaseError(other)),
        }
    }
}

impl From<Phase> for FormEventKind {
    fn from(phase: Phase) -> Self {
        phase.event()
    }
}
