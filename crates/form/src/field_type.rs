//! Field types understood by the reference host.
//!
//! The catalog is intentionally small: enough to build compound forms with
//! text inputs, hidden inputs, checkboxes, and single-select choices. Choice
//! and checkbox fields convert submitted values through a view transformer so
//! that stale selections surface as transformation failures.

use std::{fmt, rc::Rc, str::FromStr};

use dynaform_types::{DataTransformer, FieldOptions, TransformationFailure, choice};
use serde::Serialize;
use serde_json::Value;

use crate::error::FormHostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Hidden,
    Checkbox,
    Choice,
    Compound,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Hidden => "hidden",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Choice => "choice",
            FieldKind::Compound => "form",
        }
    }

    /// Resolves an optional type name; `None` picks the text type.
    pub fn resolve(field_type: Option<&str>) -> Result<Self, FormHostError> {
        match field_type {
            Some(name) => name.parse(),
            None => Ok(FieldKind::Text),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, FieldKind::Compound)
    }

    /// Errors on simple inputs travel to the parent unless configured otherwise.
    pub fn default_error_bubbling(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Hidden | FieldKind::Checkbox)
    }

    /// Data a field takes when nothing (or an empty value) is provided.
    pub fn empty_data(&self) -> Value {
        match self {
            FieldKind::Checkbox => Value::Bool(false),
            FieldKind::Compound => Value::Object(Default::default()),
            _ => Value::Null,
        }
    }

    pub fn default_invalid_message(&self) -> &'static str {
        match self {
            FieldKind::Choice => "The selected choice is invalid.",
            _ => "This value is not valid.",
        }
    }

    /// View transformers a freshly declared field of this type starts with.
    pub fn default_view_transformers(&self, options: &FieldOptions) -> Vec<Rc<dyn DataTransformer>> {
        match self {
            FieldKind::Choice => vec![Rc::new(ChoiceTransformer::new(choice_entries(options)))],
            FieldKind::Checkbox => vec![Rc::new(CheckboxTransformer)],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = FormHostError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "text" => Ok(FieldKind::Text),
            "hidden" => Ok(FieldKind::Hidden),
            "checkbox" => Ok(FieldKind::Checkbox),
            "choice" | "enum" => Ok(FieldKind::Choice),
            "form" | "compound" => Ok(FieldKind::Compound),
            other => Err(FormHostError::UnknownType(other.to_string())),
        }
    }
}

/// One selectable entry of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceEntry {
    pub label: String,
    pub value: Value,
}

/// Reads the `choices` option.
///
/// Arrays list values (labels derive from the value); objects map labels to
/// values. Anything else yields an empty domain.
pub fn choice_entries(options: &FieldOptions) -> Vec<ChoiceEntry> {
    match options.get("choices") {
        Some(Value::Array(values)) => values
            .iter()
            .map(|value| ChoiceEntry {
                label: label_for(value),
                value: value.clone(),
            })
            .collect(),
        Some(Value::Object(labelled)) => labelled
            .iter()
            .map(|(label, value)| ChoiceEntry {
                label: label.clone(),
                value: value.clone(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn label_for(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Maps submitted strings onto the canonical choice values.
pub struct ChoiceTransformer {
    values: Vec<Value>,
}

impl ChoiceTransformer {
    pub fn new(entries: Vec<ChoiceEntry>) -> Self {
        Self {
            values: entries.into_iter().map(|entry| entry.value).collect(),
        }
    }
}

impl DataTransformer for ChoiceTransformer {
    fn transform(&self, value: &Value) -> Result<Value, TransformationFailure> {
        Ok(value.clone())
    }

    fn reverse_transform(&self, value: &Value) -> Result<Value, TransformationFailure> {
        if choice::is_empty_submission(value) {
            return Ok(Value::Null);
        }
        choice::find_choice(&self.values, value)
            .cloned()
            .ok_or_else(|| TransformationFailure(format!("the choice {} does not exist", value)))
    }
}

/// Any submitted value other than an explicit `false` checks the box.
pub struct CheckboxTransformer;

impl DataTransformer for CheckboxTransformer {
    fn transform(&self, value: &Value) -> Result<Value, TransformationFailure> {
        Ok(Value::Bool(value.as_bool().unwrap_or(false)))
    }

    fn reverse_transform(&self, value: &Value) -> Result<Value, TransformationFailure> {
        Ok(match value {
            Value::Bool(checked) => Value::Bool(*checked),
            Value::Null => Value::Bool(false),
            _ => Value::Bool(true),
        })
    }
}
