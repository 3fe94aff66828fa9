//! Host validation: structural transformation failures become field errors.
//!
//! The listener is registered on every compound builder at priority 0 of
//! `PostSubmit` and only acts for root forms, after the whole tree is bound.

use std::rc::Rc;

use dynaform_types::{FormError, FormEvent, FormHandle, Listener};
use serde_json::Value;
use tracing::debug;

use crate::form::Form;

pub(crate) fn validation_listener() -> Listener<Form> {
    Rc::new(|event: &mut FormEvent<Form>| {
        let form = event.form();
        if form.is_root() {
            validate_transformations(form);
        }
        Ok(())
    })
}

/// Adds an `invalid_message` error to every field in the tree whose last
/// submission could not be converted.
pub fn validate_transformations(form: &Form) {
    if let Some(failure) = form.transformation_failure() {
        let message = form
            .options()
            .get("invalid_message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| form.kind().default_invalid_message().to_string());
        debug!(field = %form.name(), reason = %failure, "transformation failure reported as field error");
        form.add_error(FormError::new(message));
    }
    for child in form.children() {
        validate_transformations(&child);
    }
}
