//! Contract between the dependency engine and a form host.
//!
//! A host owns field construction, data binding, and validation. The engine
//! only needs to add, remove, and inspect fields, observe lifecycle events,
//! and adjust error state. Handles are cheap to clone and use interior
//! mutability: a listener may call back into the same form while the host is
//! still dispatching, so implementations must not hold internal borrows
//! across listener invocations.

use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;

use crate::{FieldOptions, FormError, FormEventKind};

/// Event delivered to a listener: the dispatching form plus the event data.
///
/// For [`FormEventKind::PreSetData`] the data is the value about to be set and
/// listeners may replace it. For [`FormEventKind::PreSubmit`] it is the raw
/// submitted payload. For the remaining events it is the form's data at
/// dispatch time.
#[derive(Debug, Clone)]
pub struct FormEvent<F> {
    form: F,
    data: Value,
}

impl<F> FormEvent<F> {
    pub fn new(form: F, data: Value) -> Self {
        Self { form, data }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn set_data(&mut self, data: Value) {
        self.data = data;
    }

    pub fn into_data(self) -> Value {
        self.data
    }
}

/// Listener registered on a builder's event table.
pub type Listener<F> = Rc<dyn Fn(&mut FormEvent<F>) -> Result<()>>;

/// Raised when a submitted value cannot be converted to the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformationFailure(pub String);

/// Bidirectional conversion between a field's model and view representation.
pub trait DataTransformer {
    /// Model value to view value.
    fn transform(&self, value: &Value) -> Result<Value, TransformationFailure>;

    /// View value back to model value. A failure marks the field as
    /// structurally invalid.
    fn reverse_transform(&self, value: &Value) -> Result<Value, TransformationFailure>;
}

/// A live form (or field) produced by a builder.
pub trait FormHandle: Clone {
    fn name(&self) -> String;

    /// Current model data.
    fn data(&self) -> Value;

    /// Populates the form with initial data, dispatching the set-data events.
    fn set_data(&self, data: Value) -> Result<()>;

    /// Binds a submitted payload, dispatching the submit events.
    fn submit(&self, submitted: Value) -> Result<()>;

    fn is_submitted(&self) -> bool;

    /// Attaches an already built child, replacing any child with the same name.
    fn add(&self, child: Self) -> Result<()>;

    /// Detaches a child; a no-op when absent.
    fn remove(&self, name: &str);

    fn has(&self, name: &str) -> bool;

    fn get(&self, name: &str) -> Option<Self>;

    /// Children in display order.
    fn children(&self) -> Vec<Self>;

    /// Failure recorded while converting the last submitted value, if any.
    fn transformation_failure(&self) -> Option<TransformationFailure>;

    /// Whether [`FormHandle::clear_errors`] has any effect on this form.
    fn supports_clearing_errors(&self) -> bool;

    fn clear_errors(&self);

    fn add_error(&self, error: FormError);

    /// Errors attached directly to this form.
    fn errors(&self) -> Vec<FormError>;

    /// True once submitted with no errors anywhere in the subtree.
    fn is_valid(&self) -> bool;
}

/// Builder side of the host: declares fields and listeners before (and while)
/// live forms exist.
pub trait FormBuilderHandle: Clone {
    type Form: FormHandle;
    type Child: FormBuilderHandle<Form = Self::Form>;

    fn name(&self) -> String;

    /// Declares (or replaces) a child field. `None` lets the host pick its
    /// default field type.
    fn add(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<()>;

    /// Creates a detached child builder without adding it.
    fn create(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<Self::Child>;

    fn remove(&self, name: &str);

    fn has(&self, name: &str) -> bool;

    fn get(&self, name: &str) -> Option<Self::Child>;

    /// Child names in declaration order.
    fn names(&self) -> Vec<String>;

    fn count(&self) -> usize {
        self.names().len()
    }

    /// Registers a listener; higher priorities run first, equal priorities in
    /// registration order.
    fn add_event_listener(&self, event: FormEventKind, listener: Listener<Self::Form>, priority: i32);

    /// Number of listeners currently registered for `event`.
    fn listener_count(&self, event: FormEventKind) -> usize;

    /// Builds the live form. Auto-initializing builders also set their data.
    fn get_form(&self) -> Result<Self::Form>;

    fn field_type(&self) -> String;

    fn attribute(&self, name: &str) -> Option<Value>;

    fn set_attribute(&self, name: &str, value: Value);

    fn attributes(&self) -> FieldOptions;

    fn option(&self, name: &str) -> Option<Value>;

    fn has_option(&self, name: &str) -> bool;

    fn options(&self) -> FieldOptions;

    fn data(&self) -> Value;

    fn set_data(&self, data: Value);

    fn required(&self) -> bool;

    fn set_required(&self, required: bool);

    fn disabled(&self) -> bool;

    fn set_disabled(&self, disabled: bool);

    fn mapped(&self) -> bool;

    fn set_mapped(&self, mapped: bool);

    fn error_bubbling(&self) -> bool;

    fn set_error_bubbling(&self, error_bubbling: bool);

    fn auto_initialize(&self) -> bool;

    fn set_auto_initialize(&self, auto_initialize: bool);

    fn add_view_transformer(&self, transformer: Rc<dyn DataTransformer>, force_prepend: bool);

    fn reset_view_transformers(&self);

    fn add_model_transformer(&self, transformer: Rc<dyn DataTransformer>, force_append: bool);

    fn reset_model_transformers(&self);
}
