//! Live forms: data population, submission, and error state.
//!
//! Children are kept in insertion order and visited through a live walk: a
//! child added while its siblings are being populated or submitted is still
//! visited, and a child replaced before the walk reaches it is visited in its
//! new form. Listeners may add or remove children of the form that is
//! currently dispatching, so no internal borrow is held while listeners run.

use std::{
    cell::RefCell,
    collections::HashSet,
    fmt,
    rc::{Rc, Weak},
};

use anyhow::Result;
use dynaform_types::{FieldOptions, FormError, FormEvent, FormEventKind, FormHandle, TransformationFailure, choice};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value};
use tracing::trace;

use crate::{
    builder::FormConfig,
    error::FormHostError,
    field_type::{ChoiceEntry, FieldKind, choice_entries},
};

struct FormState {
    config: FormConfig,
    parent: Option<Weak<RefCell<FormState>>>,
    children: IndexMap<String, Form>,
    model_data: Value,
    view_data: Value,
    submitted: bool,
    default_data_set: bool,
    lock_set_data: bool,
    errors: Vec<FormError>,
    transformation_failure: Option<TransformationFailure>,
}

/// Shared handle to a live form or field.
#[derive(Clone)]
pub struct Form {
    state: Rc<RefCell<FormState>>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Form")
            .field("name", &state.config.name)
            .field("type", &state.config.kind.as_str())
            .field("data", &state.model_data)
            .field("children", &state.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Form {
    pub(crate) fn from_config(config: FormConfig) -> Self {
        let model_data = config.kind.empty_data();
        Self {
            state: Rc::new(RefCell::new(FormState {
                config,
                parent: None,
                children: IndexMap::new(),
                view_data: model_data.clone(),
                model_data,
                submitted: false,
                default_data_set: false,
                lock_set_data: false,
                errors: Vec::new(),
                transformation_failure: None,
            })),
        }
    }

    /// Sets the configured data on a root form.
    pub fn initialize(&self) -> Result<()> {
        if !self.is_root() {
            return Err(FormHostError::NotRoot { name: self.name() }.into());
        }
        let data = self.state.borrow().config.data.clone();
        self.set_data(data)
    }

    pub fn kind(&self) -> FieldKind {
        self.state.borrow().config.kind
    }

    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    pub fn parent(&self) -> Option<Form> {
        let parent = self.state.borrow().parent.as_ref()?.upgrade()?;
        Some(Form { state: parent })
    }

    pub fn options(&self) -> FieldOptions {
        self.state.borrow().config.options.clone()
    }

    pub fn mapped(&self) -> bool {
        self.state.borrow().config.mapped
    }

    pub fn disabled(&self) -> bool {
        self.state.borrow().config.disabled
    }

    /// Data in its display representation (the raw submission after a failed conversion).
    pub fn view_data(&self) -> Value {
        self.state.borrow().view_data.clone()
    }

    /// Errors of this form and, when `deep`, of every descendant.
    pub fn collect_errors(&self, deep: bool) -> Vec<FormError> {
        let mut errors = self.errors();
        if deep {
            for child in self.children() {
                errors.extend(child.collect_errors(true));
            }
        }
        errors
    }

    /// Serializable snapshot of the form tree.
    pub fn view(&self) -> FormView {
        let (name, kind, options, required, disabled, errors) = {
            let state = self.state.borrow();
            (
                state.config.name.clone(),
                state.config.kind,
                state.config.options.clone(),
                state.config.required,
                state.config.disabled,
                state.errors.clone(),
            )
        };
        let choices = matches!(kind, FieldKind::Choice).then(|| choice_entries(&options));
        FormView {
            name,
            field_type: kind.as_str().to_string(),
            value: self.view_data(),
            data: self.data(),
            label: options.get("label").and_then(Value::as_str).map(str::to_string),
            placeholder: options.get("placeholder").and_then(Value::as_str).map(str::to_string),
            choices,
            required,
            disabled,
            errors,
            children: self.children().iter().map(Form::view).collect(),
        }
    }

    fn dispatch(&self, event: FormEventKind, data: Value) -> Result<Value> {
        let listeners = {
            let dispatcher = self.state.borrow().config.dispatcher.clone();
            let listeners = dispatcher.borrow().listeners(event);
            listeners
        };
        if listeners.is_empty() {
            return Ok(data);
        }
        trace!(form = %self.name(), event = %event, listeners = listeners.len(), "dispatching form event");
        let mut form_event = FormEvent::new(self.clone(), data);
        for listener in listeners {
            listener(&mut form_event)?;
        }
        Ok(form_event.into_data())
    }

    /// Visits children in live order, each name at most once.
    fn walk_children(&self, mut visit: impl FnMut(Form) -> Result<()>) -> Result<()> {
        let mut visited: HashSet<String> = HashSet::new();
        loop {
            let next = {
                let state = self.state.borrow();
                state
                    .children
                    .iter()
                    .find(|(name, _)| !visited.contains(*name))
                    .map(|(name, child)| (name.clone(), child.clone()))
            };
            let Some((name, child)) = next else {
                return Ok(());
            };
            visited.insert(name);
            visit(child)?;
        }
    }

    /// Initial data for `child` taken from this form's current data.
    fn child_data(&self, child: &Form) -> Value {
        let (name, mapped, configured, kind) = {
            let state = child.state.borrow();
            (state.config.name.clone(), state.config.mapped, state.config.data.clone(), state.config.kind)
        };
        let mapped_value = if mapped {
            self.state.borrow().model_data.get(&name).cloned()
        } else {
            None
        };
        match mapped_value {
            Some(value) if !value.is_null() => value,
            _ if !configured.is_null() => configured,
            _ => kind.empty_data(),
        }
    }

    fn transform_to_view(&self, data: &Value) -> Result<Value> {
        let (name, model_transformers, view_transformers) = {
            let state = self.state.borrow();
            (
                state.config.name.clone(),
                state.config.model_transformers.clone(),
                state.config.view_transformers.clone(),
            )
        };
        let mut value = data.clone();
        for transformer in model_transformers.iter().chain(view_transformers.iter()) {
            value = transformer.transform(&value).map_err(|failure| FormHostError::Transformation {
                name: name.clone(),
                reason: failure.0,
            })?;
        }
        Ok(value)
    }

    fn reverse_transform(&self, submitted: &Value) -> Result<Value, TransformationFailure> {
        let (kind, model_transformers, view_transformers) = {
            let state = self.state.borrow();
            (
                state.config.kind,
                state.config.model_transformers.clone(),
                state.config.view_transformers.clone(),
            )
        };
        if choice::is_empty_submission(submitted) && kind != FieldKind::Checkbox {
            return Ok(kind.empty_data());
        }
        let mut value = submitted.clone();
        for transformer in view_transformers.iter().rev().chain(model_transformers.iter().rev()) {
            value = transformer.reverse_transform(&value)?;
        }
        Ok(value)
    }

    fn submit_compound(&self, submitted: &Value) -> Result<Value> {
        let payload = submitted.as_object().cloned().unwrap_or_default();
        self.walk_children(|child| {
            let value = payload.get(&child.name()).cloned().unwrap_or(Value::Null);
            child.submit(value)
        })?;

        let mut data = match self.data() {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        };
        for child in self.children() {
            if child.mapped() {
                data.insert(child.name(), child.data());
            }
        }
        Ok(Value::Object(data))
    }
}

impl FormHandle for Form {
    fn name(&self) -> String {
        self.state.borrow().config.name.clone()
    }

    fn data(&self) -> Value {
        self.state.borrow().model_data.clone()
    }

    fn set_data(&self, data: Value) -> Result<()> {
        {
            let state = self.state.borrow();
            if state.submitted {
                return Err(FormHostError::AlreadySubmitted {
                    name: state.config.name.clone(),
                }
                .into());
            }
            if state.lock_set_data {
                return Err(FormHostError::SetDataLocked {
                    name: state.config.name.clone(),
                }
                .into());
            }
        }

        self.state.borrow_mut().lock_set_data = true;
        let dispatched = self.dispatch(FormEventKind::PreSetData, data);
        self.state.borrow_mut().lock_set_data = false;
        let data = dispatched?;

        let view_data = self.transform_to_view(&data)?;
        let compound = {
            let mut state = self.state.borrow_mut();
            state.model_data = data.clone();
            state.view_data = view_data;
            state.default_data_set = true;
            state.config.kind.is_compound()
        };

        if compound {
            self.walk_children(|child| {
                let value = self.child_data(&child);
                child.set_data(value)
            })?;
        }

        self.dispatch(FormEventKind::PostSetData, data)?;
        Ok(())
    }

    fn submit(&self, submitted: Value) -> Result<()> {
        let (name, disabled, compound) = {
            let state = self.state.borrow();
            if state.submitted {
                return Err(FormHostError::AlreadySubmitted {
                    name: state.config.name.clone(),
                }
                .into());
            }
            (state.config.name.clone(), state.config.disabled, state.config.kind.is_compound())
        };

        if disabled {
            self.state.borrow_mut().submitted = true;
            return Ok(());
        }

        let submitted = self.dispatch(FormEventKind::PreSubmit, submitted)?;

        let (model_data, view_data, failure) = if compound {
            let model_data = self.submit_compound(&submitted)?;
            (model_data.clone(), model_data, None)
        } else {
            match self.reverse_transform(&submitted) {
                Ok(model_data) => (model_data, submitted, None),
                Err(failure) => {
                    trace!(field = %name, reason = %failure, "submitted value could not be transformed");
                    (Value::Null, submitted, Some(failure))
                }
            }
        };

        let model_data = self.dispatch(FormEventKind::Submit, model_data)?;
        {
            let mut state = self.state.borrow_mut();
            state.model_data = model_data.clone();
            state.view_data = view_data;
            state.transformation_failure = failure;
            state.submitted = true;
        }

        self.dispatch(FormEventKind::PostSubmit, model_data)?;
        Ok(())
    }

    fn is_submitted(&self) -> bool {
        self.state.borrow().submitted
    }

    fn add(&self, child: Form) -> Result<()> {
        let (name, initialize) = {
            let state = self.state.borrow();
            if !state.config.kind.is_compound() {
                return Err(FormHostError::NotCompound {
                    name: state.config.name.clone(),
                }
                .into());
            }
            if state.submitted {
                return Err(FormHostError::AlreadySubmitted {
                    name: state.config.name.clone(),
                }
                .into());
            }
            (state.config.name.clone(), !state.lock_set_data && state.default_data_set)
        };

        let child_name = child.name();
        child.state.borrow_mut().parent = Some(Rc::downgrade(&self.state));
        self.state.borrow_mut().children.insert(child_name.clone(), child.clone());
        trace!(form = %name, child = %child_name, initialize, "child attached");

        if initialize {
            let value = self.child_data(&child);
            child.set_data(value)?;
        }
        Ok(())
    }

    fn remove(&self, name: &str) {
        let removed = self.state.borrow_mut().children.shift_remove(name);
        if let Some(child) = removed {
            child.state.borrow_mut().parent = None;
            trace!(form = %self.name(), child = %name, "child detached");
        }
    }

    fn has(&self, name: &str) -> bool {
        self.state.borrow().children.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Form> {
        self.state.borrow().children.get(name).cloned()
    }

    fn children(&self) -> Vec<Form> {
        self.state.borrow().children.values().cloned().collect()
    }

    fn transformation_failure(&self) -> Option<TransformationFailure> {
        self.state.borrow().transformation_failure.clone()
    }

    fn supports_clearing_errors(&self) -> bool {
        self.state.borrow().config.clearable_errors
    }

    fn clear_errors(&self) {
        if self.supports_clearing_errors() {
            self.state.borrow_mut().errors.clear();
        }
    }

    fn add_error(&self, error: FormError) {
        let (bubble, name) = {
            let state = self.state.borrow();
            (state.config.error_bubbling, state.config.name.clone())
        };
        if bubble && let Some(parent) = self.parent() {
            let error = if error.origin.is_none() { error.with_origin(name) } else { error };
            parent.add_error(error);
            return;
        }
        self.state.borrow_mut().errors.push(error);
    }

    fn errors(&self) -> Vec<FormError> {
        self.state.borrow().errors.clone()
    }

    fn is_valid(&self) -> bool {
        if !self.is_submitted() {
            return false;
        }
        if self.disabled() {
            return true;
        }
        self.collect_errors(true).is_empty()
    }
}

/// Snapshot of a form tree for display or inspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: Value,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceEntry>>,
    pub required: bool,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FormError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FormView>,
}

impl FormView {
    /// Finds a direct child view by name.
    pub fn child(&self, name: &str) -> Option<&FormView> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Values of the choice domain, when this is a choice field.
    pub fn choice_values(&self) -> Vec<Value> {
        self.choices
            .as_ref()
            .map(|entries| entries.iter().map(|entry| entry.value.clone()).collect())
            .unwrap_or_default()
    }
}
