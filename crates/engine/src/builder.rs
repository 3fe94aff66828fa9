//! Wraps a host form builder and adds [`DynamicFormBuilder::add_dependent`].
//!
//! The wrapper listens on three root events and on every field named as a
//! dependency:
//!
//! - root `PreSetData` (high priority): captures the live form, starts a new
//!   lifecycle, ensures the hidden tracking field, wires dependency listeners
//! - root `PreSubmit`: clears the submitted snapshot
//! - root `PostSubmit` (after host validation): masks transformation errors of
//!   dependent fields behind the tracking field
//! - dependency `PreSetData` / `PostSubmit`: records the value and runs every
//!   ready callback for that phase
//!
//! Adding a materialized field initializes it on the live form, which fires
//! its own listeners before the call returns. Chains of dependent fields
//! therefore resolve depth first, in declaration order.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::{Rc, Weak},
};

use anyhow::Result;
use dynaform_types::{
    DataTransformer, DynamicFormSettings, FieldOptions, FieldValues, FormBuilderHandle, FormError, FormEvent, FormEventKind,
    FormHandle, Listener, Phase,
};
use indexmap::{IndexSet, indexmap};
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    config::{Dependencies, DependentFieldConfig},
    dependent_field::{DependentField, Materialization},
    error::DynamicFormError,
};

type Handler<B> = fn(&DynamicCore<B>, &mut FormEvent<<B as FormBuilderHandle>::Form>) -> Result<()>;

struct DynamicCore<B: FormBuilderHandle> {
    builder: B,
    settings: DynamicFormSettings,
    this: Weak<DynamicCore<B>>,
    configs: RefCell<Vec<Rc<DependentFieldConfig>>>,
    form: RefCell<Option<B::Form>>,
    dependency_values: RefCell<[FieldValues; 2]>,
    listeners_registered: RefCell<HashSet<String>>,
    materialized: RefCell<IndexSet<String>>,
    masked_fields: RefCell<Vec<String>>,
}

/// Drop-in replacement for a host builder that understands dependent fields.
pub struct DynamicFormBuilder<B: FormBuilderHandle + 'static> {
    core: Rc<DynamicCore<B>>,
}

impl<B: FormBuilderHandle + 'static> Clone for DynamicFormBuilder<B> {
    fn clone(&self) -> Self {
        Self { core: self.core.clone() }
    }
}

impl<B: FormBuilderHandle + 'static> DynamicFormBuilder<B> {
    pub fn new(builder: B) -> Self {
        Self::with_settings(builder, DynamicFormSettings::default())
    }

    pub fn with_settings(builder: B, settings: DynamicFormSettings) -> Self {
        let core = Rc::new_cyclic(|this| DynamicCore {
            builder,
            settings,
            this: this.clone(),
            configs: RefCell::new(Vec::new()),
            form: RefCell::new(None),
            dependency_values: RefCell::new([FieldValues::new(), FieldValues::new()]),
            listeners_registered: RefCell::new(HashSet::new()),
            materialized: RefCell::new(IndexSet::new()),
            masked_fields: RefCell::new(Vec::new()),
        });

        core.builder.add_event_listener(
            FormEventKind::PreSetData,
            core.listener(DynamicCore::start_lifecycle),
            core.settings.initial_listener_priority,
        );
        core.builder
            .add_event_listener(FormEventKind::PreSubmit, core.listener(DynamicCore::start_submission), 0);
        // must run after the host's own validation listener
        core.builder.add_event_listener(
            FormEventKind::PostSubmit,
            core.listener(DynamicCore::clear_data_on_transformation_error),
            core.settings.cleanup_listener_priority,
        );

        Self { core }
    }

    /// Declares a field whose presence, type, and options are computed by
    /// `callback` from the values of `dependencies`.
    ///
    /// Dependencies may name fields that do not exist yet; such a config stays
    /// inert until they do.
    pub fn add_dependent<C>(&self, name: &str, dependencies: impl Into<Dependencies>, callback: C) -> &Self
    where
        C: Fn(&mut DependentField, &[Value]) -> anyhow::Result<()> + 'static,
    {
        let config = DependentFieldConfig::new(name, dependencies, callback);
        trace!(field = %name, dependencies = ?config.dependencies(), "dependent field declared");
        self.core.configs.borrow_mut().push(Rc::new(config));
        self
    }

    /// The wrapped host builder.
    pub fn inner(&self) -> &B {
        &self.core.builder
    }

    pub fn settings(&self) -> &DynamicFormSettings {
        &self.core.settings
    }

    /// Names of declared dependent fields, in declaration order.
    pub fn dependent_names(&self) -> Vec<String> {
        self.core
            .configs
            .borrow()
            .iter()
            .map(|config| config.name().to_string())
            .collect()
    }

    /// Live form captured at the start of the current lifecycle.
    pub fn form(&self) -> Option<B::Form> {
        self.core.form.borrow().clone()
    }

    /// Dependency values recorded so far in `phase`.
    pub fn dependency_values(&self, phase: Phase) -> FieldValues {
        self.core.dependency_values.borrow()[phase.index()].clone()
    }

    /// Dependent fields whose errors were replaced by the synthetic marker
    /// during the last submission.
    pub fn masked_fields(&self) -> Vec<String> {
        self.core.masked_fields.borrow().clone()
    }

    /// Wires dependency listeners, optionally only for the named fields.
    pub fn initialize_listeners(&self, only: Option<&[&str]>) {
        self.core.initialize_listeners(only);
    }

    pub fn store_pre_set_data_dependency_data(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        self.core.store_pre_set_data_dependency_data(event)
    }

    pub fn store_post_submit_dependency_data(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        self.core.store_post_submit_dependency_data(event)
    }

    pub fn clear_data_on_transformation_error(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        self.core.clear_data_on_transformation_error(event)
    }
}

impl<B: FormBuilderHandle + 'static> DynamicCore<B> {
    fn listener(&self, handler: Handler<B>) -> Listener<B::Form> {
        let this = self.this.clone();
        Rc::new(move |event: &mut FormEvent<B::Form>| match this.upgrade() {
            Some(core) => handler(&core, event),
            None => Ok(()),
        })
    }

    fn start_lifecycle(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        let form = event.form().clone();
        *self.form.borrow_mut() = Some(form.clone());
        *self.dependency_values.borrow_mut() = [FieldValues::new(), FieldValues::new()];
        for config in self.configs.borrow().iter() {
            config.reset();
        }
        // only fields this builder added itself; a static field may share a dependent's name
        let stale = std::mem::take(&mut *self.materialized.borrow_mut());
        for name in &stale {
            self.builder.remove(name);
            form.remove(name);
            self.listeners_registered.borrow_mut().remove(name);
        }
        self.masked_fields.borrow_mut().clear();
        debug!(form = %form.name(), dependents = self.configs.borrow().len(), "dynamic form lifecycle started");

        self.ensure_error_field(&form)?;
        self.initialize_listeners(None);
        Ok(())
    }

    fn start_submission(&self, _event: &mut FormEvent<B::Form>) -> Result<()> {
        self.dependency_values.borrow_mut()[Phase::Submitted.index()].clear();
        self.masked_fields.borrow_mut().clear();
        Ok(())
    }

    /// Adds the hidden, unmapped field that carries the synthetic error.
    fn ensure_error_field(&self, form: &B::Form) -> Result<()> {
        let name = &self.settings.error_field_name;
        if form.has(name) {
            return Ok(());
        }
        let options: FieldOptions = indexmap! {
            "mapped".to_string() => Value::Bool(false),
            "error_bubbling".to_string() => Value::Bool(false),
        };
        let field = self.builder.create(name, Some(self.settings.error_field_type.as_str()), options)?;
        field.set_auto_initialize(false);
        form.add(field.get_form()?)?;
        trace!(field = %name, "error tracking field added");
        Ok(())
    }

    fn store_pre_set_data_dependency_data(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        let dependency = event.form().name();
        let value = event.data().clone();
        self.record(Phase::Initial, dependency, value)
    }

    fn store_post_submit_dependency_data(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        let dependency = event.form().name();
        let value = event.form().data();
        self.record(Phase::Submitted, dependency, value)
    }

    fn record(&self, phase: Phase, dependency: String, value: Value) -> Result<()> {
        trace!(phase = %phase, dependency = %dependency, value = %value, "dependency value recorded");
        self.dependency_values.borrow_mut()[phase.index()].insert(dependency, value);
        self.execute_ready_callbacks(phase)
    }

    /// Runs every ready callback of `phase` against the snapshot taken on entry.
    fn execute_ready_callbacks(&self, phase: Phase) -> Result<()> {
        let available = self.dependency_values.borrow()[phase.index()].clone();
        let event = phase.event();

        let mut index = 0;
        loop {
            let config = self.configs.borrow().get(index).cloned();
            let Some(config) = config else {
                return Ok(());
            };
            index += 1;

            if !config.is_ready(&available, event)? {
                continue;
            }

            let field = config.execute(&available, event)?;
            self.materialize(config.name(), phase, field.into_materialization())?;
        }
    }

    fn materialize(&self, name: &str, phase: Phase, materialization: Materialization) -> Result<()> {
        let form = self
            .form
            .borrow()
            .clone()
            .ok_or_else(|| DynamicFormError::FormNotInitialized { field: name.to_string() })?;

        let (field_type, options) = match materialization {
            Materialization::NotRequested => {
                debug!(field = %name, phase = %phase, present = form.has(name), "dependent field not requested");
                form.remove(name);
                return Ok(());
            }
            Materialization::Requested { field_type, options } => (field_type, options),
        };

        debug!(field = %name, phase = %phase, field_type = ?field_type, "dependent field materialized");
        self.builder.add(name, field_type.as_deref(), options)?;
        self.materialized.borrow_mut().insert(name.to_string());

        // the host replaced the child builder, so its listener table is empty again
        self.listeners_registered.borrow_mut().remove(name);
        self.initialize_listeners(Some(&[name]));

        let child = self
            .builder
            .get(name)
            .ok_or_else(|| DynamicFormError::MissingField { name: name.to_string() })?;
        child.set_auto_initialize(false);
        form.add(child.get_form()?)?;
        Ok(())
    }

    fn initialize_listeners(&self, only: Option<&[&str]>) {
        let configs = self.configs.borrow().clone();
        for config in configs {
            for dependency in config.dependencies() {
                if let Some(only) = only
                    && !only.contains(&dependency.as_str())
                {
                    continue;
                }

                // dependencies may not be part of the form yet
                let Some(field) = self.builder.get(dependency) else {
                    continue;
                };

                if !self.listeners_registered.borrow_mut().insert(dependency.clone()) {
                    continue;
                }

                trace!(dependency = %dependency, "dependency listeners registered");
                field.add_event_listener(
                    FormEventKind::PreSetData,
                    self.listener(DynamicCore::store_pre_set_data_dependency_data),
                    0,
                );
                field.add_event_listener(
                    FormEventKind::PostSubmit,
                    self.listener(DynamicCore::store_post_submit_dependency_data),
                    0,
                );
            }
        }
    }

    /// Replaces transformation errors on dependent fields with one error on the
    /// hidden tracking field, keeping the form invalid without a misleading
    /// message on the reconfigured field.
    fn clear_data_on_transformation_error(&self, event: &mut FormEvent<B::Form>) -> Result<()> {
        let form = event.form().clone();
        let configs = self.configs.borrow().clone();

        let mut cleared = IndexSet::new();
        for config in configs {
            let name = config.name();
            let Some(field) = form.get(name) else {
                continue;
            };
            if field.transformation_failure().is_some() && field.supports_clearing_errors() {
                field.clear_errors();
                cleared.insert(name.to_string());
            }
        }

        if !cleared.is_empty() {
            let marker_name = &self.settings.error_field_name;
            let marker = form
                .get(marker_name)
                .ok_or_else(|| DynamicFormError::MissingField { name: marker_name.clone() })?;
            if marker.is_valid() {
                marker.add_error(FormError::new(self.settings.error_message.clone()));
            }
            debug!(fields = ?cleared, "transformation errors masked by tracking field");
        }

        *self.masked_fields.borrow_mut() = cleared.into_iter().collect();
        Ok(())
    }
}

impl<B: FormBuilderHandle + 'static> FormBuilderHandle for DynamicFormBuilder<B> {
    type Form = B::Form;
    type Child = B::Child;

    fn name(&self) -> String {
        self.core.builder.name()
    }

    fn add(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<()> {
        self.core.builder.add(name, field_type, options)?;
        // a replaced child builder starts without the engine's listeners
        self.core.listeners_registered.borrow_mut().remove(name);
        self.core.materialized.borrow_mut().shift_remove(name);
        Ok(())
    }

    fn create(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<B::Child> {
        self.core.builder.create(name, field_type, options)
    }

    fn remove(&self, name: &str) {
        self.core.builder.remove(name);
        self.core.listeners_registered.borrow_mut().remove(name);
        self.core.materialized.borrow_mut().shift_remove(name);
    }

    fn has(&self, name: &str) -> bool {
        self.core.builder.has(name)
    }

    fn get(&self, name: &str) -> Option<B::Child> {
        self.core.builder.get(name)
    }

    fn names(&self) -> Vec<String> {
        self.core.builder.names()
    }

    fn count(&self) -> usize {
        self.core.builder.count()
    }

    fn add_event_listener(&self, event: FormEventKind, listener: Listener<B::Form>, priority: i32) {
        self.core.builder.add_event_listener(event, listener, priority)
    }

    fn listener_count(&self, event: FormEventKind) -> usize {
        self.core.builder.listener_count(event)
    }

    fn get_form(&self) -> Result<B::Form> {
        self.core.builder.get_form()
    }

    fn field_type(&self) -> String {
        self.core.builder.field_type()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.core.builder.attribute(name)
    }

    fn set_attribute(&self, name: &str, value: Value) {
        self.core.builder.set_attribute(name, value)
    }

    fn attributes(&self) -> FieldOptions {
        self.core.builder.attributes()
    }

    fn option(&self, name: &str) -> Option<Value> {
        self.core.builder.option(name)
    }

    fn has_option(&self, name: &str) -> bool {
        self.core.builder.has_option(name)
    }

    fn options(&self) -> FieldOptions {
        self.core.builder.options()
    }

    fn data(&self) -> Value {
        self.core.builder.data()
    }

    fn set_data(&self, data: Value) {
        self.core.builder.set_data(data)
    }

    fn required(&self) -> bool {
        self.core.builder.required()
    }

    fn set_required(&self, required: bool) {
        self.core.builder.set_required(required)
    }

    fn disabled(&self) -> bool {
        self.core.builder.disabled()
    }

    fn set_disabled(&self, disabled: bool) {
        self.core.builder.set_disabled(disabled)
    }

    fn mapped(&self) -> bool {
        self.core.builder.mapped()
    }

    fn set_mapped(&self, mapped: bool) {
        self.core.builder.set_mapped(mapped)
    }

    fn error_bubbling(&self) -> bool {
        self.core.builder.error_bubbling()
    }

    fn set_error_bubbling(&self, error_bubbling: bool) {
        self.core.builder.set_error_bubbling(error_bubbling)
    }

    fn auto_initialize(&self) -> bool {
        self.core.builder.auto_initialize()
    }

    fn set_auto_initialize(&self, auto_initialize: bool) {
        self.core.builder.set_auto_initialize(auto_initialize)
    }

    fn add_view_transformer(&self, transformer: Rc<dyn DataTransformer>, force_prepend: bool) {
        self.core.builder.add_view_transformer(transformer, force_prepend)
    }

    fn reset_view_transformers(&self) {
        self.core.builder.reset_view_transformers()
    }

    fn add_model_transformer(&self, transformer: Rc<dyn DataTransformer>, force_append: bool) {
        self.core.builder.add_model_transformer(transformer, force_append)
    }

    fn reset_model_transformers(&self) {
        self.core.builder.reset_model_transformers()
    }
}
