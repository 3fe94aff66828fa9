//! Builders declare fields and listeners and produce live [`Form`]s.
//!
//! A builder and every form built from it share one [`EventDispatcher`], so
//! listeners registered on a child builder after the form was built still
//! observe that child form. Replacing a child through [`FormBuilder::add`]
//! creates a brand new child builder with an empty listener table.

use std::{cell::RefCell, fmt, rc::Rc};

use anyhow::Result;
use dynaform_types::{DataTransformer, FieldOptions, FormBuilderHandle, FormEventKind, FormHandle, Listener};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use crate::{dispatcher::EventDispatcher, field_type::FieldKind, form::Form, validation::validation_listener};

/// Priority of the host validation listener on root `PostSubmit`.
pub const VALIDATION_LISTENER_PRIORITY: i32 = 0;

/// Frozen configuration handed to a form when it is built.
#[derive(Clone)]
pub(crate) struct FormConfig {
    pub name: String,
    pub kind: FieldKind,
    pub options: FieldOptions,
    pub data: Value,
    pub required: bool,
    pub disabled: bool,
    pub mapped: bool,
    pub error_bubbling: bool,
    pub clearable_errors: bool,
    pub view_transformers: Vec<Rc<dyn DataTransformer>>,
    pub model_transformers: Vec<Rc<dyn DataTransformer>>,
    pub dispatcher: Rc<RefCell<EventDispatcher<Form>>>,
}

struct BuilderState {
    config: FormConfig,
    attributes: FieldOptions,
    auto_initialize: bool,
    children: IndexMap<String, FormBuilder>,
}

/// Shared handle to a field declaration.
#[derive(Clone)]
pub struct FormBuilder {
    state: Rc<RefCell<BuilderState>>,
}

impl fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FormBuilder")
            .field("name", &state.config.name)
            .field("type", &state.config.kind.as_str())
            .field("children", &state.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FormBuilder {
    /// Creates a compound root builder holding `data` as its initial data.
    pub fn root(name: impl Into<String>, data: Value) -> Self {
        let builder = Self::from_kind(name.into(), FieldKind::Compound, FieldOptions::new());
        builder.set_data(data);
        builder
    }

    /// Creates a standalone builder for `field_type` with `options`.
    pub fn new(name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<Self> {
        let kind = FieldKind::resolve(field_type)?;
        Ok(Self::from_kind(name.to_string(), kind, options))
    }

    fn from_kind(name: String, kind: FieldKind, options: FieldOptions) -> Self {
        let bool_option = |key: &str, default: bool| options.get(key).and_then(Value::as_bool).unwrap_or(default);
        let config = FormConfig {
            required: bool_option("required", true),
            disabled: bool_option("disabled", false),
            mapped: bool_option("mapped", true),
            error_bubbling: bool_option("error_bubbling", kind.default_error_bubbling()),
            clearable_errors: bool_option("clearable_errors", true),
            data: options.get("data").cloned().unwrap_or(Value::Null),
            view_transformers: kind.default_view_transformers(&options),
            model_transformers: Vec::new(),
            dispatcher: Rc::new(RefCell::new(EventDispatcher::default())),
            name,
            kind,
            options,
        };

        let builder = Self {
            state: Rc::new(RefCell::new(BuilderState {
                config,
                attributes: FieldOptions::new(),
                auto_initialize: true,
                children: IndexMap::new(),
            })),
        };
        if kind.is_compound() {
            builder.add_event_listener(FormEventKind::PostSubmit, validation_listener(), VALIDATION_LISTENER_PRIORITY);
        }
        builder
    }

    pub fn kind(&self) -> FieldKind {
        self.state.borrow().config.kind
    }

    fn build(&self) -> Result<Form> {
        let (config, children) = {
            let state = self.state.borrow();
            (state.config.clone(), state.children.values().cloned().collect::<Vec<_>>())
        };
        let form = Form::from_config(config);
        for child in children {
            child.set_auto_initialize(false);
            form.add(child.get_form()?)?;
        }
        Ok(form)
    }
}

impl FormBuilderHandle for FormBuilder {
    type Form = Form;
    type Child = FormBuilder;

    fn name(&self) -> String {
        self.state.borrow().config.name.clone()
    }

    fn add(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<()> {
        let child = self.create(name, field_type, options)?;
        trace!(parent = %self.name(), field = %name, field_type = %child.kind(), "builder child declared");
        self.state.borrow_mut().children.insert(name.to_string(), child);
        Ok(())
    }

    fn create(&self, name: &str, field_type: Option<&str>, options: FieldOptions) -> Result<FormBuilder> {
        FormBuilder::new(name, field_type, options)
    }

    fn remove(&self, name: &str) {
        self.state.borrow_mut().children.shift_remove(name);
    }

    fn has(&self, name: &str) -> bool {
        self.state.borrow().children.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<FormBuilder> {
        self.state.borrow().children.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.state.borrow().children.keys().cloned().collect()
    }

    fn add_event_listener(&self, event: FormEventKind, listener: Listener<Form>, priority: i32) {
        let dispatcher = self.state.borrow().config.dispatcher.clone();
        dispatcher.borrow_mut().add_listener(event, listener, priority);
    }

    fn listener_count(&self, event: FormEventKind) -> usize {
        let dispatcher = self.state.borrow().config.dispatcher.clone();
        let count = dispatcher.borrow().listener_count(event);
        count
    }

    fn get_form(&self) -> Result<Form> {
        let form = self.build()?;
        if self.auto_initialize() {
            form.initialize()?;
        }
        Ok(form)
    }

    fn field_type(&self) -> String {
        self.kind().as_str().to_string()
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.state.borrow().attributes.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: Value) {
        self.state.borrow_mut().attributes.insert(name.to_string(), value);
    }

    fn attributes(&self) -> FieldOptions {
        self.state.borrow().attributes.clone()
    }

    fn option(&self, name: &str) -> Option<Value> {
        self.state.borrow().config.options.get(name).cloned()
    }

    fn has_option(&self, name: &str) -> bool {
        self.state.borrow().config.options.contains_key(name)
    }

    fn options(&self) -> FieldOptions {
        self.state.borrow().config.options.clone()
    }

    fn data(&self) -> Value {
        self.state.borrow().config.data.clone()
    }

    fn set_data(&self, data: Value) {
        self.state.borrow_mut().config.data = data;
    }

    fn required(&self) -> bool {
        self.state.borrow().config.required
    }

    fn set_required(&self, required: bool) {
        self.state.borrow_mut().config.required = required;
    }

    fn disabled(&self) -> bool {
        self.state.borrow().config.disabled
    }

    fn set_disabled(&self, disabled: bool) {
        self.state.borrow_mut().config.disabled = disabled;
    }

    fn mapped(&self) -> bool {
        self.state.borrow().config.mapped
    }

    fn set_mapped(&self, mapped: bool) {
        self.state.borrow_mut().config.mapped = mapped;
    }

    fn error_bubbling(&self) -> bool {
        self.state.borrow().config.error_bubbling
    }

    fn set_error_bubbling(&self, error_bubbling: bool) {
        self.state.borrow_mut().config.error_bubbling = error_bubbling;
    }

    fn auto_initialize(&self) -> bool {
        self.state.borrow().auto_initialize
    }

    fn set_auto_initialize(&self, auto_initialize: bool) {
        self.state.borrow_mut().auto_initialize = auto_initialize;
    }

    fn add_view_transformer(&self, transformer: Rc<dyn DataTransformer>, force_prepend: bool) {
        let mut state = self.state.borrow_mut();
        let transformers = &mut state.config.view_transformers;
        if force_prepend {
            transformers.insert(0, transformer);
        } else {
            transformers.push(transformer);
        }
    }

    fn reset_view_transformers(&self) {
        self.state.borrow_mut().config.view_transformers.clear();
    }

    fn add_model_transformer(&self, transformer: Rc<dyn DataTransformer>, force_append: bool) {
        let mut state = self.state.borrow_mut();
        let transformers = &mut state.config.model_transformers;
        if force_append {
            transformers.push(transformer);
        } else {
            transformers.insert(0, transformer);
        }
    }

    fn reset_model_transformers(&self) {
        self.state.borrow_mut().config.model_transformers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynaform_types::FormEvent;
    use indexmap::indexmap;
    use serde_json::json;

    #[test]
    fn replacing_a_child_starts_with_an_empty_listener_table() {
        let root = FormBuilder::root("order", Value::Null);
        root.add("country", Some("text"), FieldOptions::new()).expect("add country");
        let country = root.get("country").expect("country builder");
        country.add_event_listener(FormEventKind::PreSetData, Rc::new(|_: &mut FormEvent<Form>| Ok(())), 0);
        assert_eq!(country.listener_count(FormEventKind::PreSetData), 1);

        root.add("country", Some("choice"), indexmap! {"choices".into() => json!(["US"])})
            .expect("replace country");
        let replaced = root.get("country").expect("replaced builder");
        assert_eq!(replaced.field_type(), "choice");
        assert_eq!(replaced.listener_count(FormEventKind::PreSetData), 0);
        assert_eq!(root.names(), vec!["country".to_string()]);
    }

    #[test]
    fn options_configure_flags() {
        let builder = FormBuilder::new(
            "flag",
            Some("checkbox"),
            indexmap! {"mapped".into() => json!(false), "required".into() => json!(false)},
        )
        .expect("checkbox builder");

        assert!(!builder.mapped());
        assert!(!builder.required());
        assert!(builder.error_bubbling());
        assert!(builder.has_option("mapped"));
        assert!(!builder.has_option("choices"));
    }

    #[test]
    fn unknown_types_are_rejected() {
        let root = FormBuilder::root("order", Value::Null);
        let error = root.add("color", Some("slider"), FieldOptions::new()).expect_err("unknown type");
        assert!(error.to_string().contains("slider"));
        assert!(!root.has("color"));
    }

    #[test]
    fn get_form_initializes_root_with_builder_data() {
        let root = FormBuilder::root("order", json!({"country": "US"}));
        root.add("country", None, FieldOptions::new()).expect("add country");

        let form = root.get_form().expect("build form");
        assert_eq!(form.get("country").expect("country").data(), json!("US"));
        assert_eq!(root.count(), 1);
    }
}
