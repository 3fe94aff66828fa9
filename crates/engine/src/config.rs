//! Per-field dependency descriptor with readiness and firing logic.

use std::{cell::Cell, fmt, rc::Rc};

use dynaform_types::{FieldValues, FormEventKind, Phase};
use serde_json::Value;

use crate::{dependent_field::DependentField, error::DynamicFormError};

/// User callback deciding whether (and how) a dependent field exists.
///
/// Receives the field to configure plus the dependency values, positionally
/// in declaration order.
pub type DependentCallback = Rc<dyn Fn(&mut DependentField, &[Value]) -> anyhow::Result<()>>;

/// Ordered dependency names; converts from a single name or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies(pub Vec<String>);

impl From<&str> for Dependencies {
    fn from(name: &str) -> Self {
        Dependencies(vec![name.to_string()])
    }
}

impl From<String> for Dependencies {
    fn from(name: String) -> Self {
        Dependencies(vec![name])
    }
}

impl From<Vec<String>> for Dependencies {
    fn from(names: Vec<String>) -> Self {
        Dependencies(names)
    }
}

impl From<Vec<&str>> for Dependencies {
    fn from(names: Vec<&str>) -> Self {
        Dependencies(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Dependencies {
    fn from(names: &[&str]) -> Self {
        Dependencies(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Dependencies {
    fn from(names: [&str; N]) -> Self {
        Dependencies(names.iter().map(|name| name.to_string()).collect())
    }
}

/// Holds the configuration of one dependent field and which phases already
/// executed its callback.
///
/// Fired flags only move forward within a lifecycle; [`reset`](Self::reset)
/// starts a new one.
pub struct DependentFieldConfig {
    name: String,
    dependencies: Vec<String>,
    callback: DependentCallback,
    fired: Cell<[bool; 2]>,
}

impl fmt::Debug for DependentFieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentFieldConfig")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("fired", &self.fired.get())
            .finish()
    }
}

impl DependentFieldConfig {
    pub fn new<C>(name: impl Into<String>, dependencies: impl Into<Dependencies>, callback: C) -> Self
    where
        C: Fn(&mut DependentField, &[Value]) -> anyhow::Result<()> + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into().0,
            callback: Rc::new(callback),
            fired: Cell::new([false; 2]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn has_fired(&self, phase: Phase) -> bool {
        self.fired.get()[phase.index()]
    }

    /// Clears both fired flags for a new form lifecycle.
    pub fn reset(&self) {
        self.fired.set([false; 2]);
    }

    /// True when every dependency is a key of `available` (null values count)
    /// and the callback has not run yet for the phase opened by `event`.
    pub fn is_ready(&self, available: &FieldValues, event: FormEventKind) -> Result<bool, DynamicFormError> {
        let phase = Phase::try_from(event)?;
        if self.has_fired(phase) {
            return Ok(false);
        }

        Ok(self
            .dependencies
            .iter()
            .all(|dependency| available.contains_key(dependency)))
    }

    /// Runs the callback with the dependency values and returns what it requested.
    ///
    /// The phase is marked as fired before the callback runs, so anything the
    /// callback triggers re-entrantly sees this config as done.
    pub fn execute(&self, available: &FieldValues, event: FormEventKind) -> Result<DependentField, DynamicFormError> {
        let phase = Phase::try_from(event)?;
        let mut fired = self.fired.get();
        fired[phase.index()] = true;
        self.fired.set(fired);

        let arguments: Vec<Value> = self
            .dependencies
            .iter()
            .map(|dependency| available.get(dependency).cloned().unwrap_or(Value::Null))
            .collect();

        let mut field = DependentField::new();
        (self.callback)(&mut field, &arguments).map_err(|source| DynamicFormError::Callback {
            field: self.name.clone(),
            source,
        })?;

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use indexmap::indexmap;
    use serde_json::json;

    fn noop(_: &mut DependentField, _: &[Value]) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn is_ready_returns_correctly_based_on_dependencies() {
        let config = DependentFieldConfig::new("state", "country", noop);

        assert!(!config.is_ready(&FieldValues::new(), FormEventKind::PreSetData).expect("initial"));
        let country = indexmap! {"country".to_string() => json!("United States")};
        assert!(config.is_ready(&country, FormEventKind::PreSetData).expect("initial"));
        assert!(config.is_ready(&country, FormEventKind::PostSubmit).expect("submitted"));

        let with_extra = indexmap! {
            "country".to_string() => json!("United States"),
            "extra".to_string() => json!("field"),
        };
        assert!(config.is_ready(&with_extra, FormEventKind::PostSubmit).expect("submitted"));
    }

    #[test]
    fn null_values_count_as_available() {
        let config = DependentFieldConfig::new("state", ["country", "flag"], noop);
        let values = indexmap! {
            "country".to_string() => Value::Null,
            "flag".to_string() => json!(false),
        };
        assert!(config.is_ready(&values, FormEventKind::PreSetData).expect("initial"));
    }

    #[test]
    fn is_ready_returns_false_once_executed_for_the_phase() {
        let config = DependentFieldConfig::new("state", "country", noop);
        let country = indexmap! {"country".to_string() => json!("United States")};

        assert!(config.is_ready(&country, FormEventKind::PreSetData).expect("initial"));
        config.execute(&country, FormEventKind::PreSetData).expect("execute");
        assert!(!config.is_ready(&country, FormEventKind::PreSetData).expect("initial"));
        assert!(config.is_ready(&country, FormEventKind::PostSubmit).expect("submitted"));
        assert!(config.has_fired(Phase::Initial));
        assert!(!config.has_fired(Phase::Submitted));

        config.reset();
        assert!(config.is_ready(&country, FormEventKind::PreSetData).expect("after reset"));
    }

    #[test]
    fn unsupported_events_fail_immediately() {
        let config = DependentFieldConfig::new("state", "country", noop);
        for event in [FormEventKind::PostSetData, FormEventKind::PreSubmit, FormEventKind::Submit] {
            let error = config.is_ready(&FieldValues::new(), event).expect_err("not a phase");
            assert!(matches!(error, DynamicFormError::UnsupportedEvent(_)));
            assert!(config.execute(&FieldValues::new(), event).is_err());
        }
        assert!(!config.has_fired(Phase::Initial));
    }

    #[test]
    fn execute_passes_values_in_declared_order() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let config = DependentFieldConfig::new("state", ["country", "flag"], move |field, values| {
            assert!(!field.is_requested());
            sink.borrow_mut().extend_from_slice(values);
            Ok(())
        });

        let values = indexmap! {
            "flag".to_string() => json!(true),
            "country".to_string() => json!("US"),
        };
        let field = config.execute(&values, FormEventKind::PreSetData).expect("execute");

        assert!(!field.is_requested());
        assert_eq!(*received.borrow(), vec![json!("US"), json!(true)]);
    }

    #[test]
    fn phase_is_marked_before_the_callback_runs() {
        let observed = Rc::new(Cell::new(None));
        let config = Rc::new_cyclic(|weak: &std::rc::Weak<DependentFieldConfig>| {
            let weak = weak.clone();
            let observed = observed.clone();
            DependentFieldConfig::new("state", "country", move |_, _| {
                let config = weak.upgrade().expect("config alive");
                observed.set(Some(config.has_fired(Phase::Initial)));
                Ok(())
            })
        });

        config
            .execute(&indexmap! {"country".to_string() => json!("US")}, FormEventKind::PreSetData)
            .expect("execute");
        assert_eq!(observed.get(), Some(true));
    }

    #[test]
    fn callback_failures_propagate_with_field_name() {
        let config = DependentFieldConfig::new("state", "country", |_, _| anyhow::bail!("no states for this country"));
        let error = config
            .execute(&indexmap! {"country".to_string() => json!("XX")}, FormEventKind::PostSubmit)
            .expect_err("callback fails");

        assert!(matches!(&error, DynamicFormError::Callback { field, .. } if field == "state"));
        assert_eq!(
            std::error::Error::source(&error).map(ToString::to_string).as_deref(),
            Some("no states for this country")
        );
        assert!(config.has_fired(Phase::Submitted));
    }
}
