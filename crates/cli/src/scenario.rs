//! Scripted submissions replayed against the meal planner.
//!
//! Every step is an independent request: a new form is built from the same
//! initial data and receives one submitted payload, as a browser posting the
//! whole form would.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use dynaform_form::FormView;
use dynaform_types::{DynamicFormSettings, FormHandle};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::meal_planner;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "meal_planner::default_data")]
    pub initial: Value,
    #[serde(default)]
    pub submissions: Vec<Value>,
}

/// Outcome of one replayed submission.
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub valid: bool,
    pub form: FormView,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn replay(&self, settings: &DynamicFormSettings) -> Result<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(self.submissions.len());
        for (index, payload) in self.submissions.iter().enumerate() {
            let step = index + 1;
            let form = meal_planner::build(self.initial.clone(), settings)
                .with_context(|| format!("building form for step {step}"))?;
            form.submit(payload.clone())
                .with_context(|| format!("submitting step {step}"))?;

            let valid = form.is_valid();
            info!(step, valid, "replayed submission");
            reports.push(StepReport {
                step,
                valid,
                form: form.view(),
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use dynaform_types::settings::{DEFAULT_ERROR_FIELD_NAME, DEFAULT_ERROR_MESSAGE};
    use serde_json::json;

    use super::*;

    fn replay(initial: Value, submissions: Vec<Value>) -> Vec<StepReport> {
        Scenario { initial, submissions }
            .replay(&DynamicFormSettings::default())
            .expect("replay scenario")
    }

    fn food_choices(view: &FormView) -> Vec<Value> {
        view.child("mainFood").expect("mainFood view").choice_values()
    }

    #[test]
    fn parses_yaml_scenarios() {
        let scenario = Scenario::from_yaml(
            r#"
initial:
  meal: dinner
submissions:
  - meal: dinner
    mainFood: pizza
    pizzaSize: 14
"#,
        )
        .expect("parse scenario");

        assert_eq!(scenario.initial, json!({"meal": "dinner"}));
        assert_eq!(scenario.submissions[0]["pizzaSize"], json!(14));
        assert_eq!(Scenario::from_yaml("{}").expect("empty scenario").initial, meal_planner::default_data());
    }

    #[test]
    fn reads_scenarios_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dinner.yaml");
        fs::write(&path, "submissions:\n  - meal: dinner\n").expect("write scenario");

        let scenario = Scenario::from_path(&path).expect("load scenario");
        assert_eq!(scenario.submissions, vec![json!({"meal": "dinner"})]);

        let error = Scenario::from_path(&dir.path().join("absent.yaml")).expect_err("missing file");
        assert!(format!("{error:#}").contains("absent.yaml"));
    }

    #[test]
    fn reshaping_the_meal_keeps_the_form_consistent() {
        let reports = replay(
            meal_planner::default_data(),
            vec![
                json!({"meal": "dinner", "mainFood": ""}),
                json!({"meal": "dinner", "mainFood": "pizza"}),
                json!({"meal": "dinner", "mainFood": "pizza", "pizzaSize": "14"}),
                json!({"meal": "breakfast", "mainFood": "pizza", "pizzaSize": "14"}),
                json!({"meal": "breakfast", "mainFood": "bacon"}),
                json!({"meal": "lunch", "mainFood": "bacon"}),
            ],
        );
        let validity: Vec<bool> = reports.iter().map(|report| report.valid).collect();
        assert_eq!(validity, vec![true, true, true, false, true, false]);

        // dinner offers pizza but no size until pizza is chosen
        assert!(food_choices(&reports[0].form).contains(&json!("pizza")));
        assert!(!food_choices(&reports[0].form).contains(&json!("bacon")));
        assert!(reports[0].form.child("pizzaSize").is_none());

        let size = reports[1].form.child("pizzaSize").expect("pizzaSize after choosing pizza");
        assert_eq!(size.placeholder.as_deref(), Some("What size pizza?"));
        assert_eq!(reports[2].form.child("pizzaSize").expect("pizzaSize").data, json!(14));

        // pizza is stale for breakfast: the marker carries the error instead of mainFood
        let stale = &reports[3].form;
        assert!(stale.child("pizzaSize").is_none());
        assert!(food_choices(stale).contains(&json!("bacon")));
        assert!(stale.child("mainFood").expect("mainFood").errors.is_empty());
        let marker = stale.child(DEFAULT_ERROR_FIELD_NAME).expect("tracking field");
        assert_eq!(marker.errors[0].message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn preselected_pizza_is_removed_with_its_size() {
        let reports = replay(
            json!({"meal": "dinner", "mainFood": "pizza"}),
            vec![
                json!({"meal": "breakfast", "mainFood": "pizza", "pizzaSize": "14"}),
                json!({"meal": "breakfast", "mainFood": "bacon"}),
                json!({"meal": "lunch", "mainFood": "bacon"}),
            ],
        );

        assert!(!reports[0].valid);
        assert!(reports[0].form.child("pizzaSize").is_none());
        assert!(!food_choices(&reports[0].form).contains(&json!("pizza")));
        assert!(reports[1].valid);
        assert!(!reports[2].valid);
    }

    #[test]
    fn unmapped_checkbox_shapes_the_size_field() {
        let reports = replay(
            json!({"meal": "dinner"}),
            vec![json!({"meal": "dinner", "mainFood": "pizza", "upperCasePizzaSizes": "1"})],
        );

        let size = reports[0].form.child("pizzaSize").expect("pizzaSize");
        assert_eq!(size.placeholder.as_deref(), Some("WHAT SIZE PIZZA?"));
        assert!(reports[0].form.data.get("upperCasePizzaSizes").is_none());
    }
}
