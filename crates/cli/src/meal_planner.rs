//! Built-in demo form: a meal planner whose food and pizza size fields depend
//! on earlier answers.

use anyhow::Result;
use dynaform_engine::DynamicFormBuilder;
use dynaform_form::{Form, FormBuilder};
use dynaform_types::{DynamicFormSettings, FieldOptions, FormBuilderHandle};
use indexmap::indexmap;
use serde_json::{Value, json};

pub const FORM_NAME: &str = "meal_planner";

const MEALS: &[(&str, &str)] = &[
    ("breakfast", "Breakfast"),
    ("second_breakfast", "Second Breakfast"),
    ("elevenses", "Elevenses"),
    ("lunch", "Lunch"),
    ("dinner", "Dinner"),
];

const PIZZA: &str = "pizza";
const PIZZA_SIZES: [u64; 3] = [12, 14, 16];
const PIZZA_PLACEHOLDER: &str = "What size pizza?";

fn meal_label(meal: &str) -> Option<&'static str> {
    MEALS.iter().find(|(value, _)| *value == meal).map(|(_, label)| *label)
}

fn foods_for(meal: &str) -> &'static [&'static str] {
    match meal {
        "breakfast" => &["eggs", "bacon", "strawberries", "croissant"],
        "second_breakfast" => &["bagel", "kiwi", "avocado", "waffles"],
        "elevenses" => &["pancakes", "strawberries", "tea"],
        "lunch" => &["sandwich", "cheese", "sushi"],
        "dinner" => &[PIZZA, "pint", "pasta"],
        _ => &[],
    }
}

/// Data the demo form starts with when none is given.
pub fn default_data() -> Value {
    json!({"meal": "breakfast"})
}

/// Declares the meal planner on a fresh root builder holding `initial`.
pub fn builder(initial: Value, settings: &DynamicFormSettings) -> Result<DynamicFormBuilder<FormBuilder>> {
    let builder = DynamicFormBuilder::with_settings(FormBuilder::root(FORM_NAME, initial), settings.clone());

    let meals: Vec<Value> = MEALS.iter().map(|(value, _)| json!(value)).collect();
    builder.add(
        "meal",
        Some("choice"),
        indexmap! {
            "choices".into() => Value::Array(meals),
            "placeholder".into() => json!("Which meal is it?"),
        },
    )?;
    builder.add("upperCasePizzaSizes", Some("checkbox"), indexmap! {"mapped".into() => json!(false)})?;

    builder
        .add_dependent("mainFood", "meal", |field, values| {
            let meal = values[0].as_str().and_then(|meal| meal_label(meal).map(|label| (meal, label)));
            let (choices, placeholder) = match meal {
                Some((meal, label)) => (foods_for(meal).to_vec(), format!("What is for {label}?")),
                None => (Vec::new(), "Select a meal first".to_string()),
            };
            field.request(
                "choice",
                indexmap! {
                    "choices".into() => json!(choices),
                    "placeholder".into() => json!(placeholder),
                    "disabled".into() => json!(meal.is_none()),
                },
            );
            Ok(())
        })
        .add_dependent("pizzaSize", ["mainFood", "upperCasePizzaSizes"], |field, values| {
            if values[0].as_str() != Some(PIZZA) {
                return Ok(());
            }
            let upper_case = values[1].as_bool().unwrap_or(false);
            let placeholder = if upper_case {
                PIZZA_PLACEHOLDER.to_uppercase()
            } else {
                PIZZA_PLACEHOLDER.to_string()
            };
            let mut options = FieldOptions::new();
            options.insert("choices".into(), json!(PIZZA_SIZES));
            options.insert("placeholder".into(), json!(placeholder));
            options.insert("required".into(), json!(true));
            field.request("choice", options);
            Ok(())
        });

    Ok(builder)
}

/// Builds and initializes the meal planner form.
pub fn build(initial: Value, settings: &DynamicFormSettings) -> Result<Form> {
    builder(initial, settings)?.get_form()
}

#[cfg(test)]
mod tests {
    use dynaform_types::{FormHandle, settings::DEFAULT_ERROR_FIELD_NAME};

    use super::*;

    fn food_choices(form: &Form) -> Vec<Value> {
        form.get("mainFood").expect("mainFood").view().choice_values()
    }

    #[test]
    fn breakfast_is_preselected() {
        let form = build(default_data(), &DynamicFormSettings::default()).expect("build form");

        assert!(form.has(DEFAULT_ERROR_FIELD_NAME));
        assert!(!form.is_valid());
        let main_food = form.get("mainFood").expect("mainFood").view();
        assert_eq!(main_food.placeholder.as_deref(), Some("What is for Breakfast?"));
        assert!(food_choices(&form).contains(&json!("bacon")));
        assert!(!food_choices(&form).contains(&json!("pizza")));
        assert!(!form.has("pizzaSize"));
    }

    #[test]
    fn preselected_pizza_adds_the_size_field() {
        let form = build(json!({"meal": "dinner", "mainFood": "pizza"}), &DynamicFormSettings::default())
            .expect("build form");

        assert_eq!(form.get("mainFood").expect("mainFood").data(), json!("pizza"));
        let size = form.get("pizzaSize").expect("pizzaSize").view();
        assert_eq!(size.placeholder.as_deref(), Some(PIZZA_PLACEHOLDER));
        assert_eq!(size.choice_values(), vec![json!(12), json!(14), json!(16)]);
    }

    #[test]
    fn missing_meal_disables_main_food() {
        let form = build(json!({}), &DynamicFormSettings::default()).expect("build form");

        let main_food = form.get("mainFood").expect("mainFood");
        assert!(main_food.disabled());
        assert_eq!(main_food.view().placeholder.as_deref(), Some("Select a meal first"));
        assert!(food_choices(&form).is_empty());
    }
}
