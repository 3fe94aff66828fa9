//! Choice-domain helpers shared by hosts and callbacks.
//!
//! Submitted values usually arrive as strings while choice domains hold typed
//! JSON values (numbers, booleans, strings). These routines decide whether a
//! submitted candidate belongs to a domain using the same loose matching rules
//! everywhere:
//! - Identical JSON values always match.
//! - A string candidate matches a non-string choice when it parses to it.
//! - A non-string candidate matches a string choice through its JSON rendering.

use serde_json::Value;

/// Returns true when the submitted value carries no selection at all.
pub fn is_empty_submission(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Locate the choice matching `candidate`, returning the canonical choice value.
pub fn find_choice<'a>(choices: &'a [Value], candidate: &Value) -> Option<&'a Value> {
    choices.iter().find(|choice| json_values_match(choice, candidate))
}

/// Loose JSON equality used for submitted values.
fn json_values_match(expected: &Value, candidate: &Value) -> bool {
    if expected == candidate {
        return true;
    }
    match (expected, candidate) {
        // distinct strings never match, even when one renders as the other
        (Value::String(_), Value::String(_)) => false,
        (Value::String(choice), typed) => *choice == typed.to_string(),
        (typed, Value::String(submitted)) => {
            serde_json::from_str::<Value>(submitted).is_ok_and(|parsed| parsed == *typed)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_submissions() {
        assert!(is_empty_submission(&Value::Null));
        assert!(is_empty_submission(&json!("")));
        assert!(is_empty_submission(&json!([])));
        assert!(!is_empty_submission(&json!(false)));
        assert!(!is_empty_submission(&json!("0")));
    }

    #[test]
    fn string_candidates_match_typed_choices() {
        let sizes = vec![json!(12), json!(14), json!(16)];
        assert_eq!(find_choice(&sizes, &json!("14")), Some(&json!(14)));
        assert_eq!(find_choice(&sizes, &json!("15")), None);
        assert_eq!(find_choice(&sizes, &json!("large")), None);
    }

    #[test]
    fn string_choices_match_rendered_candidates() {
        let choices = vec![json!("true"), json!("pizza")];
        assert_eq!(find_choice(&choices, &json!(true)), Some(&json!("true")));
        assert!(json_values_match(&json!("pizza"), &json!("pizza")));
        assert!(!json_values_match(&json!("pizza"), &json!("bacon")));
        assert!(!json_values_match(&json!(14), &json!("fourteen")));
        assert!(!json_values_match(&json!("\"pizza\""), &json!("pizza")));
    }
}
