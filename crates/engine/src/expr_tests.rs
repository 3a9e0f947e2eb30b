use super::*;
use serde_json::json;

fn vars() -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("status".to_string(), json!("success"));
    m.insert("count".to_string(), json!(3));
    m.insert("order".to_string(), json!({ "id": "ord-1", "total": 42 }));
    m
}

#[test]
fn equality_against_a_string_variable() {
    assert!(evaluate_bool("status == 'success'", &vars()).unwrap());
    assert!(!evaluate_bool("status == 'error'", &vars()).unwrap());
    assert!(evaluate_bool("status != 'error'", &vars()).unwrap());
}

#[test]
fn ordering_over_numbers() {
    assert!(evaluate_bool("count > 2", &vars()).unwrap());
    assert!(evaluate_bool("count <= 3", &vars()).unwrap());
    assert!(!evaluate_bool("count < 3", &vars()).unwrap());
}

#[test]
fn boolean_composition() {
    assert!(evaluate_bool("status == 'success' && count == 3", &vars()).unwrap());
    assert!(evaluate_bool("status == 'error' || count == 3", &vars()).unwrap());
    assert!(evaluate_bool("!(status == 'error')", &vars()).unwrap());
}

#[test]
fn dotted_path_access_into_a_nested_object() {
    assert!(evaluate_bool("${order.id} == 'ord-1'", &vars()).unwrap());
    assert!(evaluate_bool("${order.total} == 42", &vars()).unwrap());
}

#[test]
fn undefined_references_evaluate_to_null_and_are_falsy() {
    assert_eq!(evaluate("missing", &vars()).unwrap(), Value::Null);
    assert!(!evaluate_bool("missing", &vars()).unwrap());
    assert!(!evaluate_bool("missing == 'anything'", &vars()).unwrap());
}

#[test]
fn mismatched_type_comparisons_are_false() {
    assert!(!evaluate_bool("count > 'not a number'", &vars()).unwrap());
    assert!(!evaluate_bool("status == 3", &vars()).unwrap());
}

#[test]
fn trailing_input_is_rejected() {
    let err = evaluate("true true", &vars()).unwrap_err();
    assert!(matches!(err, ExprError::TrailingInput(_)));
}
