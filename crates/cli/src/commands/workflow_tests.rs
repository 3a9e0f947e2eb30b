use super::*;

#[test]
fn parse_inputs_parses_json_values() {
    let map = parse_inputs(&["count=3".to_string(), "flag=true".to_string()]).unwrap();
    assert_eq!(map["count"], serde_json::json!(3));
    assert_eq!(map["flag"], serde_json::json!(true));
}

#[test]
fn parse_inputs_falls_back_to_a_string_for_non_json() {
    let map = parse_inputs(&["name=not-json".to_string()]).unwrap();
    assert_eq!(map["name"], serde_json::json!("not-json"));
}

#[test]
fn parse_inputs_rejects_a_spec_without_equals() {
    let err = parse_inputs(&["nope".to_string()]).unwrap_err();
    assert_eq!(err.code, 1);
}

#[test]
fn load_definition_parses_yaml_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wf.yaml");
    std::fs::write(&path, "id: wf-1\nsteps: []\n").unwrap();
    let definition = load_definition(&path).unwrap();
    assert_eq!(definition.id.as_str(), "wf-1");
    assert!(definition.steps.is_empty());
}

#[test]
fn load_definition_errors_on_a_missing_file() {
    let err = load_definition(&PathBuf::from("/nonexistent/wf.yaml")).unwrap_err();
    assert_eq!(err.code, 1);
}

#[test]
fn instance_from_response_unwraps_a_present_instance() {
    let instance = WorkflowInstance::new(
        &WorkflowDefinition { id: WorkflowId::from_string("wf-1"), version: 1, steps: Vec::new(), triggers: Vec::new(), variables: Default::default(), timeout_ms: None, error_handling: Default::default() },
        Default::default(),
        0,
    );
    let response = Response::WorkflowInstance { instance: Some(Box::new(instance)) };
    let unwrapped = instance_from_response(response).unwrap();
    assert_eq!(unwrapped.workflow_id.as_str(), "wf-1");
}
