use super::*;
use orbitmesh_core::{EntityKind, OrbitError};

#[test]
fn orbit_error_converts_into_a_tagged_error_response() {
    let response: Response = OrbitError::not_found(EntityKind::Job, "job-1").into();
    match response {
        Response::Error { tag, .. } => assert_eq!(tag, "not_found"),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn ok_serializes_with_no_extra_fields() {
    let json = serde_json::to_value(Response::Ok).unwrap();
    assert_eq!(json, serde_json::json!({"type": "Ok"}));
}
