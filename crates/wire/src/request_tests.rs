use super::*;

#[test]
fn job_submit_round_trips_through_json() {
    let request = Request::JobSubmit { request: orbitmesh_core::JobRequest::new("build") };
    let json = serde_json::to_string(&request).unwrap();
    let decoded: Request = serde_json::from_str(&json).unwrap();
    match decoded {
        Request::JobSubmit { request: decoded_request } => {
            assert_eq!(decoded_request.command, "build");
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn tag_field_names_the_variant() {
    let request = Request::Ping;
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["type"], "Ping");
}
