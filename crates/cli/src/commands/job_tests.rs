use super::*;

fn sample_job() -> Job {
    orbitmesh_core::JobBuilder::new()
        .id(JobId::from_string("job-1"))
        .command("echo hi")
        .status(orbitmesh_core::JobStatus::Running)
        .build()
}

#[test]
fn job_from_response_unwraps_a_present_job() {
    let job = sample_job();
    let response = Response::Job { job: Some(Box::new(job)) };
    let unwrapped = job_from_response(response).unwrap();
    assert_eq!(unwrapped.id.as_str(), "job-1");
}

#[test]
fn job_from_response_errors_on_missing_job() {
    let response = Response::Job { job: None };
    let err = job_from_response(response).unwrap_err();
    assert_eq!(err.code, 1);
}

#[test]
fn job_from_response_rejects_an_unexpected_response() {
    let response = Response::Pong;
    let err = job_from_response(response).unwrap_err();
    assert_eq!(err.code, 3);
}

#[test]
fn render_job_table_includes_command_and_status() {
    let job = sample_job();
    let mut buf = Vec::new();
    render_job_table(&[job], &mut buf);
    let rendered = String::from_utf8(buf).unwrap();
    assert!(rendered.contains("job-1"));
    assert!(rendered.contains("running"));
}
