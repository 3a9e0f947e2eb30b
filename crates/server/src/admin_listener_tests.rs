use super::*;
use crate::config::Config;
use orbitmesh_core::JobRequest;
use tempfile::tempdir;
use tokio::net::UnixStream;

async fn running_app() -> (Arc<App>, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("admin.sock");
    let mut config = Config::default();
    config.admin_socket = Some(socket_path.clone());
    let app = App::new(config).unwrap();
    let listener = UnixListener::bind(&socket_path).unwrap();
    tokio::spawn(run(listener, app.clone()));
    // admin.sock directory must outlive the test; keep it alive via leak of dir.
    std::mem::forget(dir);
    (app, socket_path)
}

async fn roundtrip(socket_path: &std::path::Path, request: Request) -> Response {
    let mut stream = UnixStream::connect(socket_path).await.unwrap();
    frame::write_frame(&mut stream, 0, &request).await.unwrap();
    let raw = frame::read_frame(&mut stream).await.unwrap();
    frame::decode_payload(&raw).unwrap()
}

#[tokio::test]
async fn ping_returns_pong() {
    let (_app, socket_path) = running_app().await;
    let response = roundtrip(&socket_path, Request::Ping).await;
    assert!(matches!(response, Response::Pong));
}

#[tokio::test]
async fn job_submit_then_get_roundtrips() {
    let (_app, socket_path) = running_app().await;
    let submitted = roundtrip(
        &socket_path,
        Request::JobSubmit { request: JobRequest::new("echo hi") },
    )
    .await;
    let job_id = match submitted {
        Response::Job { job: Some(job) } => job.id,
        other => panic!("unexpected response: {other:?}"),
    };

    let fetched = roundtrip(&socket_path, Request::JobGet { job_id }).await;
    assert!(matches!(fetched, Response::Job { job: Some(_) }));
}

#[tokio::test]
async fn job_submit_rejected_while_draining() {
    let (app, socket_path) = running_app().await;
    app.begin_drain();
    let response = roundtrip(
        &socket_path,
        Request::JobSubmit { request: JobRequest::new("echo hi") },
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
}

#[tokio::test]
async fn shutdown_request_notifies_the_app() {
    let (app, socket_path) = running_app().await;
    let response = roundtrip(&socket_path, Request::Shutdown { drain_timeout_ms: Some(10) }).await;
    assert!(matches!(response, Response::ShuttingDown));
    app.shutdown.notified().await;
}
