use super::*;
use tokio::net::UnixListener;

fn socket_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("admin.sock");
    (dir, path)
}

#[tokio::test]
async fn send_decodes_the_matching_response() {
    let (_dir, path) = socket_path();
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let raw = frame::read_frame(&mut stream).await.unwrap();
        let _req: Request = frame::decode_payload(&raw).unwrap();
        frame::write_frame(&mut stream, 0, &Response::Pong).await.unwrap();
    });

    let client = DaemonClient::new(path);
    let response = client.send(&Request::Ping).await.unwrap();
    assert!(matches!(response, Response::Pong));
}

#[tokio::test]
async fn send_ok_rejects_a_server_error() {
    let (_dir, path) = socket_path();
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _raw = frame::read_frame(&mut stream).await.unwrap();
        frame::write_frame(&mut stream, 0, &Response::Error { tag: "not_found".into(), message: "nope".into() })
            .await
            .unwrap();
    });

    let client = DaemonClient::new(path);
    let err = client.send_ok(&Request::Ping).await.unwrap_err();
    assert!(matches!(err, ClientError::Server { tag, .. } if tag == "not_found"));
}

#[tokio::test]
async fn send_ok_rejects_an_unexpected_response_shape() {
    let (_dir, path) = socket_path();
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let _raw = frame::read_frame(&mut stream).await.unwrap();
        frame::write_frame(&mut stream, 0, &Response::Pong).await.unwrap();
    });

    let client = DaemonClient::new(path);
    let err = client.send_ok(&Request::Ping).await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedResponse));
}

#[tokio::test]
async fn connect_failure_is_reported_with_the_socket_path() {
    let (_dir, path) = socket_path();
    let client = DaemonClient::new(path.clone());
    let err = client.send(&Request::Ping).await.unwrap_err();
    assert!(matches!(err, ClientError::Connect { path: p, .. } if p == path));
}

#[tokio::test]
async fn subscribe_streams_events_until_the_server_closes() {
    let (_dir, path) = socket_path();
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let raw = frame::read_frame(&mut stream).await.unwrap();
        let _req: Request = frame::decode_payload(&raw).unwrap();
        let event = orbitmesh_core::Event::AgentReady { agent_id: orbitmesh_core::AgentId::from_string("agt-1") };
        frame::write_frame(&mut stream, 0, &Response::Event { event }).await.unwrap();
    });

    let client = DaemonClient::new(path);
    let mut stream = client.subscribe(None).await.unwrap();
    let first = stream.next().await.unwrap();
    assert!(matches!(first, Some(orbitmesh_core::Event::AgentReady { .. })));
    let second = stream.next().await.unwrap();
    assert!(second.is_none());
}
