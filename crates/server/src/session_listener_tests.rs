use super::*;
use crate::config::Config;
use orbitmesh_wire::session::Hello;
use tokio::net::TcpListener as TokioTcpListener;

async fn running_app(shared_token: &str) -> (Arc<App>, std::net::SocketAddr) {
    let mut config = Config::default();
    config.shared_token = shared_token.to_string();
    config.session_bind = "127.0.0.1:0".to_string();
    let app = App::new(config).unwrap();
    let listener = TokioTcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run(listener, app.clone()));
    (app, addr)
}

fn hello(agent_id: &str, token: &str) -> Hello {
    Hello {
        agent_id: orbitmesh_core::AgentId::from_string(agent_id),
        nominal_name: agent_id.to_string(),
        capabilities: Vec::new(),
        group: None,
        resume_token: Some(format!("{agent_id}:{token}")),
    }
}

#[tokio::test]
async fn hello_with_valid_credential_gets_a_welcome() {
    let (_app, addr) = running_app("s3cret").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    frame::write_frame(&mut stream, kind::HELLO, &hello("agt-1", "s3cret")).await.unwrap();

    let raw = frame::read_frame(&mut stream).await.unwrap();
    assert_eq!(raw.kind, kind::WELCOME);
    let welcome: session::Welcome = frame::decode_payload(&raw).unwrap();
    assert!(!welcome.resume_token.is_empty());
}

#[tokio::test]
async fn hello_with_wrong_token_gets_no_welcome() {
    let (_app, addr) = running_app("s3cret").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    frame::write_frame(&mut stream, kind::HELLO, &hello("agt-1", "wrong")).await.unwrap();

    let err = frame::read_frame(&mut stream).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn a_flood_of_malformed_frames_closes_the_session() {
    let (app, addr) = running_app("s3cret").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    frame::write_frame(&mut stream, kind::HELLO, &hello("agt-1", "s3cret")).await.unwrap();
    let _welcome = frame::read_frame(&mut stream).await.unwrap();

    // An AckReject frame whose payload isn't the expected object fails to
    // decode every time, simulating a malformed/hostile peer.
    for _ in 0..=MAX_PARSE_ERRORS_PER_SECOND {
        frame::write_frame(&mut stream, kind::ACK_REJECT, &"not an ack-reject object").await.unwrap();
    }

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let agent = app.registry.get(&orbitmesh_core::AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(agent.status, orbitmesh_core::AgentStatus::Disconnected);
}

#[tokio::test]
async fn heartbeat_updates_the_registered_agent() {
    let (app, addr) = running_app("s3cret").await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    frame::write_frame(&mut stream, kind::HELLO, &hello("agt-1", "s3cret")).await.unwrap();
    let _welcome = frame::read_frame(&mut stream).await.unwrap();

    let heartbeat = session::Heartbeat { timestamp_ms: 0, cpu_pct: None, mem_pct: None, active_jobs: None };
    frame::write_frame(&mut stream, kind::HEARTBEAT, &heartbeat).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let agent = app.registry.get(&orbitmesh_core::AgentId::from_string("agt-1")).await.unwrap();
    assert_eq!(agent.status, orbitmesh_core::AgentStatus::Ready);
}
