use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn defaults_match_engine_constants() {
    let config = Config::default();
    assert_eq!(config.heartbeat_timeout_ms, orbitmesh_engine::registry::DEFAULT_HEARTBEAT_TIMEOUT_MS);
    assert_eq!(config.ack_timeout_ms, orbitmesh_engine::dispatcher::DEFAULT_ACK_TIMEOUT_MS);
}

#[test]
fn missing_default_path_falls_back_to_defaults() {
    let config = Config::load(None);
    assert!(config.is_ok());
}

#[test]
fn explicit_missing_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/orbitmesh.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "not valid toml {{{{").unwrap();
    let err = Config::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn partial_file_overrides_only_named_fields() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "session_bind = \"0.0.0.0:9000\"").unwrap();
    let config = Config::load(Some(file.path())).unwrap();
    assert_eq!(config.session_bind, "0.0.0.0:9000");
    assert_eq!(config.heartbeat_interval_ms, Config::default().heartbeat_interval_ms);
}

#[test]
fn admin_socket_path_defaults_under_state_dir() {
    let mut config = Config::default();
    config.state_dir = Some(PathBuf::from("/var/lib/orbitmesh"));
    assert_eq!(config.admin_socket_path(), PathBuf::from("/var/lib/orbitmesh/admin.sock"));
}

#[test]
fn admin_socket_path_honors_explicit_override() {
    let mut config = Config::default();
    config.state_dir = Some(PathBuf::from("/var/lib/orbitmesh"));
    config.admin_socket = Some(PathBuf::from("/run/orbitmesh.sock"));
    assert_eq!(config.admin_socket_path(), PathBuf::from("/run/orbitmesh.sock"));
}
