use super::*;
use std::path::PathBuf;

#[test]
fn connect_errors_exit_with_code_2() {
    let err = ClientError::Connect {
        path: PathBuf::from("/tmp/admin.sock"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    let exit: ExitError = err.into();
    assert_eq!(exit.code, 2);
}

#[test]
fn server_errors_exit_with_code_3() {
    let err = ClientError::Server { tag: "not_found".into(), message: "missing".into() };
    let exit: ExitError = err.into();
    assert_eq!(exit.code, 3);
    assert!(exit.message.contains("missing"));
}

#[test]
fn display_prints_the_message_only() {
    let exit = ExitError::new(1, "bad input");
    assert_eq!(exit.to_string(), "bad input");
}
