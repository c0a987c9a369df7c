//! Transport credential construction against PEM fixtures

use std::path::{Path, PathBuf};

use helm::application::{ConnectionError, ServerVerification, TransportCredential};
use helm::config::TlsConfig;
use rstest::rstest;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/tls")
        .join(name)
}

fn tls(verify: bool, enable: bool) -> TlsConfig {
    TlsConfig {
        verify,
        enable,
        ca_cert: fixture("ca.pem"),
        cert: fixture("cert.pem"),
        key: fixture("key.pem"),
    }
}

#[test]
fn given_verify_when_building_then_validates_server_and_presents_client_cert() {
    // Act
    let credential = TransportCredential::build(&tls(true, false)).unwrap();

    // Assert
    assert_eq!(credential.verification(), ServerVerification::Verify);
    assert!(credential.verifies_server());
    assert!(credential.presents_client_cert());
}

#[test]
fn given_enable_only_when_building_then_skips_server_validation_but_presents_client_cert() {
    // Arrange: no CA needed without verification
    let mut config = tls(false, true);
    config.ca_cert = PathBuf::from("/nonexistent/ca.pem");

    // Act
    let credential = TransportCredential::build(&config).unwrap();

    // Assert
    assert_eq!(credential.verification(), ServerVerification::Skip);
    assert!(!credential.verifies_server());
    assert!(credential.presents_client_cert());
}

#[test]
fn given_verify_without_ca_when_building_then_names_ca_file() {
    let mut config = tls(true, false);
    config.ca_cert = PathBuf::from("/nonexistent/ca.pem");

    let err = TransportCredential::build(&config).unwrap_err();

    match err {
        ConnectionError::TlsConfigInvalid { path, .. } => {
            assert_eq!(path, PathBuf::from("/nonexistent/ca.pem"))
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
#[case::empty_cert("cert")]
#[case::empty_key("key")]
fn given_empty_material_when_building_then_tls_config_invalid(#[case] which: &str) {
    // Arrange
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty.pem");
    std::fs::write(&empty, "").unwrap();
    let mut config = tls(false, true);
    match which {
        "cert" => config.cert = empty.clone(),
        _ => config.key = empty.clone(),
    }

    // Act
    let err = TransportCredential::build(&config).unwrap_err();

    // Assert
    assert!(matches!(err, ConnectionError::TlsConfigInvalid { ref path, .. } if *path == empty));
    assert!(err.to_string().starts_with("invalid TLS configuration: "));
}
