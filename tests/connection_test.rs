//! Tests for ConnectionManager: tunnel decisions, credentials, teardown

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use helm::application::{ConnectionError, ConnectionManager};
use helm::config::{ConnectionConfig, TlsConfig};

use common::MockCluster;

fn config(remote_address: Option<&str>) -> ConnectionConfig {
    ConnectionConfig {
        remote_address: remote_address.map(str::to_string),
        cluster_context: None,
        remote_namespace: "kube-system".to_string(),
    }
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/tls")
        .join(name)
}

fn manager(cluster: MockCluster) -> (ConnectionManager, Arc<common::ClusterLog>) {
    let log = Arc::clone(&cluster.log);
    (ConnectionManager::new(Arc::new(cluster)), log)
}

#[test]
fn given_remote_address_when_connecting_then_never_touches_cluster() {
    // Arrange
    let (mut manager, log) = manager(MockCluster::with_port(1234));

    // Act
    let channel = manager
        .ensure_connected(&config(Some("tiller.example:44134")), &TlsConfig::default())
        .unwrap();

    // Assert
    assert_eq!(channel.address, "tiller.example:44134");
    assert_eq!(log.connects(), 0);
    assert!(manager.tunnel().is_none());
}

#[test]
fn given_no_address_when_tunnel_opens_on_port_then_address_is_localhost_port() {
    // Arrange
    let (mut manager, log) = manager(MockCluster::with_port(53117));

    // Act
    let channel = manager
        .ensure_connected(&config(None), &TlsConfig::default())
        .unwrap();

    // Assert
    assert_eq!(channel.address, "localhost:53117");
    assert_eq!(log.forwards(), 1);
    assert_eq!(log.namespaces.lock().unwrap().as_slice(), &["kube-system".to_string()]);
    assert_eq!(manager.tunnel().map(|t| t.local_port), Some(53117));
}

#[test]
fn given_tls_disabled_when_connecting_then_channel_is_unsecured() {
    let (mut manager, _) = manager(MockCluster::with_port(1));

    let channel = manager
        .ensure_connected(&config(Some("h:1")), &TlsConfig::default())
        .unwrap();

    assert!(!channel.is_secure());
    assert!(channel.credential.is_none());
}

#[test]
fn given_tls_enabled_when_connecting_twice_then_credential_is_reused() {
    // Arrange
    let (mut manager, _) = manager(MockCluster::with_port(1));
    let tls = TlsConfig {
        verify: true,
        enable: false,
        ca_cert: fixture("ca.pem"),
        cert: fixture("cert.pem"),
        key: fixture("key.pem"),
    };

    // Act
    let first = manager.ensure_connected(&config(Some("h:1")), &tls).unwrap();
    let second = manager.ensure_connected(&config(Some("h:1")), &tls).unwrap();

    // Assert
    let (a, b) = (first.credential.unwrap(), second.credential.unwrap());
    assert!(Arc::ptr_eq(&a.client_config(), &b.client_config()));
    assert!(a.verifies_server());
}

#[test]
fn given_unreadable_tls_material_when_connecting_then_tls_config_invalid() {
    let (mut manager, _) = manager(MockCluster::with_port(1));
    let tls = TlsConfig {
        enable: true,
        key: PathBuf::from("/nonexistent/key.pem"),
        cert: fixture("cert.pem"),
        ..TlsConfig::default()
    };

    let err = manager
        .ensure_connected(&config(Some("h:1")), &tls)
        .unwrap_err();

    assert!(matches!(err, ConnectionError::TlsConfigInvalid { .. }));
}

#[test]
fn given_missing_kube_config_when_tunneling_then_config_unavailable_and_no_tunnel() {
    // Arrange
    let mut cluster = MockCluster::with_port(1);
    cluster.config_error = Some("context \"prod\" does not exist".to_string());
    let (mut manager, log) = manager(cluster);

    // Act
    let err = manager
        .ensure_connected(&config(None), &TlsConfig::default())
        .unwrap_err();

    // Assert
    assert!(matches!(err, ConnectionError::ConfigUnavailable { .. }));
    assert_eq!(log.forwards(), 0);
    assert!(manager.tunnel().is_none());
    assert!(manager.address().is_none());
}

#[test]
fn given_forward_failure_when_tunneling_then_tunnel_failed() {
    let mut cluster = MockCluster::with_port(1);
    cluster.forward_error = Some("could not find tiller".to_string());
    let (mut manager, _) = manager(cluster);

    let err = manager
        .ensure_connected(&config(None), &TlsConfig::default())
        .unwrap_err();

    match err {
        ConnectionError::TunnelFailed { namespace, message } => {
            assert_eq!(namespace, "kube-system");
            assert_eq!(message, "could not find tiller");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(manager.tunnel().is_none());
}

#[test]
fn given_no_tunnel_when_tearing_down_then_noop() {
    let (mut manager, log) = manager(MockCluster::with_port(1));

    manager.teardown();
    manager.teardown();

    assert_eq!(log.closes(), 0);
}

#[test]
fn given_tunnel_when_torn_down_repeatedly_then_closed_exactly_once() {
    // Arrange
    let (mut manager, log) = manager(MockCluster::with_port(7));
    manager
        .ensure_connected(&config(None), &TlsConfig::default())
        .unwrap();

    // Act
    manager.teardown();
    manager.teardown();
    drop(manager);

    // Assert
    assert_eq!(log.closes(), 1);
}

#[test]
fn given_tunnel_when_manager_dropped_then_closed() {
    let (mut manager, log) = manager(MockCluster::with_port(7));
    manager
        .ensure_connected(&config(None), &TlsConfig::default())
        .unwrap();

    drop(manager);

    assert_eq!(log.closes(), 1);
}
