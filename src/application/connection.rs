//! Channel establishment to the remote release service
//!
//! The manager owns at most one tunnel per process. The derived remote
//! address and the transport credential are each computed once and reused
//! by later calls; the tunnel is closed exactly once, by `teardown` or on drop.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::application::{ConnectionError, TransportCredential};
use crate::config::{ConnectionConfig, TlsConfig};
use crate::infrastructure::traits::{ClusterConnector, ForwardHandle};

/// Resolved target of remote calls.
#[derive(Debug, Clone)]
pub struct Channel {
    /// `host:port`
    pub address: String,
    pub credential: Option<TransportCredential>,
}

impl Channel {
    pub fn is_secure(&self) -> bool {
        self.credential.is_some()
    }
}

/// An open port-forward into the cluster.
pub struct Tunnel {
    pub local_port: u16,
    pub namespace: String,
    handle: Box<dyn ForwardHandle>,
}

impl Tunnel {
    pub fn new(namespace: &str, handle: Box<dyn ForwardHandle>) -> Self {
        Self {
            local_port: handle.local_port(),
            namespace: namespace.to_string(),
            handle,
        }
    }

    pub fn close(mut self) {
        debug!(
            "Closing tunnel on local port {} ({})",
            self.local_port, self.namespace
        );
        self.handle.close();
    }
}

impl fmt::Debug for Tunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tunnel")
            .field("local_port", &self.local_port)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

pub struct ConnectionManager {
    connector: Arc<dyn ClusterConnector>,
    address: Option<String>,
    credential: Option<TransportCredential>,
    tunnel: Option<Tunnel>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn ClusterConnector>) -> Self {
        Self {
            connector,
            address: None,
            credential: None,
            tunnel: None,
        }
    }

    /// Return a channel to the remote service, tunneling through the cluster
    /// when no address is configured.
    pub fn ensure_connected(
        &mut self,
        config: &ConnectionConfig,
        tls: &TlsConfig,
    ) -> Result<Channel, ConnectionError> {
        let address = match &self.address {
            Some(address) => address.clone(),
            None => {
                let address = match config.remote_address.as_deref() {
                    Some(address) if !address.is_empty() => address.to_string(),
                    _ => self.open_tunnel(config)?,
                };
                debug!("SERVER: {:?}", address);
                self.address = Some(address.clone());
                address
            }
        };

        if tls.is_enabled() && self.credential.is_none() {
            let credential = TransportCredential::build(tls).map_err(|e| {
                error!("{}", e);
                e
            })?;
            self.credential = Some(credential);
        }

        Ok(Channel {
            address,
            credential: self.credential.clone(),
        })
    }

    fn open_tunnel(&mut self, config: &ConnectionConfig) -> Result<String, ConnectionError> {
        let accessor = self
            .connector
            .connect(config.cluster_context.as_deref())
            .map_err(|message| ConnectionError::ConfigUnavailable {
                context: config.cluster_context.clone().unwrap_or_default(),
                message,
            })?;
        let handle = accessor
            .forward(&config.remote_namespace)
            .map_err(|message| ConnectionError::TunnelFailed {
                namespace: config.remote_namespace.clone(),
                message,
            })?;

        let tunnel = Tunnel::new(&config.remote_namespace, handle);
        debug!("Created tunnel using local port: '{}'", tunnel.local_port);
        let address = format!("localhost:{}", tunnel.local_port);
        self.tunnel = Some(tunnel);
        Ok(address)
    }

    pub fn tunnel(&self) -> Option<&Tunnel> {
        self.tunnel.as_ref()
    }

    /// Address derived by the last successful `ensure_connected`.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Close the tunnel if one was opened. No-op otherwise.
    pub fn teardown(&mut self) {
        if let Some(tunnel) = self.tunnel.take() {
            tunnel.close();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("address", &self.address)
            .field("tunnel", &self.tunnel)
            .finish_non_exhaustive()
    }
}
