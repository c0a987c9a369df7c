//! Per-invocation state handed to command handlers

use tracing::debug;

use crate::application::{translate, ApplicationError, Channel, ConnectionManager};
use crate::cli::error::CliResult;
use crate::cli::router::CommandRouter;
use crate::config::{ResolvedConfig, TlsConfig};
use crate::domain::{HelmHome, RemoteRequest};
use crate::infrastructure::di::ServiceContainer;

/// Resolved configuration plus the lazily established connection.
///
/// The connection is torn down by `teardown` and, failing that, on drop.
pub struct Session<'a> {
    router: &'a CommandRouter,
    config: ResolvedConfig,
    tls: TlsConfig,
    connection: ConnectionManager,
}

impl<'a> Session<'a> {
    pub fn new(router: &'a CommandRouter, config: ResolvedConfig, tls: TlsConfig) -> Self {
        let connection = ConnectionManager::new(router.services().cluster.clone());
        Self {
            router,
            config,
            tls,
            connection,
        }
    }

    pub fn router(&self) -> &'a CommandRouter {
        self.router
    }

    pub fn services(&self) -> &'a ServiceContainer {
        self.router.services()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn home(&self) -> &HelmHome {
        &self.config.home
    }

    pub fn tls(&self) -> &TlsConfig {
        &self.tls
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// Address of the remote service if configured or already derived.
    pub fn remote_address(&self) -> Option<String> {
        self.connection
            .address()
            .map(str::to_string)
            .or_else(|| self.config.connection.remote_address.clone())
            .filter(|a| !a.is_empty())
    }

    /// Establish (once) and return the channel to the remote service.
    pub fn channel(&mut self) -> CliResult<Channel> {
        Ok(self
            .connection
            .ensure_connected(&self.config.connection, &self.tls)?)
    }

    /// Perform one remote operation; failures come back translated.
    pub fn call(&mut self, request: RemoteRequest) -> CliResult<String> {
        let channel = self.channel()?;
        debug!("{} -> {}", request.operation, channel.address);
        let result = self
            .services()
            .releases
            .connect(&channel)
            .and_then(|mut client| client.call(&request));
        result.map_err(|e| translate(ApplicationError::from(e)).into())
    }

    pub fn teardown(&mut self) {
        self.connection.teardown();
    }
}
