//! Service container for dependency injection
//!
//! Wires up the I/O boundaries every command handler reaches through.

use std::sync::Arc;

use crate::application::PluginLoader;
use crate::infrastructure::kube::KubectlConnector;
use crate::infrastructure::remote::TcpReleaseClientFactory;
use crate::infrastructure::traits::{
    ClusterConnector, CommandRunner, FileSystem, RealCommandRunner, RealFileSystem,
    ReleaseClientFactory,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction (kubectl checks, plugins)
    pub cmd: Arc<dyn CommandRunner>,

    /// Cluster access for tunneling to the remote service
    pub cluster: Arc<dyn ClusterConnector>,

    /// Release clients over established channels
    pub releases: Arc<dyn ReleaseClientFactory>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new() -> Self {
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        Self::with_deps(
            Arc::new(RealFileSystem),
            Arc::clone(&cmd),
            Arc::new(KubectlConnector::new(cmd)),
            Arc::new(TcpReleaseClientFactory),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        cluster: Arc<dyn ClusterConnector>,
        releases: Arc<dyn ReleaseClientFactory>,
    ) -> Self {
        Self {
            fs,
            cmd,
            cluster,
            releases,
        }
    }

    pub fn plugin_loader(&self) -> PluginLoader {
        PluginLoader::new(Arc::clone(&self.fs))
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}
