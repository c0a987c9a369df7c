//! Layout of the Helm home directory.

use std::fmt;
use std::path::{Path, PathBuf};

/// The resolved Helm home directory and the paths derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmHome(PathBuf);

impl HelmHome {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn repository(&self) -> PathBuf {
        self.0.join("repository")
    }

    pub fn repository_file(&self) -> PathBuf {
        self.repository().join("repositories.yaml")
    }

    pub fn cache(&self) -> PathBuf {
        self.repository().join("cache")
    }

    pub fn local_repository(&self) -> PathBuf {
        self.repository().join("local")
    }

    pub fn plugins(&self) -> PathBuf {
        self.0.join("plugins")
    }

    /// Download cache for plugin archives
    pub fn plugin_cache(&self) -> PathBuf {
        self.0.join("cache").join("plugins")
    }

    pub fn starters(&self) -> PathBuf {
        self.0.join("starters")
    }

    pub fn tls_ca_cert(&self) -> PathBuf {
        self.0.join("ca.pem")
    }

    pub fn tls_cert(&self) -> PathBuf {
        self.0.join("cert.pem")
    }

    pub fn tls_key(&self) -> PathBuf {
        self.0.join("key.pem")
    }

    /// Directories `helm init` creates, parents before children.
    pub fn layout(&self) -> Vec<PathBuf> {
        vec![
            self.0.clone(),
            self.repository(),
            self.cache(),
            self.local_repository(),
            self.plugins(),
            self.plugin_cache(),
            self.starters(),
        ]
    }

    /// `HELM_PATH_*` variables exported to plugins.
    pub fn path_variables(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("HELM_PATH_HOME", self.0.clone()),
            ("HELM_PATH_REPOSITORY", self.repository()),
            ("HELM_PATH_REPOSITORY_FILE", self.repository_file()),
            ("HELM_PATH_CACHE", self.cache()),
            ("HELM_PATH_LOCAL_REPOSITORY", self.local_repository()),
            ("HELM_PATH_STARTER", self.starters()),
        ]
    }
}

impl fmt::Display for HelmHome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
