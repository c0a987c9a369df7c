//! Plugin discovery
//!
//! One plugin per subdirectory of the plugins root that contains a
//! `plugin.toml`. Everything that goes wrong here is logged and skipped.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::plugin::MANIFEST_FILE;
use crate::domain::{PluginDescriptor, PluginManifest};
use crate::infrastructure::traits::FileSystem;

pub struct PluginLoader {
    fs: Arc<dyn FileSystem>,
}

impl PluginLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Descriptors for every valid plugin below `root`, in directory order.
    ///
    /// A missing or unreadable root yields no plugins. When two plugins share
    /// a name the first one wins.
    pub fn discover(&self, root: &Path) -> Vec<PluginDescriptor> {
        if !self.fs.is_dir(root) {
            debug!("No plugins directory at {}", root.display());
            return Vec::new();
        }
        let dirs = match self.fs.read_dir(root) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!("cannot read plugins directory {}: {}", root.display(), e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let mut plugins = Vec::new();
        for dir in dirs.iter().filter(|d| self.fs.is_dir(d)) {
            match self.load(dir) {
                Ok(None) => continue,
                Ok(Some(plugin)) if seen.contains(&plugin.name) => {
                    warn!(
                        "plugin {:?} in {} duplicates an earlier plugin, skipping",
                        plugin.name,
                        dir.display()
                    );
                }
                Ok(Some(plugin)) => {
                    debug!("Found plugin {:?} in {}", plugin.name, dir.display());
                    seen.insert(plugin.name.clone());
                    plugins.push(plugin);
                }
                Err(e) => warn!("skipping plugin in {}: {}", dir.display(), e),
            }
        }
        plugins
    }

    /// `None` for a directory without a manifest.
    fn load(&self, dir: &Path) -> ApplicationResult<Option<PluginDescriptor>> {
        let manifest = dir.join(MANIFEST_FILE);
        let Some(content) = self
            .fs
            .read_to_string(&manifest)
            .optional()
            .with_path_context("read plugin manifest", &manifest)?
        else {
            return Ok(None);
        };
        let parsed = PluginManifest::parse(&content, &manifest)?;
        Ok(Some(PluginDescriptor::from_manifest(parsed, dir)?))
    }
}
