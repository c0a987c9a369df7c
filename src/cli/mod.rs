//! CLI layer: command tree, dispatch and handlers

pub mod args;
pub mod commands;
pub mod error;
pub mod node;
pub mod output;
pub mod router;
pub mod session;

use std::sync::Arc;

use tracing::debug;

use crate::config::{self, ConfigResolver, GlobalFlags};
use crate::infrastructure::di::ServiceContainer;

pub use error::{CliError, CliResult};
pub use node::{CommandNode, FlagValue, Invocation};
pub use router::{CommandRouter, Dispatch};
pub use session::Session;

/// Build the full command tree: built-ins plus discovered plugins.
///
/// `flags` come from the argv pre-scan and only locate the plugins.
pub fn build_router(flags: &GlobalFlags, services: Arc<ServiceContainer>) -> CommandRouter {
    build_router_with(flags, services, |name| std::env::var(name).ok())
}

/// `build_router` against an arbitrary environment lookup.
pub fn build_router_with<F>(
    flags: &GlobalFlags,
    services: Arc<ServiceContainer>,
    lookup: F,
) -> CommandRouter
where
    F: Fn(&str) -> Option<String>,
{
    let mut router = CommandRouter::new(commands::root_command(), services);
    if !config::plugins_enabled(&lookup) {
        debug!("Plugins disabled by ${}", config::NO_PLUGINS_ENV_VAR);
        return router;
    }
    let home = ConfigResolver::new(flags).resolve_with(&lookup).home;
    let root = config::plugins_root(&home, &lookup);
    let plugins = router.services().plugin_loader().discover(&root);
    router.register_plugins(plugins);
    router
}
