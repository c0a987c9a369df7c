//! Plugin commands: forward arguments and environment to an external program

use tracing::debug;

use crate::application::ApplicationError;
use crate::cli::error::CliResult;
use crate::cli::node::{CommandNode, Invocation};
use crate::cli::session::Session;
use crate::config::{self, HOME_ENV_VAR, TILLER_NAMESPACE_ENV_VAR};
use crate::domain::{Arity, PluginDescriptor};
use crate::infrastructure::InfraError;

/// A passthrough node running `plugin`.
pub fn plugin_command(plugin: &PluginDescriptor) -> CommandNode {
    let descriptor = plugin.clone();
    CommandNode::new(&plugin.name, &plugin.short_help)
        .long(&plugin.long_help)
        .arity(Arity::Any)
        .passthrough()
        .handler(move |session, inv| run_plugin(session, inv, &descriptor))
}

fn run_plugin(session: &mut Session<'_>, inv: &Invocation, plugin: &PluginDescriptor) -> CliResult<()> {
    if plugin.use_tunnel {
        session.channel()?;
    }
    let env = plugin_env(session, plugin);
    let lookup = |name: &str| {
        env.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .or_else(|| std::env::var(name).ok())
    };
    let (program, mut args) = plugin
        .command_line(lookup)
        .map_err(ApplicationError::from)?;
    args.extend(plugin.forwarded_args(&inv.args));

    debug!("Running plugin {:?}: {} {:?}", plugin.name, program.display(), args);
    let code = session
        .services()
        .cmd
        .run_interactive(&program, &args, &env)
        .map_err(|e| InfraError::io(format!("run plugin {:?} ({})", plugin.name, program.display()), e))?;
    if code != 0 {
        return Err(InfraError::PluginExit {
            name: plugin.name.clone(),
            code,
        }
        .into());
    }
    Ok(())
}

/// Environment exported to a plugin process.
pub fn plugin_env(session: &Session<'_>, plugin: &PluginDescriptor) -> Vec<(String, String)> {
    let home = session.home();
    let lookup = |name: &str| std::env::var(name).ok();
    let helm_bin = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "helm".to_string());

    let mut env = vec![
        ("HELM_PLUGIN_NAME".to_string(), plugin.name.clone()),
        ("HELM_PLUGIN_DIR".to_string(), plugin.dir.to_string_lossy().into_owned()),
        (
            config::PLUGINS_ENV_VAR.to_string(),
            config::plugins_root(home, lookup).to_string_lossy().into_owned(),
        ),
        ("HELM_BIN".to_string(), helm_bin),
        (HOME_ENV_VAR.to_string(), home.path().to_string_lossy().into_owned()),
    ];
    env.extend(
        home.path_variables()
            .into_iter()
            .map(|(name, path)| (name.to_string(), path.to_string_lossy().into_owned())),
    );
    env.push((
        TILLER_NAMESPACE_ENV_VAR.to_string(),
        session.config().connection.remote_namespace.clone(),
    ));
    env.push((
        "HELM_DEBUG".to_string(),
        if session.debug() { "1" } else { "" }.to_string(),
    ));
    if let Some(address) = session.remote_address() {
        env.push(("TILLER_HOST".to_string(), address));
    }
    env
}
