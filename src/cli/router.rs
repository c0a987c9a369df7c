//! Command tree assembly and dispatch
//!
//! The tree of `CommandNode`s is the source of truth; a clap `Command` is
//! derived from it for parsing, help and completion. One invocation runs
//! exactly one handler between the pre-dispatch hook (TLS path expansion)
//! and the post-dispatch hook (connection teardown).

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches};
use tracing::{debug, warn};

use crate::cli::args::{self, global_flags_of, tls_config_of};
use crate::cli::commands::plugin::plugin_command;
use crate::cli::error::{CliError, CliResult};
use crate::cli::node::{CommandNode, FlagValue, Invocation};
use crate::cli::output;
use crate::cli::session::Session;
use crate::config::ConfigResolver;
use crate::domain::{FlagKind, FlagSpec, PluginDescriptor};
use crate::infrastructure::di::ServiceContainer;

/// Id of the positional argument list on every runnable node.
const ARGS_ID: &str = "args";

/// Names clap reserves for itself.
const RESERVED: &[&str] = &["help"];

/// Outcome of parsing argv.
#[derive(Debug)]
pub enum Dispatch {
    Run(Invocation),
    /// Rendered help text; nothing to run
    Help(String),
}

pub struct CommandRouter {
    root: CommandNode,
    plugins: Vec<PluginDescriptor>,
    services: Arc<ServiceContainer>,
}

impl CommandRouter {
    pub fn new(root: CommandNode, services: Arc<ServiceContainer>) -> Self {
        Self {
            root,
            plugins: Vec::new(),
            services,
        }
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// Plugins that made it into the tree.
    pub fn plugins(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    /// Merge discovered plugins into the root. Built-in names and aliases win;
    /// a shadowed plugin is skipped with a warning.
    pub fn register_plugins(&mut self, plugins: Vec<PluginDescriptor>) {
        for plugin in plugins {
            if RESERVED.contains(&plugin.name.as_str()) {
                warn!("plugin {:?} uses a reserved name, skipping", plugin.name);
                continue;
            }
            match self.root.add_child(plugin_command(&plugin)) {
                Ok(()) => {
                    debug!("Registered plugin {:?}", plugin.name);
                    self.plugins.push(plugin);
                }
                Err(e) => output::warning(&format!(
                    "plugin {:?} in {} not loaded: {}",
                    plugin.name,
                    plugin.dir.display(),
                    e
                )),
            }
        }
    }

    /// The clap view of the whole tree.
    pub fn command(&self) -> clap::Command {
        to_clap(&self.root)
            .disable_version_flag(true)
            .arg_required_else_help(true)
            .subcommand_required(true)
    }

    /// Match argv (program name first) against the tree.
    pub fn parse<I, T>(&self, argv: I) -> CliResult<Dispatch>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let matches = match self.command().try_get_matches_from(&argv) {
            Ok(matches) => matches,
            Err(e) => {
                let rendered = e.render().to_string();
                return match e.kind() {
                    ErrorKind::DisplayHelp
                    | ErrorKind::DisplayVersion
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                        Ok(Dispatch::Help(rendered))
                    }
                    // A bare group with flags is a request for its help
                    ErrorKind::MissingSubcommand => Ok(Dispatch::Help(self.group_help(&argv))),
                    _ => Err(CliError::Usage(usage_message(&rendered))),
                };
            }
        };

        let mut node = &self.root;
        let mut current = &matches;
        let mut path = Vec::new();
        // Persistent flags are inherited from every ancestor
        let mut specs: Vec<&FlagSpec> = self.root.flags.iter().filter(|f| f.persistent).collect();
        while let Some((name, sub)) = current.subcommand() {
            let Some(child) = node.find_child(name) else {
                break;
            };
            path.push(child.name.clone());
            specs.extend(child.flags.iter().filter(|f| f.persistent));
            node = child;
            current = sub;
        }
        specs.extend(node.flags.iter().filter(|f| !f.persistent));

        let mut inv = Invocation {
            path,
            args: current
                .get_many::<String>(ARGS_ID)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            flags: read_flags(current, &specs),
        };
        if node.passthrough {
            lift_global_flags(&mut inv);
        }
        Ok(Dispatch::Run(inv))
    }

    /// Help of the deepest group named in argv.
    fn group_help(&self, argv: &[OsString]) -> String {
        let mut node = &self.root;
        let mut path = Vec::new();
        for token in argv.iter().skip(1).filter_map(|t| t.to_str()) {
            if token.starts_with('-') {
                continue;
            }
            if let Some(child) = node.find_child(token) {
                path.push(child.name.clone());
                node = child;
            }
        }
        let mut cmd = self.command();
        cmd.build();
        render_help_at(&mut cmd, &path)
    }

    /// Run the handler of the matched node with hooks around it.
    pub fn run(&self, inv: &Invocation) -> CliResult<()> {
        let node = self
            .root
            .find(&inv.path)
            .ok_or_else(|| CliError::Usage(format!("unknown command {:?}", inv.command_name())))?;
        let handler = node
            .handler
            .as_ref()
            .ok_or_else(|| CliError::Usage(format!("{:?} needs a subcommand", inv.command_name())))?;

        if let Some(notice) = node.deprecation_notice() {
            output::warning(&notice);
        }
        node.arity
            .check(inv.args.len())
            .map_err(|e| CliError::Usage(e.to_string()))?;

        let resolved = ConfigResolver::new(&global_flags_of(inv)).resolve();
        // Pre-dispatch: expand TLS paths against the resolved home
        let tls = tls_config_of(inv).expanded(&resolved.home, |name| std::env::var(name).ok());
        debug!("Running {:?} (home {})", inv.command_name(), resolved.home);

        let mut session = Session::new(self, resolved, tls);
        let result = handler(&mut session, inv);
        // Post-dispatch: always release the tunnel
        session.teardown();
        result
    }

    /// Parse and run; help output goes to stdout.
    pub fn dispatch<I, T>(&self, argv: I) -> CliResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.parse(argv)? {
            Dispatch::Help(text) => {
                print!("{}", text);
                Ok(())
            }
            Dispatch::Run(inv) => self.run(&inv),
        }
    }
}

fn to_clap(node: &CommandNode) -> clap::Command {
    let mut cmd = clap::Command::new(node.name.clone())
        .about(node.short_help.clone())
        .hide(node.hidden || node.deprecated.is_some());
    if !node.long_help.is_empty() {
        cmd = cmd.long_about(node.long_help.clone());
    }
    for alias in &node.aliases {
        cmd = cmd.visible_alias(alias.clone());
    }
    for flag in &node.flags {
        cmd = cmd.arg(to_arg(flag));
    }

    if node.handler.is_some() {
        let mut positional = Arg::new(ARGS_ID)
            .num_args(0..)
            .action(ArgAction::Append)
            .value_name("ARGS")
            .hide(true);
        if node.passthrough {
            positional = positional.allow_hyphen_values(true).trailing_var_arg(true);
            cmd = cmd.disable_help_flag(true);
        }
        cmd = cmd.arg(positional);
        let usage = node.arity.usage();
        if !usage.is_empty() {
            cmd = cmd.override_usage(format!("{} [flags] {}", node.name, usage));
        }
    } else if !node.children.is_empty() {
        cmd = cmd.subcommand_required(true).arg_required_else_help(true);
    }

    for child in &node.children {
        cmd = cmd.subcommand(to_clap(child));
    }
    cmd
}

fn to_arg(flag: &FlagSpec) -> Arg {
    let mut arg = Arg::new(flag.name.clone())
        .long(flag.name.clone())
        .help(flag.help.clone())
        .global(flag.persistent);
    if let Some(short) = flag.short {
        arg = arg.short(short);
    }
    match &flag.kind {
        FlagKind::Switch => arg.action(ArgAction::SetTrue),
        FlagKind::Value {
            value_name,
            default,
        } => {
            arg = arg.action(ArgAction::Set).value_name(value_name.clone());
            if let Some(default) = default {
                arg = arg.default_value(default.clone());
            }
            arg
        }
    }
}

fn read_flags(matches: &ArgMatches, specs: &[&FlagSpec]) -> BTreeMap<String, FlagValue> {
    specs
        .iter()
        .map(|spec| {
            let value = match spec.kind {
                FlagKind::Switch => FlagValue::Switch(
                    matches
                        .try_get_one::<bool>(&spec.name)
                        .ok()
                        .flatten()
                        .copied()
                        .unwrap_or(false),
                ),
                FlagKind::Value { .. } => FlagValue::Value(
                    matches
                        .try_get_one::<String>(&spec.name)
                        .ok()
                        .flatten()
                        .cloned(),
                ),
            };
            (spec.name.clone(), value)
        })
        .collect()
}

/// Pull persistent flags out of arguments that clap handed over unparsed.
fn lift_global_flags(inv: &mut Invocation) {
    let value_flags = args::global_value_flags();
    let mut rest = Vec::with_capacity(inv.args.len());
    let mut tokens = std::mem::take(&mut inv.args).into_iter();
    while let Some(token) = tokens.next() {
        if token == "--" {
            rest.push(token);
            rest.extend(tokens.by_ref());
            break;
        }
        if token == format!("--{}", args::DEBUG) {
            inv.flags.insert(args::DEBUG.to_string(), FlagValue::Switch(true));
            continue;
        }
        let lifted = value_flags.iter().find_map(|name| {
            let long = format!("--{}", name);
            if token == long {
                Some((*name, tokens.next()))
            } else {
                token
                    .strip_prefix(&format!("{}=", long))
                    .map(|v| (*name, Some(v.to_string())))
            }
        });
        match lifted {
            Some((name, value)) => {
                inv.flags
                    .insert(name.to_string(), FlagValue::Value(value));
            }
            None => rest.push(token),
        }
    }
    inv.args = rest;
}

fn render_help_at(cmd: &mut clap::Command, path: &[String]) -> String {
    match path.split_first() {
        Some((name, rest)) => match cmd.find_subcommand_mut(name) {
            Some(sub) => render_help_at(sub, rest),
            None => cmd.render_help().to_string(),
        },
        None => cmd.render_help().to_string(),
    }
}

/// First line of a clap error without its `error: ` prefix.
fn usage_message(rendered: &str) -> String {
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
