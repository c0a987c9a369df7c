//! Local utility commands: home, init, completion, plugin

use std::io;
use std::str::FromStr;

use clap_complete::Shell;
use tracing::debug;

use crate::application::IoResultExt;
use crate::cli::error::{CliError, CliResult};
use crate::cli::node::{CommandNode, Invocation};
use crate::cli::output;
use crate::cli::session::Session;
use crate::domain::{Arity, FlagSpec};

const EMPTY_REPOSITORY_FILE: &str = "apiVersion: v1\nrepositories: []\n";

pub fn commands() -> Vec<CommandNode> {
    vec![
        CommandNode::new("home", "displays the location of HELM_HOME")
            .long("This command displays the location of HELM_HOME. This is where\nany helm configuration files live.")
            .handler(home),
        CommandNode::new("init", "initialize Helm on both client and server")
            .long("This command sets up local configuration in $HELM_HOME (default ~/.helm/).")
            .flags([
                FlagSpec::switch("client-only", "if set does not install Tiller").with_short('c'),
                FlagSpec::switch("dry-run", "do not create anything, just list what would be created"),
            ])
            .handler(init),
        CommandNode::new("completion", "Generate autocompletions script for the specified shell (bash, zsh, fish, elvish or powershell)")
            .arity(Arity::exact(&["shell"]))
            .handler(completion),
        CommandNode::new("plugin", "add, list, or remove Helm plugins")
            .child(CommandNode::new("list", "list installed Helm plugins").alias("ls").handler(plugin_list)),
    ]
}

fn home(session: &mut Session<'_>, _inv: &Invocation) -> CliResult<()> {
    let home = session.home();
    output::info(home);
    if session.debug() {
        for (name, path) in home.path_variables() {
            output::detail(&format!("{}: {}", name, path.display()));
        }
    }
    Ok(())
}

/// Create the home layout and an empty repository file. Existing entries are kept.
fn init(session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    let home = session.home().clone();
    let fs = &session.services().fs;
    let dry_run = inv.switch("dry-run");

    for dir in home.layout() {
        if fs.is_dir(&dir) {
            continue;
        }
        if dry_run {
            output::detail(&format!("would create {}", dir.display()));
            continue;
        }
        debug!("Creating {}", dir.display());
        fs.create_dir_all(&dir)
            .with_path_context("create directory", &dir)?;
    }

    let repo_file = home.repository_file();
    if !fs.exists(&repo_file) {
        if dry_run {
            output::detail(&format!("would create {}", repo_file.display()));
        } else {
            fs.write(&repo_file, EMPTY_REPOSITORY_FILE)
                .with_path_context("write", &repo_file)?;
        }
    }

    if !dry_run {
        output::success(&format!("$HELM_HOME has been configured at {}.", home));
    }
    if !inv.switch("client-only") {
        output::info("Not installing Tiller: server-side installation is managed outside this client.");
    }
    Ok(())
}

fn completion(session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    let name = inv.args.first().map(String::as_str).unwrap_or_default();
    let shell = Shell::from_str(name)
        .map_err(|_| CliError::InvalidArgs(format!("unsupported shell type {:?}", name)))?;
    let mut cmd = session.router().command();
    clap_complete::generate(shell, &mut cmd, "helm", &mut io::stdout());
    Ok(())
}

fn plugin_list(session: &mut Session<'_>, _inv: &Invocation) -> CliResult<()> {
    let plugins = session.router().plugins();
    if plugins.is_empty() {
        output::info("No plugins found");
        return Ok(());
    }
    output::plugin_table(plugins);
    Ok(())
}
