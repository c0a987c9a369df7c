//! Chart lifecycle commands
//!
//! These operate on local chart files and repositories. The chart toolkit is
//! not part of this client, so after argument validation every handler
//! reports `Unsupported`.

use crate::cli::error::{CliError, CliResult};
use crate::cli::node::{CommandNode, Invocation};
use crate::cli::session::Session;
use crate::domain::{Arity, FlagSpec};

pub fn commands() -> Vec<CommandNode> {
    vec![
        local(
            CommandNode::new("create", "create a new chart with the given name")
                .arity(Arity::exact(&["the name of chart"]))
                .flag(FlagSpec::value("starter", "NAME", "the named Helm starter scaffold").with_short('p')),
        ),
        local(
            CommandNode::new("fetch", "download a chart from a repository and (optionally) unpack it in local directory")
                .arity(Arity::at_least(&["chart URL | repo/chartname"]))
                .flags([
                    FlagSpec::switch("untar", "if set to true, will untar the chart after downloading it"),
                    FlagSpec::value("untardir", "DIR", "if untar is specified, this flag specifies the name of the directory into which the chart is expanded")
                        .with_default("."),
                    FlagSpec::switch("verify", "verify the package against its signature"),
                    FlagSpec::value("version", "VERSION", "specific version of a chart. Without this, the latest version is fetched"),
                    FlagSpec::value("destination", "DIR", "location to write the chart").with_short('d').with_default("."),
                ]),
        ),
        local(
            CommandNode::new("inspect", "inspect a chart")
                .arity(Arity::exact(&["chart name"]))
                .flag(FlagSpec::value("version", "VERSION", "version of the chart")),
        ),
        local(
            CommandNode::new("lint", "examines a chart for possible issues")
                .arity(Arity::at_most(&["path"]))
                .flag(FlagSpec::switch("strict", "fail on lint warnings")),
        ),
        local(
            CommandNode::new("package", "package a chart directory into a chart archive")
                .arity(Arity::at_least(&["chart path"]))
                .flags([
                    FlagSpec::switch("save", "save packaged chart to local chart repository"),
                    FlagSpec::switch("sign", "use a PGP private key to sign this package"),
                    FlagSpec::value("destination", "DIR", "location to write the chart").with_short('d').with_default("."),
                ]),
        ),
        CommandNode::new("repo", "add, list, remove, update, and index chart repositories")
            .child(local(
                CommandNode::new("add", "add a chart repository")
                    .arity(Arity::exact(&["name for the chart repository", "the url of the chart repository"]))
                    .flag(FlagSpec::switch("no-update", "raise error if repo is already registered")),
            ))
            .child(local(CommandNode::new("list", "list chart repositories")))
            .child(local(
                CommandNode::new("remove", "remove a chart repository")
                    .alias("rm")
                    .arity(Arity::exact(&["name of chart repository"])),
            ))
            .child(local(repo_update().alias("up")))
            .child(local(
                CommandNode::new("index", "generate an index file given a directory containing packaged charts")
                    .arity(Arity::exact(&["path to a directory"]))
                    .flags([
                        FlagSpec::value("url", "URL", "url of chart repository"),
                        FlagSpec::value("merge", "FILE", "merge the generated index into the given index"),
                    ]),
            )),
        local(
            CommandNode::new("search", "search for a keyword in charts")
                .arity(Arity::at_most(&["keyword"]))
                .flags([
                    FlagSpec::switch("regexp", "use regular expressions for searching").with_short('r'),
                    FlagSpec::switch("versions", "show the long listing, with each version of each chart on its own line")
                        .with_short('l'),
                ]),
        ),
        local(
            CommandNode::new("serve", "start a local http web server")
                .flags([
                    FlagSpec::value("address", "HOST:PORT", "address to listen on").with_default("127.0.0.1:8879"),
                    FlagSpec::value("repo-path", "DIR", "local directory path from which to serve charts"),
                ]),
        ),
        local(
            CommandNode::new("verify", "verify that a chart at the given path has been signed and is valid")
                .arity(Arity::exact(&["chart path"]))
                .flag(FlagSpec::value("keyring", "FILE", "keyring containing public keys")),
        ),
        CommandNode::new("dependency", "manage a chart's dependencies")
            .alias("dep")
            .alias("dependencies")
            .child(local(
                CommandNode::new("list", "list the dependencies for the given chart")
                    .alias("ls")
                    .arity(Arity::at_most(&["chart"])),
            ))
            .child(local(
                CommandNode::new("update", "update charts/ based on the contents of requirements.yaml")
                    .alias("up")
                    .arity(Arity::at_most(&["chart"])),
            ))
            .child(local(
                CommandNode::new("build", "rebuild the charts/ directory based on the requirements.lock file")
                    .arity(Arity::at_most(&["chart"])),
            )),
    ]
}

/// Top-level `update`, kept as a deprecated spelling of `repo update`.
pub fn deprecated_update() -> CommandNode {
    local(repo_update().alias("up").deprecated("use 'helm repo update'\n"))
}

fn repo_update() -> CommandNode {
    CommandNode::new("update", "update information on available charts in the chart repositories")
}

fn local(node: CommandNode) -> CommandNode {
    node.handler(unsupported)
}

fn unsupported(_session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    Err(CliError::Unsupported {
        command: inv.command_name(),
    })
}
