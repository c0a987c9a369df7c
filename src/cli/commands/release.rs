//! Release lifecycle commands: everything that talks to the remote service
//!
//! Each handler turns its positional arguments and command flags into one
//! `RemoteRequest` and prints the response body as is.

use tracing::debug;

use crate::application::IoResultExt;
use crate::cli::args::with_tls_flags;
use crate::cli::error::CliResult;
use crate::cli::node::{CommandNode, Invocation};
use crate::cli::output;
use crate::cli::session::Session;
use crate::domain::{Arity, FlagSpec, RemoteRequest};

const INSTALL_FLAGS: &[&str] = &[
    "name",
    "namespace",
    "values",
    "set",
    "version",
    "dry-run",
    "replace",
    "no-hooks",
    "wait",
    "timeout",
];
const UPGRADE_FLAGS: &[&str] = &[
    "install",
    "namespace",
    "values",
    "set",
    "version",
    "dry-run",
    "recreate-pods",
    "reset-values",
    "reuse-values",
    "no-hooks",
    "wait",
    "timeout",
];
const ROLLBACK_FLAGS: &[&str] = &["dry-run", "recreate-pods", "no-hooks", "wait", "timeout"];
const REVISION_FLAGS: &[&str] = &["revision"];
const HISTORY_FLAGS: &[&str] = &["max"];
const LIST_FLAGS: &[&str] = &[
    "short", "max", "offset", "date", "reverse", "all", "deployed", "deleted", "failed",
    "namespace",
];
const DELETE_FLAGS: &[&str] = &["purge", "dry-run", "no-hooks", "timeout"];
const TEST_FLAGS: &[&str] = &["cleanup", "timeout"];
const RESET_FLAGS: &[&str] = &["force"];

pub fn commands() -> Vec<CommandNode> {
    vec![
        remote(
            CommandNode::new("install", "install a chart archive")
                .long("This command installs a chart archive.")
                .arity(Arity::exact(&["chart name"]))
                .flags([
                    FlagSpec::value("name", "NAME", "release name. If unspecified, it will autogenerate one for you")
                        .with_short('n'),
                    FlagSpec::value("namespace", "NAMESPACE", "namespace to install the release into"),
                    FlagSpec::value("values", "FILE", "specify values in a YAML file").with_short('f'),
                    FlagSpec::value("set", "KEY=VAL", "set values on the command line"),
                    FlagSpec::value("version", "VERSION", "specify the exact chart version to install"),
                    FlagSpec::switch("dry-run", "simulate an install"),
                    FlagSpec::switch("replace", "re-use the given name, even if that name is already used"),
                    FlagSpec::switch("no-hooks", "prevent hooks from running during install"),
                    FlagSpec::switch("wait", "wait until all resources are ready"),
                    FlagSpec::value("timeout", "SECONDS", "time to wait for any individual operation")
                        .with_default("300"),
                ]),
            "install",
            INSTALL_FLAGS,
        ),
        remote(
            CommandNode::new("upgrade", "upgrade a release")
                .long("This command upgrades a release to a new version of a chart.")
                .arity(Arity::exact(&["release name", "chart path"]))
                .flags([
                    FlagSpec::switch("install", "run an install if a release by this name doesn't already exist")
                        .with_short('i'),
                    FlagSpec::value("namespace", "NAMESPACE", "namespace to install the release into (only used with --install)"),
                    FlagSpec::value("values", "FILE", "specify values in a YAML file").with_short('f'),
                    FlagSpec::value("set", "KEY=VAL", "set values on the command line"),
                    FlagSpec::value("version", "VERSION", "specify the exact chart version to use"),
                    FlagSpec::switch("dry-run", "simulate an upgrade"),
                    FlagSpec::switch("recreate-pods", "performs pods restart for the resource if applicable"),
                    FlagSpec::switch("reset-values", "reset the values to the ones built into the chart"),
                    FlagSpec::switch("reuse-values", "reuse the last release's values and merge in overrides"),
                    FlagSpec::switch("no-hooks", "disable pre/post upgrade hooks"),
                    FlagSpec::switch("wait", "wait until all resources are ready"),
                    FlagSpec::value("timeout", "SECONDS", "time to wait for any individual operation")
                        .with_default("300"),
                ]),
            "upgrade",
            UPGRADE_FLAGS,
        ),
        remote(
            CommandNode::new("rollback", "roll back a release to a previous revision")
                .arity(Arity::exact(&["release name", "revision number"]))
                .flags([
                    FlagSpec::switch("dry-run", "simulate a rollback"),
                    FlagSpec::switch("recreate-pods", "performs pods restart for the resource if applicable"),
                    FlagSpec::switch("no-hooks", "prevent hooks from running during rollback"),
                    FlagSpec::switch("wait", "wait until all resources are ready"),
                    FlagSpec::value("timeout", "SECONDS", "time to wait for any individual operation")
                        .with_default("300"),
                ]),
            "rollback",
            ROLLBACK_FLAGS,
        ),
        remote(
            CommandNode::new("status", "displays the status of the named release")
                .arity(Arity::exact(&["release name"]))
                .flag(FlagSpec::value("revision", "N", "if set, display the status of the named release with revision")),
            "status",
            REVISION_FLAGS,
        ),
        remote(
            CommandNode::new("get", "download a named release")
                .long("This command shows the details of a named release.")
                .arity(Arity::exact(&["release name"]))
                .flag(FlagSpec::value("revision", "N", "get the named release with revision")),
            "get",
            REVISION_FLAGS,
        ),
        remote(
            CommandNode::new("history", "fetch release history")
                .alias("hist")
                .arity(Arity::exact(&["release name"]))
                .flag(FlagSpec::value("max", "N", "maximum number of revision to include in history").with_default("256")),
            "history",
            HISTORY_FLAGS,
        ),
        remote(
            CommandNode::new("list", "list releases")
                .alias("ls")
                .long("This command lists all of the releases.\n\nBy default, it lists only releases that are deployed or failed.")
                .arity(Arity::at_most(&["filter"]))
                .flags([
                    FlagSpec::switch("short", "output short (quiet) listing format").with_short('q'),
                    FlagSpec::value("max", "N", "maximum number of releases to fetch").with_short('m').with_default("256"),
                    FlagSpec::value("offset", "NAME", "next release name in the list, used to offset from start value").with_short('o'),
                    FlagSpec::switch("date", "sort by release date").with_short('d'),
                    FlagSpec::switch("reverse", "reverse the sort order").with_short('r'),
                    FlagSpec::switch("all", "show all releases, not just the ones marked DEPLOYED"),
                    FlagSpec::switch("deployed", "show deployed releases. If no other is specified, this will be automatically enabled"),
                    FlagSpec::switch("deleted", "show deleted releases"),
                    FlagSpec::switch("failed", "show failed releases"),
                    FlagSpec::value("namespace", "NAMESPACE", "show releases within a specific namespace"),
                ]),
            "list",
            LIST_FLAGS,
        ),
        remote(
            CommandNode::new("delete", "given a release name, delete the release from Kubernetes")
                .alias("del")
                .arity(Arity::at_least(&["release name"]))
                .flags([
                    FlagSpec::switch("purge", "remove the release from the store and make its name free for later use"),
                    FlagSpec::switch("dry-run", "simulate a delete"),
                    FlagSpec::switch("no-hooks", "prevent hooks from running during deletion"),
                    FlagSpec::value("timeout", "SECONDS", "time to wait for any individual operation")
                        .with_default("300"),
                ]),
            "delete",
            DELETE_FLAGS,
        ),
        remote(
            CommandNode::new("test", "test a release")
                .alias("release-test")
                .long("The test command runs the tests for a release.")
                .arity(Arity::exact(&["release name"]))
                .flags([
                    FlagSpec::switch("cleanup", "delete test pods upon completion"),
                    FlagSpec::value("timeout", "SECONDS", "time to wait for any individual operation")
                        .with_default("300"),
                ]),
            "test",
            TEST_FLAGS,
        ),
        with_tls_flags(
            CommandNode::new("reset", "uninstalls Tiller from a cluster")
                .flags([
                    FlagSpec::switch("force", "forces Tiller uninstall even if there are releases installed")
                        .with_short('f'),
                    FlagSpec::switch("remove-helm-home", "if set deletes $HELM_HOME"),
                ])
                .handler(reset),
        ),
        with_tls_flags(
            CommandNode::new("version", "print the client/server version information")
                .flags([
                    FlagSpec::switch("client", "client version only").with_short('c'),
                    FlagSpec::switch("server", "server version only").with_short('s'),
                ])
                .handler(version),
        ),
    ]
}

/// Attach TLS flags and a handler forwarding to `operation`.
fn remote(node: CommandNode, operation: &'static str, flags: &'static [&'static str]) -> CommandNode {
    with_tls_flags(node).handler(move |session, inv| {
        let body = session.call(RemoteRequest::new(operation, inv.args.clone(), inv.flag_map(flags)))?;
        output::body(&body);
        Ok(())
    })
}

fn reset(session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    let body = session.call(RemoteRequest::new("reset", Vec::new(), inv.flag_map(RESET_FLAGS)))?;
    output::body(&body);

    if inv.switch("remove-helm-home") {
        let home = session.home().path().to_path_buf();
        debug!("Removing {}", home.display());
        let fs = &session.services().fs;
        if fs.is_dir(&home) {
            fs.remove_dir_all(&home)
                .with_path_context("remove helm home", &home)?;
        }
        output::info(&format!("Deleting {}", home.display()));
    }
    output::info("Tiller (the helm server side component) has been uninstalled from your Kubernetes Cluster.");
    Ok(())
}

fn version(session: &mut Session<'_>, inv: &Invocation) -> CliResult<()> {
    // Neither flag means both
    let (client, server) = match (inv.switch("client"), inv.switch("server")) {
        (false, false) => (true, true),
        pair => pair,
    };
    if client {
        output::info(&format!("Client: v{}", env!("CARGO_PKG_VERSION")));
    }
    if server {
        let body = session.call(RemoteRequest::new("version", Vec::new(), Default::default()))?;
        output::info(&format!("Server: {}", body.trim_end()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> CommandNode {
        commands().into_iter().find(|c| c.answers_to(name)).unwrap()
    }

    #[test]
    fn test_forwarded_flag_names_are_declared() {
        let cases: &[(&str, &[&str])] = &[
            ("install", INSTALL_FLAGS),
            ("upgrade", UPGRADE_FLAGS),
            ("rollback", ROLLBACK_FLAGS),
            ("status", REVISION_FLAGS),
            ("history", HISTORY_FLAGS),
            ("list", LIST_FLAGS),
            ("delete", DELETE_FLAGS),
            ("test", TEST_FLAGS),
            ("reset", RESET_FLAGS),
        ];
        for (command, names) in cases {
            let node = find(command);
            for name in *names {
                assert!(
                    node.flags.iter().any(|f| f.name == *name),
                    "{command} forwards undeclared flag {name}"
                );
            }
        }
    }

    #[test]
    fn test_release_test_alias() {
        assert_eq!(find("release-test").name, "test");
    }
}
