//! Built-in command tree

pub mod chart;
pub mod docs;
pub mod plugin;
pub mod release;
pub mod utility;

use crate::cli::args;
use crate::cli::node::CommandNode;

const GLOBAL_USAGE: &str = "The Kubernetes package manager

To begin working with Helm, run the 'helm init' command:

	$ helm init

This will set up any necessary local configuration.

Common actions from this point include:

- helm search:    search for charts
- helm fetch:     download a chart to your local directory to view
- helm install:   upload the chart to Kubernetes
- helm list:      list releases of charts

Environment:
  $HELM_HOME          set an alternative location for Helm files. By default, these are stored in ~/.helm
  $HELM_HOST          set an alternative Tiller host. The format is host:port
  $HELM_NO_PLUGINS    disable plugins. Set HELM_NO_PLUGINS=1 to disable plugins.
  $HELM_PLUGIN        set an alternative location for plugins. By default, these are stored in $HELM_HOME/plugins
  $TILLER_NAMESPACE   set an alternative Tiller namespace (default \"kube-system\")
  $KUBECONFIG         set an alternative Kubernetes configuration file (default \"~/.kube/config\")
";

/// The root with every built-in command; plugins are merged in later.
pub fn root_command() -> CommandNode {
    let root = CommandNode::new("helm", "The Helm package manager for Kubernetes.")
        .long(GLOBAL_USAGE)
        .flags(args::global_flags());

    let children = chart::commands()
        .into_iter()
        .chain(release::commands())
        .chain(utility::commands())
        .chain([docs::command(), chart::deprecated_update()]);
    children.fold(root, CommandNode::child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sibling_names_are_unique() {
        let root = root_command();
        let mut nodes = vec![&root];
        nodes.extend(root.walk().into_iter().map(|(_, n)| n));
        for node in nodes {
            let mut seen = HashSet::new();
            for child in &node.children {
                for name in std::iter::once(&child.name).chain(&child.aliases) {
                    assert!(seen.insert(name.clone()), "duplicate {:?} under {:?}", name, node.name);
                }
            }
        }
    }

    #[test]
    fn test_only_remote_commands_carry_tls_flags() {
        let root = root_command();
        for name in ["install", "list", "delete", "test", "reset", "version"] {
            let node = root.find(&[name]).unwrap();
            assert!(node.flags.iter().any(|f| f.name == args::TLS), "{name}");
        }
        for name in ["home", "init", "create", "completion"] {
            let node = root.find(&[name]).unwrap();
            assert!(node.flags.iter().all(|f| f.name != args::TLS), "{name}");
        }
    }

    #[test]
    fn test_persistent_flags_live_on_root_only() {
        let root = root_command();
        assert_eq!(root.flags.iter().filter(|f| f.persistent).count(), 5);
        assert!(root
            .walk()
            .iter()
            .all(|(_, n)| n.flags.iter().all(|f| !f.persistent)));
    }
}
