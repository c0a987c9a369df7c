//! Flag declarations shared across the command tree

use std::path::PathBuf;

use crate::cli::node::{CommandNode, Invocation};
use crate::config::{GlobalFlags, TlsConfig, DEFAULT_TLS_CA_CERT, DEFAULT_TLS_CERT, DEFAULT_TLS_KEY};
use crate::domain::FlagSpec;

pub const HOME: &str = "home";
pub const HOST: &str = "host";
pub const KUBE_CONTEXT: &str = "kube-context";
pub const DEBUG: &str = "debug";
pub const TILLER_NAMESPACE: &str = "tiller-namespace";

pub const TLS: &str = "tls";
pub const TLS_VERIFY: &str = "tls-verify";
pub const TLS_CA_CERT: &str = "tls-ca-cert";
pub const TLS_CERT: &str = "tls-cert";
pub const TLS_KEY: &str = "tls-key";

/// Persistent flags declared on the root.
///
/// None of them has a default here: an absent value lets the environment apply.
pub fn global_flags() -> Vec<FlagSpec> {
    vec![
        FlagSpec::value(HOME, "DIR", "location of your Helm config. Overrides $HELM_HOME")
            .persistent(),
        FlagSpec::value(HOST, "HOST:PORT", "address of tiller. Overrides $HELM_HOST").persistent(),
        FlagSpec::value(KUBE_CONTEXT, "CONTEXT", "name of the kubeconfig context to use")
            .persistent(),
        FlagSpec::switch(DEBUG, "enable verbose output").persistent(),
        FlagSpec::value(
            TILLER_NAMESPACE,
            "NAMESPACE",
            "namespace of tiller. Overrides $TILLER_NAMESPACE",
        )
        .persistent(),
    ]
}

/// Names of the persistent flags taking a value.
pub fn global_value_flags() -> [&'static str; 4] {
    [HOME, HOST, KUBE_CONTEXT, TILLER_NAMESPACE]
}

/// Add the TLS flags to a command that talks to the remote service.
pub fn with_tls_flags(node: CommandNode) -> CommandNode {
    node.flags([
        FlagSpec::value(TLS_CA_CERT, "FILE", "path to TLS CA certificate file")
            .with_default(DEFAULT_TLS_CA_CERT),
        FlagSpec::value(TLS_CERT, "FILE", "path to TLS certificate file")
            .with_default(DEFAULT_TLS_CERT),
        FlagSpec::value(TLS_KEY, "FILE", "path to TLS key file").with_default(DEFAULT_TLS_KEY),
        FlagSpec::switch(TLS_VERIFY, "enable TLS for request and verify remote"),
        FlagSpec::switch(TLS, "enable TLS for request"),
    ])
}

pub fn global_flags_of(inv: &Invocation) -> GlobalFlags {
    let value = |name| inv.value(name).map(str::to_string);
    GlobalFlags {
        home: value(HOME),
        host: value(HOST),
        kube_context: value(KUBE_CONTEXT),
        tiller_namespace: value(TILLER_NAMESPACE),
        debug: inv.switch(DEBUG),
    }
}

/// TLS settings as given; paths still unexpanded. Commands without TLS flags
/// get the disabled defaults.
pub fn tls_config_of(inv: &Invocation) -> TlsConfig {
    let defaults = TlsConfig::default();
    let path = |name, default: PathBuf| inv.value(name).map(PathBuf::from).unwrap_or(default);
    TlsConfig {
        verify: inv.switch(TLS_VERIFY),
        enable: inv.switch(TLS),
        ca_cert: path(TLS_CA_CERT, defaults.ca_cert),
        cert: path(TLS_CERT, defaults.cert),
        key: path(TLS_KEY, defaults.key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_invocation_flags_when_reading_globals_then_maps_fields() {
        let inv = Invocation::new(&["list"], &[])
            .with_value(HOME, "/h")
            .with_value(TILLER_NAMESPACE, "ops")
            .with_switch(DEBUG, true);

        let flags = global_flags_of(&inv);

        assert_eq!(flags.home.as_deref(), Some("/h"));
        assert_eq!(flags.tiller_namespace.as_deref(), Some("ops"));
        assert_eq!(flags.host, None);
        assert!(flags.debug);
    }

    #[test]
    fn given_no_tls_flags_when_reading_tls_then_disabled_defaults() {
        let tls = tls_config_of(&Invocation::new(&["home"], &[]));
        assert_eq!(tls, TlsConfig::default());
    }

    #[test]
    fn test_tls_flags_have_home_relative_defaults() {
        let node = with_tls_flags(CommandNode::new("status", ""));
        let key = node.flags.iter().find(|f| f.name == TLS_KEY).unwrap();
        assert_eq!(
            key.kind,
            crate::domain::FlagKind::Value {
                value_name: "FILE".to_string(),
                default: Some("$HELM_HOME/key.pem".to_string()),
            }
        );
        assert!(node.flags.iter().all(|f| !f.persistent));
    }
}
