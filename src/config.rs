//! Connection configuration resolution
//!
//! Precedence per field (highest first):
//! 1. Explicit CLI flag (`--home`, `--host`, `--tiller-namespace`, ...)
//! 2. Environment variables: `HELM_HOME`, `HELM_HOST`, `TILLER_NAMESPACE`
//! 3. Compiled defaults
//!
//! Path-like values go through `$VAR` / `${VAR}` expansion, where `$HELM_HOME`
//! always refers to the already resolved home directory.

use std::path::PathBuf;

use crate::domain::HelmHome;

pub const HOME_ENV_VAR: &str = "HELM_HOME";
pub const HOST_ENV_VAR: &str = "HELM_HOST";
pub const TILLER_NAMESPACE_ENV_VAR: &str = "TILLER_NAMESPACE";
pub const NO_PLUGINS_ENV_VAR: &str = "HELM_NO_PLUGINS";
pub const PLUGINS_ENV_VAR: &str = "HELM_PLUGIN";

/// Namespace the remote service runs in unless told otherwise.
pub const DEFAULT_TILLER_NAMESPACE: &str = "kube-system";

pub const DEFAULT_TLS_CA_CERT: &str = "$HELM_HOME/ca.pem";
pub const DEFAULT_TLS_CERT: &str = "$HELM_HOME/cert.pem";
pub const DEFAULT_TLS_KEY: &str = "$HELM_HOME/key.pem";

/// Values of the persistent flags as given on the command line.
///
/// `None` means "not given", which lets the environment and defaults apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    pub home: Option<String>,
    pub host: Option<String>,
    pub kube_context: Option<String>,
    pub tiller_namespace: Option<String>,
    pub debug: bool,
}

impl GlobalFlags {
    /// Pick `--home` and `--debug` out of raw arguments before the command tree exists.
    ///
    /// Scanning stops at `--`. Unknown arguments are ignored.
    pub fn prescan<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            match arg {
                "--" => break,
                "--debug" => flags.debug = true,
                "--home" => flags.home = args.next().map(|v| v.as_ref().to_string()),
                _ => {
                    if let Some(value) = arg.strip_prefix("--home=") {
                        flags.home = Some(value.to_string());
                    }
                }
            }
        }
        flags
    }
}

/// Where and how to reach the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// `host:port` of the remote service; `None` means tunnel through the cluster
    pub remote_address: Option<String>,
    /// kubeconfig context used for tunneling
    pub cluster_context: Option<String>,
    /// Never empty
    pub remote_namespace: String,
}

/// Everything the resolver produces for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub home: HelmHome,
    pub connection: ConnectionConfig,
    pub debug: bool,
}

/// Transport security settings, as declared by the TLS flags of remote commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Enable TLS and verify the remote certificate chain
    pub verify: bool,
    /// Enable TLS without verifying the remote
    pub enable: bool,
    pub ca_cert: PathBuf,
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            verify: false,
            enable: false,
            ca_cert: PathBuf::from(DEFAULT_TLS_CA_CERT),
            cert: PathBuf::from(DEFAULT_TLS_CERT),
            key: PathBuf::from(DEFAULT_TLS_KEY),
        }
    }
}

impl TlsConfig {
    /// Verification implies TLS.
    pub fn is_enabled(&self) -> bool {
        self.verify || self.enable
    }

    /// Expand environment references in the file paths. No existence check.
    pub fn expanded<F>(self, home: &HelmHome, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let expand = |p: &PathBuf| PathBuf::from(expand_path(&p.to_string_lossy(), home, &lookup));
        Self {
            ca_cert: expand(&self.ca_cert),
            cert: expand(&self.cert),
            key: expand(&self.key),
            ..self
        }
    }
}

/// Resolves the connection configuration from flags, environment and defaults.
pub struct ConfigResolver<'a> {
    flags: &'a GlobalFlags,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(flags: &'a GlobalFlags) -> Self {
        Self { flags }
    }

    /// Resolve against the process environment and re-export `HELM_HOME`.
    ///
    /// The export keeps handlers and spawned plugins consistent with the
    /// resolved home.
    pub fn resolve(&self) -> ResolvedConfig {
        let resolved = self.resolve_with(|name| std::env::var(name).ok());
        std::env::set_var(HOME_ENV_VAR, resolved.home.path());
        resolved
    }

    /// Resolve against an arbitrary environment lookup. No side effects.
    pub fn resolve_with<F>(&self, lookup: F) -> ResolvedConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_home = given(&self.flags.home)
            .or_else(|| given(&lookup(HOME_ENV_VAR)))
            .unwrap_or_else(|| default_helm_home(&lookup));
        let home = HelmHome::new(expand_env(&raw_home, &lookup));

        let remote_address = given(&self.flags.host).or_else(|| given(&lookup(HOST_ENV_VAR)));
        let remote_namespace = given(&self.flags.tiller_namespace)
            .or_else(|| given(&lookup(TILLER_NAMESPACE_ENV_VAR)))
            .unwrap_or_else(|| DEFAULT_TILLER_NAMESPACE.to_string());

        ResolvedConfig {
            home,
            connection: ConnectionConfig {
                remote_address,
                cluster_context: given(&self.flags.kube_context),
                remote_namespace,
            },
            debug: self.flags.debug,
        }
    }
}

/// Expand `$VAR` and `${VAR}`, with `$HELM_HOME` bound to `home`.
///
/// Unknown variables are left as written.
pub fn expand_path<F>(value: &str, home: &HelmHome, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    shellexpand::env_with_context_no_errors(value, |var| {
        if var == HOME_ENV_VAR {
            Some(home.path().to_string_lossy().into_owned())
        } else {
            lookup(var)
        }
    })
    .into_owned()
}

fn expand_env<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    shellexpand::env_with_context_no_errors(value, |var| lookup(var)).into_owned()
}

/// Whether plugin discovery is enabled (`HELM_NO_PLUGINS` not truthy).
pub fn plugins_enabled<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    !lookup(NO_PLUGINS_ENV_VAR)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Plugins root: `$HELM_PLUGIN` if set, else `<home>/plugins`.
pub fn plugins_root<F>(home: &HelmHome, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match given(&lookup(PLUGINS_ENV_VAR)) {
        Some(dir) => PathBuf::from(expand_path(&dir, home, &lookup)),
        None => home.plugins(),
    }
}

/// `<user-home>/.helm`
fn default_helm_home<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let user_home = given(&lookup("HOME"))
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
        .unwrap_or_default();
    user_home.join(".helm").to_string_lossy().into_owned()
}

fn given(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
