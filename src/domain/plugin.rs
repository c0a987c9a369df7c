//! Plugin manifests and the descriptors built from them.
//!
//! A plugin lives in its own directory below the plugins root and declares
//! itself in a `plugin.toml`:
//!
//! ```toml
//! name = "last"
//! version = "0.1.0"
//! usage = "get the last release name"
//! description = "get the last release name"
//! command = "$HELM_BIN --host $TILLER_HOST list --short --max 1 --date -r"
//! ignore_flags = false
//! use_tunnel = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::DomainError;

/// File name of a plugin manifest inside a plugin directory.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Raw manifest as written by the plugin author.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub usage: String,
    pub description: String,
    /// Command line to execute; environment references are expanded at run time
    pub command: String,
    /// Drop flag-like arguments before forwarding
    pub ignore_flags: bool,
    /// Establish the tunnel to the remote service before running
    pub use_tunnel: bool,
}

impl PluginManifest {
    pub fn parse(content: &str, path: &Path) -> Result<Self, DomainError> {
        toml::from_str(content).map_err(|e| DomainError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// A discovered plugin, ready to become a command node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: String,
    pub version: String,
    pub short_help: String,
    pub long_help: String,
    /// Directory the manifest was found in
    pub dir: PathBuf,
    pub command: String,
    pub ignore_flags: bool,
    pub use_tunnel: bool,
}

impl PluginDescriptor {
    pub fn from_manifest(manifest: PluginManifest, dir: &Path) -> Result<Self, DomainError> {
        validate_name(&manifest.name)?;
        if manifest.command.trim().is_empty() {
            return Err(DomainError::InvalidPlugin {
                name: manifest.name,
                message: "no command given".to_string(),
            });
        }
        let short_help = if manifest.usage.is_empty() {
            format!("the {:?} plugin", manifest.name)
        } else {
            manifest.usage
        };
        Ok(Self {
            name: manifest.name,
            version: manifest.version,
            short_help,
            long_help: manifest.description,
            dir: dir.to_path_buf(),
            command: manifest.command,
            ignore_flags: manifest.ignore_flags,
            use_tunnel: manifest.use_tunnel,
        })
    }

    /// Expand the manifest command and split it into executable and base arguments.
    ///
    /// Relative executables containing a path separator resolve against the plugin
    /// directory; bare names are left for `PATH` lookup.
    pub fn command_line<F>(&self, lookup: F) -> Result<(PathBuf, Vec<String>), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = shellexpand::env_with_context_no_errors(&self.command, |var| lookup(var));
        let mut tokens = expanded.split_whitespace().map(str::to_string);
        let program = tokens.next().ok_or_else(|| DomainError::InvalidPlugin {
            name: self.name.clone(),
            message: format!("command {:?} expands to nothing", self.command),
        })?;
        let program = PathBuf::from(program);
        let program = if program.is_relative() && program.components().count() > 1 {
            self.dir.join(program)
        } else {
            program
        };
        Ok((program, tokens.collect()))
    }

    /// Arguments to forward, honoring `ignore_flags`.
    pub fn forwarded_args(&self, args: &[String]) -> Vec<String> {
        if self.ignore_flags {
            args.iter().filter(|a| !a.starts_with('-')).cloned().collect()
        } else {
            args.to_vec()
        }
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let invalid = |message: &str| DomainError::InvalidPlugin {
        name: name.to_string(),
        message: message.to_string(),
    };
    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.starts_with('-') {
        return Err(invalid("name must not start with '-'"));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(invalid("name must not contain whitespace or path separators"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, command: &str) -> PluginManifest {
        PluginManifest {
            name: name.to_string(),
            command: command.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn given_toml_manifest_when_parsing_then_reads_all_fields() {
        let content = r#"
name = "keybase"
version = "0.1.0"
usage = "Integrate Keybase.io tools with Helm"
description = "sign and verify charts"
command = "$HELM_PLUGIN_DIR/keybase.sh"
ignore_flags = true
use_tunnel = true
"#;
        let m = PluginManifest::parse(content, Path::new("plugin.toml")).unwrap();

        assert_eq!(m.name, "keybase");
        assert_eq!(m.version, "0.1.0");
        assert_eq!(m.command, "$HELM_PLUGIN_DIR/keybase.sh");
        assert!(m.ignore_flags);
        assert!(m.use_tunnel);
    }

    #[test]
    fn given_garbage_when_parsing_then_invalid_manifest() {
        let err = PluginManifest::parse("name = [", Path::new("/p/plugin.toml")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidManifest { .. }));
    }

    #[test]
    fn given_bad_names_when_building_descriptor_then_rejected() {
        for name in ["", "two words", "a/b", "-x"] {
            let result = PluginDescriptor::from_manifest(manifest(name, "run"), Path::new("/p"));
            assert!(result.is_err(), "name {:?} should be rejected", name);
        }
    }

    #[test]
    fn given_empty_command_when_building_descriptor_then_rejected() {
        let result = PluginDescriptor::from_manifest(manifest("empty", "  "), Path::new("/p"));
        assert!(matches!(result, Err(DomainError::InvalidPlugin { .. })));
    }

    #[test]
    fn given_plugin_dir_reference_when_building_command_line_then_expands() {
        let d = PluginDescriptor::from_manifest(
            manifest("echo", "$HELM_PLUGIN_DIR/bin/echo.sh --loud"),
            Path::new("/plugins/echo"),
        )
        .unwrap();

        let (program, args) = d
            .command_line(|var| (var == "HELM_PLUGIN_DIR").then(|| "/plugins/echo".to_string()))
            .unwrap();

        assert_eq!(program, PathBuf::from("/plugins/echo/bin/echo.sh"));
        assert_eq!(args, vec!["--loud".to_string()]);
    }

    #[test]
    fn given_relative_program_when_building_command_line_then_joins_plugin_dir() {
        let d =
            PluginDescriptor::from_manifest(manifest("rel", "bin/run"), Path::new("/plugins/rel"))
                .unwrap();
        let (program, _) = d.command_line(|_| None).unwrap();
        assert_eq!(program, PathBuf::from("/plugins/rel/bin/run"));

        let d = PluginDescriptor::from_manifest(manifest("bare", "sh -c true"), Path::new("/p"))
            .unwrap();
        let (program, args) = d.command_line(|_| None).unwrap();
        assert_eq!(program, PathBuf::from("sh"));
        assert_eq!(args, vec!["-c".to_string(), "true".to_string()]);
    }

    #[test]
    fn given_ignore_flags_when_forwarding_then_drops_flag_arguments() {
        let mut d =
            PluginDescriptor::from_manifest(manifest("f", "run"), Path::new("/p")).unwrap();
        let args = vec!["a".to_string(), "--debug".to_string(), "b".to_string()];

        assert_eq!(d.forwarded_args(&args), args);

        d.ignore_flags = true;
        assert_eq!(d.forwarded_args(&args), vec!["a".to_string(), "b".to_string()]);
    }
}
