//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;

use crate::application::Channel;
use crate::domain::{RemoteCallError, RemoteRequest};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and all its contents.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Immediate children of a directory, sorted by file name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments and capture its output.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;

    /// Run a program attached to the current terminal and return its exit code.
    ///
    /// `env` is added on top of the inherited environment.
    fn run_interactive(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> io::Result<i32>;
}

/// Entry point into the cluster API for one kubeconfig context.
pub trait ClusterConnector: Send + Sync {
    /// Load cluster configuration for `context` (`None` = current context).
    fn connect(&self, context: Option<&str>) -> Result<Box<dyn ClusterAccessor>, String>;
}

/// Authenticated access to one cluster.
pub trait ClusterAccessor {
    /// Forward a local port to the remote service running in `namespace`.
    ///
    /// Blocks until the local port is known.
    fn forward(&self, namespace: &str) -> Result<Box<dyn ForwardHandle>, String>;
}

/// A running port-forward.
pub trait ForwardHandle: Send {
    fn local_port(&self) -> u16;

    /// Stop forwarding and release the local port. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Client for the remote release service bound to one channel.
pub trait ReleaseClient {
    /// Perform one named operation; returns the response body.
    fn call(&mut self, request: &RemoteRequest) -> Result<String, RemoteCallError>;
}

/// Creates release clients for established channels.
pub trait ReleaseClientFactory: Send + Sync {
    fn connect(&self, channel: &Channel) -> Result<Box<dyn ReleaseClient>, RemoteCallError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        use walkdir::WalkDir;

        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            entries.push(entry.into_path());
        }
        Ok(entries)
    }
}

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        std::process::Command::new(cmd).args(args).output()
    }

    fn run_interactive(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> io::Result<i32> {
        let status = std::process::Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status()?;

        // Killed by signal: report like a shell does
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Ok(128 + signal);
            }
        }
        Ok(status.code().unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_directory_when_reading_then_returns_sorted_children_only() {
        // Arrange
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("c.txt"), "x").unwrap();

        // Act
        let entries = RealFileSystem.read_dir(dir.path()).unwrap();

        // Assert
        let names: Vec<_> = entries
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a", "b", "c.txt"]);
    }

    #[test]
    fn given_missing_directory_when_reading_then_errors() {
        let dir = TempDir::new().unwrap();
        assert!(RealFileSystem.read_dir(&dir.path().join("nope")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn given_failing_program_when_running_interactive_then_returns_exit_code() {
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let code = RealCommandRunner
            .run_interactive(Path::new("sh"), &args, &[])
            .unwrap();
        assert_eq!(code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn given_extra_env_when_running_interactive_then_child_sees_it() {
        let args = vec!["-c".to_string(), "test \"$HELM_X\" = yes".to_string()];
        let env = vec![("HELM_X".to_string(), "yes".to_string())];
        let code = RealCommandRunner
            .run_interactive(Path::new("sh"), &args, &env)
            .unwrap();
        assert_eq!(code, 0);
    }
}
