//! Cluster access through `kubectl`
//!
//! The context check runs `kubectl config view --minify`; the tunnel is a
//! background `kubectl port-forward` whose stdout announces the local port.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace};

use crate::infrastructure::traits::{ClusterAccessor, ClusterConnector, CommandRunner, ForwardHandle};

/// Port the remote service listens on inside its pod.
pub const TILLER_PORT: u16 = 44134;

/// Forward target inside the remote namespace.
pub const TILLER_TARGET: &str = "deployment/tiller-deploy";

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Most stderr kept for a failed handshake.
const STDERR_LIMIT: usize = 8 * 1024;

pub struct KubectlConnector {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl KubectlConnector {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_program("kubectl", runner)
    }

    /// Use a different `kubectl` binary.
    pub fn with_program(program: &str, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: program.to_string(),
            runner,
        }
    }
}

impl ClusterConnector for KubectlConnector {
    fn connect(&self, context: Option<&str>) -> Result<Box<dyn ClusterAccessor>, String> {
        let mut args = vec!["config", "view", "--minify"];
        if let Some(context) = context {
            args.extend(["--context", context]);
        }
        debug!("Checking cluster config: {} {}", self.program, args.join(" "));
        let output = self
            .runner
            .run(&self.program, &args)
            .map_err(|e| format!("cannot run {}: {}", self.program, e))?;
        if !output.status.success() {
            return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
        }
        Ok(Box::new(KubectlAccessor {
            program: self.program.clone(),
            context: context.map(str::to_string),
        }))
    }
}

pub struct KubectlAccessor {
    program: String,
    context: Option<String>,
}

impl KubectlAccessor {
    fn command(&self, namespace: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(context) = &self.context {
            cmd.args(["--context", context]);
        }
        cmd.args(["--namespace", namespace, "port-forward", TILLER_TARGET])
            .arg(format!(":{}", TILLER_PORT))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ClusterAccessor for KubectlAccessor {
    fn forward(&self, namespace: &str) -> Result<Box<dyn ForwardHandle>, String> {
        let pattern = Regex::new(&format!(
            r"^Forwarding from (?:127\.0\.0\.1|\[::1\]):(\d+) -> {}",
            TILLER_PORT
        ))
        .map_err(|e| format!("invalid port-forward pattern: {}", e))?;

        let mut child = self
            .command(namespace)
            .spawn()
            .map_err(|e| format!("cannot run {}: {}", self.program, e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| "port-forward stdout not captured".to_string())?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| "port-forward stderr not captured".to_string())?;
        // Drained for the child's whole life; only the head is kept
        let stderr_reader = thread::spawn(move || {
            let mut captured = String::new();
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                trace!("port-forward stderr: {}", line);
                let room = STDERR_LIMIT.saturating_sub(captured.len());
                if room > 0 {
                    captured.extend(line.chars().take(room));
                    captured.push('\n');
                }
            }
            captured
        });

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut announced = false;
            // Keep draining after the announcement so kubectl never blocks on a full pipe
            for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                trace!("port-forward: {}", line);
                if announced {
                    continue;
                }
                if let Some(port) = pattern
                    .captures(&line)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse::<u16>().ok())
                {
                    announced = true;
                    let _ = tx.send(port);
                }
            }
        });

        match rx.recv_timeout(HANDSHAKE_TIMEOUT) {
            Ok(port) => Ok(Box::new(KubectlForward {
                child: Some(child),
                port,
            })),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                stop(&mut child);
                Err(format!(
                    "no local port announced within {}s",
                    HANDSHAKE_TIMEOUT.as_secs()
                ))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                stop(&mut child);
                let stderr = stderr_reader.join().unwrap_or_default();
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    Err("port-forward exited before announcing a local port".to_string())
                } else {
                    Err(stderr.to_string())
                }
            }
        }
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// A running `kubectl port-forward`.
pub struct KubectlForward {
    child: Option<Child>,
    port: u16,
}

impl ForwardHandle for KubectlForward {
    fn local_port(&self) -> u16 {
        self.port
    }

    fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!("Stopping port-forward (pid {})", child.id());
            stop(&mut child);
        }
    }
}

impl Drop for KubectlForward {
    fn drop(&mut self) {
        self.close();
    }
}
