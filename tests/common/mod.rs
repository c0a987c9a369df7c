//! Mock I/O boundaries shared by the integration tests

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use helm::application::Channel;
use helm::domain::{RemoteCallError, RemoteRequest};
use helm::infrastructure::di::ServiceContainer;
use helm::infrastructure::traits::{
    ClusterAccessor, ClusterConnector, CommandRunner, ForwardHandle, RealFileSystem,
    ReleaseClient, ReleaseClientFactory,
};

/// What the mock cluster was asked to do.
#[derive(Default)]
pub struct ClusterLog {
    pub connects: AtomicUsize,
    pub forwards: AtomicUsize,
    pub closes: AtomicUsize,
    pub namespaces: Mutex<Vec<String>>,
}

impl ClusterLog {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn forwards(&self) -> usize {
        self.forwards.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Cluster whose tunnels report `port`, or fail at the configured step.
pub struct MockCluster {
    pub log: Arc<ClusterLog>,
    pub port: u16,
    pub config_error: Option<String>,
    pub forward_error: Option<String>,
}

impl MockCluster {
    pub fn with_port(port: u16) -> Self {
        Self {
            log: Arc::new(ClusterLog::default()),
            port,
            config_error: None,
            forward_error: None,
        }
    }
}

struct MockAccessor {
    log: Arc<ClusterLog>,
    port: u16,
    forward_error: Option<String>,
}

struct MockForward {
    log: Arc<ClusterLog>,
    port: u16,
    open: bool,
}

impl ClusterConnector for MockCluster {
    fn connect(&self, _context: Option<&str>) -> Result<Box<dyn ClusterAccessor>, String> {
        self.log.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.config_error {
            return Err(message.clone());
        }
        Ok(Box::new(MockAccessor {
            log: Arc::clone(&self.log),
            port: self.port,
            forward_error: self.forward_error.clone(),
        }))
    }
}

impl ClusterAccessor for MockAccessor {
    fn forward(&self, namespace: &str) -> Result<Box<dyn ForwardHandle>, String> {
        self.log.forwards.fetch_add(1, Ordering::SeqCst);
        self.log.namespaces.lock().unwrap().push(namespace.to_string());
        if let Some(message) = &self.forward_error {
            return Err(message.clone());
        }
        Ok(Box::new(MockForward {
            log: Arc::clone(&self.log),
            port: self.port,
            open: true,
        }))
    }
}

impl ForwardHandle for MockForward {
    fn local_port(&self) -> u16 {
        self.port
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.log.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Release service answering every request with one canned result.
pub struct MockReleases {
    pub requests: Arc<Mutex<Vec<(String, RemoteRequest)>>>,
    pub reply: Result<String, RemoteCallError>,
}

impl MockReleases {
    pub fn replying(reply: Result<String, RemoteCallError>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            reply,
        }
    }
}

struct MockReleaseClient {
    address: String,
    requests: Arc<Mutex<Vec<(String, RemoteRequest)>>>,
    reply: Result<String, RemoteCallError>,
}

impl ReleaseClientFactory for MockReleases {
    fn connect(&self, channel: &Channel) -> Result<Box<dyn ReleaseClient>, RemoteCallError> {
        Ok(Box::new(MockReleaseClient {
            address: channel.address.clone(),
            requests: Arc::clone(&self.requests),
            reply: self.reply.clone(),
        }))
    }
}

impl ReleaseClient for MockReleaseClient {
    fn call(&mut self, request: &RemoteRequest) -> Result<String, RemoteCallError> {
        self.requests
            .lock()
            .unwrap()
            .push((self.address.clone(), request.clone()));
        self.reply.clone()
    }
}

/// Records interactive runs; returns `exit_code`.
pub struct MockRunner {
    pub runs: Arc<Mutex<Vec<(PathBuf, Vec<String>, Vec<(String, String)>)>>>,
    pub exit_code: i32,
}

impl MockRunner {
    pub fn exiting(exit_code: i32) -> Self {
        Self {
            runs: Arc::new(Mutex::new(Vec::new())),
            exit_code,
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &str, _args: &[&str]) -> io::Result<Output> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{cmd}: not available in tests"),
        ))
    }

    fn run_interactive(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> io::Result<i32> {
        self.runs
            .lock()
            .unwrap()
            .push((program.to_path_buf(), args.to_vec(), env.to_vec()));
        Ok(self.exit_code)
    }
}

pub fn services(
    cluster: MockCluster,
    releases: MockReleases,
    runner: MockRunner,
) -> Arc<ServiceContainer> {
    Arc::new(ServiceContainer::with_deps(
        Arc::new(RealFileSystem),
        Arc::new(runner),
        Arc::new(cluster),
        Arc::new(releases),
    ))
}

/// Write `plugins/<dir>/plugin.toml` below `root`.
pub fn write_plugin(root: &Path, dir: &str, manifest: &str) -> PathBuf {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("plugin.toml"), manifest).unwrap();
    dir
}
