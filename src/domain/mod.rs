//! Domain layer: command model, home layout, plugin and remote-call types
//!
//! This layer is independent of external concerns (no I/O, no CLI parsing, no network).

pub mod command;
pub mod error;
pub mod home;
pub mod plugin;
pub mod remote;

pub use command::{Arity, FlagKind, FlagSpec};
pub use error::DomainError;
pub use home::HelmHome;
pub use plugin::{PluginDescriptor, PluginManifest};
pub use remote::{RemoteCallError, RemoteErrorKind, RemoteRequest, RemoteResponse};
