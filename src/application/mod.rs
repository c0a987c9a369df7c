//! Application layer: connection setup, plugin discovery, error translation
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod connection;
pub mod error;
pub mod error_ext;
pub mod plugins;
pub mod tls;
pub mod translate;

pub use connection::{Channel, ConnectionManager, Tunnel};
pub use error::{ApplicationError, ApplicationResult, ConnectionError};
pub use error_ext::IoResultExt;
pub use plugins::PluginLoader;
pub use tls::{ServerVerification, TransportCredential};
pub use translate::{pretty_error, translate};
