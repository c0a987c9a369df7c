//! Helm client bootstrap: configuration, connection to the remote release
//! service, command routing and plugins.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
