//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Whether an argument count is a hard requirement or a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgBound {
    Exactly,
    AtMost,
    AtLeast,
}

/// Domain errors represent violations of the command and plugin model.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{}", describe_arity(.bound, .names))]
    ArgumentCount {
        bound: ArgBound,
        names: Vec<String>,
        received: usize,
    },

    #[error("command {0:?} is already defined")]
    DuplicateCommand(String),

    #[error("invalid plugin manifest {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("plugin {name:?}: {message}")]
    InvalidPlugin { name: String, message: String },
}

fn describe_arity(bound: &ArgBound, names: &[String]) -> String {
    let expected = names.len();
    let noun = if expected == 1 { "argument" } else { "arguments" };
    let qualifier = match bound {
        ArgBound::Exactly => "needs",
        ArgBound::AtMost => "accepts at most",
        ArgBound::AtLeast => "needs at least",
    };
    if names.is_empty() {
        format!("This command {qualifier} {expected} {noun}")
    } else {
        format!(
            "This command {qualifier} {expected} {noun}: {}",
            names.join(", ")
        )
    }
}
