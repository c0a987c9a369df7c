//! Flag and positional-argument declarations for command nodes.

use crate::domain::error::{ArgBound, DomainError};

/// How a flag takes its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagKind {
    /// Boolean switch, `false` unless given
    Switch,
    /// Takes a string value
    Value {
        value_name: String,
        default: Option<String>,
    },
}

/// A flag declared on a command node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub short: Option<char>,
    pub help: String,
    pub kind: FlagKind,
    /// Visible on the declaring node and every descendant
    pub persistent: bool,
}

impl FlagSpec {
    pub fn switch(name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            help: help.to_string(),
            kind: FlagKind::Switch,
            persistent: false,
        }
    }

    pub fn value(name: &str, value_name: &str, help: &str) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            help: help.to_string(),
            kind: FlagKind::Value {
                value_name: value_name.to_string(),
                default: None,
            },
            persistent: false,
        }
    }

    /// Set the default for a value flag. No effect on switches.
    pub fn with_default(mut self, default: &str) -> Self {
        if let FlagKind::Value { default: slot, .. } = &mut self.kind {
            *slot = Some(default.to_string());
        }
        self
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.kind, FlagKind::Switch)
    }
}

/// Positional arguments a command expects, by display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    /// Exactly these arguments
    Exact(Vec<String>),
    /// Any prefix of these arguments
    AtMost(Vec<String>),
    /// These arguments, the last one repeatable
    AtLeast(Vec<String>),
    /// Anything, forwarded untouched
    Any,
}

impl Arity {
    pub fn none() -> Self {
        Arity::Exact(Vec::new())
    }

    pub fn exact(names: &[&str]) -> Self {
        Arity::Exact(owned(names))
    }

    pub fn at_most(names: &[&str]) -> Self {
        Arity::AtMost(owned(names))
    }

    pub fn at_least(names: &[&str]) -> Self {
        Arity::AtLeast(owned(names))
    }

    /// Validate the number of positional arguments received.
    pub fn check(&self, received: usize) -> Result<(), DomainError> {
        let (bound, names) = match self {
            Arity::Exact(names) if received != names.len() => (ArgBound::Exactly, names),
            Arity::AtMost(names) if received > names.len() => (ArgBound::AtMost, names),
            Arity::AtLeast(names) if received < names.len() => (ArgBound::AtLeast, names),
            _ => return Ok(()),
        };
        Err(DomainError::ArgumentCount {
            bound,
            names: names.clone(),
            received,
        })
    }

    /// Usage fragment, e.g. `RELEASE_NAME [FILTER]`.
    pub fn usage(&self) -> String {
        let placeholder = |name: &String| name.to_uppercase().replace(' ', "_");
        match self {
            Arity::Exact(names) => names.iter().map(placeholder).collect::<Vec<_>>().join(" "),
            Arity::AtMost(names) => names
                .iter()
                .map(|n| format!("[{}]", placeholder(n)))
                .collect::<Vec<_>>()
                .join(" "),
            Arity::AtLeast(names) => {
                let mut parts: Vec<String> = names.iter().map(placeholder).collect();
                if let Some(last) = parts.last_mut() {
                    last.push_str("...");
                }
                parts.join(" ")
            }
            Arity::Any => "[ARGS]...".to_string(),
        }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}
