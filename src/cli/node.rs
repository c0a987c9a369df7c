//! Command tree nodes and parsed invocations

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::cli::error::CliResult;
use crate::cli::session::Session;
use crate::domain::{Arity, DomainError, FlagSpec};

/// Body of a command. Receives the per-invocation session and the parsed input.
pub type Handler = Arc<dyn Fn(&mut Session<'_>, &Invocation) -> CliResult<()> + Send + Sync>;

/// One entry in the command tree, built-in or plugin-provided.
#[derive(Clone)]
pub struct CommandNode {
    pub name: String,
    pub aliases: Vec<String>,
    pub short_help: String,
    pub long_help: String,
    pub arity: Arity,
    pub flags: Vec<FlagSpec>,
    pub children: Vec<CommandNode>,
    /// Runs normally but warns with this notice; hidden from listings
    pub deprecated: Option<String>,
    pub hidden: bool,
    /// Arguments are handed over unparsed (plugins)
    pub passthrough: bool,
    pub handler: Option<Handler>,
}

impl CommandNode {
    pub fn new(name: &str, short_help: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            short_help: short_help.to_string(),
            long_help: String::new(),
            arity: Arity::none(),
            flags: Vec::new(),
            children: Vec::new(),
            deprecated: None,
            hidden: false,
            passthrough: false,
            handler: None,
        }
    }

    pub fn long(mut self, long_help: &str) -> Self {
        self.long_help = long_help.to_string();
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    pub fn flag(mut self, flag: FlagSpec) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = FlagSpec>) -> Self {
        self.flags.extend(flags);
        self
    }

    /// Append a child without checking for collisions; for static trees.
    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn deprecated(mut self, notice: &str) -> Self {
        self.deprecated = Some(notice.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Session<'_>, &Invocation) -> CliResult<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Whether `name` refers to this node, by name or alias.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// Warning shown before a deprecated command runs.
    pub fn deprecation_notice(&self) -> Option<String> {
        self.deprecated.as_ref().map(|notice| {
            format!("Command {:?} is deprecated, {}", self.name, notice.trim_end())
        })
    }

    pub fn find_child(&self, name: &str) -> Option<&CommandNode> {
        self.children.iter().find(|c| c.answers_to(name))
    }

    /// Follow a path of child names from this node.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(self, |node, name| node.find_child(name.as_ref()))
    }

    /// Add a child, refusing names or aliases already taken by a sibling.
    pub fn add_child(&mut self, child: CommandNode) -> Result<(), DomainError> {
        let taken = std::iter::once(&child.name)
            .chain(child.aliases.iter())
            .find(|name| self.find_child(name).is_some());
        if let Some(name) = taken {
            return Err(DomainError::DuplicateCommand(name.clone()));
        }
        self.children.push(child);
        Ok(())
    }

    /// Every node below this one with its path, depth first.
    pub fn walk(&self) -> Vec<(Vec<String>, &CommandNode)> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push((vec![child.name.clone()], child));
            for (mut path, node) in child.walk() {
                path.insert(0, child.name.clone());
                out.push((path, node));
            }
        }
        out
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arity", &self.arity)
            .field("flags", &self.flags.iter().map(|fl| &fl.name).collect::<Vec<_>>())
            .field("children", &self.children)
            .field("deprecated", &self.deprecated)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Value of one flag as seen by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Switch(bool),
    /// `None` when neither given nor defaulted
    Value(Option<String>),
}

/// A matched command with its positional arguments and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Names from the root down to the matched node
    pub path: Vec<String>,
    pub args: Vec<String>,
    pub flags: BTreeMap<String, FlagValue>,
}

impl Invocation {
    pub fn new(path: &[&str], args: &[&str]) -> Self {
        Self {
            path: path.iter().map(|p| p.to_string()).collect(),
            args: args.iter().map(|a| a.to_string()).collect(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_switch(mut self, name: &str, on: bool) -> Self {
        self.flags.insert(name.to_string(), FlagValue::Switch(on));
        self
    }

    pub fn with_value(mut self, name: &str, value: &str) -> Self {
        self.flags
            .insert(name.to_string(), FlagValue::Value(Some(value.to_string())));
        self
    }

    /// `repo add`
    pub fn command_name(&self) -> String {
        self.path.join(" ")
    }

    pub fn switch(&self, name: &str) -> bool {
        matches!(self.flags.get(name), Some(FlagValue::Switch(true)))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        match self.flags.get(name) {
            Some(FlagValue::Value(Some(v))) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The named flags that carry something, as strings.
    ///
    /// Switches appear only when on; value flags only when set.
    pub fn flag_map(&self, names: &[&str]) -> BTreeMap<String, String> {
        names
            .iter()
            .filter_map(|name| match self.flags.get(*name)? {
                FlagValue::Switch(true) => Some((name.to_string(), "true".to_string())),
                FlagValue::Value(Some(v)) => Some((name.to_string(), v.clone())),
                _ => None,
            })
            .collect()
    }
}
