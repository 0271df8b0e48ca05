//! Name to command lookup

use crate::command::{Command, CommandKind};
use crate::error::{CommandError, CommandResult};
use std::collections::HashMap;

/// Builds a fresh command from its raw string arguments.
pub type CommandFactory = fn(Vec<String>) -> Command;

/// Maps command names to factories.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// A registry holding every built-in command.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in CommandKind::ALL {
            registry.register(kind.name(), kind.factory());
        }
        registry
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, factory: CommandFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the command registered under `name`.
    pub fn resolve(&self, name: &str, args: Vec<String>) -> CommandResult<Command> {
        self.factories
            .get(name)
            .map(|factory| factory(args))
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
