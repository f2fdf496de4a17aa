//! Command trait, command output, and the command registry.

use std::collections::HashMap;

use plshell_tree::ObjectTree;
use plshell_types::error::Result;

use crate::session::SessionState;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal.
    Clear,
    /// Signal to the dispatcher to replay a stored macro.
    Play {
        /// Macro name.
        name: String,
    },
    /// Signal to the dispatcher to execute a script file.
    RunScript {
        /// Script path on the local filesystem.
        path: String,
    },
    /// Signal to the dispatcher to open a macro or file in the editor.
    Edit {
        /// Macro name or file path.
        target: String,
    },
    /// Signal to end the session.
    Quit,
}

/// Shared mutable environment passed to every command.
pub struct Environment<'a> {
    /// Session state: path, connections, aliases, bookmarks, macros.
    pub session: &'a mut SessionState,
    /// The object tree the navigation commands operate on.
    pub tree: &'a mut dyn ObjectTree,
    /// Read-only view of the registry (for `help` and alias validation).
    pub registry: &'a CommandRegistry,
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "play MACRO_NAME").
    fn usage(&self) -> &str;

    /// Command category for grouping in extended help.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// Registry of available commands.
///
/// Lookup is an exact match on the command name. Registering a name twice
/// replaces the earlier command.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let name = cmd.name().to_string();
        if self.commands.insert(name.clone(), cmd).is_some() {
            log::debug!("command '{name}' re-registered, last registration wins");
        }
    }

    /// Look up a command by exact name.
    pub fn resolve(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Check whether a command name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Help text for one command: name, description, and usage.
    pub fn help(&self, name: &str) -> Option<String> {
        self.resolve(name).map(|cmd| {
            format!(
                "{} ({})\n  {}\n  Usage: {}",
                cmd.name(),
                cmd.category(),
                cmd.description(),
                cmd.usage()
            )
        })
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Return sorted command names starting with `partial`.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .keys()
            .filter(|name| name.starts_with(partial))
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a command line into whitespace-separated tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
