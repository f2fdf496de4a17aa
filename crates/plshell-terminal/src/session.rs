//! Process-wide session state.
//!
//! One `SessionState` is owned by the dispatcher for the lifetime of the
//! process. All mutation goes through the named methods below.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::macros::MacroStore;

/// Default number of history entries to retain.
const DEFAULT_MAX_HISTORY: usize = 500;

/// Saved credentials for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub username: String,
    pub password: String,
}

/// Mutable state shared by every command of a session.
#[derive(Debug, Clone)]
pub struct SessionState {
    cwd: String,
    connections: BTreeMap<String, Connection>,
    active: Option<String>,
    bookmarks: BTreeMap<String, String>,
    aliases: BTreeMap<String, String>,
    macros: MacroStore,
    history: Vec<String>,
    max_history: usize,
    simple_prompt: bool,
}

impl SessionState {
    /// Create an empty session rooted at `/`.
    pub fn new() -> Self {
        Self {
            cwd: "/".to_string(),
            connections: BTreeMap::new(),
            active: None,
            bookmarks: BTreeMap::new(),
            aliases: BTreeMap::new(),
            macros: MacroStore::new(),
            history: Vec::new(),
            max_history: DEFAULT_MAX_HISTORY,
            simple_prompt: false,
        }
    }

    /// Set the number of history entries kept in memory.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    // -- Prompt --

    pub fn simple_prompt(&self) -> bool {
        self.simple_prompt
    }

    pub fn set_simple_prompt(&mut self, simple: bool) {
        self.simple_prompt = simple;
    }

    // -- Path --

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn set_cwd(&mut self, path: &str) {
        self.cwd = path.to_string();
    }

    // -- Connections --

    /// Save credentials for `host` and make it the active connection.
    ///
    /// Returns the previously active host if a different one was replaced.
    pub fn connect(&mut self, host: &str, conn: Connection) -> Option<String> {
        self.connections.insert(host.to_string(), conn);
        let previous = self.active.replace(host.to_string());
        self.cwd = "/".to_string();
        previous.filter(|p| p != host)
    }

    /// Drop the active connection, returning its host.
    pub fn disconnect(&mut self) -> Option<String> {
        self.active.take()
    }

    /// Host of the active connection.
    pub fn active_host(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Saved credentials for `host`.
    pub fn connection(&self, host: &str) -> Option<&Connection> {
        self.connections.get(host)
    }

    pub fn connections(&self) -> &BTreeMap<String, Connection> {
        &self.connections
    }

    pub fn remove_connection(&mut self, host: &str) -> Option<Connection> {
        self.connections.remove(host)
    }

    // -- Bookmarks --

    /// Store a bookmark, returning the path it replaced.
    pub fn bookmark(&mut self, name: &str, path: &str) -> Option<String> {
        self.bookmarks.insert(name.to_string(), path.to_string())
    }

    pub fn remove_bookmark(&mut self, name: &str) -> Option<String> {
        self.bookmarks.remove(name)
    }

    pub fn bookmark_path(&self, name: &str) -> Option<&str> {
        self.bookmarks.get(name).map(String::as_str)
    }

    pub fn bookmarks(&self) -> &BTreeMap<String, String> {
        &self.bookmarks
    }

    // -- Aliases --

    /// Define an alias, returning the expansion it replaced.
    pub fn set_alias(&mut self, name: &str, expansion: &str) -> Option<String> {
        self.aliases.insert(name.to_string(), expansion.to_string())
    }

    pub fn remove_alias(&mut self, name: &str) -> Option<String> {
        self.aliases.remove(name)
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.aliases
    }

    // -- Macros --

    pub fn macros(&self) -> &MacroStore {
        &self.macros
    }

    pub fn macros_mut(&mut self) -> &mut MacroStore {
        &mut self.macros
    }

    // -- History --

    /// Push a line to the in-session history.
    pub fn push_history(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.max_history == 0 {
            return;
        }
        // Don't duplicate the last entry.
        if self.history.last().is_none_or(|last| last != line) {
            self.history.push(line.to_string());
            if self.history.len() > self.max_history {
                self.history.remove(0);
            }
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    // -- Bulk replacement used by persistence --

    pub(crate) fn replace_connections(&mut self, connections: BTreeMap<String, Connection>) {
        self.connections = connections;
    }

    pub(crate) fn replace_aliases(&mut self, aliases: BTreeMap<String, String>) {
        self.aliases = aliases;
    }

    pub(crate) fn replace_bookmarks(&mut self, bookmarks: BTreeMap<String, String>) {
        self.bookmarks = bookmarks;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
