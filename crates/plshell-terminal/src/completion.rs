//! Context-aware completion candidates.

use crate::interpreter::CommandRegistry;
use crate::session::SessionState;

/// Names offered for completion, captured from a registry and session.
///
/// The first word completes to command and alias names. The second word
/// completes to macro, alias, bookmark, or host names depending on the
/// command before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    commands: Vec<String>,
    macros: Vec<String>,
    aliases: Vec<String>,
    bookmarks: Vec<String>,
    hosts: Vec<String>,
}

impl Completions {
    pub fn from_session(registry: &CommandRegistry, session: &SessionState) -> Self {
        let aliases: Vec<String> = session.aliases().keys().cloned().collect();
        let mut commands = registry.completions("");
        commands.extend(aliases.iter().cloned());
        commands.sort();
        commands.dedup();
        Self {
            commands,
            macros: session.macros().list().into_iter().map(str::to_string).collect(),
            aliases,
            bookmarks: session.bookmarks().keys().cloned().collect(),
            hosts: session.connections().keys().cloned().collect(),
        }
    }

    /// Candidates for the word being typed at the end of `line`.
    ///
    /// Only the statement after the last `;` is considered.
    pub fn candidates(&self, line: &str) -> Vec<String> {
        let line = line.rsplit(';').next().unwrap_or(line).trim_start();
        let words: Vec<&str> = line.split_whitespace().collect();
        let at_boundary = line.is_empty() || line.ends_with(char::is_whitespace);
        let (pool, partial) = match (words.as_slice(), at_boundary) {
            ([], _) => (&self.commands, ""),
            ([partial], false) => (&self.commands, *partial),
            ([cmd], true) => match self.arguments_for(cmd) {
                Some(pool) => (pool, ""),
                None => return Vec::new(),
            },
            ([cmd, partial], false) => match self.arguments_for(cmd) {
                Some(pool) => (pool, *partial),
                None => return Vec::new(),
            },
            _ => return Vec::new(),
        };
        pool.iter()
            .filter(|name| name.starts_with(partial))
            .cloned()
            .collect()
    }

    fn arguments_for(&self, cmd: &str) -> Option<&Vec<String>> {
        match cmd {
            "play" | "rmmacro" | "list" | "edit" => Some(&self.macros),
            "rmalias" => Some(&self.aliases),
            "goto" | "rmbookmark" => Some(&self.bookmarks),
            "connect" => Some(&self.hosts),
            _ => None,
        }
    }
}
