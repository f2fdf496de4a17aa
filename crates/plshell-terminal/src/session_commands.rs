//! Session commands: macros, aliases, bookmarks, and connections.

use plshell_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::macros::MacroLine;
use crate::session::{Connection, SessionState};

/// Register macro, alias, bookmark, and connection commands.
pub fn register_session_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(RecordCmd));
    reg.register(Box::new(StopCmd));
    reg.register(Box::new(PlayCmd));
    reg.register(Box::new(ListCmd));
    reg.register(Box::new(RmMacroCmd));
    reg.register(Box::new(AliasCmd));
    reg.register(Box::new(RmAliasCmd));
    reg.register(Box::new(BookmarkCmd));
    reg.register(Box::new(RmBookmarkCmd));
    reg.register(Box::new(GotoCmd));
    reg.register(Box::new(ConnectCmd));
    reg.register(Box::new(DisconnectCmd));
    reg.register(Box::new(ConnectionsCmd));
}

/// Numbered listing of a macro's lines.
pub fn format_macro(lines: &[MacroLine]) -> String {
    if lines.is_empty() {
        return "(empty macro)".to_string();
    }
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!(" {:02}: {}", i + 1, line.join(" ")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Saved connections, one `* user@host` line each.
pub fn format_connections(session: &SessionState) -> String {
    if session.connections().is_empty() {
        return "No saved connections".to_string();
    }
    let mut lines = vec!["Saved connections:".to_string()];
    for (host, conn) in session.connections() {
        let marker = if session.active_host() == Some(host.as_str()) {
            " (active)"
        } else {
            ""
        };
        lines.push(format!("* {}@{host}{marker}", conn.username));
    }
    lines.join("\n")
}

fn usage(cmd: &dyn Command) -> ShellError {
    ShellError::Usage(cmd.usage().to_string())
}

// ---------------------------------------------------------------------------
// record / stop
// ---------------------------------------------------------------------------

struct RecordCmd;
impl Command for RecordCmd {
    fn name(&self) -> &str {
        "record"
    }
    fn description(&self) -> &str {
        "Start recording commands into a macro"
    }
    fn usage(&self) -> &str {
        "record NAME"
    }
    fn category(&self) -> &str {
        "macro"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let macros = env.session.macros_mut();
        if let Some(current) = macros.recording() {
            return Err(ShellError::RecordingState(format!(
                "already recording macro '{current}'; this command was not recorded"
            )));
        }
        let [name] = args else {
            return Err(usage(self));
        };
        let mut lines = Vec::new();
        if macros.start_recording(name)? {
            lines.push(format!(
                "Warning: macro '{name}' exists. All commands will be appended"
            ));
        }
        lines.push("Macro recording started...".to_string());
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct StopCmd;
impl Command for StopCmd {
    fn name(&self) -> &str {
        "stop"
    }
    fn description(&self) -> &str {
        "Stop recording the current macro"
    }
    fn usage(&self) -> &str {
        "stop"
    }
    fn category(&self) -> &str {
        "macro"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let macros = env.session.macros_mut();
        let name = macros.stop_recording()?;
        let count = macros.show(&name).map_or(0, <[_]>::len);
        Ok(CommandOutput::Text(format!(
            "Macro recording stopped ('{name}', {count} lines)"
        )))
    }
}

// ---------------------------------------------------------------------------
// play / list / rmmacro
// ---------------------------------------------------------------------------

struct PlayCmd;
impl Command for PlayCmd {
    fn name(&self) -> &str {
        "play"
    }
    fn description(&self) -> &str {
        "Replay a recorded macro"
    }
    fn usage(&self) -> &str {
        "play NAME"
    }
    fn category(&self) -> &str {
        "macro"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [name] = args else {
            return Err(usage(self));
        };
        if !env.session.macros().contains(name) {
            return Err(ShellError::NotFound(format!("macro '{name}'")));
        }
        Ok(CommandOutput::Play {
            name: name.to_string(),
        })
    }
}

struct ListCmd;
impl Command for ListCmd {
    fn name(&self) -> &str {
        "list"
    }
    fn description(&self) -> &str {
        "List macros, or the lines of one macro"
    }
    fn usage(&self) -> &str {
        "list [NAME]"
    }
    fn category(&self) -> &str {
        "macro"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let macros = env.session.macros();
        match args {
            [] => {
                if macros.is_empty() {
                    return Ok(CommandOutput::Text("No recorded macros".to_string()));
                }
                let lines: Vec<String> = macros
                    .list()
                    .into_iter()
                    .map(|name| {
                        if macros.recording() == Some(name) {
                            format!("{name} (recording)")
                        } else {
                            name.to_string()
                        }
                    })
                    .collect();
                Ok(CommandOutput::Text(lines.join("\n")))
            },
            [name] => macros
                .show(name)
                .map(|lines| CommandOutput::Text(format_macro(lines)))
                .ok_or_else(|| ShellError::NotFound(format!("macro '{name}'"))),
            _ => Err(usage(self)),
        }
    }
}

struct RmMacroCmd;
impl Command for RmMacroCmd {
    fn name(&self) -> &str {
        "rmmacro"
    }
    fn description(&self) -> &str {
        "Delete a macro"
    }
    fn usage(&self) -> &str {
        "rmmacro NAME"
    }
    fn category(&self) -> &str {
        "macro"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [name] = args else {
            return Err(usage(self));
        };
        let macros = env.session.macros_mut();
        if macros.recording() == Some(*name) {
            return Err(ShellError::RecordingState(format!(
                "macro '{name}' is being recorded"
            )));
        }
        macros
            .remove(name)
            .map(|_| CommandOutput::Text(format!("Removed macro '{name}'")))
            .ok_or_else(|| ShellError::NotFound(format!("macro '{name}'")))
    }
}

// ---------------------------------------------------------------------------
// alias / rmalias
// ---------------------------------------------------------------------------

struct AliasCmd;
impl Command for AliasCmd {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "List aliases or define one"
    }
    fn usage(&self) -> &str {
        "alias [NAME COMMAND...]"
    }
    fn category(&self) -> &str {
        "alias"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        match args {
            [] => {
                let aliases = env.session.aliases();
                if aliases.is_empty() {
                    return Ok(CommandOutput::Text("No aliases defined".to_string()));
                }
                let lines: Vec<String> = aliases
                    .iter()
                    .map(|(name, expansion)| format!("{name} -> {expansion}"))
                    .collect();
                Ok(CommandOutput::Text(lines.join("\n")))
            },
            [_] => Err(usage(self)),
            [name, expansion @ ..] => {
                if env.registry.contains(name) {
                    return Err(ShellError::Usage(format!(
                        "'{name}' is a command and cannot be used as an alias name"
                    )));
                }
                if expansion.first() == Some(name) {
                    return Err(ShellError::AliasLoop(format!("'{name}' expands to itself")));
                }
                let expansion = expansion.join(" ");
                let mut lines = Vec::new();
                if env.session.set_alias(name, &expansion).is_some() {
                    lines.push(format!("Warning: replacing alias '{name}'"));
                }
                lines.push(format!("Recorded alias '{name}' as '{expansion}'"));
                Ok(CommandOutput::Text(lines.join("\n")))
            },
        }
    }
}

struct RmAliasCmd;
impl Command for RmAliasCmd {
    fn name(&self) -> &str {
        "rmalias"
    }
    fn description(&self) -> &str {
        "Remove an alias"
    }
    fn usage(&self) -> &str {
        "rmalias NAME"
    }
    fn category(&self) -> &str {
        "alias"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [name] = args else {
            return Err(usage(self));
        };
        env.session
            .remove_alias(name)
            .map(|_| CommandOutput::Text(format!("Removing alias: {name}")))
            .ok_or_else(|| ShellError::NotFound(format!("alias '{name}'")))
    }
}

// ---------------------------------------------------------------------------
// bookmark / rmbookmark / goto
// ---------------------------------------------------------------------------

struct BookmarkCmd;
impl Command for BookmarkCmd {
    fn name(&self) -> &str {
        "bookmark"
    }
    fn description(&self) -> &str {
        "Bookmark the current path"
    }
    fn usage(&self) -> &str {
        "bookmark NAME"
    }
    fn category(&self) -> &str {
        "bookmark"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [name] = args else {
            return Err(usage(self));
        };
        let path = env.session.cwd().to_string();
        let mut lines = Vec::new();
        if env.session.bookmark(name, &path).is_some() {
            lines.push(format!("Warning: replacing bookmark '{name}'"));
        }
        lines.push(format!("Storing bookmark {name} -> {path}"));
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct RmBookmarkCmd;
impl Command for RmBookmarkCmd {
    fn name(&self) -> &str {
        "rmbookmark"
    }
    fn description(&self) -> &str {
        "Remove a bookmark"
    }
    fn usage(&self) -> &str {
        "rmbookmark NAME"
    }
    fn category(&self) -> &str {
        "bookmark"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [name] = args else {
            return Err(usage(self));
        };
        env.session
            .remove_bookmark(name)
            .map(|_| CommandOutput::Text(format!("Removing bookmark '{name}'")))
            .ok_or_else(|| ShellError::NotFound(format!("bookmark '{name}'")))
    }
}

struct GotoCmd;
impl Command for GotoCmd {
    fn name(&self) -> &str {
        "goto"
    }
    fn description(&self) -> &str {
        "List bookmarks or jump to one"
    }
    fn usage(&self) -> &str {
        "goto [NAME]"
    }
    fn category(&self) -> &str {
        "bookmark"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        match args {
            [] => {
                let bookmarks = env.session.bookmarks();
                if bookmarks.is_empty() {
                    return Ok(CommandOutput::Text("No bookmarks defined".to_string()));
                }
                let lines: Vec<String> = bookmarks
                    .iter()
                    .map(|(name, path)| format!("{name} -> {path}"))
                    .collect();
                Ok(CommandOutput::Text(lines.join("\n")))
            },
            [name] => {
                crate::tree_commands::require_connection(env)?;
                let path = env
                    .session
                    .bookmark_path(name)
                    .ok_or_else(|| ShellError::NotFound(format!("bookmark '{name}'")))?
                    .to_string();
                if !env.tree.exists(&path) {
                    return Err(ShellError::Tree(format!("no such path: {path}")));
                }
                env.session.set_cwd(&path);
                Ok(CommandOutput::Text(format!("Taking you to {path}")))
            },
            _ => Err(usage(self)),
        }
    }
}

// ---------------------------------------------------------------------------
// connect / disconnect / connections
// ---------------------------------------------------------------------------

struct ConnectCmd;
impl Command for ConnectCmd {
    fn name(&self) -> &str {
        "connect"
    }
    fn description(&self) -> &str {
        "Connect to a saved host, or save and connect to a new one"
    }
    fn usage(&self) -> &str {
        "connect HOST [USERNAME PASSWORD]"
    }
    fn category(&self) -> &str {
        "connection"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (host, conn) = match args {
            [host] => {
                let conn = env
                    .session
                    .connection(host)
                    .cloned()
                    .ok_or_else(|| ShellError::NotFound(format!("connection '{host}'")))?;
                (*host, conn)
            },
            [host, username, password] => (
                *host,
                Connection {
                    username: username.to_string(),
                    password: password.to_string(),
                },
            ),
            _ => return Err(usage(self)),
        };
        let username = conn.username.clone();
        let mut lines = Vec::new();
        if let Some(previous) = env.session.connect(host, conn) {
            lines.push(format!("Warning: disconnected from {previous}"));
        }
        log::info!("connected to {username}@{host}");
        lines.push(format!("Connected to {username}@{host}"));
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct DisconnectCmd;
impl Command for DisconnectCmd {
    fn name(&self) -> &str {
        "disconnect"
    }
    fn description(&self) -> &str {
        "Drop the active connection"
    }
    fn usage(&self) -> &str {
        "disconnect"
    }
    fn category(&self) -> &str {
        "connection"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let text = match env.session.disconnect() {
            Some(host) => format!("Disconnected from {host}"),
            None => "Not connected".to_string(),
        };
        Ok(CommandOutput::Text(text))
    }
}

struct ConnectionsCmd;
impl Command for ConnectionsCmd {
    fn name(&self) -> &str {
        "connections"
    }
    fn description(&self) -> &str {
        "List saved connections"
    }
    fn usage(&self) -> &str {
        "connections"
    }
    fn category(&self) -> &str {
        "connection"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(format_connections(env.session)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_builtins;
    use plshell_tree::{MemoryTree, ObjectTree};

    struct Fixture {
        reg: CommandRegistry,
        session: SessionState,
        tree: MemoryTree,
    }

    impl Fixture {
        fn new() -> Self {
            let mut reg = CommandRegistry::new();
            register_builtins(&mut reg);
            Self {
                reg,
                session: SessionState::new(),
                tree: MemoryTree::new(),
            }
        }

        fn exec(&mut self, line: &str) -> Result<CommandOutput> {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let mut env = Environment {
                session: &mut self.session,
                tree: &mut self.tree,
                registry: &self.reg,
            };
            self.reg
                .resolve(tokens[0])
                .unwrap()
                .execute(&tokens[1..], &mut env)
        }

        fn text(&mut self, line: &str) -> String {
            match self.exec(line).unwrap() {
                CommandOutput::Text(s) => s,
                other => panic!("expected text, got {other:?}"),
            }
        }
    }

    #[test]
    fn record_and_stop() {
        let mut f = Fixture::new();
        assert_eq!(f.text("record m"), "Macro recording started...");
        assert_eq!(f.session.macros().recording(), Some("m"));
        assert_eq!(f.text("stop"), "Macro recording stopped ('m', 0 lines)");
        assert!(!f.session.macros().is_recording());
    }

    #[test]
    fn record_existing_warns() {
        let mut f = Fixture::new();
        f.session.macros_mut().insert("m", vec![vec!["ls".to_string()]]);
        assert!(f.text("record m").starts_with("Warning: macro 'm' exists"));
    }

    #[test]
    fn record_usage_and_state_errors() {
        let mut f = Fixture::new();
        assert!(matches!(f.exec("record"), Err(ShellError::Usage(_))));
        assert!(matches!(f.exec("record a b"), Err(ShellError::Usage(_))));
        f.exec("record a").unwrap();
        assert!(matches!(
            f.exec("record b"),
            Err(ShellError::RecordingState(_))
        ));
        f.exec("stop").unwrap();
        assert!(matches!(f.exec("stop"), Err(ShellError::RecordingState(_))));
    }

    #[test]
    fn play_signals_known_macro() {
        let mut f = Fixture::new();
        f.session.macros_mut().insert("m", vec![]);
        assert_eq!(
            f.exec("play m").unwrap(),
            CommandOutput::Play {
                name: "m".to_string()
            }
        );
        assert!(matches!(f.exec("play x"), Err(ShellError::NotFound(_))));
        assert!(matches!(f.exec("play"), Err(ShellError::Usage(_))));
    }

    #[test]
    fn list_macros_and_lines() {
        let mut f = Fixture::new();
        assert_eq!(f.text("list"), "No recorded macros");
        f.session.macros_mut().insert(
            "m",
            vec![
                vec!["cd".to_string(), "/a".to_string()],
                vec!["ls".to_string()],
            ],
        );
        f.session.macros_mut().insert("n", vec![]);
        assert_eq!(f.text("list"), "m\nn");
        assert_eq!(f.text("list m"), " 01: cd /a\n 02: ls");
        assert!(matches!(f.exec("list zz"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn rmmacro_refuses_macro_being_recorded() {
        let mut f = Fixture::new();
        f.exec("record m").unwrap();
        assert!(matches!(
            f.exec("rmmacro m"),
            Err(ShellError::RecordingState(_))
        ));
        f.exec("stop").unwrap();
        assert_eq!(f.text("rmmacro m"), "Removed macro 'm'");
        assert!(matches!(f.exec("rmmacro m"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn alias_define_list_replace_remove() {
        let mut f = Fixture::new();
        assert_eq!(f.text("alias"), "No aliases defined");
        assert_eq!(
            f.text("alias l ls /Customers"),
            "Recorded alias 'l' as 'ls /Customers'"
        );
        assert!(f.text("alias l ll").starts_with("Warning: replacing alias 'l'"));
        assert_eq!(f.text("alias"), "l -> ll");
        assert_eq!(f.text("rmalias l"), "Removing alias: l");
        assert!(matches!(f.exec("rmalias l"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn alias_rejects_command_names_and_self_reference() {
        let mut f = Fixture::new();
        assert!(matches!(f.exec("alias ls pwd"), Err(ShellError::Usage(_))));
        assert!(matches!(f.exec("alias x x -l"), Err(ShellError::AliasLoop(_))));
        assert!(matches!(f.exec("alias x"), Err(ShellError::Usage(_))));
        assert!(f.session.aliases().is_empty());
    }

    #[test]
    fn bookmark_stores_current_path() {
        let mut f = Fixture::new();
        f.session.set_cwd("/Customers/Gold");
        assert_eq!(f.text("bookmark gold"), "Storing bookmark gold -> /Customers/Gold");
        assert_eq!(f.session.bookmark_path("gold"), Some("/Customers/Gold"));
        assert_eq!(f.text("goto"), "gold -> /Customers/Gold");
        assert_eq!(f.text("rmbookmark gold"), "Removing bookmark 'gold'");
        assert_eq!(f.text("goto"), "No bookmarks defined");
    }

    #[test]
    fn goto_requires_connection_and_existing_path() {
        let mut f = Fixture::new();
        f.session.bookmark("gold", "/Gold");
        assert!(matches!(f.exec("goto gold"), Err(ShellError::Usage(_))));
        f.exec("connect pre1 admin pw").unwrap();
        assert!(matches!(f.exec("goto gold"), Err(ShellError::Tree(_))));
        f.tree.create("/Gold").unwrap();
        assert_eq!(f.text("goto gold"), "Taking you to /Gold");
        assert_eq!(f.session.cwd(), "/Gold");
        assert!(matches!(f.exec("goto nope"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn connect_new_saved_and_bad_arity() {
        let mut f = Fixture::new();
        assert!(matches!(f.exec("connect pre1"), Err(ShellError::NotFound(_))));
        assert!(matches!(f.exec("connect pre1 admin"), Err(ShellError::Usage(_))));
        assert_eq!(f.text("connect pre1 admin pw"), "Connected to admin@pre1");
        f.exec("disconnect").unwrap();
        assert_eq!(f.text("connect pre1"), "Connected to admin@pre1");
        assert!(
            f.text("connect pre2 root pw2")
                .starts_with("Warning: disconnected from pre1")
        );
        assert_eq!(f.session.active_host(), Some("pre2"));
    }

    #[test]
    fn disconnect_and_connections_listing() {
        let mut f = Fixture::new();
        assert_eq!(f.text("connections"), "No saved connections");
        assert_eq!(f.text("disconnect"), "Not connected");
        f.exec("connect pre1 admin pw").unwrap();
        assert_eq!(
            f.text("connections"),
            "Saved connections:\n* admin@pre1 (active)"
        );
        assert_eq!(f.text("disconnect"), "Disconnected from pre1");
        assert_eq!(f.text("connections"), "Saved connections:\n* admin@pre1");
    }

    #[test]
    fn format_empty_macro() {
        assert_eq!(format_macro(&[]), "(empty macro)");
    }
}
