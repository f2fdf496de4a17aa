//! Command interpreter for plshell.
//!
//! Commands implement the `Command` trait and are registered by name in a
//! `CommandRegistry`. The `Dispatcher` owns the registry, the session, and the
//! object tree: it parses input lines, expands aliases, records macros, and
//! invokes command handlers. Session state survives restarts through the
//! `persist` module.

mod commands;
mod completion;
mod dispatcher;
mod edit;
mod interpreter;
mod line;
mod macros;
pub mod persist;
mod session;
pub mod session_commands;
pub mod tree_commands;

/// Register all built-in commands (shell, session, tree) into a registry.
pub use commands::register_builtins;
/// Help text for every registered command.
pub use commands::extended_help;
/// Completion candidates captured from a registry and session.
pub use completion::Completions;
/// Line dispatcher, its control flow result, and the cancellation flag.
pub use dispatcher::{CancelToken, DEFAULT_MAX_DEPTH, Dispatcher, Flow, RunMode};
/// Where `edit` keeps macro files and which editor it launches.
pub use edit::EditorSettings;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text and signals).
pub use interpreter::CommandOutput;
/// Registry of available commands.
pub use interpreter::CommandRegistry;
/// Shared mutable environment passed to every command.
pub use interpreter::Environment;
pub use interpreter::tokenize;
/// Prompt line parsing and output filtering.
pub use line::{LineFilter, LineOutcome, ParsedLine, parse_line};
pub use macros::{COMMENT_MARKER, MacroLine, MacroStore, RecordState, is_comment};
pub use persist::{LoadReport, load_session, save_session};
pub use session::{Connection, SessionState};
/// Register macro, alias, bookmark, and connection commands into a registry.
pub use session_commands::{format_connections, format_macro, register_session_commands};
/// Register object tree commands into a registry.
pub use tree_commands::register_tree_commands;
