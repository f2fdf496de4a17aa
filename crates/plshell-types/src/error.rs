//! Error types for plshell.

use std::io;

/// Errors produced by the plshell crates.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("recording error: {0}")]
    RecordingState(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("alias loop: {0}")]
    AliasLoop(String),

    #[error("nesting too deep: {0}")]
    Nesting(String),

    #[error("object tree error: {0}")]
    Tree(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
