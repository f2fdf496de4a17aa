//! Shell configuration loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration rooted in the user's home directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Runtime configuration for the shell.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// TOML document holding connections, aliases, and bookmarks.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Line-editor history file.
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,
    /// Directory with one file per recorded macro.
    #[serde(default = "default_macro_dir")]
    pub macro_dir: PathBuf,
    /// File extension used for macro files (without the dot).
    #[serde(default = "default_macro_extension")]
    pub macro_extension: String,
    /// Maximum alias/macro nesting before dispatch gives up.
    #[serde(default = "default_max_alias_depth")]
    pub max_alias_depth: usize,
    /// Maximum in-session history entries kept for the `history` command.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Show a bare `>> ` prompt instead of the connection/path prompt.
    #[serde(default)]
    pub simple_prompt: bool,
    /// Command used by `edit`. Falls back to `$EDITOR`, then `nano -w`.
    #[serde(default)]
    pub editor: Option<String>,
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
fn default_state_file() -> PathBuf {
    home().join(".plshell_state.toml")
}
fn default_history_file() -> PathBuf {
    home().join(".plshell_history")
}
fn default_macro_dir() -> PathBuf {
    home().join(".plshell_macros")
}
fn default_macro_extension() -> String {
    "pli".to_string()
}
fn default_max_alias_depth() -> usize {
    16
}
fn default_max_history() -> usize {
    500
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            history_file: default_history_file(),
            macro_dir: default_macro_dir(),
            macro_extension: default_macro_extension(),
            max_alias_depth: default_max_alias_depth(),
            max_history: default_max_history(),
            simple_prompt: false,
            editor: None,
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(text).map_err(|e| ShellError::Config(format!("config: {e}")))?;
        if cfg.max_alias_depth == 0 {
            return Err(ShellError::Config(
                "max_alias_depth must be at least 1".to_string(),
            ));
        }
        if cfg.macro_extension.is_empty() || cfg.macro_extension.contains('.') {
            return Err(ShellError::Config(format!(
                "invalid macro_extension: '{}'",
                cfg.macro_extension
            )));
        }
        Ok(cfg)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load `path` when given, falling back to defaults when it is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let cfg = Self::load(p)?;
                log::info!("Loaded config from {}", p.display());
                Ok(cfg)
            },
            None => Ok(Self::default()),
        }
    }

    /// The editor command line: the configured one, `$EDITOR`, or `nano -w`.
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| "nano -w".to_string())
    }

    /// Build a configuration that keeps all state under `dir`.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            state_file: dir.join("state.toml"),
            history_file: dir.join("history"),
            macro_dir: dir.join("macros"),
            ..Self::default()
        }
    }
}
