//! Editing macros and script files in an external editor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use plshell_types::ShellConfig;
use plshell_types::error::{Result, ShellError};

use crate::dispatcher::Dispatcher;
use crate::macros::render;
use crate::persist::write_atomic;

/// Where macro files live and the command line that edits a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub macro_dir: PathBuf,
    pub macro_extension: String,
    /// Program and leading arguments; the file path is appended.
    pub command: String,
}

impl EditorSettings {
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            macro_dir: config.macro_dir.clone(),
            macro_extension: config.macro_extension.clone(),
            command: config.editor_command(),
        }
    }

    fn macro_path(&self, name: &str) -> PathBuf {
        self.macro_dir
            .join(format!("{name}.{}", self.macro_extension))
    }
}

impl Dispatcher {
    /// Open `target` in the editor.
    ///
    /// A macro name is written to its file first and reloaded once the
    /// editor exits. Anything else is treated as a file path and created
    /// empty when it does not exist.
    pub(crate) fn edit(&mut self, target: &str) -> Result<()> {
        let settings = self.editor().clone();
        let macro_name = self
            .session()
            .macros()
            .contains(target)
            .then(|| target.to_string());

        let path = match &macro_name {
            Some(name) => {
                let path = settings.macro_path(name);
                fs::create_dir_all(&settings.macro_dir)?;
                let text = render(self.session().macros().show(name).unwrap_or_default());
                write_atomic(&path, text.as_bytes())?;
                path
            },
            None => {
                let path = PathBuf::from(target);
                if !path.exists() {
                    fs::write(&path, "")?;
                    self.emit(format!("Created empty file {}", path.display()));
                }
                path
            },
        };

        launch(&settings.command, &path)?;

        if let Some(name) = macro_name {
            self.session_mut().macros_mut().load_file(&path)?;
            let count = self.session().macros().show(&name).map_or(0, <[_]>::len);
            self.emit(format!("Reloaded macro '{name}' ({count} lines)"));
        }
        Ok(())
    }
}

/// Run the editor on `path` and wait for it to exit.
fn launch(command: &str, path: &Path) -> Result<()> {
    let mut parts = command.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ShellError::Config("empty editor command".to_string()))?;
    log::info!("editing {} with {program}", path.display());
    let status = process::Command::new(program).args(parts).arg(path).status()?;
    if !status.success() {
        return Err(ShellError::Io(io::Error::other(format!(
            "editor '{program}' exited with {status}"
        ))));
    }
    Ok(())
}
