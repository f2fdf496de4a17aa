//! Macro recording, storage, and on-disk persistence.
//!
//! A macro is a named, ordered list of tokenized command lines. At most one
//! macro is recorded at a time. On disk every macro is one text file in the
//! macro directory, one command per line with tokens joined by single spaces.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::Path;

use plshell_types::error::{Result, ShellError};

use crate::persist::write_atomic;

/// One recorded command line, as tokens.
pub type MacroLine = Vec<String>;

/// Marker that starts a comment line.
pub const COMMENT_MARKER: char = '#';

/// Whether a recorded line is a comment (skipped on replay).
pub fn is_comment(line: &[String]) -> bool {
    line.first().is_some_and(|t| t.starts_with(COMMENT_MARKER))
}

/// Recording state of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordState {
    #[default]
    Idle,
    Recording {
        name: String,
    },
}

/// Named macros plus the current recording state.
#[derive(Debug, Clone, Default)]
pub struct MacroStore {
    macros: BTreeMap<String, Vec<MacroLine>>,
    state: RecordState,
    /// Macros removed since the last save; their files are deleted on save.
    removed: BTreeSet<String>,
}

/// Macro names become file names, so they must be plain path components.
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_whitespace)
    {
        return Err(ShellError::Usage(format!("invalid macro name: '{name}'")));
    }
    Ok(())
}

impl MacroStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording into `name`.
    ///
    /// Returns `true` when the macro already exists and new lines will be
    /// appended to it.
    pub fn start_recording(&mut self, name: &str) -> Result<bool> {
        if let RecordState::Recording { name: current } = &self.state {
            return Err(ShellError::RecordingState(format!(
                "already recording macro '{current}'"
            )));
        }
        validate_name(name)?;
        let existed = self.macros.contains_key(name);
        self.macros.entry(name.to_string()).or_default();
        self.removed.remove(name);
        self.state = RecordState::Recording {
            name: name.to_string(),
        };
        log::info!("recording macro '{name}' (append: {existed})");
        Ok(existed)
    }

    /// Stop recording and return the name of the macro that was recorded.
    pub fn stop_recording(&mut self) -> Result<String> {
        match std::mem::take(&mut self.state) {
            RecordState::Recording { name } => {
                log::info!("stopped recording macro '{name}'");
                Ok(name)
            },
            RecordState::Idle => Err(ShellError::RecordingState(
                "not recording at the moment".to_string(),
            )),
        }
    }

    /// Current recording state.
    pub fn state(&self) -> &RecordState {
        &self.state
    }

    /// Name of the macro being recorded, if any.
    pub fn recording(&self) -> Option<&str> {
        match &self.state {
            RecordState::Recording { name } => Some(name),
            RecordState::Idle => None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording().is_some()
    }

    /// Append a line to the macro being recorded. Returns `false` when idle.
    pub fn append(&mut self, line: MacroLine) -> bool {
        match &self.state {
            RecordState::Recording { name } => {
                self.macros.entry(name.clone()).or_default().push(line);
                true
            },
            RecordState::Idle => false,
        }
    }

    /// Create or replace a macro.
    pub fn insert(&mut self, name: &str, lines: Vec<MacroLine>) -> Option<Vec<MacroLine>> {
        self.removed.remove(name);
        self.macros.insert(name.to_string(), lines)
    }

    /// Sorted macro names.
    pub fn list(&self) -> Vec<&str> {
        self.macros.keys().map(String::as_str).collect()
    }

    /// The lines of a macro.
    pub fn show(&self, name: &str) -> Option<&[MacroLine]> {
        self.macros.get(name).map(Vec::as_slice)
    }

    /// Delete a macro, returning its lines.
    pub fn remove(&mut self, name: &str) -> Option<Vec<MacroLine>> {
        let lines = self.macros.remove(name)?;
        self.removed.insert(name.to_string());
        Some(lines)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Write every macro to `dir` as `<name>.<ext>` and delete the files of
    /// macros removed since the last save.
    ///
    /// Other files in `dir` are never touched, including macro files that
    /// failed to load. A macro that cannot be written is skipped; the others
    /// are still saved and the failures are returned as one error.
    pub fn save(&mut self, dir: &Path, ext: &str) -> Result<usize> {
        fs::create_dir_all(dir)?;
        let mut failed = Vec::new();
        let mut saved = 0;
        for (name, lines) in &self.macros {
            let written = validate_name(name)
                .and_then(|()| write_atomic(&dir.join(format!("{name}.{ext}")), render(lines).as_bytes()));
            match written {
                Ok(()) => saved += 1,
                Err(e) => {
                    log::warn!("could not save macro '{name}': {e}");
                    failed.push(name.clone());
                },
            }
        }
        self.removed.retain(|name| {
            if validate_name(name).is_err() {
                return false;
            }
            let path = dir.join(format!("{name}.{ext}"));
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("removed macro file {}", path.display());
                    false
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => false,
                Err(e) => {
                    log::warn!("could not remove {}: {e}", path.display());
                    failed.push(name.clone());
                    true
                },
            }
        });
        if !failed.is_empty() {
            return Err(ShellError::Persistence(format!(
                "could not save macros: {}",
                failed.join(", ")
            )));
        }
        Ok(saved)
    }

    /// Load one macro file, naming the macro after the file stem.
    ///
    /// Replaces any macro with the same name. Blank lines are skipped.
    pub fn load_file(&mut self, path: &Path) -> Result<String> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ShellError::Persistence(format!("bad macro file name: {}", path.display())))?
            .to_string();
        validate_name(&name)?;
        let text = fs::read_to_string(path)?;
        let lines: Vec<MacroLine> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(parse_line)
            .collect();
        self.insert(&name, lines);
        Ok(name)
    }

    /// Load every `*.<ext>` file in `dir`. A missing directory loads nothing.
    ///
    /// Unreadable files are logged and skipped.
    pub fn load_dir(&mut self, dir: &Path, ext: &str) -> Result<usize> {
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|e| e == ext))
            .collect();
        paths.sort();
        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path) {
                Ok(_) => loaded += 1,
                Err(e) => log::warn!("skipping macro file {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }
}

/// Macro lines as file text, one line per command.
pub(crate) fn render(lines: &[MacroLine]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

/// Split a stored line into tokens.
///
/// Comment lines keep their exact spacing; commands are split on whitespace.
fn parse_line(line: &str) -> MacroLine {
    if line.starts_with(COMMENT_MARKER) {
        line.split(' ').map(str::to_string).collect()
    } else {
        line.split_whitespace().map(str::to_string).collect()
    }
}
