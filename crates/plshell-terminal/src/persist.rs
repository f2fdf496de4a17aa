//! Session persistence.
//!
//! Connections, aliases, and bookmarks are stored in one TOML document with
//! a named table per category. Each table is decoded on its own, so a damaged
//! `[aliases]` table does not cost the user their bookmarks. Macros are
//! stored as one file each in the macro directory (see [`MacroStore::save`]).
//!
//! [`MacroStore::save`]: crate::macros::MacroStore::save

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use plshell_types::ShellConfig;
use plshell_types::error::{Result, ShellError};

use crate::macros::{MacroLine, validate_name};
use crate::session::{Connection, SessionState};

const CONNECTIONS: &str = "connections";
const ALIASES: &str = "aliases";
const BOOKMARKS: &str = "bookmarks";
const MACROS: &str = "macros";

#[derive(Serialize)]
struct StateDocument<'a> {
    connections: &'a BTreeMap<String, Connection>,
    aliases: &'a BTreeMap<String, String>,
    bookmarks: &'a BTreeMap<String, String>,
}

/// What a call to [`load_session`] restored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub connections: usize,
    pub aliases: usize,
    pub bookmarks: usize,
    pub macros: usize,
    /// Problems that were tolerated (each category degrades to empty).
    pub problems: Vec<String>,
}

/// Write `data` to `path` by writing a sibling temporary file and renaming
/// it over the target.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ShellError::Persistence(format!("not a file path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Decode one table of the state document, degrading to empty on failure.
fn section<T: DeserializeOwned + Default>(
    table: &toml::Table,
    key: &str,
    problems: &mut Vec<String>,
) -> T {
    match table.get(key) {
        None => T::default(),
        Some(value) => match value.clone().try_into() {
            Ok(v) => v,
            Err(e) => {
                let msg = format!("could not load {key}: {e}");
                log::warn!("{msg}");
                problems.push(msg);
                T::default()
            },
        },
    }
}

/// Restore session state from the configured state file and macro directory.
///
/// Never fails: every problem is logged, recorded in the report, and the
/// affected category is left empty. Macro files are loaded first; macros in
/// the state document's `[macros]` table are applied afterwards and win on
/// name collisions.
pub fn load_session(config: &ShellConfig, session: &mut SessionState) -> LoadReport {
    let mut report = LoadReport::default();

    let table = match fs::read_to_string(&config.state_file) {
        Ok(text) => match text.parse::<toml::Table>() {
            Ok(t) => Some(t),
            Err(e) => {
                let msg = format!(
                    "state file {} is not valid TOML: {e}",
                    config.state_file.display()
                );
                log::warn!("{msg}");
                report.problems.push(msg);
                None
            },
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no state file at {}", config.state_file.display());
            None
        },
        Err(e) => {
            let msg = format!("could not read {}: {e}", config.state_file.display());
            log::warn!("{msg}");
            report.problems.push(msg);
            None
        },
    };
    let table = table.unwrap_or_default();

    let connections: BTreeMap<String, Connection> =
        section(&table, CONNECTIONS, &mut report.problems);
    let aliases: BTreeMap<String, String> = section(&table, ALIASES, &mut report.problems);
    let bookmarks: BTreeMap<String, String> = section(&table, BOOKMARKS, &mut report.problems);
    report.connections = connections.len();
    report.aliases = aliases.len();
    report.bookmarks = bookmarks.len();
    session.replace_connections(connections);
    session.replace_aliases(aliases);
    session.replace_bookmarks(bookmarks);

    let macros = session.macros_mut();
    if let Err(e) = macros.load_dir(&config.macro_dir, &config.macro_extension) {
        let msg = format!("could not read macro directory: {e}");
        log::warn!("{msg}");
        report.problems.push(msg);
    }
    let embedded: BTreeMap<String, Vec<MacroLine>> = section(&table, MACROS, &mut report.problems);
    for (name, lines) in embedded {
        if let Err(e) = validate_name(&name) {
            let msg = format!("skipping macro from state file: {e}");
            log::warn!("{msg}");
            report.problems.push(msg);
            continue;
        }
        let lines = lines
            .into_iter()
            .filter(|line| !line.join(" ").trim().is_empty())
            .collect();
        macros.insert(&name, lines);
    }
    report.macros = macros.len();

    log::info!(
        "restored {} connections, {} aliases, {} bookmarks, {} macros",
        report.connections,
        report.aliases,
        report.bookmarks,
        report.macros
    );
    report
}

/// Persist session state to the configured state file and macro directory.
///
/// An active recording is stopped first.
pub fn save_session(config: &ShellConfig, session: &mut SessionState) -> Result<()> {
    if session.macros().is_recording() {
        session.macros_mut().stop_recording()?;
    }

    let doc = StateDocument {
        connections: session.connections(),
        aliases: session.aliases(),
        bookmarks: session.bookmarks(),
    };
    let text = toml::to_string(&doc)?;
    if let Some(parent) = config.state_file.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    write_atomic(&config.state_file, text.as_bytes())
        .map_err(|e| ShellError::Persistence(format!("{}: {e}", config.state_file.display())))?;

    let saved = session
        .macros_mut()
        .save(&config.macro_dir, &config.macro_extension)
        .map_err(|e| ShellError::Persistence(format!("{}: {e}", config.macro_dir.display())))?;
    log::info!(
        "saved state to {} and {saved} macros to {}",
        config.state_file.display(),
        config.macro_dir.display()
    );
    Ok(())
}
