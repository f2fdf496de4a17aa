//! Interactive prompt: line editing, completion, and output printing.

use std::io::Write;

use anyhow::Result;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use plshell_terminal::{CommandOutput, Completions, Dispatcher, Flow, SessionState};
use plshell_types::ShellConfig;

/// Line editor helper that completes from a snapshot of the session.
///
/// The snapshot is refreshed before every prompt, since commands may add
/// macros, aliases, bookmarks, or connections.
#[derive(Default)]
pub struct ShellHelper {
    names: Completions,
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let before = &line[..pos];
        let start = before
            .rfind(|c: char| c.is_whitespace() || c == ';')
            .map(|i| i + 1)
            .unwrap_or(0);
        Ok((start, self.names.candidates(before)))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// The prompt: statement counter, connection, and current path.
pub fn render_prompt(session: &SessionState, count: usize, simple: bool) -> String {
    if simple {
        return ">> ".to_string();
    }
    let active = session
        .active_host()
        .and_then(|host| session.connection(host).map(|conn| (host, conn)));
    match active {
        Some((host, conn)) => format!(
            ">> [{count}] ({}@{host}) ({}): ",
            conn.username,
            session.cwd()
        ),
        None => format!(">> [{count}]: (disconnected): "),
    }
}

/// Print command output to stdout.
pub fn print_output(output: Vec<CommandOutput>) {
    let mut stdout = std::io::stdout().lock();
    for entry in output {
        let result = match entry {
            CommandOutput::Text(text) => writeln!(stdout, "{text}"),
            CommandOutput::Clear => write!(stdout, "\x1B[2J\x1B[1;1H"),
            _ => Ok(()),
        };
        if let Err(e) = result {
            log::warn!("failed to write output: {e}");
            return;
        }
    }
    if let Err(e) = stdout.flush() {
        log::warn!("failed to flush output: {e}");
    }
}

/// Run the interactive prompt until `quit`, end of input, or an interrupt.
pub fn run(shell: &mut Dispatcher, config: &ShellConfig) -> Result<()> {
    let mut editor: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ShellHelper::default()));
    match editor.load_history(&config.history_file) {
        Ok(()) => log::info!("read history from {}", config.history_file.display()),
        Err(e) => log::info!("no history loaded: {e}"),
    }

    println!("plshell v{}", env!("CARGO_PKG_VERSION"));
    println!("To get a list of commands, type help");
    println!();

    let cancel = shell.cancel_token();
    let mut count = 0;
    loop {
        if let Some(helper) = editor.helper_mut() {
            helper.names = shell.completion_snapshot();
        }
        let session = shell.session();
        let prompt = render_prompt(session, count, session.simple_prompt());
        match editor.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = editor.add_history_entry(line.as_str()) {
                    log::warn!("could not add history entry: {e}");
                }
                cancel.reset();
                match shell.execute_line(&line) {
                    Ok(outcome) => {
                        count += outcome.dispatched;
                        print_output(outcome.output);
                        if outcome.flow == Flow::Quit {
                            break;
                        }
                    },
                    Err(e) => eprintln!("error: {e}"),
                }
            },
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!();
                break;
            },
            Err(e) => return Err(e.into()),
        }
    }

    if let Err(e) = editor.save_history(&config.history_file) {
        log::warn!(
            "could not write history to {}: {e}",
            config.history_file.display()
        );
    }
    println!("Exiting...");
    Ok(())
}
