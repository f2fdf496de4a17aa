//! Line dispatch: alias expansion, macro capture, replay, and scripts.
//!
//! Two call paths reach a command handler. [`Dispatcher::dispatch`] is the
//! interactive path: it expands aliases and captures the line into the macro
//! being recorded. [`Dispatcher::invoke`] is the replay path used by `play`,
//! scripts, and `-e`: it runs the handler directly, so replayed lines are
//! never captured.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use plshell_tree::ObjectTree;
use plshell_types::ShellConfig;
use plshell_types::error::{Result, ShellError};

use crate::completion::Completions;
use crate::edit::EditorSettings;
use crate::interpreter::{CommandOutput, CommandRegistry, Environment, tokenize};
use crate::macros::{COMMENT_MARKER, MacroLine, is_comment};
use crate::session::SessionState;

/// Default bound on alias substitutions and macro/script nesting.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Whether the session continues after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// How a script treats a line naming an unknown command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Report the failing line and keep going.
    Interactive,
    /// Report the failing line and return the error (exit status 1).
    Batch,
}

/// Shared flag that stops a running script or macro between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the registry, the session, and the object tree, and routes lines to
/// command handlers.
///
/// Visible output is buffered; callers drain it with [`take_output`] after
/// each dispatch.
///
/// [`take_output`]: Dispatcher::take_output
pub struct Dispatcher {
    registry: CommandRegistry,
    session: SessionState,
    tree: Box<dyn ObjectTree>,
    max_depth: usize,
    quiet: bool,
    cancel: CancelToken,
    editor: EditorSettings,
    output: Vec<CommandOutput>,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, session: SessionState, tree: Box<dyn ObjectTree>) -> Self {
        Self {
            registry,
            session,
            tree,
            max_depth: DEFAULT_MAX_DEPTH,
            quiet: false,
            cancel: CancelToken::new(),
            editor: EditorSettings::from_config(&ShellConfig::default()),
            output: Vec::new(),
        }
    }

    /// Bound alias substitution and macro/script nesting to `depth` levels.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Set where `edit` finds macro files and which program it runs.
    pub fn with_editor(mut self, editor: EditorSettings) -> Self {
        self.editor = editor;
        self
    }

    /// Suppress the `Executing:` and `Recorded:` echo lines.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// A handle to the cancellation flag checked between replayed lines.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn tree(&self) -> &dyn ObjectTree {
        self.tree.as_ref()
    }

    pub(crate) fn editor(&self) -> &EditorSettings {
        &self.editor
    }

    /// Drain the output produced since the last call.
    pub fn take_output(&mut self) -> Vec<CommandOutput> {
        std::mem::take(&mut self.output)
    }

    /// Number of buffered output entries.
    pub(crate) fn output_len(&self) -> usize {
        self.output.len()
    }

    /// Remove and return the output produced after `mark` entries.
    pub(crate) fn output_since(&mut self, mark: usize) -> Vec<CommandOutput> {
        self.output.split_off(mark.min(self.output.len()))
    }

    pub(crate) fn emit(&mut self, text: impl Into<String>) {
        self.output.push(CommandOutput::Text(text.into()));
    }

    fn echo(&mut self, prefix: &str, line: &str) {
        if !self.quiet {
            self.emit(format!("{prefix}: {line}"));
        }
    }

    // -- Interactive path --

    /// Dispatch one statement typed at the prompt.
    ///
    /// Comment lines are captured verbatim while recording and otherwise
    /// ignored. A leading alias is replaced by its expansion (trailing
    /// arguments are kept) and the result dispatched again. A resolved
    /// command is captured into the macro being recorded, unless it is
    /// `record` or `stop`, before its handler runs.
    pub fn dispatch(&mut self, line: &str) -> Result<Flow> {
        self.dispatch_at(line, 0)
    }

    fn dispatch_at(&mut self, line: &str, depth: usize) -> Result<Flow> {
        let line = line.trim_start();
        if line.starts_with(COMMENT_MARKER) {
            let raw: MacroLine = line.trim_end().split(' ').map(str::to_string).collect();
            self.session.macros_mut().append(raw);
            return Ok(Flow::Continue);
        }

        let mut tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            return Ok(Flow::Continue);
        };

        if let Some(expansion) = self.session.alias(first) {
            if depth >= self.max_depth {
                return Err(ShellError::AliasLoop(format!(
                    "'{first}' still expanding after {} substitutions",
                    self.max_depth
                )));
            }
            log::debug!("alias '{first}' -> '{expansion}'");
            let mut expanded = tokenize(expansion);
            expanded.extend(tokens.drain(1..));
            return self.dispatch_at(&expanded.join(" "), depth + 1);
        }

        if !self.registry.contains(first) {
            return Err(ShellError::UnknownCommand(first.clone()));
        }

        if self.session.macros().is_recording() && first != "record" && first != "stop" {
            let joined = tokens.join(" ");
            self.echo("Recorded", &joined);
            self.session.macros_mut().append(tokens.clone());
        }

        self.invoke_at(&tokens, 0)
    }

    // -- Replay path --

    /// Run a tokenized line without alias expansion or macro capture.
    pub fn invoke(&mut self, tokens: &[String]) -> Result<Flow> {
        self.invoke_at(tokens, 0)
    }

    fn invoke_at(&mut self, tokens: &[String], depth: usize) -> Result<Flow> {
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        let output = {
            let cmd = self
                .registry
                .resolve(name)
                .ok_or_else(|| ShellError::UnknownCommand(name.clone()))?;
            let mut env = Environment {
                session: &mut self.session,
                tree: self.tree.as_mut(),
                registry: &self.registry,
            };
            cmd.execute(&args, &mut env)?
        };

        match output {
            CommandOutput::None => {},
            CommandOutput::Text(_) | CommandOutput::Clear => self.output.push(output),
            CommandOutput::Play { name } => return self.play_at(&name, depth + 1),
            CommandOutput::RunScript { path } => {
                return self.run_script_at(Path::new(&path), RunMode::Interactive, depth + 1);
            },
            CommandOutput::Edit { target } => self.edit(&target)?,
            CommandOutput::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Replay a stored macro line by line, skipping comments.
    ///
    /// An unknown command aborts the replay with its error, as do interrupts
    /// and the nesting bound. Other handler errors are reported and the
    /// replay continues with the next line.
    pub fn play(&mut self, name: &str) -> Result<Flow> {
        self.play_at(name, 0)
    }

    fn play_at(&mut self, name: &str, depth: usize) -> Result<Flow> {
        if depth > self.max_depth {
            return Err(ShellError::Nesting(format!(
                "macro '{name}' nested more than {} levels",
                self.max_depth
            )));
        }
        let lines = self
            .session
            .macros()
            .show(name)
            .ok_or_else(|| ShellError::NotFound(format!("macro '{name}'")))?
            .to_vec();
        log::info!("playing macro '{name}' ({} lines)", lines.len());

        for line in &lines {
            if self.cancel.is_cancelled() {
                return Err(ShellError::Interrupted);
            }
            if is_comment(line) {
                continue;
            }
            self.echo("Executing", &line.join(" "));
            match self.invoke_at(line, depth) {
                Ok(Flow::Continue) => {},
                Ok(Flow::Quit) => return Ok(Flow::Quit),
                Err(
                    e @ (ShellError::UnknownCommand(_)
                    | ShellError::Interrupted
                    | ShellError::Nesting(_)),
                ) => return Err(e),
                Err(e) => self.emit(format!("error: {e}")),
            }
        }
        Ok(Flow::Continue)
    }

    /// Execute a script file.
    pub fn run_script(&mut self, path: &Path, mode: RunMode) -> Result<Flow> {
        self.run_script_at(path, mode, 0)
    }

    fn run_script_at(&mut self, path: &Path, mode: RunMode, depth: usize) -> Result<Flow> {
        let text = fs::read_to_string(path)?;
        log::info!("running script {}", path.display());
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        self.run_lines_at(&lines, mode, depth)
    }

    /// Execute a sequence of statements, one per entry.
    ///
    /// Blank entries and comments are skipped. A line naming an unknown
    /// command produces a numbered listing with that line marked; other
    /// handler errors are reported and the run continues.
    pub fn run_lines(&mut self, lines: &[String], mode: RunMode) -> Result<Flow> {
        self.run_lines_at(lines, mode, 0)
    }

    fn run_lines_at(&mut self, lines: &[String], mode: RunMode, depth: usize) -> Result<Flow> {
        if depth > self.max_depth {
            return Err(ShellError::Nesting(format!(
                "scripts nested more than {} levels",
                self.max_depth
            )));
        }
        let lines: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        for (index, line) in lines.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(ShellError::Interrupted);
            }
            if line.starts_with(COMMENT_MARKER) {
                continue;
            }
            self.echo("Executing", line);
            match self.invoke_at(&tokenize(line), depth) {
                Ok(Flow::Continue) => {},
                Ok(Flow::Quit) => return Ok(Flow::Quit),
                Err(ShellError::UnknownCommand(name)) => {
                    self.emit(format!("Command error: command '{name}' not found."));
                    self.emit(failing_listing(&lines, index));
                    if mode == RunMode::Batch {
                        return Err(ShellError::UnknownCommand(name));
                    }
                },
                Err(e @ (ShellError::Interrupted | ShellError::Nesting(_))) => return Err(e),
                Err(e) => self.emit(format!("error: {e}")),
            }
        }
        Ok(Flow::Continue)
    }

    /// Load a script file as a macro named after the file stem.
    pub fn import_script(&mut self, path: &Path) -> Result<String> {
        let name = self.session.macros_mut().load_file(path)?;
        log::info!("imported {} as macro '{name}'", path.display());
        Ok(name)
    }

    // -- Completion --

    /// Snapshot of the names used for completion.
    pub fn completion_snapshot(&self) -> Completions {
        Completions::from_session(&self.registry, &self.session)
    }

    /// Completion candidates for the word being typed at the end of `line`.
    pub fn completions(&self, line: &str) -> Vec<String> {
        self.completion_snapshot().candidates(line)
    }
}

/// Numbered listing of a script with the failing line marked.
fn failing_listing(lines: &[&str], failing: usize) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == failing {
                format!(" {:02}: {line}  <-- Failing command", i + 1)
            } else {
                format!(" {:02}: {line}", i + 1)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::interpreter::{Command, tests::TagCmd};
    use crate::register_builtins;
    use plshell_tree::MemoryTree;

    /// Command that reports its name and arguments as output.
    struct EchoCmd(&'static str);

    impl Command for EchoCmd {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "Report the invocation"
        }
        fn usage(&self) -> &str {
            "echo [ARGS...]"
        }
        fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(
                std::iter::once(self.0)
                    .chain(args.iter().copied())
                    .collect::<Vec<_>>()
                    .join(" "),
            ))
        }
    }

    /// A quiet dispatcher with the built-ins plus echo commands named `ls`, `pwd`,
    /// and `show`.
    pub(crate) fn shell() -> Dispatcher {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        reg.register(Box::new(EchoCmd("ls")));
        reg.register(Box::new(EchoCmd("pwd")));
        reg.register(Box::new(EchoCmd("show")));
        let mut d = Dispatcher::new(reg, SessionState::new(), Box::new(MemoryTree::new()));
        d.set_quiet(true);
        d
    }

    pub(crate) fn texts(d: &mut Dispatcher) -> Vec<String> {
        d.take_output()
            .into_iter()
            .filter_map(|o| match o {
                CommandOutput::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn toks(s: &str) -> MacroLine {
        tokenize(s)
    }

    fn recorded(d: &Dispatcher, name: &str) -> Vec<MacroLine> {
        d.session().macros().show(name).unwrap().to_vec()
    }

    #[test]
    fn dispatch_invokes_handler_with_arguments() {
        let mut d = shell();
        assert_eq!(d.dispatch("  show  a   b ").unwrap(), Flow::Continue);
        assert_eq!(texts(&mut d), vec!["show a b"]);
    }

    #[test]
    fn empty_and_blank_lines_are_noops() {
        let mut d = shell();
        assert_eq!(d.dispatch("").unwrap(), Flow::Continue);
        assert_eq!(d.dispatch("   \t").unwrap(), Flow::Continue);
        assert!(d.take_output().is_empty());
    }

    #[test]
    fn unknown_command_is_error() {
        let mut d = shell();
        let err = d.dispatch("frobnicate now").unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref n) if n == "frobnicate"));
    }

    #[test]
    fn last_registration_is_dispatched() {
        let mut d = shell();
        d.registry.register(Box::new(TagCmd {
            name: "show".to_string(),
            tag: "replaced".to_string(),
        }));
        d.dispatch("show").unwrap();
        assert_eq!(texts(&mut d), vec!["replaced"]);
    }

    #[test]
    fn quit_ends_the_session() {
        let mut d = shell();
        assert_eq!(d.dispatch("quit").unwrap(), Flow::Quit);
        assert_eq!(d.dispatch("exit").unwrap(), Flow::Quit);
    }

    #[test]
    fn alias_is_equivalent_to_its_expansion_including_capture() {
        let mut via_alias = shell();
        via_alias.session_mut().set_alias("a", "show x y");
        via_alias.dispatch("record m").unwrap();
        via_alias.dispatch("a").unwrap();
        via_alias.dispatch("stop").unwrap();

        let mut direct = shell();
        direct.dispatch("record m").unwrap();
        direct.dispatch("show x y").unwrap();
        direct.dispatch("stop").unwrap();

        assert_eq!(texts(&mut via_alias), texts(&mut direct));
        assert_eq!(recorded(&via_alias, "m"), recorded(&direct, "m"));
        assert_eq!(recorded(&via_alias, "m"), vec![toks("show x y")]);
    }

    #[test]
    fn alias_keeps_trailing_arguments() {
        let mut d = shell();
        d.session_mut().set_alias("s", "show -l");
        d.dispatch("s /Customers").unwrap();
        assert_eq!(texts(&mut d), vec!["show -l /Customers"]);
    }

    #[test]
    fn alias_chains_resolve() {
        let mut d = shell();
        d.session_mut().set_alias("a", "b 1");
        d.session_mut().set_alias("b", "show 2");
        d.dispatch("a").unwrap();
        assert_eq!(texts(&mut d), vec!["show 2 1"]);
    }

    #[test]
    fn self_alias_is_alias_loop() {
        let mut d = shell();
        d.session_mut().set_alias("x", "x");
        assert!(matches!(d.dispatch("x"), Err(ShellError::AliasLoop(_))));
    }

    #[test]
    fn cyclic_aliases_are_alias_loop() {
        let mut d = shell().with_max_depth(4);
        d.session_mut().set_alias("a", "b");
        d.session_mut().set_alias("b", "a");
        assert!(matches!(d.dispatch("a"), Err(ShellError::AliasLoop(_))));
    }

    #[test]
    fn recording_captures_n_lines_in_order_without_record_or_stop() {
        let mut d = shell();
        d.dispatch("record m").unwrap();
        d.dispatch("ls").unwrap();
        d.dispatch("show 1").unwrap();
        d.dispatch("pwd").unwrap();
        d.dispatch("stop").unwrap();
        assert_eq!(
            recorded(&d, "m"),
            vec![toks("ls"), toks("show 1"), toks("pwd")]
        );
    }

    #[test]
    fn unknown_commands_are_not_captured() {
        let mut d = shell();
        d.dispatch("record m").unwrap();
        assert!(d.dispatch("nope").is_err());
        d.dispatch("stop").unwrap();
        assert!(recorded(&d, "m").is_empty());
    }

    #[test]
    fn recorded_echo_unless_quiet() {
        let mut d = shell();
        d.set_quiet(false);
        d.dispatch("record m").unwrap();
        d.take_output();
        d.dispatch("show 1").unwrap();
        assert_eq!(texts(&mut d), vec!["Recorded: show 1", "show 1"]);
    }

    #[test]
    fn double_record_keeps_first_target() {
        let mut d = shell();
        d.dispatch("record first").unwrap();
        d.dispatch("ls").unwrap();
        let err = d.dispatch("record second").unwrap_err();
        assert!(matches!(err, ShellError::RecordingState(_)));
        d.dispatch("pwd").unwrap();
        d.dispatch("stop").unwrap();
        assert_eq!(recorded(&d, "first"), vec![toks("ls"), toks("pwd")]);
        assert!(!d.session().macros().contains("second"));
    }

    #[test]
    fn play_runs_lines_in_order() {
        let mut d = shell();
        d.session_mut()
            .macros_mut()
            .insert("m", vec![toks("ls"), toks("pwd")]);
        d.dispatch("play m").unwrap();
        assert_eq!(texts(&mut d), vec!["ls", "pwd"]);
    }

    #[test]
    fn play_while_recording_does_not_capture_replayed_lines() {
        let mut d = shell();
        d.session_mut()
            .macros_mut()
            .insert("m", vec![toks("ls"), toks("pwd")]);
        d.dispatch("record r").unwrap();
        d.dispatch("play m").unwrap();
        d.dispatch("stop").unwrap();
        assert_eq!(recorded(&d, "r"), vec![toks("play m")]);
        assert_eq!(recorded(&d, "m"), vec![toks("ls"), toks("pwd")]);
    }

    #[test]
    fn play_method_bypasses_capture() {
        let mut d = shell();
        d.session_mut().macros_mut().insert("m", vec![toks("ls")]);
        d.dispatch("record r").unwrap();
        d.play("m").unwrap();
        d.dispatch("stop").unwrap();
        assert!(recorded(&d, "r").is_empty());
    }

    #[test]
    fn comments_are_captured_and_skipped_on_replay() {
        let mut d = shell();
        d.dispatch("record m").unwrap();
        d.dispatch("# list  things").unwrap();
        d.dispatch("ls").unwrap();
        d.dispatch("stop").unwrap();
        assert_eq!(
            recorded(&d, "m"),
            vec![
                vec!["#", "list", "", "things"]
                    .into_iter()
                    .map(str::to_string)
                    .collect::<MacroLine>(),
                toks("ls")
            ]
        );
        d.take_output();
        d.play("m").unwrap();
        assert_eq!(texts(&mut d), vec!["ls"]);
    }

    #[test]
    fn comment_when_idle_is_ignored() {
        let mut d = shell();
        assert_eq!(d.dispatch("# nothing").unwrap(), Flow::Continue);
        assert!(d.take_output().is_empty());
        assert!(d.session().macros().is_empty());
    }

    #[test]
    fn play_echoes_executing_unless_quiet() {
        let mut d = shell();
        d.set_quiet(false);
        d.session_mut().macros_mut().insert("m", vec![toks("ls")]);
        d.play("m").unwrap();
        assert_eq!(texts(&mut d), vec!["Executing: ls", "ls"]);
    }

    #[test]
    fn play_missing_macro_is_not_found() {
        let mut d = shell();
        assert!(matches!(d.play("ghost"), Err(ShellError::NotFound(_))));
    }

    #[test]
    fn play_aborts_on_unknown_command() {
        let mut d = shell();
        d.session_mut()
            .macros_mut()
            .insert("m", vec![toks("ls"), toks("bogus"), toks("pwd")]);
        assert!(matches!(d.play("m"), Err(ShellError::UnknownCommand(_))));
        assert_eq!(texts(&mut d), vec!["ls"]);
    }

    #[test]
    fn play_reports_handler_errors_and_continues() {
        let mut d = shell();
        d.session_mut()
            .macros_mut()
            .insert("m", vec![toks("stop"), toks("ls")]);
        assert_eq!(d.play("m").unwrap(), Flow::Continue);
        assert_eq!(
            texts(&mut d),
            vec!["error: recording error: not recording at the moment", "ls"]
        );
    }

    #[test]
    fn self_playing_macro_hits_nesting_bound() {
        let mut d = shell().with_max_depth(3);
        d.session_mut().macros_mut().insert("m", vec![toks("play m")]);
        assert!(matches!(d.play("m"), Err(ShellError::Nesting(_))));
    }

    #[test]
    fn quit_inside_macro_stops_replay() {
        let mut d = shell();
        d.session_mut()
            .macros_mut()
            .insert("m", vec![toks("ls"), toks("quit"), toks("pwd")]);
        assert_eq!(d.play("m").unwrap(), Flow::Quit);
        assert_eq!(texts(&mut d), vec!["ls"]);
    }

    #[test]
    fn cancelled_play_is_interrupted() {
        let mut d = shell();
        d.session_mut().macros_mut().insert("m", vec![toks("ls")]);
        d.cancel_token().cancel();
        assert!(matches!(d.play("m"), Err(ShellError::Interrupted)));
        d.cancel_token().reset();
        assert!(d.play("m").is_ok());
    }

    #[test]
    fn batch_script_fails_on_unknown_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.pli");
        fs::write(&path, "ls\n\n# note\nbogus 1\npwd\n").unwrap();
        let mut d = shell();
        let err = d.run_script(&path, RunMode::Batch).unwrap_err();
        assert!(matches!(err, ShellError::UnknownCommand(ref n) if n == "bogus"));
        let out = texts(&mut d);
        assert_eq!(out[0], "ls");
        assert_eq!(out[1], "Command error: command 'bogus' not found.");
        assert_eq!(
            out[2],
            " 01: ls\n 02: # note\n 03: bogus 1  <-- Failing command\n 04: pwd"
        );
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn interactive_script_continues_after_unknown_command() {
        let lines: Vec<String> = ["ls", "bogus", "pwd"].iter().map(|s| s.to_string()).collect();
        let mut d = shell();
        assert_eq!(d.run_lines(&lines, RunMode::Interactive).unwrap(), Flow::Continue);
        let out = texts(&mut d);
        assert_eq!(out.first().map(String::as_str), Some("ls"));
        assert_eq!(out.last().map(String::as_str), Some("pwd"));
    }

    #[test]
    fn script_reports_handler_errors_and_continues() {
        let lines: Vec<String> = ["stop", "ls"].iter().map(|s| s.to_string()).collect();
        let mut d = shell();
        d.run_lines(&lines, RunMode::Batch).unwrap();
        let out = texts(&mut d);
        assert!(out[0].starts_with("error: recording error"));
        assert_eq!(out[1], "ls");
    }

    #[test]
    fn run_command_executes_script_without_capturing_its_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.pli");
        fs::write(&path, "ls\npwd\n").unwrap();
        let mut d = shell();
        d.dispatch("record r").unwrap();
        d.take_output();
        d.dispatch(&format!("run {}", path.display())).unwrap();
        assert_eq!(texts(&mut d), vec!["ls", "pwd"]);
        d.dispatch("stop").unwrap();
        assert_eq!(recorded(&d, "r").len(), 1);
    }

    #[test]
    fn missing_script_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut d = shell();
        let err = d
            .run_script(&dir.path().join("absent.pli"), RunMode::Batch)
            .unwrap_err();
        assert!(matches!(err, ShellError::Io(_)));
    }

    #[test]
    fn import_script_creates_macro_from_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nightly.pli");
        fs::write(&path, "# nightly job\nls\n").unwrap();
        let mut d = shell();
        assert_eq!(d.import_script(&path).unwrap(), "nightly");
        d.play("nightly").unwrap();
        assert_eq!(texts(&mut d), vec!["ls"]);
    }

    #[test]
    fn completion_of_first_word_includes_aliases() {
        let mut d = shell();
        d.session_mut().set_alias("rlist", "list");
        let c = d.completions("r");
        assert!(c.contains(&"record".to_string()));
        assert!(c.contains(&"rlist".to_string()));
        assert!(c.contains(&"rmmacro".to_string()));
        assert!(c.iter().all(|n| n.starts_with('r')));
    }

    #[test]
    fn completion_of_arguments_depends_on_command() {
        let mut d = shell();
        d.session_mut().macros_mut().insert("nightly", vec![]);
        d.session_mut().macros_mut().insert("noon", vec![]);
        d.session_mut().bookmark("gold", "/Gold");
        assert_eq!(d.completions("play n"), vec!["nightly", "noon"]);
        assert_eq!(d.completions("play ni"), vec!["nightly"]);
        assert_eq!(d.completions("goto "), vec!["gold"]);
        assert!(d.completions("ls ").is_empty());
        assert!(d.completions("play nightly x").is_empty());
    }
}
