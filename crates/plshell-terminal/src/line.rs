//! Interactive line handling: `;` statements and a trailing `| grep` filter.

use plshell_types::error::{Result, ShellError};

use crate::dispatcher::{Dispatcher, Flow};
use crate::interpreter::CommandOutput;
use crate::macros::COMMENT_MARKER;

/// Keeps only output lines containing a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFilter {
    pattern: String,
    ignore_case: bool,
}

impl LineFilter {
    pub fn new(pattern: &str, ignore_case: bool) -> Self {
        let pattern = if ignore_case {
            pattern.to_lowercase()
        } else {
            pattern.to_string()
        };
        Self {
            pattern,
            ignore_case,
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        if self.ignore_case {
            line.to_lowercase().contains(&self.pattern)
        } else {
            line.contains(&self.pattern)
        }
    }

    /// Filter the text entries of `output` line by line.
    pub fn apply(&self, output: Vec<CommandOutput>) -> Vec<CommandOutput> {
        output
            .into_iter()
            .filter_map(|entry| match entry {
                CommandOutput::Text(text) => {
                    let kept: Vec<&str> = text.lines().filter(|l| self.matches(l)).collect();
                    (!kept.is_empty()).then(|| CommandOutput::Text(kept.join("\n")))
                },
                other => Some(other),
            })
            .collect()
    }
}

/// One input line split into statements and an optional filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub statements: Vec<String>,
    pub filter: Option<LineFilter>,
}

/// Split a prompt line into `;`-separated statements and a trailing
/// `| grep TEXT` or `| igrep TEXT` filter.
///
/// A comment line is kept whole so it can be recorded verbatim.
pub fn parse_line(line: &str) -> Result<ParsedLine> {
    if line.trim_start().starts_with(COMMENT_MARKER) {
        return Ok(ParsedLine {
            statements: vec![line.to_string()],
            filter: None,
        });
    }

    let mut parts = line.split('|');
    let body = parts.next().unwrap_or_default();
    let filter = match (parts.next(), parts.next()) {
        (None, _) => None,
        (Some(text), None) => Some(parse_filter(text)?),
        (Some(_), Some(_)) => {
            return Err(ShellError::Usage(
                "only one '|' filter is allowed per line".to_string(),
            ));
        },
    };

    Ok(ParsedLine {
        statements: body.split(';').map(str::to_string).collect(),
        filter,
    })
}

fn parse_filter(text: &str) -> Result<LineFilter> {
    let mut words = text.split_whitespace();
    let cmd = words.next().unwrap_or_default();
    let pattern = words.collect::<Vec<_>>().join(" ");
    let ignore_case = match cmd {
        "grep" => false,
        "igrep" => true,
        other => {
            return Err(ShellError::Usage(format!(
                "unknown filter command '{other}' (use grep or igrep)"
            )));
        },
    };
    if pattern.is_empty() {
        return Err(ShellError::Usage(format!("... | {cmd} TEXT")));
    }
    Ok(LineFilter::new(&pattern, ignore_case))
}

/// Result of running one prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    pub flow: Flow,
    /// Output of every statement, filtered when the line had a filter.
    pub output: Vec<CommandOutput>,
    /// Number of statements dispatched.
    pub dispatched: usize,
}

impl Dispatcher {
    /// Run one prompt line.
    ///
    /// The line is added to the session history. Errors from individual
    /// statements are reported as `error: ...` text and the remaining
    /// statements still run; a `quit` stops the line. Only a malformed
    /// filter is returned as an error, and then nothing is executed.
    pub fn execute_line(&mut self, line: &str) -> Result<LineOutcome> {
        self.session_mut().push_history(line);
        let parsed = parse_line(line)?;
        let mark = self.output_len();
        let mut flow = Flow::Continue;
        let mut dispatched = 0;

        for statement in &parsed.statements {
            dispatched += 1;
            match self.dispatch(statement) {
                Ok(Flow::Continue) => {},
                Ok(Flow::Quit) => {
                    flow = Flow::Quit;
                    break;
                },
                Err(e) => {
                    log::debug!("statement '{}' failed: {e}", statement.trim());
                    self.emit(format!("error: {e}"));
                },
            }
        }

        let output = self.output_since(mark);
        let output = match &parsed.filter {
            Some(filter) => filter.apply(output),
            None => output,
        };
        Ok(LineOutcome {
            flow,
            output,
            dispatched,
        })
    }
}
