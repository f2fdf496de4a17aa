//! Command-line arguments.
//!
//! - plshell                  # interactive prompt
//! - plshell -s job.pli       # run a script and exit
//! - plshell -e "cd /a; ls"   # run statements and exit
//! - plshell -r nightly       # play a stored macro and exit

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "plshell")]
#[command(about = "Line-oriented management shell with aliases, bookmarks, and macros")]
#[command(version)]
pub struct Cli {
    /// Run a script file and exit (status 1 on an unknown command)
    #[arg(short = 's', long = "script", conflicts_with_all = ["execute", "run"])]
    pub script: Option<PathBuf>,

    /// Run ';'-separated statements and exit
    #[arg(short = 'e', long = "execute", conflicts_with = "run")]
    pub execute: Option<String>,

    /// Play a stored macro and exit
    #[arg(short = 'r', long = "run")]
    pub run: Option<String>,

    /// Import a script file as a macro (repeatable)
    #[arg(short = 'i', long = "import")]
    pub import: Vec<PathBuf>,

    /// Print one macro, or the names of all macros with "all", and exit
    #[arg(short = 'l', long = "list", value_name = "MACRO|all")]
    pub list: Option<String>,

    /// Connect to a saved host before running anything
    #[arg(short = 'o', long = "open", value_name = "HOST")]
    pub open: Option<String>,

    /// Suppress "Executing:" and "Recorded:" echo lines
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Print help for every command and exit
    #[arg(short = 'c', long = "commands")]
    pub commands: bool,

    /// Print saved connections and exit
    #[arg(short = 'p', long = "connections")]
    pub connections: bool,

    /// Path to a TOML configuration file
    #[arg(long, env = "PLSHELL_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_is_interactive() {
        let cli = Cli::try_parse_from(["plshell"]).unwrap();
        assert!(cli.script.is_none() && cli.execute.is_none() && cli.run.is_none());
        assert!(!cli.quiet);
    }

    #[test]
    fn imports_are_repeatable() {
        let cli = Cli::try_parse_from(["plshell", "-i", "a.pli", "--import", "b.pli", "-q"]).unwrap();
        assert_eq!(cli.import, vec![PathBuf::from("a.pli"), PathBuf::from("b.pli")]);
        assert!(cli.quiet);
    }

    #[test]
    fn execute_with_open() {
        let cli = Cli::try_parse_from(["plshell", "-o", "pre1", "-e", "cd /a; ls"]).unwrap();
        assert_eq!(cli.open.as_deref(), Some("pre1"));
        assert_eq!(cli.execute.as_deref(), Some("cd /a; ls"));
    }

    #[test]
    fn script_and_execute_conflict() {
        assert!(Cli::try_parse_from(["plshell", "-s", "a.pli", "-e", "ls"]).is_err());
    }
}
