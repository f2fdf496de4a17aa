//! plshell entry point.
//!
//! Loads configuration and saved session state, then either runs a batch job
//! (script, inline statements, or a stored macro) or starts the interactive
//! prompt. Session state is written back on exit.

mod args;
mod repl;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use args::Cli;
use plshell_terminal::{
    CommandRegistry, Dispatcher, EditorSettings, Flow, RunMode, SessionState, extended_help,
    format_connections, format_macro, load_session, register_builtins, save_session,
};
use plshell_tree::MemoryTree;
use plshell_types::ShellConfig;

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = ShellConfig::load_or_default(cli.config.as_deref())?;
    log::info!("state file: {}", config.state_file.display());

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    let mut session = SessionState::new().with_max_history(config.max_history);
    session.set_simple_prompt(config.simple_prompt);
    let mut shell = Dispatcher::new(registry, session, Box::new(MemoryTree::new()))
        .with_max_depth(config.max_alias_depth)
        .with_editor(EditorSettings::from_config(&config));
    shell.set_quiet(cli.quiet);

    let report = load_session(&config, shell.session_mut());
    for problem in &report.problems {
        eprintln!("warning: {problem}");
    }
    log::info!(
        "loaded {} connections, {} aliases, {} bookmarks, {} macros",
        report.connections,
        report.aliases,
        report.bookmarks,
        report.macros
    );

    let cancel = shell.cancel_token();
    ctrlc::set_handler(move || cancel.cancel())?;

    if cli.commands {
        println!("{}", extended_help(shell.registry()));
        return Ok(ExitCode::SUCCESS);
    }
    if cli.connections {
        println!("{}", format_connections(shell.session()));
        return Ok(ExitCode::SUCCESS);
    }

    let status = run(&mut shell, &config, &cli);
    if let Err(e) = save_session(&config, shell.session_mut()) {
        eprintln!("error: could not save session state: {e}");
    }
    status
}

/// Everything after the early-exit flags; the caller saves state afterwards.
fn run(shell: &mut Dispatcher, config: &ShellConfig, cli: &Cli) -> Result<ExitCode> {
    for path in &cli.import {
        match shell.import_script(path) {
            Ok(name) => println!("Imported {} as macro '{name}'", path.display()),
            Err(e) => {
                eprintln!("error: could not import {}: {e}", path.display());
                return Ok(ExitCode::FAILURE);
            },
        }
    }

    if let Some(which) = &cli.list {
        let macros = shell.session().macros();
        if which == "all" {
            for name in macros.list() {
                println!("{name}");
            }
        } else if let Some(lines) = macros.show(which) {
            println!("{}", format_macro(lines));
        } else {
            eprintln!("No macro named '{which}'");
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(host) = &cli.open {
        let result = shell.dispatch(&format!("connect {host}"));
        repl::print_output(shell.take_output());
        if let Err(e) = result {
            eprintln!("error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    }

    let batch = if let Some(path) = &cli.script {
        Some(shell.run_script(path, RunMode::Batch))
    } else if let Some(statements) = &cli.execute {
        let lines: Vec<String> = statements.split(';').map(str::to_string).collect();
        Some(shell.run_lines(&lines, RunMode::Batch))
    } else {
        cli.run.as_deref().map(|name| shell.play(name))
    };

    match batch {
        Some(result) => {
            repl::print_output(shell.take_output());
            match result {
                Ok(Flow::Continue | Flow::Quit) => Ok(ExitCode::SUCCESS),
                Err(e) => {
                    eprintln!("error: {e}");
                    Ok(ExitCode::FAILURE)
                },
            }
        },
        None => {
            repl::run(shell, config)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
