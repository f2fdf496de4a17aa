//! Built-in shell commands for plshell.

use std::path::Path;

use plshell_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register all built-in commands into a registry.
///
/// This registers the shell commands here plus the session commands
/// (macros, aliases, bookmarks, connections) and the object tree commands.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(HistoryCmd));
    reg.register(Box::new(RunCmd));
    reg.register(Box::new(ImportCmd));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(VersionCmd));
    reg.register(Box::new(SimplePromptCmd));
    reg.register(Box::new(EditCmd));
    reg.register(Box::new(QuitCmd("quit")));
    reg.register(Box::new(QuitCmd("exit")));
    crate::register_session_commands(reg);
    crate::register_tree_commands(reg);
}

/// Help text for every registered command, separated by blank lines.
pub fn extended_help(reg: &CommandRegistry) -> String {
    reg.list_commands()
        .iter()
        .filter_map(|(name, _)| reg.help(name))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "List commands or describe one"
    }
    fn usage(&self) -> &str {
        "help [COMMAND]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if let Some(topic) = args.first() {
            return env
                .registry
                .help(topic)
                .map(CommandOutput::Text)
                .ok_or_else(|| ShellError::NotFound(format!("command '{topic}'")));
        }
        let mut lines = vec!["Available commands:".to_string()];
        for (name, desc) in env.registry.list_commands() {
            lines.push(format!("  {name:<12} {desc}"));
        }
        lines.push(String::new());
        lines.push("Type 'help COMMAND' for usage.".to_string());
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Print command history"
    }
    fn usage(&self) -> &str {
        "history [PREFIX]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let prefix = args.first().copied().unwrap_or("");
        let lines: Vec<String> = env
            .session
            .history()
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with(prefix))
            .map(|(i, line)| format!(" {:04} :  {line}", i + 1))
            .collect();
        if lines.is_empty() {
            return Ok(CommandOutput::Text("(no history)".to_string()));
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

struct RunCmd;
impl Command for RunCmd {
    fn name(&self) -> &str {
        "run"
    }
    fn description(&self) -> &str {
        "Execute a script file"
    }
    fn usage(&self) -> &str {
        "run FILE"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        Ok(CommandOutput::RunScript {
            path: args.join(" "),
        })
    }
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

struct ImportCmd;
impl Command for ImportCmd {
    fn name(&self) -> &str {
        "import"
    }
    fn description(&self) -> &str {
        "Load a script file as a macro named after the file"
    }
    fn usage(&self) -> &str {
        "import FILE"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        let path = args.join(" ");
        let name = env.session.macros_mut().load_file(Path::new(&path))?;
        let count = env.session.macros().show(&name).map_or(0, <[_]>::len);
        Ok(CommandOutput::Text(format!(
            "Imported macro '{name}' ({count} lines)"
        )))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the screen"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// version
// ---------------------------------------------------------------------------

struct VersionCmd;
impl Command for VersionCmd {
    fn name(&self) -> &str {
        "version"
    }
    fn description(&self) -> &str {
        "Show the plshell version"
    }
    fn usage(&self) -> &str {
        "version"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(format!(
            "plshell v{}",
            env!("CARGO_PKG_VERSION")
        )))
    }
}

// ---------------------------------------------------------------------------
// simpleprompt
// ---------------------------------------------------------------------------

struct SimplePromptCmd;
impl Command for SimplePromptCmd {
    fn name(&self) -> &str {
        "simpleprompt"
    }
    fn description(&self) -> &str {
        "Toggle between the simple and the full prompt"
    }
    fn usage(&self) -> &str {
        "simpleprompt"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let simple = !env.session.simple_prompt();
        env.session.set_simple_prompt(simple);
        let which = if simple { "simple" } else { "full" };
        Ok(CommandOutput::Text(format!("Using the {which} prompt")))
    }
}

// ---------------------------------------------------------------------------
// edit
// ---------------------------------------------------------------------------

struct EditCmd;
impl Command for EditCmd {
    fn name(&self) -> &str {
        "edit"
    }
    fn description(&self) -> &str {
        "Open a macro or file in the editor; macros are reloaded afterwards"
    }
    fn usage(&self) -> &str {
        "edit MACRO|FILE"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        Ok(CommandOutput::Edit {
            target: args.join(" "),
        })
    }
}

// ---------------------------------------------------------------------------
// quit / exit
// ---------------------------------------------------------------------------

struct QuitCmd(&'static str);
impl Command for QuitCmd {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Save state and leave the shell"
    }
    fn usage(&self) -> &str {
        self.0
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Quit)
    }
}
