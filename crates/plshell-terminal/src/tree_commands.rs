//! Object tree commands: navigation, objects, and items.
//!
//! Everything except `pwd` needs an active connection.

use std::path::Path;

use plshell_tree::{EntryKind, Item, ObjectTree, resolve_path};
use plshell_types::error::{Result, ShellError};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::persist::write_atomic;

/// Register object tree commands into a registry.
pub fn register_tree_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(LlCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(TreeCmd));
    reg.register(Box::new(ExportTreeCmd));
    reg.register(Box::new(AddCmd));
    reg.register(Box::new(DelCmd));
    reg.register(Box::new(GrepCmd {
        name: "grep",
        ignore_case: false,
    }));
    reg.register(Box::new(GrepCmd {
        name: "igrep",
        ignore_case: true,
    }));
}

pub(crate) fn require_connection(env: &Environment<'_>) -> Result<()> {
    if env.session.is_connected() {
        Ok(())
    } else {
        Err(ShellError::Usage("not connected".to_string()))
    }
}

/// Resolve an optional path argument against the current path.
fn target(env: &Environment<'_>, args: &[&str]) -> String {
    if args.is_empty() {
        env.session.cwd().to_string()
    } else {
        resolve_path(env.session.cwd(), &args.join(" "))
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Depth-first walk below `path`, objects before items at each level.
fn walk(
    tree: &dyn ObjectTree,
    path: &str,
    visit: &mut dyn FnMut(&str, &str, EntryKind),
) -> Result<()> {
    for entry in tree.list(path)? {
        visit(path, &entry.name, entry.kind);
        if entry.kind == EntryKind::Object {
            walk(tree, &join(path, &entry.name), visit)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ls / ll
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List child objects and items"
    }
    fn usage(&self) -> &str {
        "ls [PATH]"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let path = target(env, args);
        let entries = env.tree.list(&path)?;
        let mut lines = vec![format!("Listing the contents of {path}")];
        if entries.is_empty() {
            lines.push("(empty)".to_string());
        }
        lines.extend(entries.into_iter().map(|e| e.name));
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct LlCmd;
impl Command for LlCmd {
    fn name(&self) -> &str {
        "ll"
    }
    fn description(&self) -> &str {
        "Like ls, with kind and counts (kind, children, items, name)"
    }
    fn usage(&self) -> &str {
        "ll [PATH]"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let path = target(env, args);
        let mut lines = vec![format!("Listing the contents of {path}")];
        for entry in env.tree.list(&path)? {
            match entry.kind {
                EntryKind::Object => {
                    let info = env.tree.stat(&join(&path, &entry.name))?;
                    lines.push(format!(
                        "object  {:>6}  {:>6}  {}",
                        info.children, info.items, entry.name
                    ));
                },
                EntryKind::Item => {
                    lines.push(format!("item    {:>6}  {:>6}  {}", "-", "-", entry.name));
                },
            }
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// cd / pwd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Go to a specific path"
    }
    fn usage(&self) -> &str {
        "cd [PATH]"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let dest = if args.is_empty() {
            "/".to_string()
        } else {
            target(env, args)
        };
        if !env.tree.exists(&dest) {
            return Err(ShellError::Tree(format!("no such path: {dest}")));
        }
        env.session.set_cwd(&dest);
        Ok(CommandOutput::None)
    }
}

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print the current path"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.cwd().to_string()))
    }
}

// ---------------------------------------------------------------------------
// mkdir / rm
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create an object (and missing parents) below the current path"
    }
    fn usage(&self) -> &str {
        "mkdir NAME"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        let name = args.join(" ");
        let mut current = env.session.cwd().to_string();
        let mut lines = Vec::new();
        for part in name.split('/').filter(|p| !p.is_empty()) {
            current = resolve_path(&current, part);
            if env.tree.exists(&current) {
                lines.push(format!("Warning: object {current} already exists, skipping"));
            } else {
                env.tree.create(&current)?;
                lines.push(format!("New object '{current}'"));
            }
        }
        lines.push(format!("Created object path: {current}"));
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove an empty object"
    }
    fn usage(&self) -> &str {
        "rm NAME"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        let path = target(env, args);
        env.tree.remove(&path)?;
        if env.session.cwd() == path {
            let parent = resolve_path(&path, "..");
            env.session.set_cwd(&parent);
        }
        Ok(CommandOutput::Text(format!("Removed object {path}")))
    }
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

struct TreeCmd;
impl Command for TreeCmd {
    fn name(&self) -> &str {
        "tree"
    }
    fn description(&self) -> &str {
        "Recursively list everything below the current path"
    }
    fn usage(&self) -> &str {
        "tree"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let root = env.session.cwd().to_string();
        let mut lines = vec![format!("Listing the contents of {root}")];
        walk(&*env.tree, &root, &mut |parent, name, _| {
            lines.push(join(parent, name));
        })?;
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// exporttree
// ---------------------------------------------------------------------------

/// A script that rebuilds every object and item below `root`.
///
/// Paths are written relative to `/`, so the script can be run from
/// anywhere once connected.
fn export_script(tree: &dyn ObjectTree, root: &str) -> Result<Vec<String>> {
    let mut lines = vec![
        format!("# Generated by plshell v{}", env!("CARGO_PKG_VERSION")),
        "cd /".to_string(),
    ];
    export_below(tree, root, &mut lines)?;
    Ok(lines)
}

fn export_below(tree: &dyn ObjectTree, path: &str, lines: &mut Vec<String>) -> Result<()> {
    let children: Vec<String> = tree
        .list(path)?
        .into_iter()
        .filter(|e| e.kind == EntryKind::Object)
        .map(|e| join(path, &e.name))
        .collect();
    for child in children {
        let relative = child.trim_start_matches('/');
        lines.push(format!("mkdir {relative}"));
        let items: Vec<String> = tree
            .list(&child)?
            .into_iter()
            .filter(|e| e.kind == EntryKind::Item)
            .map(|e| e.name)
            .collect();
        if !items.is_empty() {
            lines.push(format!("cd {relative}"));
            lines.extend(items.into_iter().map(|item| format!("add {item}")));
            lines.push("cd /".to_string());
        }
        export_below(tree, &child, lines)?;
    }
    Ok(())
}

struct ExportTreeCmd;
impl Command for ExportTreeCmd {
    fn name(&self) -> &str {
        "exporttree"
    }
    fn description(&self) -> &str {
        "Export the objects below the current path as a replayable script"
    }
    fn usage(&self) -> &str {
        "exporttree [FILE]"
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let lines = export_script(&*env.tree, env.session.cwd())?;
        if args.is_empty() {
            return Ok(CommandOutput::Text(lines.join("\n")));
        }
        let file = args.join(" ");
        let mut text = lines.join("\n");
        text.push('\n');
        write_atomic(Path::new(&file), text.as_bytes())?;
        Ok(CommandOutput::Text(format!(
            "Wrote {} lines to {file}",
            lines.len()
        )))
    }
}

// ---------------------------------------------------------------------------
// add / del
// ---------------------------------------------------------------------------

fn parse_items(args: &[&str], usage: &str) -> Result<Vec<Item>> {
    if args.is_empty() {
        return Err(ShellError::Usage(usage.to_string()));
    }
    args.iter().map(|a| a.parse::<Item>()).collect()
}

struct AddCmd;
impl Command for AddCmd {
    fn name(&self) -> &str {
        "add"
    }
    fn description(&self) -> &str {
        "Add address items (a.b.c.d, a-b range, net/mask) to the current object"
    }
    fn usage(&self) -> &str {
        "add ITEM..."
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let items = parse_items(args, self.usage())?;
        let path = env.session.cwd().to_string();
        let mut lines = Vec::new();
        for item in &items {
            env.tree.add_item(&path, item)?;
            lines.push(format!("Added {item} to {path}"));
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct DelCmd;
impl Command for DelCmd {
    fn name(&self) -> &str {
        "del"
    }
    fn description(&self) -> &str {
        "Remove address items from the current object"
    }
    fn usage(&self) -> &str {
        "del ITEM..."
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        let items = parse_items(args, self.usage())?;
        let path = env.session.cwd().to_string();
        let mut lines = Vec::new();
        for item in &items {
            env.tree.remove_item(&path, item)?;
            lines.push(format!("Removed {item} from {path}"));
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// grep / igrep
// ---------------------------------------------------------------------------

struct GrepCmd {
    name: &'static str,
    ignore_case: bool,
}

impl Command for GrepCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        if self.ignore_case {
            "Search the whole tree for objects and items (case-insensitive)"
        } else {
            "Search the whole tree for objects and items"
        }
    }
    fn usage(&self) -> &str {
        if self.ignore_case {
            "igrep TEXT"
        } else {
            "grep TEXT"
        }
    }
    fn category(&self) -> &str {
        "tree"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        require_connection(env)?;
        if args.is_empty() {
            return Err(ShellError::Usage(self.usage().to_string()));
        }
        let needle = args.join(" ");
        let needle = if self.ignore_case {
            needle.to_lowercase()
        } else {
            needle
        };
        let mut hits = Vec::new();
        walk(&*env.tree, "/", &mut |parent, name, kind| {
            let hay = if self.ignore_case {
                name.to_lowercase()
            } else {
                name.to_string()
            };
            if hay.contains(&needle) {
                hits.push(match kind {
                    EntryKind::Object => join(parent, name),
                    EntryKind::Item => format!("{parent}: {name}"),
                });
            }
        })?;
        if hits.is_empty() {
            return Ok(CommandOutput::Text(format!("No matches for '{needle}'")));
        }
        Ok(CommandOutput::Text(hits.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_builtins;
    use crate::session::{Connection, SessionState};
    use plshell_tree::MemoryTree;

    struct Fixture {
        reg: CommandRegistry,
        session: SessionState,
        tree: MemoryTree,
    }

    impl Fixture {
        fn connected() -> Self {
            let mut reg = CommandRegistry::new();
            register_builtins(&mut reg);
            let mut session = SessionState::new();
            session.connect(
                "pre1",
                Connection {
                    username: "admin".to_string(),
                    password: "pw".to_string(),
                },
            );
            let mut tree = MemoryTree::new();
            tree.create_all("/Customers/Gold").unwrap();
            tree.create_all("/Customers/Silver").unwrap();
            tree.add_item("/Customers/Gold", &"10.0.0.1".parse().unwrap())
                .unwrap();
            Self { reg, session, tree }
        }

        fn exec(&mut self, line: &str) -> Result<CommandOutput> {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let mut env = Environment {
                session: &mut self.session,
                tree: &mut self.tree,
                registry: &self.reg,
            };
            self.reg
                .resolve(tokens[0])
                .unwrap()
                .execute(&tokens[1..], &mut env)
        }

        fn text(&mut self, line: &str) -> String {
            match self.exec(line).unwrap() {
                CommandOutput::Text(s) => s,
                other => panic!("expected text, got {other:?}"),
            }
        }
    }

    #[test]
    fn tree_commands_require_connection() {
        let mut f = Fixture::connected();
        f.session.disconnect();
        for line in [
            "ls", "ll", "cd /", "mkdir x", "rm x", "tree", "exporttree", "add 1.2.3.4",
            "del 1.2.3.4", "grep x", "igrep x",
        ] {
            let err = f.exec(line).unwrap_err();
            assert_eq!(format!("{err}"), "usage: not connected", "{line}");
        }
        assert_eq!(f.text("pwd"), "/");
    }

    #[test]
    fn ls_lists_objects_then_items() {
        let mut f = Fixture::connected();
        assert_eq!(f.text("ls"), "Listing the contents of /\nCustomers");
        assert_eq!(
            f.text("ls Customers/Gold"),
            "Listing the contents of /Customers/Gold\n10.0.0.1"
        );
        assert_eq!(
            f.text("ls /Customers/Silver"),
            "Listing the contents of /Customers/Silver\n(empty)"
        );
        assert!(matches!(f.exec("ls /nope"), Err(ShellError::Tree(_))));
    }

    #[test]
    fn ll_shows_counts() {
        let mut f = Fixture::connected();
        let out = f.text("ll /Customers");
        assert!(out.contains("object       0       1  Gold"), "{out}");
        assert!(out.contains("object       0       0  Silver"), "{out}");
    }

    #[test]
    fn cd_and_pwd() {
        let mut f = Fixture::connected();
        assert_eq!(f.exec("cd Customers").unwrap(), CommandOutput::None);
        f.exec("cd Gold").unwrap();
        assert_eq!(f.text("pwd"), "/Customers/Gold");
        f.exec("cd ..").unwrap();
        assert_eq!(f.text("pwd"), "/Customers");
        assert!(matches!(f.exec("cd Bronze"), Err(ShellError::Tree(_))));
        assert_eq!(f.text("pwd"), "/Customers");
        f.exec("cd").unwrap();
        assert_eq!(f.text("pwd"), "/");
    }

    #[test]
    fn mkdir_creates_missing_parts() {
        let mut f = Fixture::connected();
        let out = f.text("mkdir Customers/Bronze/East");
        assert!(out.contains("Warning: object /Customers already exists"));
        assert!(out.contains("New object '/Customers/Bronze'"));
        assert!(out.ends_with("Created object path: /Customers/Bronze/East"));
        assert!(f.tree.exists("/Customers/Bronze/East"));
    }

    #[test]
    fn rm_removes_empty_object_and_leaves_it() {
        let mut f = Fixture::connected();
        f.exec("cd /Customers/Silver").unwrap();
        assert_eq!(
            f.text("rm /Customers/Silver"),
            "Removed object /Customers/Silver"
        );
        assert_eq!(f.session.cwd(), "/Customers");
        assert!(matches!(f.exec("rm Gold"), Err(ShellError::Tree(_))));
    }

    #[test]
    fn add_and_del_items() {
        let mut f = Fixture::connected();
        f.exec("cd /Customers/Silver").unwrap();
        assert_eq!(
            f.text("add 192.168.0.0/24 10.0.0.1-10.0.0.9"),
            "Added 192.168.0.0/255.255.255.0 to /Customers/Silver\nAdded 10.0.0.1-10.0.0.9 to /Customers/Silver"
        );
        assert_eq!(f.tree.stat("/Customers/Silver").unwrap().items, 2);
        assert!(matches!(f.exec("add 10.0.0.1-10.0.0.9"), Err(ShellError::Tree(_))));
        assert!(matches!(f.exec("add not-an-ip"), Err(ShellError::Tree(_))));
        f.exec("del 10.0.0.1-10.0.0.9").unwrap();
        assert_eq!(f.tree.stat("/Customers/Silver").unwrap().items, 1);
        assert!(matches!(f.exec("del"), Err(ShellError::Usage(_))));
    }

    #[test]
    fn tree_walks_depth_first() {
        let mut f = Fixture::connected();
        assert_eq!(
            f.text("tree"),
            "Listing the contents of /\n/Customers\n/Customers/Gold\n/Customers/Gold/10.0.0.1\n/Customers/Silver"
        );
    }

    #[test]
    fn grep_is_case_sensitive_and_igrep_is_not() {
        let mut f = Fixture::connected();
        assert_eq!(f.text("grep Gold"), "/Customers/Gold");
        assert_eq!(f.text("grep gold"), "No matches for 'gold'");
        assert_eq!(f.text("igrep gold"), "/Customers/Gold");
        assert_eq!(f.text("grep 10.0"), "/Customers/Gold: 10.0.0.1");
    }

    #[test]
    fn exporttree_prints_a_rebuild_script() {
        let mut f = Fixture::connected();
        let expected = [
            format!("# Generated by plshell v{}", env!("CARGO_PKG_VERSION")),
            "cd /".to_string(),
            "mkdir Customers".to_string(),
            "mkdir Customers/Gold".to_string(),
            "cd Customers/Gold".to_string(),
            "add 10.0.0.1".to_string(),
            "cd /".to_string(),
            "mkdir Customers/Silver".to_string(),
        ];
        assert_eq!(f.text("exporttree"), expected.join("\n"));

        f.exec("cd /Customers/Silver").unwrap();
        assert_eq!(f.text("exporttree").lines().count(), 2);
    }

    #[test]
    fn exported_tree_replays_into_an_empty_tree() {
        use crate::dispatcher::{Dispatcher, RunMode};

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tree.pli");
        let mut f = Fixture::connected();
        f.exec("cd /Customers/Silver").unwrap();
        f.exec("add 192.168.0.0/24").unwrap();
        f.exec("cd /").unwrap();
        assert_eq!(
            f.text(&format!("exporttree {}", file.display())),
            format!("Wrote 11 lines to {}", file.display())
        );

        let mut session = SessionState::new();
        session.connect(
            "lab",
            Connection {
                username: "u".to_string(),
                password: "p".to_string(),
            },
        );
        let mut d = Dispatcher::new(f.reg, session, Box::new(MemoryTree::new()));
        d.set_quiet(true);
        d.run_script(&file, RunMode::Batch).unwrap();
        assert_eq!(
            export_script(d.tree(), "/").unwrap(),
            export_script(&f.tree, "/").unwrap()
        );
    }
}
