//! Object tree abstraction.
//!
//! The shell's navigation commands (`ls`, `cd`, `mkdir`, `add`, ...) operate
//! on a tree of named objects. Each object may hold child objects and a set
//! of address items. Backends implement [`ObjectTree`]; [`MemoryTree`] is the
//! offline implementation used by the binary and by tests.

mod item;
mod memory;

use plshell_types::error::Result;

pub use item::Item;
pub use memory::MemoryTree;

/// Kind of an entry returned by [`ObjectTree::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Object,
    Item,
}

/// One child of an object: either a nested object or an address item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Summary of a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Number of direct child objects.
    pub children: usize,
    /// Number of address items held by the object.
    pub items: usize,
}

/// A hierarchical store of objects and items addressed by `/`-separated paths.
pub trait ObjectTree {
    /// List direct child objects (first) and items of the object at `path`.
    fn list(&self, path: &str) -> Result<Vec<TreeEntry>>;

    /// Describe the object at `path`.
    fn stat(&self, path: &str) -> Result<ObjectInfo>;

    /// Create an object. The parent must already exist.
    fn create(&mut self, path: &str) -> Result<()>;

    /// Remove an object that has no children and no items.
    fn remove(&mut self, path: &str) -> Result<()>;

    /// Add an item to the object at `path`.
    fn add_item(&mut self, path: &str, item: &Item) -> Result<()>;

    /// Remove an item from the object at `path`.
    fn remove_item(&mut self, path: &str, item: &Item) -> Result<()>;

    /// Check whether an object exists.
    fn exists(&self, path: &str) -> bool;
}

/// Resolve a possibly-relative object path against the current path.
///
/// Handles `.` and `..` components; `..` at the root stays at the root.
pub fn resolve_path(cwd: &str, input: &str) -> String {
    let raw = if input.starts_with('/') {
        input.to_string()
    } else if cwd == "/" {
        format!("/{input}")
    } else {
        format!("{cwd}/{input}")
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}
