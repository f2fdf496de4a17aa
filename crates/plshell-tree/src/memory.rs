//! In-memory object tree.
//!
//! Useful for offline sessions and unit tests. The whole tree lives in a
//! `BTreeMap<String, Node>` keyed by normalized absolute paths.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use plshell_types::error::{Result, ShellError};

use crate::{EntryKind, Item, ObjectInfo, ObjectTree, TreeEntry};

#[derive(Debug, Clone, Default)]
struct Node {
    items: BTreeSet<Item>,
}

/// A fully in-memory object tree.
#[derive(Debug)]
pub struct MemoryTree {
    /// Map of normalized paths to object nodes.
    nodes: BTreeMap<String, Node>,
}

impl MemoryTree {
    /// Create a tree holding only the root object.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::default());
        Self { nodes }
    }

    /// Create an object and any missing parents.
    pub fn create_all(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if self.nodes.contains_key(path.as_ref()) {
            return Ok(());
        }
        let par = parent(&path).to_string();
        if par != path.as_ref() && !self.nodes.contains_key(&par) {
            self.create_all(&par)?;
        }
        self.nodes.insert(path.into_owned(), Node::default());
        Ok(())
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.nodes
            .get(path)
            .ok_or_else(|| ShellError::Tree(format!("no such object: {path}")))
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut Node> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| ShellError::Tree(format!("no such object: {path}")))
    }

    /// Names of direct child objects, in lexicographic order.
    fn child_names(&self, path: &str) -> Vec<String> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };
        let mut names = Vec::new();
        for key in self.nodes.range(prefix.clone()..).map(|(k, _)| k) {
            if !key.starts_with(&prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                names.push(rest.to_string());
            }
        }
        names
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether a path is already in normal form.
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root).
fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    let mut prev_slash = true;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path.
fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

impl ObjectTree for MemoryTree {
    fn list(&self, path: &str) -> Result<Vec<TreeEntry>> {
        let path = normalize(path);
        let node = self.node(&path)?;
        let mut entries: Vec<TreeEntry> = self
            .child_names(&path)
            .into_iter()
            .map(|name| TreeEntry {
                name,
                kind: EntryKind::Object,
            })
            .collect();
        entries.extend(node.items.iter().map(|item| TreeEntry {
            name: item.to_string(),
            kind: EntryKind::Item,
        }));
        Ok(entries)
    }

    fn stat(&self, path: &str) -> Result<ObjectInfo> {
        let path = normalize(path);
        let node = self.node(&path)?;
        Ok(ObjectInfo {
            children: self.child_names(&path).len(),
            items: node.items.len(),
        })
    }

    fn create(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if self.nodes.contains_key(path.as_ref()) {
            return Err(ShellError::Tree(format!("object exists: {path}")));
        }
        let par = parent(&path);
        if !self.nodes.contains_key(par) {
            return Err(ShellError::Tree(format!("no such object: {par}")));
        }
        log::debug!("create object {path}");
        self.nodes.insert(path.into_owned(), Node::default());
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.as_ref() == "/" {
            return Err(ShellError::Tree("cannot remove root".to_string()));
        }
        let info = self.stat(&path)?;
        if info.children > 0 || info.items > 0 {
            return Err(ShellError::Tree(format!("object not empty: {path}")));
        }
        log::debug!("remove object {path}");
        self.nodes.remove(path.as_ref());
        Ok(())
    }

    fn add_item(&mut self, path: &str, item: &Item) -> Result<()> {
        let path = normalize(path);
        if !self.node_mut(&path)?.items.insert(*item) {
            return Err(ShellError::Tree(format!("item {item} already in {path}")));
        }
        Ok(())
    }

    fn remove_item(&mut self, path: &str, item: &Item) -> Result<()> {
        let path = normalize(path);
        if !self.node_mut(&path)?.items.remove(item) {
            return Err(ShellError::Tree(format!("item {item} not in {path}")));
        }
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(normalize(path).as_ref())
    }
}
