//! Hierarchical, lazily navigable argument namespace.
//!
//! Built once from a nested mapping after all argument sources are merged.
//! Reads go through [`Namespace::get`] (or segment by segment via
//! [`Node::resolve`]) and never fail: unknown paths yield a [`Pending`]
//! placeholder. Assignments through a placeholder create the missing
//! containers at that moment and nowhere else.
//!
//! Each terminal value carries a reference count that grows on reads while the
//! namespace is activated; [`Namespace::trim`] then drops what the program
//! never consulted.

mod node;
mod pending;

pub use node::{Entry, Node};
pub use pending::{Pending, Resolved, WriteOutcome};

use crate::config::loader;
use crate::error::ArgResult;
use crate::table::KEY_SEPARATOR;
use serde_json::{Map, Value};
use std::path::Path;

/// Root of an argument tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    root: Node,
}

impl Namespace {
    /// Build a deactivated namespace from a nested mapping.
    pub fn from_mapping(map: Map<String, Value>) -> Self {
        Self {
            root: Node::from_mapping(map, false),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Resolve a dotted path, counting the read if it ends on a value.
    ///
    /// A path running below a terminal value counts one read of that value
    /// and yields a detached placeholder holding the whole path.
    pub fn get(&mut self, path: &str) -> Resolved<'_> {
        let segments: Vec<&str> = path.split(KEY_SEPARATOR).collect();
        let mut resolved = self.root.resolve(segments[0]);
        for (depth, segment) in segments.iter().enumerate().skip(1) {
            resolved = match resolved {
                Resolved::Value(_) => Resolved::Pending(Pending::detached(&segments[..=depth])),
                other => other.resolve(segment),
            };
        }
        resolved
    }

    /// Read a terminal value by dotted path.
    pub fn value(&mut self, path: &str) -> Option<&Value> {
        match self.get(path) {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Assign a value by dotted path, creating missing containers.
    ///
    /// Assigning onto an existing container, or below a terminal value, is
    /// rejected and leaves the namespace unchanged.
    pub fn set(&mut self, path: &str, value: Value) -> WriteOutcome {
        match path.rsplit_once(KEY_SEPARATOR) {
            Some((parent, key)) => self.get(parent).assign(key, value),
            None => self.root.set(path, value),
        }
    }

    /// Whether a path names a value or node, without counting a read.
    pub fn contains(&self, path: &str) -> bool {
        let mut node = &self.root;
        let mut segments = path.split(KEY_SEPARATOR).peekable();
        while let Some(segment) = segments.next() {
            if let Some(child) = node.child(segment) {
                node = child;
                continue;
            }
            return segments.peek().is_none() && node.entry(segment).is_some();
        }
        true
    }

    /// Top-level keys: terminal entries first, then children.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys()
    }

    /// Toggle reference counting on every node.
    pub fn activate(&mut self, activated: bool) {
        self.root.activate(activated);
    }

    /// Remove entries read fewer than `min_ref_count` times, cascading to
    /// emptied subtrees. The root itself always remains.
    pub fn trim(&mut self, min_ref_count: u64) {
        self.root.trim(min_ref_count);
    }

    pub fn to_nested_mapping(&self, include_ref_count: bool) -> Map<String, Value> {
        self.root.to_nested_mapping(include_ref_count)
    }

    /// Render as YAML, also writing the text to `path` when given.
    pub fn to_yaml(&self, path: Option<&Path>) -> ArgResult<String> {
        loader::dump(&self.to_nested_mapping(false), path)
    }
}
