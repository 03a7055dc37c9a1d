//! Namespace tree nodes.

use super::pending::{Pending, Resolved, WriteOutcome};
use crate::error::ArgError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// A terminal value and the number of times it was read while activated.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    pub ref_count: u64,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            ref_count: 0,
        }
    }
}

/// One level of the dotted hierarchy.
///
/// A local key is held either as a terminal entry or as a child node, never
/// both.
#[derive(Clone, Default, PartialEq)]
pub struct Node {
    entries: BTreeMap<String, Entry>,
    children: BTreeMap<String, Node>,
    activated: bool,
}

impl Node {
    /// Build a node from a nested mapping; nested mappings become children.
    pub fn from_mapping(map: Map<String, Value>, activated: bool) -> Self {
        let mut node = Self {
            activated,
            ..Self::default()
        };
        for (key, value) in map {
            match value {
                Value::Object(child) => {
                    node.children
                        .insert(key, Node::from_mapping(child, activated));
                }
                value => {
                    node.entries.insert(key, Entry::new(value));
                }
            }
        }
        node
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.children.is_empty()
    }

    /// Local keys: terminal entries first, then children.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .keys()
            .chain(self.children.keys())
            .map(String::as_str)
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    /// Resolve one segment.
    ///
    /// Reading a terminal entry bumps its reference count when this node is
    /// activated. An unknown key yields a [`Pending`] placeholder anchored at
    /// this node.
    pub fn resolve(&mut self, key: &str) -> Resolved<'_> {
        if !self.children.contains_key(key) && !self.entries.contains_key(key) {
            return Resolved::Pending(Pending::anchored(self, key));
        }

        if let Some(child) = self.children.get_mut(key) {
            return Resolved::Node(child);
        }

        let increment = u64::from(self.activated);
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.ref_count += increment;
                Resolved::Value(&entry.value)
            }
            None => Resolved::Pending(Pending::detached(&[key])),
        }
    }

    /// Assign a value to a local key.
    ///
    /// Existing entries keep their reference count. A key naming a child is
    /// left untouched and the write is rejected. Mapping values become child
    /// nodes.
    pub fn set(&mut self, key: &str, value: Value) -> WriteOutcome {
        if self.children.contains_key(key) {
            warn!("{}. This assignment is ignored", ArgError::structural_conflict(key, &value));
            return WriteOutcome::Rejected;
        }

        if let Value::Object(map) = value {
            if self.entries.contains_key(key) {
                warn!(
                    "{}. This assignment is ignored",
                    ArgError::structural_conflict(key, &serde_json::Value::Object(map))
                );
                return WriteOutcome::Rejected;
            }
            self.attach(key.to_string(), map);
            return WriteOutcome::Materialized;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                WriteOutcome::Updated
            }
            None => {
                self.entries.insert(key.to_string(), Entry::new(value));
                WriteOutcome::Inserted
            }
        }
    }

    /// Attach a new child built from `map`, inheriting activation.
    pub(super) fn attach(&mut self, key: String, map: Map<String, Value>) {
        let child = Node::from_mapping(map, self.activated);
        self.children.insert(key, child);
    }

    /// Set the activation flag here and on every descendant.
    pub fn activate(&mut self, activated: bool) {
        self.activated = activated;
        for child in self.children.values_mut() {
            child.activate(activated);
        }
    }

    /// Drop entries read fewer than `min_ref_count` times and children left
    /// empty by trimming. Returns `true` if this node is now empty.
    pub fn trim(&mut self, min_ref_count: u64) -> bool {
        self.entries
            .retain(|_, entry| entry.ref_count >= min_ref_count);
        self.children
            .retain(|_, child| !child.trim(min_ref_count));
        self.is_empty()
    }

    /// Render as a plain nested mapping.
    ///
    /// With `include_ref_count`, each terminal is rendered as `[value, count]`.
    pub fn to_nested_mapping(&self, include_ref_count: bool) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, entry) in &self.entries {
            let rendered = if include_ref_count {
                Value::Array(vec![entry.value.clone(), Value::from(entry.ref_count)])
            } else {
                entry.value.clone()
            };
            map.insert(key.clone(), rendered);
        }
        for (key, child) in &self.children {
            map.insert(
                key.clone(),
                Value::Object(child.to_nested_mapping(include_ref_count)),
            );
        }
        map
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, entry) in &self.entries {
            map.entry(
                key,
                &format_args!("(value: {}, ref_count: {})", entry.value, entry.ref_count),
            );
        }
        for (key, child) in &self.children {
            map.entry(key, child);
        }
        map.finish()
    }
}
