//! Lookup results and the absorbing placeholder.
//!
//! Resolving a path never fails. Once a segment is missing, resolution
//! switches to a [`Pending`] placeholder that remembers every further segment
//! and creates nothing until a value is assigned through it.

use super::node::Node;
use crate::error::ArgError;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// Outcome of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new terminal entry was created.
    Inserted,
    /// An existing terminal entry got a new value.
    Updated,
    /// Missing containers were created along the way.
    Materialized,
    /// The target is a container (or lies below a terminal); nothing changed.
    Rejected,
}

/// Result of resolving a path segment.
#[derive(Debug)]
pub enum Resolved<'a> {
    /// The segment names a child node.
    Node(&'a mut Node),
    /// The segment names a terminal value.
    Value(&'a Value),
    /// Nothing exists at this path yet.
    Pending(Pending<'a>),
}

impl<'a> Resolved<'a> {
    /// Resolve one more segment.
    ///
    /// Below a terminal value the result is a detached placeholder that
    /// rejects assignment. It only knows `key`; [`Namespace::get`] seeds it
    /// with the full path instead.
    ///
    /// [`Namespace::get`]: super::Namespace::get
    pub fn resolve(self, key: &str) -> Resolved<'a> {
        match self {
            Resolved::Node(node) => node.resolve(key),
            Resolved::Pending(pending) => Resolved::Pending(pending.extend(key)),
            Resolved::Value(_) => Resolved::Pending(Pending::detached(&[key])),
        }
    }

    /// Assign `value` to `key` below this result.
    pub fn assign(self, key: &str, value: Value) -> WriteOutcome {
        match self {
            Resolved::Node(node) => node.set(key, value),
            Resolved::Pending(pending) => pending.commit(key, value),
            Resolved::Value(_) => {
                warn!("{}. This assignment is ignored", ArgError::structural_conflict(key, &value));
                WriteOutcome::Rejected
            }
        }
    }

    /// The terminal value, if the path names one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(*value),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<&'a mut Node> {
        match self {
            Resolved::Node(node) => Some(node),
            _ => None,
        }
    }

    /// `true` for the placeholder; it behaves like an absent value.
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Pending(_))
    }
}

/// Absorbing placeholder for a path that does not exist (yet).
///
/// Holds the node where resolution left the real tree and the chain of keys
/// requested since. All placeholders compare equal.
pub struct Pending<'a> {
    origin: Option<&'a mut Node>,
    chain: Vec<String>,
}

impl<'a> Pending<'a> {
    pub(super) fn anchored(origin: &'a mut Node, key: &str) -> Self {
        Self {
            origin: Some(origin),
            chain: vec![key.to_string()],
        }
    }

    /// A placeholder with no real node to write back to, remembering `chain`
    /// for diagnostics.
    pub(super) fn detached<S: AsRef<str>>(chain: &[S]) -> Self {
        Self {
            origin: None,
            chain: chain.iter().map(|key| key.as_ref().to_string()).collect(),
        }
    }

    /// Append a key to the remembered chain.
    pub fn extend(mut self, key: &str) -> Self {
        self.chain.push(key.to_string());
        self
    }

    /// Keys requested since the last real node.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Dotted form of the remembered chain.
    pub fn path(&self) -> String {
        self.chain.join(".")
    }

    /// Materialize the remembered chain with `value` stored under `key`.
    ///
    /// The first remembered key becomes a new child of the origin node; each
    /// further key nests one level deeper.
    pub fn commit(self, key: &str, value: Value) -> WriteOutcome {
        let Some(origin) = self.origin else {
            let path = format!("{}.{}", self.path(), key);
            warn!("{}. This assignment is ignored", ArgError::structural_conflict(path, &value));
            return WriteOutcome::Rejected;
        };

        let mut chain = self.chain;
        let root_key = chain.remove(0);
        let mut nested = Map::new();
        nested.insert(key.to_string(), value);
        for segment in chain.into_iter().rev() {
            let mut parent = Map::new();
            parent.insert(segment, Value::Object(nested));
            nested = parent;
        }

        debug!(key = %root_key, "Materializing pending path");
        origin.attach(root_key, nested);
        WriteOutcome::Materialized
    }
}

impl PartialEq for Pending<'_> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for Pending<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("chain", &self.chain)
            .field("anchored", &self.origin.is_some())
            .finish()
    }
}

impl fmt::Display for Pending<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("None")
    }
}
