//! Flat argument table keyed by dotted path.
//!
//! Every source of arguments (static parser, free-form flags, config files) is
//! normalized into an [`ArgTable`] before merging. Containers are recorded as
//! explicit `dict` entries so ancestor existence never requires a tree walk.

use crate::error::{ArgError, ArgResult};
use crate::infer::{infer, unify};
use crate::types::{Side, TypeTag};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Separator between segments of a dotted key.
pub const KEY_SEPARATOR: char = '.';

/// A value with its inferred type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgEntry {
    pub value: Value,
    pub tag: TypeTag,
}

impl ArgEntry {
    pub fn new(value: Value, tag: TypeTag) -> Self {
        Self { value, tag }
    }

    /// Placeholder entry for an intermediate container.
    pub fn container() -> Self {
        Self {
            value: Value::Object(Map::new()),
            tag: TypeTag::Dict,
        }
    }
}

/// Mapping from dotted key to typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgTable {
    entries: BTreeMap<String, ArgEntry>,
}

impl ArgTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a nested mapping into dotted keys.
    ///
    /// Nested mappings register a `dict` entry for their own key before their
    /// children; `null` values are skipped entirely.
    pub fn from_mapping(map: &Map<String, Value>) -> ArgResult<Self> {
        let mut table = Self::new();
        table.flatten_into(map, None)?;
        Ok(table)
    }

    fn flatten_into(&mut self, map: &Map<String, Value>, prefix: Option<&str>) -> ArgResult<()> {
        for (key, value) in map {
            let key = match prefix {
                Some(prefix) => format!("{}{}{}", prefix, KEY_SEPARATOR, key),
                None => key.clone(),
            };
            match value {
                Value::Null => continue,
                Value::Object(children) => {
                    self.entries.insert(key.clone(), ArgEntry::container());
                    self.flatten_into(children, Some(&key))?;
                }
                _ => {
                    let (value, tag) = infer(value)?;
                    self.entries.insert(key, ArgEntry::new(value, tag));
                }
            }
        }
        Ok(())
    }

    /// Insert or replace an entry without unification.
    pub fn insert(&mut self, key: impl Into<String>, entry: ArgEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&ArgEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge `incoming` into this table.
    ///
    /// New keys are inserted as-is. For duplicate keys the stored tag is
    /// unified with the incoming one; the value is taken from `incoming` only
    /// when `overwrite` is set, while the unified tag is always kept. With
    /// `check_consistency` off, duplicates skip unification and the incoming
    /// entry simply replaces the stored one when overwriting.
    pub fn merge(&mut self, incoming: ArgTable, overwrite: bool, check_consistency: bool) -> ArgResult<()> {
        for (key, entry) in incoming.entries {
            let Some(existing) = self.entries.get_mut(&key) else {
                self.entries.insert(key, entry);
                continue;
            };

            if !check_consistency {
                if overwrite {
                    *existing = entry;
                }
                continue;
            }

            let tag = match unify(existing.tag, entry.tag) {
                Ok(tag) => tag,
                Err(conflict) => {
                    return Err(ArgError::TypeConsistency {
                        key,
                        existing: existing.value.clone(),
                        incoming: entry.value,
                        container: conflict.container,
                    });
                }
            };

            existing.tag = tag;
            if overwrite {
                existing.value = entry.value;
            }
        }
        Ok(())
    }

    /// Convert to a nested mapping, dropping type tags.
    ///
    /// `dict` entries become empty mappings that deeper keys then populate.
    /// Missing ancestors are created on the way; a key below a terminal value
    /// is a type consistency error.
    pub fn to_nested(&self) -> ArgResult<Map<String, Value>> {
        let mut root = Map::new();
        // Sorted order guarantees a parent key is visited before its children.
        for (key, entry) in &self.entries {
            let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
            let Some((last, parents)) = segments.split_last() else {
                continue;
            };

            let mut node = &mut root;
            for (depth, segment) in parents.iter().enumerate() {
                let slot = node
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                node = match slot {
                    Value::Object(map) => map,
                    other => {
                        return Err(ArgError::TypeConsistency {
                            key: segments[..=depth].join("."),
                            existing: other.clone(),
                            incoming: Value::Object(Map::new()),
                            container: Side::Incoming,
                        });
                    }
                };
            }

            let value = if entry.tag.is_dict() {
                Value::Object(Map::new())
            } else {
                entry.value.clone()
            };
            node.insert(last.to_string(), value);
        }
        Ok(root)
    }
}

impl FromIterator<(String, ArgEntry)> for ArgTable {
    fn from_iter<I: IntoIterator<Item = (String, ArgEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
