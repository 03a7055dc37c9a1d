//! Free-form command-line tokenizer.
//!
//! Turns a token stream such as `--a 1 2 --log.level info --flag` into an
//! [`ArgTable`]. A token starting with `-` opens a new argument; following
//! tokens up to the next flag are its values. `--name=v1,v2` is shorthand for
//! `--name v1 v2`.

use crate::error::ArgResult;
use crate::infer::{infer, infer_str};
use crate::table::{ArgEntry, ArgTable, KEY_SEPARATOR};
use crate::types::TypeTag;
use serde_json::Value;
use tracing::{debug, warn};

/// Flag appended to the input so the last argument flushes like any other.
const SENTINEL: &str = "-";

/// An argument collected from the token stream, not yet typed.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingArg {
    name: String,
    values: Vec<String>,
}

impl PendingArg {
    /// Start an argument from a flag token.
    fn from_flag(token: &str) -> Self {
        let stripped = token.trim_start_matches('-');
        match stripped.split_once('=') {
            Some((name, inline)) => Self {
                name: name.to_string(),
                values: inline
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            },
            None => Self {
                name: stripped.to_string(),
                values: Vec::new(),
            },
        }
    }

    /// Resolve the collected values into a typed entry.
    fn resolve(&self) -> ArgResult<ArgEntry> {
        let (value, tag) = match self.values.as_slice() {
            [] => (Value::Bool(true), TypeTag::BOOL),
            [single] => infer_str(single),
            many => infer(&Value::Array(
                many.iter().cloned().map(Value::String).collect(),
            ))?,
        };
        Ok(ArgEntry::new(value, tag))
    }
}

fn is_flag(token: &str) -> bool {
    token.starts_with('-')
}

/// Tokenize `tokens` into a flat argument table.
///
/// Every dotted ancestor of an argument (`a`, `a.b` for `a.b.c`) is registered
/// as a `dict` entry. A repeated argument replaces its earlier occurrence.
pub fn tokenize<S: AsRef<str>>(tokens: &[S]) -> ArgResult<ArgTable> {
    let mut table = ArgTable::new();
    let mut current: Option<PendingArg> = None;

    let stream = tokens.iter().map(AsRef::as_ref).chain(std::iter::once(SENTINEL));
    for token in stream {
        if !is_flag(token) {
            match current.as_mut() {
                Some(arg) => arg.values.push(token.to_string()),
                None => warn!(token, "Dropping value given before any flag"),
            }
            continue;
        }

        if let Some(arg) = current.take() {
            store(&mut table, &arg)?;
        }
        current = Some(PendingArg::from_flag(token));
    }

    // The sentinel leaves an empty argument behind; it is never stored.
    debug!(count = table.len(), "Tokenized dynamic arguments");
    Ok(table)
}

fn store(table: &mut ArgTable, arg: &PendingArg) -> ArgResult<()> {
    if arg.name.is_empty() {
        warn!(values = ?arg.values, "Skipping flag without a name");
        return Ok(());
    }

    for (idx, _) in arg.name.match_indices(KEY_SEPARATOR) {
        table.insert(&arg.name[..idx], ArgEntry::container());
    }

    let entry = arg.resolve()?;
    table.insert(arg.name.clone(), entry);
    Ok(())
}
