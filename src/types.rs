//! Core types for the dynamic argument parser.
//!
//! A [`TypeTag`] labels every value stored in the flat argument table. Terminal
//! types form a total order (`bool < int < float < str`); list-ness is carried
//! alongside and propagates through unification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal (non-container) type, ordered from most to least specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Terminal {
    Bool,
    Int,
    Float,
    Str,
}

impl Terminal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminal::Bool => "bool",
            Terminal::Int => "int",
            Terminal::Float => "float",
            Terminal::Str => "str",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(Terminal::Bool),
            "int" => Some(Terminal::Int),
            "float" => Some(Terminal::Float),
            "str" => Some(Terminal::Str),
            _ => None,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred semantic type of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A single terminal value.
    Scalar(Terminal),
    /// A list whose elements unify to the given terminal.
    List(Terminal),
    /// An intermediate container; the key has children rather than a value.
    Dict,
}

impl TypeTag {
    pub const BOOL: TypeTag = TypeTag::Scalar(Terminal::Bool);
    pub const INT: TypeTag = TypeTag::Scalar(Terminal::Int);
    pub const FLOAT: TypeTag = TypeTag::Scalar(Terminal::Float);
    pub const STR: TypeTag = TypeTag::Scalar(Terminal::Str);

    /// Terminal part of the tag, `None` for containers.
    pub fn terminal(&self) -> Option<Terminal> {
        match self {
            TypeTag::Scalar(t) | TypeTag::List(t) => Some(*t),
            TypeTag::Dict => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, TypeTag::List(_))
    }

    pub fn is_dict(&self) -> bool {
        matches!(self, TypeTag::Dict)
    }

    /// Parse the textual form (`int`, `list_float`, `dict`, ...).
    pub fn from_str(s: &str) -> Option<Self> {
        if s == "dict" {
            return Some(TypeTag::Dict);
        }
        match s.strip_prefix("list_") {
            Some(rest) => Terminal::from_str(rest).map(TypeTag::List),
            None => Terminal::from_str(s).map(TypeTag::Scalar),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Scalar(t) => write!(f, "{}", t),
            TypeTag::List(t) => write!(f, "list_{}", t),
            TypeTag::Dict => f.write_str("dict"),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TypeTag::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown type tag '{}'", s)))
    }
}

/// Which operand of a merge holds the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The value already stored in the table.
    Existing,
    /// The value being merged in.
    Incoming,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Existing => write!(f, "existing"),
            Side::Incoming => write!(f, "incoming"),
        }
    }
}
