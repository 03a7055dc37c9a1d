//! Structured error types for argument parsing.

use crate::types::Side;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Merge errors
    TypeConsistency,
    UnhandledValueType,
    StructuralWriteConflict,

    // Config file errors
    ConfigRead,
    ConfigParse,
    ConfigNotMapping,
    ConfigPath,
    ConfigWrite,

    // Collaborator errors
    YamlEmit,
    StaticParser,
}

/// Errors raised while parsing, merging or serializing arguments.
#[derive(Debug, Error)]
pub enum ArgError {
    /// A container and a terminal value met under the same key.
    #[error(
        "type consistency check failed: {}\n\
         set check_type_consistency = false to overwrite the argument anyway",
        describe_conflict(.key, .existing, .incoming, .container)
    )]
    TypeConsistency {
        key: String,
        existing: Value,
        incoming: Value,
        container: Side,
    },

    /// Inference met a value that is not a bool, number, string or list.
    #[error("cannot infer a type for {kind} value {value}")]
    UnhandledValueType { kind: &'static str, value: Value },

    /// A terminal value was assigned onto a path that names a container.
    #[error("cannot assign {value} to '{path}': the path is already taken by a namespace node")]
    StructuralWriteConflict { path: String, value: Value },

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file {} must contain a mapping at the top level", .path.display())]
    ConfigNotMapping { path: PathBuf },

    /// The config-file argument holds something that cannot name a file.
    #[error("argument '{key}' does not name a config file: {value}")]
    ConfigPath { key: String, value: Value },

    #[error("failed to write {}: {source}", .path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render YAML: {0}")]
    YamlEmit(#[source] serde_yaml::Error),

    /// Errors from the static parser are passed through unchanged.
    #[error(transparent)]
    StaticParser(#[from] clap::Error),
}

impl ArgError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ArgError::TypeConsistency { .. } => ErrorCode::TypeConsistency,
            ArgError::UnhandledValueType { .. } => ErrorCode::UnhandledValueType,
            ArgError::StructuralWriteConflict { .. } => ErrorCode::StructuralWriteConflict,
            ArgError::ConfigRead { .. } => ErrorCode::ConfigRead,
            ArgError::ConfigParse { .. } => ErrorCode::ConfigParse,
            ArgError::ConfigNotMapping { .. } => ErrorCode::ConfigNotMapping,
            ArgError::ConfigPath { .. } => ErrorCode::ConfigPath,
            ArgError::ConfigWrite { .. } => ErrorCode::ConfigWrite,
            ArgError::YamlEmit(_) => ErrorCode::YamlEmit,
            ArgError::StaticParser(_) => ErrorCode::StaticParser,
        }
    }

    // Convenience constructors

    pub fn unhandled(value: &Value) -> Self {
        let kind = match value {
            Value::Null => "null",
            Value::Object(_) => "mapping",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "list",
        };
        Self::UnhandledValueType {
            kind,
            value: value.clone(),
        }
    }

    pub fn structural_conflict(path: impl Into<String>, value: &Value) -> Self {
        Self::StructuralWriteConflict {
            path: path.into(),
            value: value.clone(),
        }
    }
}

fn describe_conflict(key: &str, existing: &Value, incoming: &Value, container: &Side) -> String {
    match container {
        Side::Incoming => format!(
            "'{}' can not be extended, because the terminal value {} is already assigned",
            key, existing
        ),
        Side::Existing => format!(
            "the terminal value {} can not be assigned to '{}', because it has children",
            incoming, key
        ),
    }
}

/// Result type for argument parsing operations.
pub type ArgResult<T> = std::result::Result<T, ArgError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_consistency_message_names_container_side() {
        let err = ArgError::TypeConsistency {
            key: "optimizer".into(),
            existing: json!({}),
            incoming: json!(5),
            container: Side::Existing,
        };
        let msg = err.to_string();
        assert!(msg.contains("optimizer"));
        assert!(msg.contains("because it has children"));
        assert!(msg.contains("check_type_consistency"));

        let err = ArgError::TypeConsistency {
            key: "lr".into(),
            existing: json!(0.1),
            incoming: json!({}),
            container: Side::Incoming,
        };
        assert!(err.to_string().contains("can not be extended"));
        assert_eq!(err.code(), ErrorCode::TypeConsistency);
    }

    #[test]
    fn test_unhandled_kind() {
        let err = ArgError::unhandled(&Value::Null);
        assert!(matches!(err, ArgError::UnhandledValueType { kind: "null", .. }));
        assert_eq!(err.code(), ErrorCode::UnhandledValueType);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::StructuralWriteConflict).unwrap();
        assert_eq!(json, "\"STRUCTURAL_WRITE_CONFLICT\"");
    }
}
