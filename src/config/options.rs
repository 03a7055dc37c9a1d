//! Parser options.

use crate::error::{ArgError, ArgResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling how argument sources are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Unify types of duplicate keys and reject container/value conflicts.
    #[serde(default = "default_check_type_consistency")]
    pub check_type_consistency: bool,

    /// Argument whose value names a YAML config file. Empty disables lookup.
    #[serde(default)]
    pub config_arg: String,

    /// Minimum reference count an entry needs to survive trimming.
    #[serde(default = "default_trim_min_ref_count")]
    pub trim_min_ref_count: u64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            check_type_consistency: default_check_type_consistency(),
            config_arg: String::new(),
            trim_min_ref_count: default_trim_min_ref_count(),
        }
    }
}

fn default_check_type_consistency() -> bool {
    true
}

fn default_trim_min_ref_count() -> u64 {
    1
}

impl ParserOptions {
    /// Load options from a YAML file; missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> ArgResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ArgError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ArgError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
