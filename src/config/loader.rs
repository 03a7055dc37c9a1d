//! YAML config file loading and dumping.
//!
//! Config files are read into `serde_json` values so they share one
//! representation with every other argument source.

use crate::error::{ArgError, ArgResult};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Load a YAML file whose top level is a mapping.
///
/// An empty file loads as an empty mapping.
pub fn load(path: &Path) -> ArgResult<Map<String, Value>> {
    let content = std::fs::read_to_string(path).map_err(|source| ArgError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| ArgError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => {
            debug!(path = %path.display(), keys = map.len(), "Loaded config file");
            Ok(map)
        }
        Value::Null => Ok(Map::new()),
        _ => Err(ArgError::ConfigNotMapping {
            path: path.to_path_buf(),
        }),
    }
}

/// Render `tree` as YAML with sorted keys, writing it to `path` when given.
pub fn dump(tree: &Map<String, Value>, path: Option<&Path>) -> ArgResult<String> {
    let text = serde_yaml::to_string(tree).map_err(ArgError::YamlEmit)?;
    if let Some(path) = path {
        std::fs::write(path, &text).map_err(|source| ArgError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Saved YAML");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_nested_mapping() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("example.yaml");
        std::fs::write(
            &path,
            "model: resnet18\noptimizer:\n  name: adam\n  lr: 0.1\n  betas: [0.9, 0.999]\n",
        )
        .unwrap();

        let map = load(&path).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({
                "model": "resnet18",
                "optimizer": {"name": "adam", "lr": 0.1, "betas": [0.9, 0.999]}
            })
        );
    }

    #[test]
    fn test_load_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yaml");
        std::fs::write(&path, "").unwrap();
        assert!(load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_load_errors() {
        let temp = TempDir::new().unwrap();

        let missing = load(&temp.path().join("missing.yaml")).unwrap_err();
        assert_eq!(missing.code(), ErrorCode::ConfigRead);

        let list = temp.path().join("list.yaml");
        std::fs::write(&list, "- a\n- b\n").unwrap();
        assert_eq!(load(&list).unwrap_err().code(), ErrorCode::ConfigNotMapping);

        let broken = temp.path().join("broken.yaml");
        std::fs::write(&broken, "a: [1, 2\n").unwrap();
        assert_eq!(load(&broken).unwrap_err().code(), ErrorCode::ConfigParse);
    }

    #[test]
    fn test_dump_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.yaml");
        let tree = match json!({"b": true, "a": "x"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let text = dump(&tree, Some(path.as_path())).unwrap();
        assert_eq!(text, "a: x\nb: true\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
        assert_eq!(load(&path).unwrap(), tree);
    }
}
