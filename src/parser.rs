//! Merge orchestration across argument sources.
//!
//! A full [`DynamicParser::parse`] runs three phases over one flat table:
//! 1. **Static** - declared arguments from the [`StaticParser`], replacing any
//!    previous result
//! 2. **Dynamic** - the tokens the static parser left over, added without
//!    overwriting static values
//! 3. **Config file** - the YAML file named by the config argument, added
//!    without overwriting command-line values
//!
//! The merged table is then turned into an activated [`Namespace`].

use crate::config::{ParserOptions, loader};
use crate::error::{ArgError, ArgResult};
use crate::namespace::Namespace;
use crate::static_parser::StaticParser;
use crate::table::ArgTable;
use crate::tokenizer::tokenize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a parse phase combines its result with the current table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// New values replace existing ones.
    #[default]
    Overwrite,
    /// Only keys not yet present are added.
    Additive,
    /// The table is cleared first.
    Replace,
}

impl MergeMode {
    fn overwrites(&self) -> bool {
        !matches!(self, MergeMode::Additive)
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Overwrite => write!(f, "overwrite"),
            MergeMode::Additive => write!(f, "additive"),
            MergeMode::Replace => write!(f, "replace"),
        }
    }
}

/// Parser merging static, dynamic and config-file arguments.
#[derive(Default)]
pub struct DynamicParser {
    static_parser: Option<Box<dyn StaticParser>>,
    options: ParserOptions,
    table: ArgTable,
}

impl DynamicParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `parser` for the static phase.
    pub fn with_static_parser(mut self, parser: impl StaticParser + 'static) -> Self {
        self.static_parser = Some(Box::new(parser));
        self
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable type unification on duplicate keys.
    pub fn check_type_consistency(mut self, check: bool) -> Self {
        self.options.check_type_consistency = check;
        self
    }

    /// The flat table accumulated so far.
    pub fn table(&self) -> &ArgTable {
        &self.table
    }

    fn apply(&mut self, incoming: ArgTable, mode: MergeMode) -> ArgResult<()> {
        if mode == MergeMode::Replace {
            self.table.clear();
        }
        self.table.merge(
            incoming,
            mode.overwrites(),
            self.options.check_type_consistency,
        )
    }

    /// Run the static parser and merge its values.
    ///
    /// Returns the tokens it did not recognize. Without a static parser every
    /// token is returned.
    pub fn static_parse<S: AsRef<str>>(&mut self, tokens: &[S], mode: MergeMode) -> ArgResult<Vec<String>> {
        let tokens: Vec<String> = tokens.iter().map(|t| t.as_ref().to_string()).collect();
        let Some(parser) = self.static_parser.as_ref() else {
            if mode == MergeMode::Replace {
                self.table.clear();
            }
            return Ok(tokens);
        };

        let known = parser.parse_known(&tokens)?;
        let incoming = ArgTable::from_mapping(&known.recognized)?;
        debug!(count = incoming.len(), %mode, "Merging static arguments");
        self.apply(incoming, mode)?;
        Ok(known.residual)
    }

    /// Tokenize free-form arguments and merge them.
    pub fn dynamic_parse<S: AsRef<str>>(&mut self, tokens: &[S], mode: MergeMode) -> ArgResult<()> {
        let incoming = tokenize(tokens)?;
        debug!(count = incoming.len(), %mode, "Merging dynamic arguments");
        self.apply(incoming, mode)
    }

    /// Load a YAML config file and merge its flattened contents.
    pub fn parse_config_file(&mut self, path: &Path, mode: MergeMode) -> ArgResult<()> {
        let map = loader::load(path)?;
        let incoming = ArgTable::from_mapping(&map)?;
        debug!(path = %path.display(), count = incoming.len(), %mode, "Merging config file");
        self.apply(incoming, mode)
    }

    /// Path named by `config_arg`, if that argument was given.
    ///
    /// Only a string value names a file. A value inferred as a number or bool
    /// no longer matches the token it came from (`007` became `7`).
    fn config_path(&self, config_arg: &str) -> ArgResult<Option<PathBuf>> {
        if config_arg.is_empty() {
            return Ok(None);
        }
        let Some(entry) = self.table.get(config_arg) else {
            return Ok(None);
        };
        match &entry.value {
            Value::String(s) => Ok(Some(PathBuf::from(s))),
            other => Err(ArgError::ConfigPath {
                key: config_arg.to_string(),
                value: other.clone(),
            }),
        }
    }

    /// Parse `tokens` through all phases and build the namespace.
    ///
    /// `config_arg` names the argument holding a config file path; pass an
    /// empty string to skip the config phase.
    pub fn parse<S: AsRef<str>>(&mut self, tokens: &[S], config_arg: &str) -> ArgResult<Namespace> {
        let residual = self.static_parse(tokens, MergeMode::Replace)?;
        self.dynamic_parse(residual.as_slice(), MergeMode::Additive)?;

        if let Some(path) = self.config_path(config_arg)? {
            info!(path = %path.display(), "Loading arguments from config file");
            self.parse_config_file(&path, MergeMode::Additive)?;
        }

        let mut namespace = Namespace::from_mapping(self.table.to_nested()?);
        namespace.activate(true);
        Ok(namespace)
    }
}

impl fmt::Debug for DynamicParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicParser")
            .field("static_parser", &self.static_parser.is_some())
            .field("options", &self.options)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_parser::KnownArgs;
    use crate::types::TypeTag;
    use serde_json::{Map, json};

    fn fixed_static(recognized: Value) -> impl StaticParser {
        move |tokens: &[String]| -> ArgResult<KnownArgs> {
            let Value::Object(map) = recognized.clone() else {
                return Ok(KnownArgs::default());
            };
            Ok(KnownArgs {
                recognized: map,
                residual: tokens.to_vec(),
            })
        }
    }

    #[test]
    fn test_dynamic_does_not_overwrite_static() {
        let mut parser = DynamicParser::new().with_static_parser(fixed_static(json!({"lr": 0.01})));
        let residual = parser.static_parse(&["--lr", "1"], MergeMode::Replace).unwrap();
        parser.dynamic_parse(residual.as_slice(), MergeMode::Additive).unwrap();

        let entry = parser.table().get("lr").unwrap();
        assert_eq!(entry.value, json!(0.01));
        assert_eq!(entry.tag, TypeTag::FLOAT);
    }

    #[test]
    fn test_replace_clears_previous_result() {
        let mut parser = DynamicParser::new();
        parser.dynamic_parse(&["--a", "1"], MergeMode::Overwrite).unwrap();
        parser.dynamic_parse(&["--b", "2"], MergeMode::Replace).unwrap();
        assert!(!parser.table().contains_key("a"));
        assert!(parser.table().contains_key("b"));
    }

    #[test]
    fn test_overwrite_mode_replaces_values() {
        let mut parser = DynamicParser::new();
        parser.dynamic_parse(&["--a", "1"], MergeMode::Overwrite).unwrap();
        parser.dynamic_parse(&["--a", "2.5"], MergeMode::Overwrite).unwrap();
        let entry = parser.table().get("a").unwrap();
        assert_eq!(entry.value, json!(2.5));
        assert_eq!(entry.tag, TypeTag::FLOAT);
    }

    #[test]
    fn test_container_conflict_aborts_parse() {
        let mut parser = DynamicParser::new().with_static_parser(fixed_static(json!({"a": 1})));
        let err = parser.parse(&["--a.b", "2"], "").unwrap_err();
        assert!(matches!(err, ArgError::TypeConsistency { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_conflict_ignored_without_consistency_check() {
        let mut parser = DynamicParser::new()
            .with_static_parser(fixed_static(json!({"a": 1})))
            .check_type_consistency(false);
        // Static value wins the additive merge, leaving `a.b` under a terminal.
        let err = parser.parse(&["--a.b", "2"], "").unwrap_err();
        assert!(matches!(err, ArgError::TypeConsistency { .. }));

        let mut parser = DynamicParser::new().check_type_consistency(false);
        parser.dynamic_parse(&["--a", "1"], MergeMode::Overwrite).unwrap();
        parser.dynamic_parse(&["--a.b", "2"], MergeMode::Overwrite).unwrap();
        assert_eq!(parser.table().get("a").unwrap().tag, TypeTag::Dict);
    }

    #[test]
    fn test_non_path_config_argument() {
        let mut parser = DynamicParser::new();
        let err = parser.parse(&["--conf", "a", "b"], "conf").unwrap_err();
        assert!(matches!(err, ArgError::ConfigPath { .. }));
    }

    #[test]
    fn test_missing_config_argument_skips_file() {
        let mut parser = DynamicParser::new();
        let mut ns = parser.parse(&["--a", "1"], "conf").unwrap();
        assert_eq!(ns.value("a"), Some(&json!(1)));
        assert!(ns.get("conf").is_absent());
    }

    #[test]
    fn test_parse_activates_namespace() {
        let mut parser = DynamicParser::new();
        let ns = parser.parse(&["--x.y", "1"], "").unwrap();
        assert!(ns.root().is_activated());
        assert!(ns.root().child("x").unwrap().is_activated());
        assert_eq!(ns.to_nested_mapping(false), {
            let mut m = Map::new();
            m.insert("x".into(), json!({"y": 1}));
            m
        });
    }
}
