//! Dynamic Argument Parser Library
//!
//! Merges declared command-line arguments, free-form `--a.b.c value` tokens
//! and a YAML config file into one hierarchical [`Namespace`], with type
//! inference across sources and per-value reference counting.

pub mod cli;
pub mod config;
pub mod error;
pub mod infer;
pub mod logging;
pub mod namespace;
pub mod parser;
pub mod static_parser;
pub mod table;
pub mod tokenizer;
pub mod types;

pub use error::{ArgError, ArgResult, ErrorCode};
pub use namespace::{Namespace, Resolved, WriteOutcome};
pub use parser::{DynamicParser, MergeMode};
pub use static_parser::{ClapStaticParser, KnownArgs, StaticParser};
pub use types::TypeTag;
