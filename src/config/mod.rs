//! Configuration files and parser options.
//!
//! - [`loader`]: the YAML collaborator. Reads a config file into a nested
//!   mapping and renders a mapping back to YAML text (optionally saving it).
//! - [`options`]: [`ParserOptions`], loadable from YAML with per-field
//!   defaults.

pub mod loader;
pub mod options;

pub use loader::{dump, load};
pub use options::ParserOptions;
