//! quarry.toml loading and validation
//!
//! Looked up in the project root first, then in the global config directory
//! (`~/.config/quarry/quarry.toml` on Linux).

pub mod parser;
pub mod schema;
pub mod store;

pub use parser::{parse_quarry_toml, parse_quarry_toml_str, to_toml};
pub use schema::{QuarryConfig, RepositoryConfig, RepositoryKind};
pub use store::{CONFIG_FILE_NAME, ConfigStore};
