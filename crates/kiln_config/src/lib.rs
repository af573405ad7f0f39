//! Project configuration: the optional `kiln.toml`, `package.json` and
//! command-line overrides merged into one [`ResolvedProject`].

#![warn(missing_docs)]

pub mod cdn;
pub mod error;
pub mod loader;
pub mod package;
pub mod resolve;
pub mod types;

pub use cdn::CdnBase;
pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use package::{module_name_from_package, read_package_name};
pub use resolve::{resolve_project, Overrides, ResolvedProject};
pub use types::*;
