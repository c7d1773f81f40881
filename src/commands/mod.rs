pub mod fetch;
pub mod serve;

use anyhow::Result;
use std::path::Path;

use tourcat::config::Config;

// Re-export command functions for convenience
pub use fetch::fetch;
pub use serve::serve;

/// Load from `path` when given, otherwise from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;
    Ok(config)
}
