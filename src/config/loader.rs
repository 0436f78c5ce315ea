// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config file name looked up in the current working directory.
pub const DEFAULT_CONFIG_PATH: &str = "Assetpipe.toml";

/// Load a configuration file from a given path and return the raw form.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML (a missing default config falls back to built-in defaults;
///   a missing *explicit* config is an error).
/// - Applies defaults via `serde` + `Default` impls.
/// - Checks glob and directory sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    let raw = if path.exists() {
        load_from_path(path)?
    } else if path == Path::new(DEFAULT_CONFIG_PATH) {
        debug!(?path, "no config file found; using built-in defaults");
        RawConfigFile::default()
    } else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        )
        .into());
    };

    ConfigFile::try_from(raw)
}
