// src/config/mod.rs

//! Configuration loading, validation and the path registry.

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{load_and_validate, DEFAULT_CONFIG_PATH};
pub use model::{CategorySection, ConfigFile, ManifestSection, ProjectSection, RawConfigFile, ServeSection};
pub use paths::{CategoryPaths, PathRegistry};
