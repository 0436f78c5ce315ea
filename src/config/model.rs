// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration as read from `Assetpipe.toml`.
///
/// All sections are optional and default to the documented source layout:
///
/// ```toml
/// [project]
/// source = "src"
/// output = "dist"
/// staging = ".tmp"
///
/// [serve]
/// port = 3000
/// ws_port = 35729
///
/// [manifest]
/// path = "vendor.toml"
/// refresh_fonts = true
///
/// [category.styles]
/// input = ["src/scss/**/*.scss"]
/// output = "dist/css"
/// staging = ".tmp/css"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Root directories from `[project]`.
    #[serde(default)]
    pub project: ProjectSection,

    /// Development server settings from `[serve]`.
    #[serde(default)]
    pub serve: ServeSection,

    /// Dependency manifest settings from `[manifest]`.
    #[serde(default)]
    pub manifest: ManifestSection,

    /// Per-category path overrides from `[category.<name>]`.
    ///
    /// Keys are category names (`"styles"`, `"scripts"`, ...). A category
    /// override replaces the built-in entry wholesale.
    #[serde(default)]
    pub category: BTreeMap<String, CategorySection>,
}

/// `[project]` section: the three root directories everything else hangs off.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default = "default_staging")]
    pub staging: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from("src")
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_staging() -> PathBuf {
    PathBuf::from(".tmp")
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
            staging: default_staging(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// HTTP port for the development server.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Base port for the live-reload WebSocket server. If the port is taken
    /// the notifier retries upward.
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
}

fn default_http_port() -> u16 {
    3000
}

fn default_ws_port() -> u16 {
    35729
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            ws_port: default_ws_port(),
        }
    }
}

/// `[manifest]` section.
///
/// The manifest file itself is owned externally; we only consume it.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSection {
    /// Path to the vendor dependency manifest.
    #[serde(default = "default_manifest_path")]
    pub path: PathBuf,

    /// Whether a manifest change also re-runs the fonts stage (vendor
    /// packages may ship font files). The original build coupled these; we
    /// keep the coupling but make it an explicit switch.
    #[serde(default = "default_refresh_fonts")]
    pub refresh_fonts: bool,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("vendor.toml")
}

fn default_refresh_fonts() -> bool {
    true
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            refresh_fonts: default_refresh_fonts(),
        }
    }
}

/// `[category.<name>]` section: overrides one path-registry entry.
///
/// Globs are relative to the project root. `output` and `staging` are
/// directories, also relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySection {
    pub input: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    pub output: PathBuf,

    #[serde(default)]
    pub staging: Option<PathBuf>,
}

/// Validated configuration.
///
/// Constructed via `TryFrom<RawConfigFile>` in `config::validate`; the raw
/// form never leaves the config module once loaded.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    project: ProjectSection,
    serve: ServeSection,
    manifest: ManifestSection,
    category: BTreeMap<String, CategorySection>,
}

impl ConfigFile {
    /// Internal constructor used after validation has passed.
    pub(crate) fn new_unchecked(
        project: ProjectSection,
        serve: ServeSection,
        manifest: ManifestSection,
        category: BTreeMap<String, CategorySection>,
    ) -> Self {
        Self {
            project,
            serve,
            manifest,
            category,
        }
    }

    pub fn project(&self) -> &ProjectSection {
        &self.project
    }

    pub fn serve(&self) -> &ServeSection {
        &self.serve
    }

    pub fn manifest(&self) -> &ManifestSection {
        &self.manifest
    }

    pub fn category_overrides(&self) -> &BTreeMap<String, CategorySection> {
        &self.category
    }
}
