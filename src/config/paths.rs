// src/config/paths.rs

//! Static registry mapping asset categories to source globs and destination
//! directories.
//!
//! The registry is built once at startup from the `[project]` roots plus any
//! `[category.<name>]` overrides, and is read-only afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};

/// Category names wired into the built-in task graph.
pub const STYLES: &str = "styles";
pub const SCRIPTS: &str = "scripts";
pub const IMAGES: &str = "images";
pub const FONTS: &str = "fonts";
pub const MARKUP: &str = "markup";
pub const STATIC: &str = "static";

/// Resolved paths for one asset category.
///
/// Globs are relative to the project root; `output` and `staging` are
/// directories relative to the project root.
#[derive(Debug, Clone)]
pub struct CategoryPaths {
    pub input: Vec<String>,
    pub exclude: Vec<String>,
    pub output: PathBuf,
    pub staging: Option<PathBuf>,
}

/// Immutable category → paths mapping.
#[derive(Debug, Clone)]
pub struct PathRegistry {
    entries: BTreeMap<String, CategoryPaths>,
}

impl PathRegistry {
    /// Build the registry from validated configuration.
    ///
    /// Built-in entries mirror the documented source tree; overrides from
    /// `[category.<name>]` replace the matching entry wholesale.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let src = cfg.project().source.as_path();
        let out = cfg.project().output.as_path();
        let tmp = cfg.project().staging.as_path();

        let mut entries = BTreeMap::new();

        entries.insert(
            STYLES.to_string(),
            CategoryPaths {
                input: vec![
                    glob_under(src, "scss/**/*.scss"),
                    glob_under(src, "scss/**/*.sass"),
                    glob_under(src, "scss/**/*.css"),
                ],
                exclude: Vec::new(),
                output: out.join("css"),
                staging: Some(tmp.join("css")),
            },
        );

        entries.insert(
            SCRIPTS.to_string(),
            CategoryPaths {
                input: vec![glob_under(src, "scripts/**/*.js")],
                exclude: Vec::new(),
                output: out.join("js"),
                staging: Some(tmp.join("js")),
            },
        );

        entries.insert(
            IMAGES.to_string(),
            CategoryPaths {
                input: vec![glob_under(src, "images/**/*")],
                exclude: Vec::new(),
                output: out.join("images"),
                staging: None,
            },
        );

        entries.insert(
            FONTS.to_string(),
            CategoryPaths {
                input: vec![glob_under(src, "fonts/**/*")],
                exclude: Vec::new(),
                output: out.join("fonts"),
                staging: Some(tmp.join("fonts")),
            },
        );

        entries.insert(
            MARKUP.to_string(),
            CategoryPaths {
                input: vec![glob_under(src, "**/*.html")],
                exclude: Vec::new(),
                output: out.to_path_buf(),
                staging: None,
            },
        );

        entries.insert(
            STATIC.to_string(),
            CategoryPaths {
                input: vec![glob_under(src, "*.*")],
                exclude: vec![glob_under(src, "*.html")],
                output: out.to_path_buf(),
                staging: None,
            },
        );

        for (name, section) in cfg.category_overrides() {
            entries.insert(
                name.clone(),
                CategoryPaths {
                    input: section.input.clone(),
                    exclude: section.exclude.clone(),
                    output: section.output.clone(),
                    staging: section.staging.clone(),
                },
            );
        }

        Self { entries }
    }

    /// Pure lookup; unknown categories are a configuration error.
    pub fn resolve(&self, category: &str) -> Result<&CategoryPaths> {
        self.entries
            .get(category)
            .ok_or_else(|| PipelineError::Config(format!("unknown category: {category}")))
    }

    /// All registered category names.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }
}

fn glob_under(root: &Path, pattern: &str) -> String {
    let joined = root.join(pattern);
    joined.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    fn default_registry() -> PathRegistry {
        let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
        PathRegistry::from_config(&cfg)
    }

    #[test]
    fn resolve_known_categories_have_nonempty_globs() {
        let registry = default_registry();
        for name in [STYLES, SCRIPTS, IMAGES, FONTS, MARKUP, STATIC] {
            let entry = registry.resolve(name).unwrap();
            assert!(!entry.input.is_empty(), "category {name} has no globs");
            assert!(entry.input.iter().all(|g| !g.is_empty()));
        }
    }

    #[test]
    fn resolve_unknown_category_is_config_error() {
        let registry = default_registry();
        let err = registry.resolve("video").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn category_override_replaces_builtin_entry() {
        let raw: RawConfigFile = toml::from_str(
            r#"
            [category.images]
            input = ["assets/img/**/*"]
            output = "public/img"
            "#,
        )
        .unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();
        let registry = PathRegistry::from_config(&cfg);

        let images = registry.resolve(IMAGES).unwrap();
        assert_eq!(images.input, vec!["assets/img/**/*".to_string()]);
        assert_eq!(images.output, PathBuf::from("public/img"));
        assert!(images.staging.is_none());
    }
}
