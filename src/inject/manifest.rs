// src/inject/manifest.rs

//! Vendor dependency manifest.
//!
//! The manifest schema is owned externally; we only consume it. Entries keep
//! their file order, which is also the injection order.
//!
//! ```toml
//! [[package]]
//! name = "lib-a"
//! version = "1.2"
//! assets = ["vendor/lib-a/lib-a.css", "vendor/lib-a/lib-a.js"]
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Manifest {
    #[serde(default, rename = "package")]
    pub packages: Vec<ManifestEntry>,
}

impl Manifest {
    /// Load the manifest; a missing file is an empty manifest, so projects
    /// without vendor dependencies need no manifest at all.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let manifest: Manifest = toml::from_str(&contents)?;
        Ok(manifest)
    }

    /// All asset paths across packages, in manifest order.
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .flat_map(|p| p.assets.iter().map(|s| s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_packages_in_order() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[package]]
            name = "lib-a"
            version = "1.2"
            assets = ["vendor/lib-a/lib-a.js"]

            [[package]]
            name = "lib-b"
            version = "3.0"
            assets = ["vendor/lib-b/lib-b.css", "vendor/lib-b/lib-b.js"]
            "#,
        )
        .unwrap();

        assert_eq!(manifest.packages.len(), 2);
        assert_eq!(manifest.packages[0].name, "lib-a");
        assert_eq!(
            manifest.assets().collect::<Vec<_>>(),
            vec![
                "vendor/lib-a/lib-a.js",
                "vendor/lib-b/lib-b.css",
                "vendor/lib-b/lib-b.js"
            ]
        );
    }
}
