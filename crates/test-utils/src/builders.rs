#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assetpipe::config::{CategorySection, ConfigFile, RawConfigFile};
use assetpipe::stage::{Stage, Transform};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_source(mut self, dir: &str) -> Self {
        self.config.project.source = PathBuf::from(dir);
        self
    }

    pub fn with_output(mut self, dir: &str) -> Self {
        self.config.project.output = PathBuf::from(dir);
        self
    }

    pub fn with_staging(mut self, dir: &str) -> Self {
        self.config.project.staging = PathBuf::from(dir);
        self
    }

    pub fn with_category(mut self, name: &str, section: CategorySection) -> Self {
        self.config.category.insert(name.to_string(), section);
        self
    }

    pub fn with_manifest_path(mut self, path: &str) -> Self {
        self.config.manifest.path = PathBuf::from(path);
        self
    }

    pub fn with_refresh_fonts(mut self, val: bool) -> Self {
        self.config.manifest.refresh_fonts = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a [`Stage`] rooted at an arbitrary directory.
pub struct StageBuilder {
    name: String,
    walk_root: PathBuf,
    strip_prefix: PathBuf,
    input: Vec<String>,
    exclude: Vec<String>,
    transforms: Vec<Box<dyn Transform>>,
    commit_dirs: Vec<PathBuf>,
}

impl StageBuilder {
    pub fn new(name: &str, walk_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            walk_root: walk_root.into(),
            strip_prefix: PathBuf::new(),
            input: vec!["**/*".to_string()],
            exclude: Vec::new(),
            transforms: Vec::new(),
            commit_dirs: Vec::new(),
        }
    }

    pub fn strip_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.strip_prefix = prefix.into();
        self
    }

    pub fn input(mut self, pattern: &str) -> Self {
        self.input = vec![pattern.to_string()];
        self
    }

    pub fn add_input(mut self, pattern: &str) -> Self {
        self.input.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude.push(pattern.to_string());
        self
    }

    pub fn transform(mut self, t: Box<dyn Transform>) -> Self {
        self.transforms.push(t);
        self
    }

    pub fn commit_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.commit_dirs.push(dir.into());
        self
    }

    pub fn build(self) -> Stage {
        Stage::new(
            self.name,
            self.walk_root,
            self.strip_prefix,
            &self.input,
            &self.exclude,
            self.transforms,
            self.commit_dirs,
        )
        .expect("Failed to build valid stage from builder")
    }
}

/// Write `contents` at `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("creating parent dirs");
    }
    fs::write(&path, contents).expect("writing test file");
}

/// Read `root/rel` as UTF-8.
pub fn read_file(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}
