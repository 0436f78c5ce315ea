// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.project,
            raw.serve,
            raw.manifest,
            raw.category,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_categories(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    for (label, path) in [
        ("source", &cfg.project.source),
        ("output", &cfg.project.output),
        ("staging", &cfg.project.staging),
    ] {
        if path.as_os_str().is_empty() {
            return Err(PipelineError::Config(format!(
                "[project].{label} must not be empty"
            )));
        }
    }

    if cfg.project.output == cfg.project.source {
        return Err(PipelineError::Config(
            "[project].output must differ from [project].source".to_string(),
        ));
    }

    Ok(())
}

fn validate_categories(cfg: &RawConfigFile) -> Result<()> {
    for (name, section) in cfg.category.iter() {
        if section.input.is_empty() {
            return Err(PipelineError::Config(format!(
                "category '{name}' has an empty input glob list"
            )));
        }

        for pattern in section.input.iter().chain(section.exclude.iter()) {
            if pattern.is_empty() {
                return Err(PipelineError::Config(format!(
                    "category '{name}' contains an empty glob pattern"
                )));
            }
            Glob::new(pattern).map_err(|e| {
                PipelineError::Config(format!(
                    "category '{name}' has invalid glob '{pattern}': {e}"
                ))
            })?;
        }

        if section.output.as_os_str().is_empty() {
            return Err(PipelineError::Config(format!(
                "category '{name}' has an empty output directory"
            )));
        }
    }

    Ok(())
}
