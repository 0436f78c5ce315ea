// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod inject;
pub mod logging;
pub mod pipeline;
pub mod reload;
pub mod serve;
pub mod stage;
pub mod watch;

use std::path::PathBuf;

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::errors::Result;
use crate::pipeline::Pipeline;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates configuration, assembles the pipeline and dispatches
/// on the subcommand. Omitting the subcommand runs a production build.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let pipeline = Pipeline::new(cfg, args.dry_run);

    match args.command.unwrap_or(Command::Build) {
        Command::Dev => pipeline.dev().await,
        Command::Build => pipeline.build().await,
        Command::Clean => pipeline.clean(),
        Command::Clear => pipeline.clear(),
    }
}
