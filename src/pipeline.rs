// src/pipeline.rs

//! Build orchestration: assembles stages and tasks from configuration and
//! drives the dev, build, clean and clear operations.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::model::ConfigFile;
use crate::config::paths::{self, CategoryPaths, PathRegistry};
use crate::errors::{PipelineError, Result};
use crate::graph::{run_task, LocalStageExecutor, StageExecutor, TaskGraph, TaskSpec};
use crate::inject::{InjectRefs, RefFormat};
use crate::reload::{ReloadNotifier, ReloadScope};
use crate::serve::DevServer;
use crate::stage::command::StyleCompile;
use crate::stage::fonts::VendorFonts;
use crate::stage::html::{BuildBlocks, HtmlMinify};
use crate::stage::images::ImageOptimize;
use crate::stage::minify::{CssTransform, JsMinify};
use crate::stage::{DropPartials, HashCache, Stage, Transform};
use crate::watch::{spawn_watcher, Dispatch, WatchBinding};

/// Task run for `assetpipe dev` before watching starts.
const DEV_TASK: &str = "dev";
/// Task run for `assetpipe build`.
const DEPLOY_TASK: &str = "deploy";

pub struct Pipeline {
    cfg: ConfigFile,
    registry: PathRegistry,
    root: PathBuf,
    dry_run: bool,
}

impl Pipeline {
    pub fn new(cfg: ConfigFile, dry_run: bool) -> Self {
        let registry = PathRegistry::from_config(&cfg);
        Self {
            cfg,
            registry,
            root: PathBuf::from("."),
            dry_run,
        }
    }

    /// Development loop: clean staging, run the dev task once, then serve
    /// and watch until interrupted.
    pub async fn dev(&self) -> Result<()> {
        if self.dry_run {
            return self.print_plan(DEV_TASK);
        }

        clean_dir(&self.cfg.project().staging)?;

        let notifier = ReloadNotifier::start(self.cfg.serve().ws_port)?;
        let graph = Arc::new(self.build_graph(false)?);
        let exec: Arc<dyn StageExecutor> =
            Arc::new(LocalStageExecutor::new(Some(notifier.clone())));

        run_task(Arc::clone(&graph), Arc::clone(&exec), DEV_TASK.to_string()).await?;

        let serve_roots = vec![
            self.cfg.project().staging.clone(),
            self.cfg.project().source.clone(),
            self.root.clone(),
        ];
        let server = DevServer::start(
            self.cfg.serve().port,
            serve_roots,
            Some(notifier.port()),
        )?;
        info!(
            http = server.port(),
            ws = notifier.port(),
            "dev server ready"
        );

        let _watcher = spawn_watcher(
            self.root.clone(),
            self.watch_bindings()?,
            graph,
            exec,
            Some(notifier),
        )?;

        tokio::signal::ctrl_c()
            .await
            .map_err(PipelineError::from)?;
        info!("interrupted; shutting down");
        Ok(())
    }

    /// Production build: clean the output directory, run the deploy task and
    /// report the built size.
    pub async fn build(&self) -> Result<()> {
        if self.dry_run {
            return self.print_plan(DEPLOY_TASK);
        }

        clean_dir(&self.cfg.project().staging)?;
        clean_dir(&self.cfg.project().output)?;

        let graph = Arc::new(self.build_graph(true)?);
        let exec: Arc<dyn StageExecutor> = Arc::new(LocalStageExecutor::new(None));
        run_task(graph, exec, DEPLOY_TASK.to_string()).await?;

        let size = dir_size(&self.cfg.project().output)?;
        info!(
            output = ?self.cfg.project().output,
            size = %human_size(size),
            "build finished"
        );
        Ok(())
    }

    /// Remove the output and staging trees.
    pub fn clean(&self) -> Result<()> {
        if self.dry_run {
            info!(
                output = ?self.cfg.project().output,
                staging = ?self.cfg.project().staging,
                "dry run: would remove"
            );
            return Ok(());
        }
        clean_dir(&self.cfg.project().output)?;
        clean_dir(&self.cfg.project().staging)?;
        info!("cleaned output and staging");
        Ok(())
    }

    /// Drop the content-hash cache so the next image run re-encodes
    /// everything.
    pub fn clear(&self) -> Result<()> {
        if self.dry_run {
            info!("dry run: would clear the content-hash cache");
            return Ok(());
        }
        HashCache::clear(&self.root)?;
        Ok(())
    }

    /// Assemble the full task graph. `production` switches the style and
    /// script stages to minified output. Validation runs before anything can
    /// execute, so unknown references and cycles fail here.
    pub fn build_graph(&self, production: bool) -> Result<TaskGraph> {
        let mut graph = TaskGraph::new();

        for stage in self.build_stages(production)? {
            graph.register_stage(Arc::new(stage));
        }

        graph.register(
            "inject",
            TaskSpec::Par(vec!["inject-markup".into(), "inject-styles".into()]),
        );
        graph.register(
            "fonts",
            TaskSpec::Par(vec!["fonts-local".into(), "fonts-vendor".into()]),
        );
        graph.register(
            "dev-assets",
            TaskSpec::Seq(vec![
                "styles".into(),
                "scripts".into(),
                "images".into(),
                "fonts".into(),
            ]),
        );
        graph.register(
            DEV_TASK,
            TaskSpec::Seq(vec!["inject".into(), "dev-assets".into()]),
        );

        graph.register(
            "prepare",
            TaskSpec::Par(vec!["styles".into(), "scripts".into()]),
        );
        graph.register(
            "deploy-copy",
            TaskSpec::Par(vec![
                "markup".into(),
                "images".into(),
                "fonts".into(),
                "static".into(),
            ]),
        );
        graph.register(
            DEPLOY_TASK,
            TaskSpec::Seq(vec!["inject".into(), "prepare".into(), "deploy-copy".into()]),
        );

        graph.validate()?;
        Ok(graph)
    }

    fn build_stages(&self, production: bool) -> Result<Vec<Stage>> {
        let styles = self.registry.resolve(paths::STYLES)?;
        let scripts = self.registry.resolve(paths::SCRIPTS)?;
        let images = self.registry.resolve(paths::IMAGES)?;
        let fonts = self.registry.resolve(paths::FONTS)?;
        let markup = self.registry.resolve(paths::MARKUP)?;
        let statics = self.registry.resolve(paths::STATIC)?;

        let styles_prefix = static_prefix(&styles.input);
        let mut stages = Vec::new();

        let style_transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(DropPartials),
            Box::new(StyleCompile::new(&styles_prefix)),
            Box::new(CssTransform::new(production)),
        ];
        stages.push(
            self.category_stage(paths::STYLES, styles, style_transforms)?
                .with_reload(ReloadScope::StyleOnly),
        );

        let script_transforms: Vec<Box<dyn Transform>> = if production {
            vec![Box::new(JsMinify)]
        } else {
            Vec::new()
        };
        stages.push(
            self.category_stage(paths::SCRIPTS, scripts, script_transforms)?
                .with_reload(ReloadScope::Full),
        );

        stages.push(
            self.category_stage(paths::IMAGES, images, vec![Box::new(ImageOptimize)])?
                .with_cache(HashCache::load(&self.root))
                .with_reload(ReloadScope::Full),
        );

        stages.push(
            self.category_stage("fonts-local", fonts, Vec::new())?
                .with_reload(ReloadScope::Full),
        );

        // Vendor packages may ship fonts; the manifest drives that copy.
        let manifest_path = self.cfg.manifest().path.clone();
        let manifest_glob = manifest_path.to_string_lossy().replace('\\', "/");
        let mut vendor_font_dirs = Vec::new();
        if let Some(staging) = &fonts.staging {
            vendor_font_dirs.push(staging.clone());
        }
        vendor_font_dirs.push(fonts.output.clone());
        stages.push(
            Stage::new(
                "fonts-vendor",
                &self.root,
                "",
                &[manifest_glob],
                &[],
                vec![Box::new(VendorFonts::new(manifest_path.clone()))],
                vendor_font_dirs,
            )?
            .with_reload(ReloadScope::Full),
        );

        stages.push(self.category_stage(paths::STATIC, statics, Vec::new())?);

        // Production markup: concatenate build blocks, then minify the page.
        let search_roots = vec![
            self.cfg.project().staging.clone(),
            self.cfg.project().source.clone(),
            self.root.clone(),
        ];
        stages.push(self.category_stage(
            paths::MARKUP,
            markup,
            vec![
                Box::new(BuildBlocks::new(search_roots)),
                Box::new(HtmlMinify::new()),
            ],
        )?);

        // Inject stages rewrite marked source files in place.
        let markup_prefix = static_prefix(&markup.input);
        stages.push(Stage::new(
            "inject-markup",
            &self.root,
            &markup_prefix,
            &markup.input,
            &markup.exclude,
            vec![Box::new(InjectRefs::new(
                RefFormat::Markup,
                manifest_path.clone(),
            ))],
            vec![markup_prefix.clone()],
        )?);

        stages.push(Stage::new(
            "inject-styles",
            &self.root,
            &styles_prefix,
            &styles.input,
            &styles.exclude,
            vec![Box::new(InjectRefs::new(
                RefFormat::StyleImport,
                manifest_path,
            ))],
            vec![styles_prefix.clone()],
        )?);

        Ok(stages)
    }

    /// Build one stage from a registry entry: walk from the project root,
    /// strip the category's static glob prefix, commit to staging (when the
    /// category has one) and the output directory.
    fn category_stage(
        &self,
        name: &str,
        entry: &CategoryPaths,
        transforms: Vec<Box<dyn Transform>>,
    ) -> Result<Stage> {
        let mut commit_dirs = Vec::new();
        if let Some(staging) = &entry.staging {
            commit_dirs.push(staging.clone());
        }
        commit_dirs.push(entry.output.clone());

        Stage::new(
            name,
            &self.root,
            static_prefix(&entry.input),
            &entry.input,
            &entry.exclude,
            transforms,
            commit_dirs,
        )
    }

    /// Watch rules for the dev loop.
    ///
    /// Markup changes only signal a reload: the dev server serves pages
    /// straight from the source tree, so there is nothing to rebuild. A
    /// manifest edit re-runs injection, and optionally the fonts stage since
    /// vendor packages may ship font files.
    pub fn watch_bindings(&self) -> Result<Vec<WatchBinding>> {
        let mut bindings = Vec::new();

        for (category, task) in [
            (paths::STYLES, "styles"),
            (paths::SCRIPTS, "scripts"),
            (paths::IMAGES, "images"),
            (paths::FONTS, "fonts"),
        ] {
            let entry = self.registry.resolve(category)?;
            bindings.push(WatchBinding::new(
                &entry.input,
                &entry.exclude,
                vec![Dispatch::Run(task.to_string())],
            )?);
        }

        let markup = self.registry.resolve(paths::MARKUP)?;
        bindings.push(WatchBinding::new(
            &markup.input,
            &markup.exclude,
            vec![Dispatch::Reload(ReloadScope::Full)],
        )?);

        let manifest_glob = self
            .cfg
            .manifest()
            .path
            .to_string_lossy()
            .replace('\\', "/");
        let mut manifest_dispatches = vec![Dispatch::Run("inject".to_string())];
        if self.cfg.manifest().refresh_fonts {
            manifest_dispatches.push(Dispatch::Run("fonts".to_string()));
        }
        bindings.push(WatchBinding::new(
            &[manifest_glob],
            &[],
            manifest_dispatches,
        )?);

        Ok(bindings)
    }

    fn print_plan(&self, task: &str) -> Result<()> {
        let graph = self.build_graph(task == DEPLOY_TASK)?;
        println!("would run task '{task}' with graph:");
        for name in graph.task_names() {
            match graph.resolve(name)? {
                TaskSpec::Stage(stage) => {
                    println!("  {name}: stage matching {:?}", stage.input_patterns());
                }
                TaskSpec::Seq(children) => println!("  {name}: seq {children:?}"),
                TaskSpec::Par(children) => println!("  {name}: par {children:?}"),
            }
        }
        Ok(())
    }
}

/// Longest glob-free directory prefix of a pattern set.
///
/// `src/scss/**/*.scss` contributes `src/scss`; the shortest prefix across
/// patterns wins so every pattern stays under the result.
fn static_prefix(patterns: &[String]) -> PathBuf {
    let mut shortest: Option<PathBuf> = None;

    for pattern in patterns {
        let mut prefix = PathBuf::new();
        for part in pattern.split('/') {
            if part.contains(['*', '?', '[', '{']) {
                break;
            }
            prefix.push(part);
        }
        // The last static component of a full-file pattern is the file name.
        if !pattern.ends_with('/') && prefix.as_os_str() == Path::new(pattern).as_os_str() {
            prefix.pop();
        }

        shortest = match shortest {
            Some(current) if current.starts_with(&prefix) => Some(prefix),
            Some(current) => Some(current),
            None => Some(prefix),
        };
    }

    shortest.unwrap_or_default()
}

/// Remove a directory tree, tolerating its absence.
fn clean_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!(?path, "removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::Cleanup {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn dir_size(path: &Path) -> Result<u64> {
    let mut total = 0u64;
    if !path.is_dir() {
        return Ok(total);
    }
    let mut stack = vec![path.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if let Ok(meta) = entry.metadata() {
                total += meta.len();
            }
        }
    }
    Ok(total)
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_prefix_stops_at_glob_parts() {
        let patterns = vec!["src/scss/**/*.scss".to_string()];
        assert_eq!(static_prefix(&patterns), PathBuf::from("src/scss"));

        let patterns = vec!["src/*.*".to_string()];
        assert_eq!(static_prefix(&patterns), PathBuf::from("src"));
    }

    #[test]
    fn static_prefix_takes_shortest_across_patterns() {
        let patterns = vec![
            "src/scss/vendor/**/*.css".to_string(),
            "src/scss/**/*.scss".to_string(),
        ];
        assert_eq!(static_prefix(&patterns), PathBuf::from("src/scss"));
    }

    #[test]
    fn human_size_uses_binary_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
