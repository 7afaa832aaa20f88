//! Language targets: the generation entry point.
//!
//! [`Target`] resolves the template set for `data.kind`, renders every
//! template file through a fresh [`TemplateEngine`] and splits the output
//! into [`GeneratedFile`]s. Language-specific targets customize it through
//! its builder methods (formatter, DSL parser, post-processor) or implement
//! [`LanguageTarget`] themselves and delegate to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::config::{TargetConfig, TargetOptions};
use crate::directive::split_files;
use crate::dsl::{DslParser, UnavailableDslParser};
use crate::engine::TemplateEngine;
use crate::error::{Error, Result};
use crate::formatter::{CodeFormatter, DefaultCodeFormatter, value_text};
use crate::kind::KindUri;
use crate::post_process::{
    CodePostProcessor, ExternalFormatter, IdentityPostProcessor, run_post_generation_commands,
};
use crate::shell::{CommandExecutor, ShellCommandExecutor};
use crate::templates::{TEMPLATES_DIR, load_templates};
use crate::types::{GeneratedAsset, GeneratedFile, SourceFile};

/// Root object every template renders against
#[derive(Serialize)]
struct RenderScope<'a> {
    options: &'a TargetOptions,
    data: JsonValue,
    context: &'a JsonValue,
}

/// Contract of a code generation target
#[async_trait]
pub trait LanguageTarget: Send + Sync {
    /// Render all files for `data.kind`. Nothing is written to disk.
    fn generate(&self, data: &JsonValue, context: &JsonValue) -> Result<Vec<GeneratedFile>>;

    /// Transform `data` before generation
    async fn preprocess(&self, data: JsonValue) -> Result<JsonValue> {
        Ok(data)
    }

    /// Called once generated files are written below `target_dir`
    async fn postprocess(&self, _target_dir: &Path, _assets: &[GeneratedAsset]) -> Result<()> {
        Ok(())
    }

    /// Three-way merge for files in `merge` mode
    fn merge_file(
        &self,
        source: &SourceFile,
        _target: &GeneratedFile,
        _last: Option<&GeneratedFile>,
    ) -> Result<GeneratedFile> {
        Err(Error::MergeNotSupported {
            filename: source.filename.clone(),
        })
    }

    /// `preprocess` followed by `generate`
    async fn generate_prepared(
        &self,
        data: JsonValue,
        context: &JsonValue,
    ) -> Result<Vec<GeneratedFile>> {
        let data = self.preprocess(data).await?;
        self.generate(&data, context)
    }
}

/// Template-directory backed target
pub struct Target {
    options: TargetOptions,
    base_dir: PathBuf,
    formatter: Arc<dyn CodeFormatter>,
    dsl: Arc<dyn DslParser>,
    post_processor: Arc<dyn CodePostProcessor>,
    executor: Arc<dyn CommandExecutor>,
    post_generation_commands: Vec<String>,
}

impl Target {
    pub fn new<P: Into<PathBuf>>(options: TargetOptions, base_dir: P) -> Self {
        Self {
            options,
            base_dir: base_dir.into(),
            formatter: Arc::new(DefaultCodeFormatter),
            dsl: Arc::new(UnavailableDslParser),
            post_processor: Arc::new(IdentityPostProcessor),
            executor: Arc::new(ShellCommandExecutor),
            post_generation_commands: Vec::new(),
        }
    }

    /// Build a target from a loaded [`TargetConfig`]
    pub fn from_config(config: TargetConfig) -> Result<Self> {
        let base_dir = config.base_dir()?.to_path_buf();
        let mut target = Self::new(config.options, base_dir)
            .with_post_generation_commands(config.post_generation_commands);
        if let Some(command) = config.formatter {
            target = target.with_post_processor(Arc::new(ExternalFormatter::new(command)));
        }
        Ok(target)
    }

    /// Load `target.yml` / `target.yaml` / `target.toml` from `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        Self::from_config(TargetConfig::load(dir)?)
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn CodeFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_dsl_parser(mut self, dsl: Arc<dyn DslParser>) -> Self {
        self.dsl = dsl;
        self
    }

    pub fn with_post_processor(mut self, post_processor: Arc<dyn CodePostProcessor>) -> Self {
        self.post_processor = post_processor;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_post_generation_commands(mut self, commands: Vec<String>) -> Self {
        self.post_generation_commands = commands;
        self
    }

    pub fn options(&self) -> &TargetOptions {
        &self.options
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.base_dir.join(TEMPLATES_DIR)
    }

    /// Engine with the target's collaborators bound in
    pub fn create_template_engine(
        &self,
        data: &JsonValue,
        context: &JsonValue,
    ) -> Result<TemplateEngine> {
        TemplateEngine::create(
            data,
            context,
            Arc::clone(&self.formatter),
            Arc::clone(&self.dsl),
        )
    }

    /// Generate every file for `data.kind`.
    ///
    /// Templates under `templates/<handle>/<name>/` render in file-name order;
    /// every file under `templates/` is available as a partial named after its
    /// relative path. Each template gets its own deep copy of `data`.
    pub fn generate(&self, data: &JsonValue, context: &JsonValue) -> Result<Vec<GeneratedFile>> {
        let kind = data.get("kind").map(value_text).unwrap_or_default();
        let kind_uri: KindUri = kind
            .parse()
            .map_err(|_| Error::MissingKind(kind.clone()))?;

        let root_dir = self.templates_dir();
        let kind_dir = root_dir.join(kind_uri.handle()).join(kind_uri.name());
        if !kind_dir.is_dir() {
            return Err(Error::TemplateNotFound {
                path: kind_dir,
                kind,
            });
        }

        let mut engine = self.create_template_engine(data, context)?;

        let partials = load_templates(&root_dir)?;
        let mut registered = 0;
        for partial in &partials {
            // a broken partial only fails the templates that include it
            match engine.register_partial(&partial.id, &partial.source) {
                Ok(()) => registered += 1,
                Err(e) => warn!(partial = %partial.id, error = %e, "Skipping partial that failed to compile"),
            }
        }
        debug!(kind = %kind, partials = registered, "Registered partials");

        let mut out = Vec::new();
        for template in load_templates(&kind_dir)? {
            let scope = RenderScope {
                options: &self.options,
                data: data.clone(),
                context,
            };
            let rendered = engine.render(&template.path, &template.source, &scope)?;

            let files = split_files(&template.id, &rendered);
            debug!(template = %template.id, files = files.len(), "Rendered template");

            out.extend(files.into_iter().map(|file| GeneratedFile {
                content: self.post_processor.process(&file.filename, file.content),
                ..file
            }));
        }

        info!(kind = %kind, files = out.len(), "Generated files");
        Ok(out)
    }
}

#[async_trait]
impl LanguageTarget for Target {
    fn generate(&self, data: &JsonValue, context: &JsonValue) -> Result<Vec<GeneratedFile>> {
        Target::generate(self, data, context)
    }

    async fn postprocess(&self, target_dir: &Path, assets: &[GeneratedAsset]) -> Result<()> {
        if self.post_generation_commands.is_empty() {
            return Ok(());
        }
        debug!(
            target_dir = %target_dir.display(),
            assets = assets.len(),
            "Running post-generation commands"
        );
        run_post_generation_commands(
            self.executor.as_ref(),
            &self.post_generation_commands,
            target_dir,
        )
        .await;
        Ok(())
    }
}
