//! Multi-file source code generation from kind-specific template sets.
//!
//! A [`Target`] owns a `templates/` directory with one template set per kind
//! (`templates/<handle>/<name>/`). [`Target::generate`] renders the set that
//! matches `data.kind` through a handlebars-based [`TemplateEngine`] and splits
//! the output into [`GeneratedFile`]s using the `#FILENAME:` directive
//! protocol described in [`directive`].
//!
//! ```no_run
//! use kapeta_codegen::{Target, TargetOptions};
//! use serde_json::json;
//!
//! let target = Target::new(TargetOptions::new(), "./java-target");
//! let files = target.generate(
//!     &json!({"kind": "kapeta/block-type-service:1.0.0", "metadata": {"name": "users"}}),
//!     &json!({"spec": {"consumers": [], "providers": []}}),
//! )?;
//! for file in files {
//!     println!("{} ({}, {})", file.filename, file.mode, file.permissions);
//! }
//! # Ok::<(), kapeta_codegen::Error>(())
//! ```

pub mod config;
pub mod directive;
pub mod dsl;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod kind;
pub mod post_process;
pub mod shell;
pub mod target;
pub mod templates;
pub mod type_refs;
pub mod types;

pub use config::{FormatterCommand, TargetConfig, TargetOptions};
pub use directive::split_files;
pub use dsl::{DslError, DslParseOptions, DslParseResult, DslParser, EntityReader};
pub use engine::TemplateEngine;
pub use error::{Error, Result};
pub use formatter::{CodeFormatter, DefaultCodeFormatter};
pub use kind::{KindQuery, KindUri};
pub use post_process::{CodePostProcessor, ExternalFormatter, IdentityPostProcessor};
pub use shell::{CommandExecutor, CommandOutput, ShellCommandExecutor};
pub use target::{LanguageTarget, Target};
pub use type_refs::{DtoCatalog, TypeReferenceResolver};
pub use types::{FileMode, GeneratedAsset, GeneratedFile, SourceFile};
