//! Error handling for the code generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Every failure of a `generate`
//! call is fatal for that call: no partial file list is ever returned.
//!
//! # Examples
//!
//! ```
//! use kapeta_codegen::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("missing base directory"))
//! }
//!
//! assert!(might_fail().is_err());
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::dsl::DslError;

/// Result type for code generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for code generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// The render data carried no usable `kind`
    #[error("No template found for kind: {0}")]
    MissingKind(String),

    /// The kind resolved to a template directory that does not exist
    #[error("Template not found \"{}\" for kind: {kind}", path.display())]
    TemplateNotFound { path: PathBuf, kind: String },

    /// A file under the template tree could not be read
    #[error("Failed to read template \"{}\": {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template failed to compile or render
    #[error("Failed to compile source: {}. {message}", path.display())]
    Render { path: PathBuf, message: String },

    /// Embedded source block could not be parsed
    #[error("DSL error: {0}")]
    Dsl(#[from] DslError),

    /// Default merge hook
    #[error("Could not merge changes for file: {filename}. Merge not supported.")]
    MergeNotSupported { filename: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Post-processing error
    #[error("Post-processing error: {0}")]
    PostProcessing(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new render error for the template at `path`
    pub fn render<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Render {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new post-processing error
    pub fn post_processing<S: Into<String>>(msg: S) -> Self {
        Self::PostProcessing(msg.into())
    }

    /// True for failures caused by the caller's input or setup rather than by a template
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingKind(_) | Self::TemplateNotFound { .. } | Self::Config(_)
        )
    }
}
