//! Target configuration file.
//!
//! A target directory may carry a `target.yml` (or `target.yaml`, or
//! `target.toml`) describing the options exposed to templates and the
//! commands run around generation. Every field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_value::Value as SerdeValue;
use tracing::debug;

use crate::error::{Error, Result};

/// Free-form options handed to every template as `options`
pub type TargetOptions = Map<String, JsonValue>;

/// File names probed by [`TargetConfig::load`], in order
pub const CONFIG_FILES: [&str; 3] = ["target.yml", "target.yaml", "target.toml"];

/// External source formatter invoked per generated file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterCommand {
    /// Program to run; code is piped through its stdin/stdout
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Directory holding `templates/`; defaults to the directory the config was loaded from
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    #[serde(default)]
    pub options: TargetOptions,

    #[serde(default)]
    pub formatter: Option<FormatterCommand>,

    /// Shell commands run in the output directory after files are written
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub post_generation_commands: Vec<String>,
}

impl TargetConfig {
    /// Load the first config file found in `dir`, or defaults when there is none.
    /// A relative `base_dir` is resolved against `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let Some(path) = CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        else {
            debug!(dir = %dir.display(), "No target config found, using defaults");
            return Ok(Self {
                base_dir: Some(dir.to_path_buf()),
                ..Self::default()
            });
        };

        debug!(path = %path.display(), "Loading target config");
        let content = std::fs::read_to_string(&path)?;
        let mut config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        config.base_dir = Some(match config.base_dir.take() {
            Some(base) if base.is_relative() => dir.join(base),
            Some(base) => base,
            None => dir.to_path_buf(),
        });
        Ok(config)
    }

    /// `base_dir`, failing when none was configured
    pub fn base_dir(&self) -> Result<&Path> {
        self.base_dir
            .as_deref()
            .ok_or_else(|| Error::config("Target base directory not configured"))
    }
}

/// Accept either a single command or a list of commands
fn deserialize_commands<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match SerdeValue::deserialize(deserializer)? {
        SerdeValue::String(command) => Ok(vec![command]),
        SerdeValue::Seq(items) => items
            .into_iter()
            .map(|item| match item {
                SerdeValue::String(command) => Ok(command),
                _ => Err(serde::de::Error::custom(
                    "Expected string or array of strings",
                )),
            })
            .collect(),
        SerdeValue::Unit | SerdeValue::Option(None) => Ok(Vec::new()),
        _ => Err(serde::de::Error::custom(
            "Expected string or array of strings",
        )),
    }
}
