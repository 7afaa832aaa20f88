//! Core types for generated output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permissions applied to a generated file when none are given
pub const DEFAULT_PERMISSIONS: &str = "644";

/// How a generated file is written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileMode {
    /// Overwrite on every generation
    #[default]
    WriteAlways,
    /// Only write when the file does not exist yet
    CreateOnly,
    /// Three-way merge with the hand-edited version
    Merge,
    /// Never write
    Skip,
}

impl FileMode {
    /// The literal token used in `#FILENAME:` directives
    pub fn as_str(&self) -> &'static str {
        match self {
            FileMode::WriteAlways => "write-always",
            FileMode::CreateOnly => "create-only",
            FileMode::Merge => "merge",
            FileMode::Skip => "skip",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "write-always" => Ok(FileMode::WriteAlways),
            "create-only" => Ok(FileMode::CreateOnly),
            "merge" => Ok(FileMode::Merge),
            "skip" => Ok(FileMode::Skip),
            other => Err(format!("Unknown file mode: {other}")),
        }
    }
}

/// One output file produced by a generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filename: String,
    pub content: String,
    pub mode: FileMode,
    pub permissions: String,
}

impl GeneratedFile {
    /// Permission string interpreted as octal unix mode bits
    pub fn unix_mode(&self) -> Option<u32> {
        u32::from_str_radix(self.permissions.trim(), 8).ok()
    }
}

/// A file previously written to disk by a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAsset {
    pub filename: String,
    pub mode: FileMode,
    pub permissions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A file from the hand-authored source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub filename: String,
    pub content: String,
    pub permissions: String,
}
