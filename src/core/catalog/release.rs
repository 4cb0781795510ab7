use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::error::{InstallerError, InstallerResult};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    Release,
    Beta,
    Alpha,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FileHashes {
    #[serde(default)]
    pub sha1: Option<String>,
}

/// A distributable attached to a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseFile {
    pub url: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub hashes: FileHashes,
    /// Modrinth calls this `size`; older feeds use `fileSize`.
    #[serde(default, alias = "fileSize")]
    pub size: u64,
}

/// One version of the modpack project as listed by the catalog.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version_number: Option<String>,
    pub game_versions: Vec<String>,
    pub files: Vec<ReleaseFile>,
    #[serde(rename = "version_type")]
    pub channel: ReleaseChannel,
    #[serde(default)]
    pub date_published: Option<DateTime<Utc>>,
}

impl ReleaseRecord {
    /// The file flagged primary. A feed without one is malformed.
    pub fn primary_file(&self) -> InstallerResult<&ReleaseFile> {
        self.files
            .iter()
            .find(|f| f.primary)
            .ok_or_else(|| InstallerError::NoPrimaryFile(self.label()))
    }

    /// Human-readable identifier for logs and errors.
    pub fn label(&self) -> String {
        self.version_number
            .clone()
            .or_else(|| self.name.clone())
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| self.game_versions.join(", "))
    }
}
