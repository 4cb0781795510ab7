use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the installer backend.
/// Every module returns `Result<T, InstallerError>`.
#[derive(Debug, Error)]
pub enum InstallerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Loader metadata unavailable: {0}")]
    LoaderApi(String),

    // ── Integrity ───────────────────────────────────────
    #[error("{path} is not inside {root:?}")]
    PathEscapesRoot { path: String, root: PathBuf },

    #[error("Not a valid mrpack: no modrinth.index.json entry found")]
    MissingManifest,

    #[error("No primary file found in release {0}")]
    NoPrimaryFile(String),

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Checksum {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Configuration ───────────────────────────────────
    #[error("No supported mod loader declared (dependencies: {0})")]
    UnsupportedLoader(String),

    #[error("Invalid version string {0:?}")]
    InvalidVersion(String),

    // ── Local state ─────────────────────────────────────
    #[error("Launcher state at {path:?} unusable: {reason}")]
    LocalState { path: PathBuf, reason: String },

    // ── Formats ─────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type InstallerResult<T> = Result<T, InstallerError>;

impl InstallerError {
    /// True for errors that mean the pack or feed itself is malformed.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            InstallerError::PathEscapesRoot { .. }
                | InstallerError::MissingManifest
                | InstallerError::NoPrimaryFile(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallerError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for InstallerError {
    fn from(source: std::io::Error) -> Self {
        InstallerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// A single mirror that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    pub url: String,
    pub reason: String,
}

/// Every candidate URL for one file was exhausted.
#[derive(Debug, Clone, Error)]
pub struct DownloadError {
    pub attempts: Vec<MirrorFailure>,
}

impl DownloadError {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.attempts.iter().map(|a| a.url.as_str())
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "No download URLs available");
        }
        write!(f, "All urls from [")?;
        for (i, url) in self.urls().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", url)?;
        }
        write!(f, "] could not be downloaded")?;
        if let Some(last) = self.attempts.last() {
            write!(f, " (last error: {})", last.reason)?;
        }
        Ok(())
    }
}
