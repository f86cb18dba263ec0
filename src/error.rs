use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to callers.
///
/// Only [`ProjectError::NoTarget`] is produced by the parsers themselves;
/// every other gap in a descriptor degrades to an absent model field.  The
/// remaining variants come from the file-reading convenience wrappers.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The Xcode object graph contains no `PBXNativeTarget`.
    #[error("no native target found in project")]
    NoTarget,

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid resolver settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
