//! The error taxonomy every fallible operation in this crate returns.
//!
//! All seven kinds are fatal to an `install` run: there is no retry layer
//! and no partial success (see spec §7). `main.rs` is the only place that
//! turns one of these into an exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("{0} not found or unparseable")]
    ManifestMissing(String),

    #[error("no version of {name} satisfies {range}")]
    Resolution { name: String, range: String },

    #[error("request to {url} failed: {reason}{status}", status = .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("integrity verification failed for {id}")]
    Integrity { id: String },

    #[error("extraction of {id} failed: {reason}")]
    Extraction { id: String, reason: String },

    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} failed with exit status {1}")]
    Script(String, std::process::ExitStatus),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn transport(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Transport {
            url: url.into(),
            status: None,
            reason: reason.to_string(),
        }
    }

    pub fn transport_status(url: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Error::Transport {
            url: url.into(),
            status: Some(status),
            reason: reason.into(),
        }
    }

    pub fn fs(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// Extension used throughout the crate to attach a path to an `io::Error`
/// the moment it's produced, so the `Filesystem` diagnostic is always
/// specific (spec §7: "the underlying cause").
pub trait IoResultExt<T> {
    fn fs_err(self, path: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_err(self, path: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::fs(path, e))
    }
}
