//! Error types for fontinst-core (made by FontLab https://www.fontlab.com/)

use std::path::PathBuf;

/// Failures that abort a batch before any file is touched.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("folder does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures raised by a [`FontRegistry`](crate::registry::FontRegistry) backend.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("font registry is not available on this platform")]
    Unsupported,
}

/// Failures raised by the platform services behind the install strategies.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0} is not available on this platform")]
    Unavailable(&'static str),

    #[error("{operation} failed with code {code}")]
    Os { operation: &'static str, code: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
