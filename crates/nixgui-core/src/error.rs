//! Error types for `nixgui-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use std::path::PathBuf;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A search query was rejected before touching the catalog.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A data file referenced by configuration does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// Failed to parse a TOML data file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `nixgui-core`.
pub type CoreResult<T> = Result<T, CoreError>;
