use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring the installer or running the install phase
#[derive(Debug, Error)]
pub enum InstallError {
    /// A destination directory could not be resolved
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A source directory (or one of its entries) could not be read
    #[error("could not read {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file name pattern glob could not compile. Patterns are rewritten to
    /// fnmatch rules first, so an unclosed `[` matches itself instead of failing.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The install manifest is missing or malformed
    #[error("manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A copy, permission change or removal failed during the install phase
    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InstallError>;
