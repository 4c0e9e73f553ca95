//! Application error type.

use std::fmt;
use std::path::PathBuf;

use prism_graphics::GraphicsError;

/// Errors that stop the application.
#[derive(Debug)]
pub enum AppError {
    /// An HDR or material image could not be read or decoded.
    AssetLoad { path: PathBuf, reason: String },
    /// The configuration file or flags are invalid.
    Config(String),
    /// Reading a file failed.
    Io { path: PathBuf, source: std::io::Error },
    /// The graphics layer failed.
    Graphics(GraphicsError),
}

impl AppError {
    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetLoad { path, reason } => {
                write!(f, "failed to load {}: {reason}", path.display())
            }
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Graphics(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Graphics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphicsError> for AppError {
    fn from(err: GraphicsError) -> Self {
        Self::Graphics(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
