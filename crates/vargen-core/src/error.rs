//! Centralized error types for vargen.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for registry and generation operations.
#[derive(Error, Debug)]
pub enum VarTypeError {
    #[error("Invalid identifier for {field}: '{value}'")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("A variable type named '{0}' already exists")]
    NameCollision(String),

    #[error("Referability of '{0}' was never resolved to value or reference")]
    InvalidReferability(String),

    #[error("Directory not found: {0}")]
    PathNotFound(PathBuf),

    #[error("'{0}' has no runtime-visible artifact to regenerate into")]
    NoLocation(String),

    #[error("Cannot generate into the tool-only partition: {0}")]
    InvalidPlacement(PathBuf),

    #[error("Artifact already exists: {0}")]
    ArtifactExists(PathBuf),

    #[error("Path is obstructed by a file that is not a directory: {0}")]
    Obstructed(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Store(#[from] vargen_store::StoreError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for vargen operations.
pub type VarTypeResult<T> = Result<T, VarTypeError>;

/// Closed classification of [`VarTypeError`] for callers that branch on the
/// failure category rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    NameCollision,
    InvalidReferability,
    PathNotFound,
    InvalidPlacement,
    IoFailure,
    Config,
}

impl ErrorKind {
    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "invalid_identifier",
            Self::NameCollision => "name_collision",
            Self::InvalidReferability => "invalid_referability",
            Self::PathNotFound => "path_not_found",
            Self::InvalidPlacement => "invalid_placement",
            Self::IoFailure => "io_failure",
            Self::Config => "config",
        }
    }
}

impl VarTypeError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            Self::NameCollision(_) => ErrorKind::NameCollision,
            Self::InvalidReferability(_) => ErrorKind::InvalidReferability,
            Self::PathNotFound(_) | Self::NoLocation(_) => ErrorKind::PathNotFound,
            Self::InvalidPlacement(_) => ErrorKind::InvalidPlacement,
            Self::ArtifactExists(_)
            | Self::Obstructed(_)
            | Self::Io { .. }
            | Self::Store(_)
            | Self::Template(_) => ErrorKind::IoFailure,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            field,
            value: value.into(),
        }
    }

    /// Wrap an IO error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
