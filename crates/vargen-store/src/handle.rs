//! Asset handles and sidecar files.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Extension appended to an asset path to form its sidecar path.
pub const SIDECAR_EXTENSION: &str = "meta";

/// Storage layer error types.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed sidecar {path}: {message}")]
    Sidecar { path: PathBuf, message: String },

    #[error("Unknown asset handle: {0}")]
    UnknownHandle(AssetHandle),

    #[error("Cannot import missing asset: {0}")]
    MissingAsset(PathBuf),
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Stable, path-independent identifier of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetHandle(String);

impl AssetHandle {
    /// Fresh random handle.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sidecar contents written next to every tracked asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Sidecar {
    pub guid: AssetHandle,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Sidecar {
    pub fn read(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        toml::from_str(&raw).map_err(|e| StoreError::Sidecar {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn write(&self, path: &Path) -> StoreResult<()> {
        let raw = toml::to_string(self).map_err(|e| StoreError::Sidecar {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, raw).map_err(|e| StoreError::io(path, e))
    }
}

/// Sidecar path for an asset: `X` -> `X.meta`.
pub fn sidecar_path(asset: &Path) -> PathBuf {
    let mut raw: OsString = asset.as_os_str().to_owned();
    raw.push(".");
    raw.push(SIDECAR_EXTENSION);
    PathBuf::from(raw)
}

/// Asset path for a sidecar, or `None` if `path` is not a sidecar.
pub fn asset_path(sidecar: &Path) -> Option<PathBuf> {
    if sidecar.extension()? != SIDECAR_EXTENSION {
        return None;
    }
    let stem = sidecar.file_stem()?;
    Some(sidecar.with_file_name(stem))
}
