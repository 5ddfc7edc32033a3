//! All-or-nothing multi-file writes.
//!
//! Every directory created and file written through a [`WriteTransaction`] is
//! tracked. Dropping the transaction without [`WriteTransaction::commit`]
//! unwinds the tracked writes in reverse order: new files are deleted,
//! overwritten files get their previous contents back, and created
//! directories are removed once empty.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use vargen_core::{VarTypeError, VarTypeResult};
use vargen_store::{AssetHandle, AssetStore, sidecar_path};

use crate::catalog::Placement;

/// One artifact written by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub handle: AssetHandle,
    pub path: PathBuf,
    pub placement: Placement,
}

#[derive(Debug)]
enum TrackedWrite {
    Dir(PathBuf),
    File {
        path: PathBuf,
        /// Contents of the file and its sidecar before this write, if it existed.
        previous: Option<(Vec<u8>, Option<Vec<u8>>)>,
    },
}

/// Transaction over a sequence of writes into an asset store.
pub struct WriteTransaction<'s, S: AssetStore> {
    store: &'s mut S,
    tracked: Vec<TrackedWrite>,
    written: Vec<GeneratedArtifact>,
    committed: bool,
}

impl<'s, S: AssetStore> WriteTransaction<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            tracked: Vec::new(),
            written: Vec::new(),
            committed: false,
        }
    }

    /// Create a directory and register it with the store.
    pub fn create_dir(&mut self, path: &Path) -> VarTypeResult<AssetHandle> {
        std::fs::create_dir(path).map_err(|e| VarTypeError::io(path, e))?;
        self.tracked.push(TrackedWrite::Dir(path.to_path_buf()));
        let handle = self.store.import(path)?;
        debug!(path = %path.display(), "Created directory");
        Ok(handle)
    }

    /// Write a file and register it with the store.
    ///
    /// The write is tracked before the filesystem is touched, so a write
    /// that fails halfway is still unwound on rollback.
    pub fn write_file(&mut self, path: &Path, contents: &str, placement: Placement) -> VarTypeResult<AssetHandle> {
        if path.is_dir() {
            return Err(VarTypeError::Obstructed(path.to_path_buf()));
        }
        let previous = if path.is_file() {
            let bytes = std::fs::read(path).map_err(|e| VarTypeError::io(path, e))?;
            let meta = sidecar_path(path);
            let meta_bytes = if meta.is_file() {
                Some(std::fs::read(&meta).map_err(|e| VarTypeError::io(&meta, e))?)
            } else {
                None
            };
            Some((bytes, meta_bytes))
        } else {
            None
        };

        self.tracked.push(TrackedWrite::File {
            path: path.to_path_buf(),
            previous,
        });
        write_replacing(path, contents).map_err(|e| VarTypeError::io(path, e))?;

        let handle = self.store.import(path)?;
        self.written.push(GeneratedArtifact {
            handle: handle.clone(),
            path: path.to_path_buf(),
            placement,
        });
        debug!(path = %path.display(), handle = %handle, "Wrote artifact");
        Ok(handle)
    }

    /// Artifacts written so far.
    pub fn written(&self) -> &[GeneratedArtifact] {
        &self.written
    }

    /// Store the transaction writes into.
    pub fn store(&mut self) -> &mut S {
        &mut *self.store
    }

    /// Keep every write and return the artifacts in write order.
    pub fn commit(mut self) -> Vec<GeneratedArtifact> {
        self.committed = true;
        self.tracked.clear();
        std::mem::take(&mut self.written)
    }

    fn rollback(&mut self) {
        let mut restored = false;
        for write in self.tracked.drain(..).rev() {
            match write {
                TrackedWrite::File { path, previous: None } => {
                    if let Err(e) = self.store.delete(&path) {
                        warn!(path = %path.display(), error = %e, "Rollback failed to delete file");
                    }
                }
                TrackedWrite::File {
                    path,
                    previous: Some((bytes, meta_bytes)),
                } => {
                    restored = true;
                    if let Err(e) = std::fs::write(&path, bytes) {
                        warn!(path = %path.display(), error = %e, "Rollback failed to restore file");
                    }
                    let meta = sidecar_path(&path);
                    let result = match meta_bytes {
                        Some(meta_bytes) => std::fs::write(&meta, meta_bytes),
                        None if meta.is_file() => std::fs::remove_file(&meta),
                        None => Ok(()),
                    };
                    if let Err(e) = result {
                        warn!(path = %meta.display(), error = %e, "Rollback failed to restore sidecar");
                    }
                }
                TrackedWrite::Dir(path) => {
                    if !is_empty_dir(&path) {
                        warn!(path = %path.display(), "Rollback left non-empty directory in place");
                        continue;
                    }
                    if let Err(e) = self.store.delete(&path) {
                        warn!(path = %path.display(), error = %e, "Rollback failed to delete directory");
                    }
                }
            }
        }
        // Restored sidecars bypass the store, so its index is stale.
        if restored {
            if let Err(e) = self.store.refresh() {
                warn!(error = %e, "Failed to refresh store after rollback");
            }
        }
        self.written.clear();
    }
}

impl<S: AssetStore> Drop for WriteTransaction<'_, S> {
    fn drop(&mut self) {
        if !self.committed && !self.tracked.is_empty() {
            debug!(writes = self.tracked.len(), "Rolling back uncommitted writes");
            self.rollback();
        }
    }
}

/// Write `contents` to a hidden sibling and rename it over `path`. A failed
/// write leaves `path` untouched.
fn write_replacing(path: &Path, contents: &str) -> std::io::Result<()> {
    let staging = staging_path(path);
    let result = std::fs::write(&staging, contents).and_then(|()| std::fs::rename(&staging, path));
    if result.is_err() && staging.is_file() {
        let _ = std::fs::remove_file(&staging);
    }
    result
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// True if `path` is a directory with no entries at all.
pub(crate) fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
