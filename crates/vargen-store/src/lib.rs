//! Vargen Storage Layer
//!
//! Tracks project assets through `.meta` sidecar files. Each sidecar carries
//! a stable handle and the asset's labels, so assets can be found by label
//! and resolved by handle regardless of where they live.

pub mod fs;
pub mod handle;

pub use fs::FsAssetStore;
pub use handle::{AssetHandle, StoreError, StoreResult, sidecar_path};

use std::path::{Path, PathBuf};

/// Host storage layer seen by the registry and the generator.
pub trait AssetStore {
    /// Root directory of the corpus.
    fn root(&self) -> &Path;

    /// Rebuild the handle index from disk.
    fn refresh(&mut self) -> StoreResult<()>;

    /// Handles carrying `label`, in discovery order.
    fn find_labeled(&self, label: &str) -> Vec<AssetHandle>;

    /// Current path of a handle.
    fn resolve(&self, handle: &AssetHandle) -> Option<PathBuf>;

    /// Handle of the asset at `path`, if tracked.
    fn handle_for(&self, path: &Path) -> Option<AssetHandle>;

    /// Labels attached to a handle.
    fn labels(&self, handle: &AssetHandle) -> Vec<String>;

    /// Start tracking a file or directory that was just written.
    ///
    /// An asset that already has a sidecar keeps its handle and labels.
    fn import(&mut self, path: &Path) -> StoreResult<AssetHandle>;

    fn add_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()>;

    fn remove_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()>;

    /// Request deletion of a file or empty directory and its sidecar.
    ///
    /// Callers must only rely on the deletion having been requested; a host
    /// may process it later.
    fn delete(&mut self, path: &Path) -> StoreResult<()>;

    /// Resolve a handle and delete its asset. Unknown handles are skipped.
    fn delete_handle(&mut self, handle: &AssetHandle) -> StoreResult<()> {
        match self.resolve(handle) {
            Some(path) => self.delete(&path),
            None => {
                tracing::warn!(handle = %handle, "Delete requested for unknown handle");
                Ok(())
            }
        }
    }
}
