//! Filesystem-backed asset store.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::AssetStore;
use crate::handle::{AssetHandle, Sidecar, StoreError, StoreResult, asset_path, sidecar_path};

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    labels: Vec<String>,
}

/// Asset store over a project directory, using `.meta` sidecars.
#[derive(Debug)]
pub struct FsAssetStore {
    root: PathBuf,
    index: IndexMap<AssetHandle, Entry>,
    by_path: HashMap<PathBuf, AssetHandle>,
}

impl FsAssetStore {
    /// Create a store rooted at `root`. The index is empty until [`AssetStore::refresh`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: IndexMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// Create a store and index it immediately.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self::new(root);
        store.refresh()?;
        Ok(store)
    }

    /// Number of tracked assets.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn insert(&mut self, handle: AssetHandle, path: PathBuf, labels: Vec<String>) {
        self.by_path.insert(path.clone(), handle.clone());
        self.index.insert(handle, Entry { path, labels });
    }

    fn forget_path(&mut self, path: &Path) {
        if let Some(handle) = self.by_path.remove(path) {
            self.index.shift_remove(&handle);
        }
    }

    fn update_labels(&mut self, handle: &AssetHandle, f: impl FnOnce(&mut Vec<String>)) -> StoreResult<()> {
        let entry = self
            .index
            .get_mut(handle)
            .ok_or_else(|| StoreError::UnknownHandle(handle.clone()))?;
        f(&mut entry.labels);
        Sidecar {
            guid: handle.clone(),
            labels: entry.labels.clone(),
        }
        .write(&sidecar_path(&entry.path))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

impl AssetStore for FsAssetStore {
    fn root(&self) -> &Path {
        &self.root
    }

    fn refresh(&mut self) -> StoreResult<()> {
        if !self.root.is_dir() {
            return Err(StoreError::io(
                &self.root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "store root is not a directory"),
            ));
        }

        self.index.clear();
        self.by_path.clear();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable path during refresh");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(asset) = asset_path(entry.path()) else {
                continue;
            };
            if !asset.exists() {
                debug!(sidecar = %entry.path().display(), "Ignoring sidecar without asset");
                continue;
            }
            let sidecar = match Sidecar::read(entry.path()) {
                Ok(sidecar) => sidecar,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed sidecar");
                    continue;
                }
            };
            if let Some(existing) = self.index.get(&sidecar.guid) {
                warn!(
                    handle = %sidecar.guid,
                    first = %existing.path.display(),
                    duplicate = %asset.display(),
                    "Duplicate asset handle, keeping the first"
                );
                continue;
            }
            self.insert(sidecar.guid, asset, sidecar.labels);
        }

        debug!(root = %self.root.display(), assets = self.index.len(), "Asset index refreshed");
        Ok(())
    }

    fn find_labeled(&self, label: &str) -> Vec<AssetHandle> {
        self.index
            .iter()
            .filter(|(_, entry)| entry.labels.iter().any(|l| l == label))
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    fn resolve(&self, handle: &AssetHandle) -> Option<PathBuf> {
        self.index.get(handle).map(|entry| entry.path.clone())
    }

    fn handle_for(&self, path: &Path) -> Option<AssetHandle> {
        self.by_path.get(path).cloned()
    }

    fn labels(&self, handle: &AssetHandle) -> Vec<String> {
        self.index
            .get(handle)
            .map(|entry| entry.labels.clone())
            .unwrap_or_default()
    }

    fn import(&mut self, path: &Path) -> StoreResult<AssetHandle> {
        if !path.exists() {
            return Err(StoreError::MissingAsset(path.to_path_buf()));
        }

        let meta = sidecar_path(path);
        let sidecar = if meta.is_file() {
            match Sidecar::read(&meta) {
                Ok(sidecar) => sidecar,
                Err(e) => {
                    warn!(error = %e, "Replacing malformed sidecar");
                    let fresh = Sidecar {
                        guid: AssetHandle::generate(),
                        labels: Vec::new(),
                    };
                    fresh.write(&meta)?;
                    fresh
                }
            }
        } else {
            let fresh = Sidecar {
                guid: AssetHandle::generate(),
                labels: Vec::new(),
            };
            fresh.write(&meta)?;
            fresh
        };

        self.forget_path(path);
        let handle = sidecar.guid.clone();
        self.insert(sidecar.guid, path.to_path_buf(), sidecar.labels);
        debug!(path = %path.display(), handle = %handle, "Imported asset");
        Ok(handle)
    }

    fn add_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()> {
        self.update_labels(handle, |labels| {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        })
    }

    fn remove_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()> {
        self.update_labels(handle, |labels| labels.retain(|l| l != label))
    }

    fn delete(&mut self, path: &Path) -> StoreResult<()> {
        if path.is_dir() {
            std::fs::remove_dir(path).map_err(|e| StoreError::io(path, e))?;
        } else if path.exists() {
            std::fs::remove_file(path).map_err(|e| StoreError::io(path, e))?;
        }

        let meta = sidecar_path(path);
        if meta.is_file() {
            std::fs::remove_file(&meta).map_err(|e| StoreError::io(&meta, e))?;
        }

        self.forget_path(path);
        debug!(path = %path.display(), "Deleted asset");
        Ok(())
    }
}
