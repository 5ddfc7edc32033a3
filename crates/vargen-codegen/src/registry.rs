//! Artifact registry.
//!
//! Generated artifacts are found by their discovery label and grouped by the
//! descriptor name embedded in each file. The registry caches the result and
//! rescans lazily after [`Registry::invalidate`].

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use vargen_core::descriptor::metadata;
use vargen_core::{Settings, TypeDescriptor};
use vargen_store::{AssetHandle, AssetStore};

use crate::reload::ReloadLock;

/// Discovery label of system-owned artifacts.
pub const SYSTEM_LABEL: &str = "vargen:system";
/// Discovery label of custom artifacts.
pub const CUSTOM_LABEL: &str = "vargen:custom";

/// Registry partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    System,
    Custom,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::System, Partition::Custom];

    /// Partition new artifacts are labeled into.
    pub fn for_builtin_mode(builtin_mode: bool) -> Self {
        if builtin_mode {
            Self::System
        } else {
            Self::Custom
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::System => SYSTEM_LABEL,
            Self::Custom => CUSTOM_LABEL,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::System => Self::Custom,
            Self::Custom => Self::System,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Custom => "custom",
        }
    }
}

/// Non-fatal condition found while scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanWarning {
    /// File could not be read or holds no valid metadata block.
    Unparseable { path: PathBuf, error: String },
    /// File disagrees with the set's canonical descriptor.
    Mismatch {
        name: String,
        path: PathBuf,
        field: &'static str,
        canonical: String,
        found: String,
    },
    /// File's referability did not decode to a known kind.
    UnresolvedReferability { name: String, path: PathBuf },
    /// Name present in both partitions; the custom entry was dropped.
    CrossPartition { name: String },
    /// No file of this name carried a usable descriptor.
    NoCanonical { name: String },
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable { path, error } => {
                write!(f, "{}: unreadable metadata ({})", path.display(), error)
            }
            Self::Mismatch {
                name,
                path,
                field,
                canonical,
                found,
            } => write!(
                f,
                "{}: {} of '{}' is '{}' but the set uses '{}'",
                path.display(),
                field,
                name,
                found,
                canonical
            ),
            Self::UnresolvedReferability { name, path } => {
                write!(f, "{}: referability of '{}' is not value or reference", path.display(), name)
            }
            Self::CrossPartition { name } => {
                write!(f, "'{}' is labeled both system and custom; treating it as system", name)
            }
            Self::NoCanonical { name } => {
                write!(f, "'{}' has no artifact with a usable descriptor", name)
            }
        }
    }
}

/// The generated files realizing one descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactSet {
    pub descriptor: TypeDescriptor,
    pub partition: Partition,
    handles: IndexSet<AssetHandle>,
    pub warnings: Vec<ScanWarning>,
}

impl ArtifactSet {
    pub fn new(descriptor: TypeDescriptor, partition: Partition) -> Self {
        Self {
            descriptor,
            partition,
            handles: IndexSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Append a handle. Returns `false` if it was already present.
    pub fn push_handle(&mut self, handle: AssetHandle) -> bool {
        self.handles.insert(handle)
    }

    /// Handles in discovery order.
    pub fn handles(&self) -> impl Iterator<Item = &AssetHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Current paths of every resolvable handle, in discovery order.
    pub fn paths<S: AssetStore>(&self, store: &S) -> Vec<PathBuf> {
        self.handles.iter().filter_map(|h| store.resolve(h)).collect()
    }

    /// Directory of the first artifact outside the tool-only partition.
    pub fn dominant_location<S: AssetStore>(&self, store: &S, settings: &Settings) -> Option<PathBuf> {
        self.handles
            .iter()
            .filter_map(|h| store.resolve(h))
            .find(|path| !settings.is_tool_only(path))
            .and_then(|path| path.parent().map(Path::to_path_buf))
    }

    /// System sets are only editable in builtin mode.
    pub fn is_editable(&self, builtin_mode: bool) -> bool {
        self.partition == Partition::Custom || builtin_mode
    }
}

/// Row of [`Registry::list_partition`].
#[derive(Debug, Clone, Serialize)]
pub struct PartitionEntry {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub dominant_location: Option<PathBuf>,
    pub artifacts: usize,
    pub warnings: usize,
}

/// Result of scanning one partition.
#[derive(Debug, Default)]
pub struct PartitionScan {
    pub sets: IndexMap<String, ArtifactSet>,
    pub warnings: Vec<ScanWarning>,
}

#[derive(Default)]
struct PendingSet {
    canonical: Option<TypeDescriptor>,
    handles: IndexSet<AssetHandle>,
    warnings: Vec<ScanWarning>,
}

/// Cached view of both partitions.
#[derive(Debug)]
pub struct Registry {
    system: IndexMap<String, ArtifactSet>,
    custom: IndexMap<String, ArtifactSet>,
    warnings: Vec<ScanWarning>,
    dirty: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty registry that scans on first lookup.
    pub fn new() -> Self {
        Self {
            system: IndexMap::new(),
            custom: IndexMap::new(),
            warnings: Vec::new(),
            dirty: true,
        }
    }

    /// Mark the cache stale; the next lookup rescans.
    pub fn invalidate(&mut self) {
        if !self.dirty {
            debug!("Registry invalidated");
        }
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Host reload hook. Invalidates unless the reload is currently suppressed.
    pub fn on_reload(&mut self, lock: &ReloadLock) -> bool {
        let proceed = lock.request_reload();
        if proceed {
            self.invalidate();
        }
        proceed
    }

    /// Rescan both partitions if the cache is stale.
    pub fn ensure_fresh<S: AssetStore>(&mut self, store: &mut S) {
        if self.dirty {
            self.rescan(store);
        }
    }

    /// Unconditionally rebuild both partitions.
    pub fn rescan<S: AssetStore>(&mut self, store: &mut S) {
        if let Err(e) = store.refresh() {
            warn!(error = %e, "Asset index refresh failed; scanning the previous index");
        }

        let system = Self::scan(&*store, Partition::System);
        let mut custom = Self::scan(&*store, Partition::Custom);

        let mut warnings = system.warnings;
        warnings.append(&mut custom.warnings);

        let mut system_sets = system.sets;
        custom.sets.retain(|name, _| {
            let Some(set) = system_sets.get_mut(name) else {
                return true;
            };
            let warning = ScanWarning::CrossPartition { name: name.clone() };
            warn!(name = %name, "Name labeled in both partitions");
            set.warnings.push(warning.clone());
            warnings.push(warning);
            false
        });

        debug!(
            system = system_sets.len(),
            custom = custom.sets.len(),
            warnings = warnings.len(),
            "Registry scanned"
        );

        self.system = system_sets;
        self.custom = custom.sets;
        self.warnings = warnings;
        self.dirty = false;
    }

    /// Build the name -> set mapping for one partition.
    pub fn scan<S: AssetStore>(store: &S, partition: Partition) -> PartitionScan {
        let mut pending: IndexMap<String, PendingSet> = IndexMap::new();
        let mut loose = Vec::new();

        for handle in store.find_labeled(partition.label()) {
            let Some(path) = store.resolve(&handle) else {
                continue;
            };
            if !path.is_file() {
                continue;
            }

            let decoded = std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|text| metadata::decode(&text).map_err(|e| e.to_string()));
            let descriptor = match decoded {
                Ok(descriptor) => descriptor,
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "Skipping artifact without metadata");
                    loose.push(ScanWarning::Unparseable { path, error });
                    continue;
                }
            };

            let entry = pending.entry(descriptor.name.clone()).or_default();
            entry.handles.insert(handle);

            if !descriptor.referability.is_resolved() {
                warn!(name = %descriptor.name, path = %path.display(), "Unresolved referability");
                entry.warnings.push(ScanWarning::UnresolvedReferability {
                    name: descriptor.name,
                    path,
                });
                continue;
            }

            match &entry.canonical {
                None => entry.canonical = Some(descriptor),
                Some(canonical) => {
                    let checks = [
                        ("type", canonical.target_type.clone(), descriptor.target_type.clone()),
                        (
                            "referability",
                            canonical.referability.to_string(),
                            descriptor.referability.to_string(),
                        ),
                    ];
                    for (field, expected, found) in checks {
                        if expected != found {
                            warn!(name = %descriptor.name, path = %path.display(), field, "Artifact disagrees with its set");
                            entry.warnings.push(ScanWarning::Mismatch {
                                name: descriptor.name.clone(),
                                path: path.clone(),
                                field,
                                canonical: expected,
                                found,
                            });
                        }
                    }
                }
            }
        }

        let mut result = PartitionScan {
            sets: IndexMap::new(),
            warnings: loose,
        };
        for (name, set) in pending {
            result.warnings.extend(set.warnings.iter().cloned());
            let Some(canonical) = set.canonical else {
                warn!(name = %name, "No usable descriptor for name");
                result.warnings.push(ScanWarning::NoCanonical { name });
                continue;
            };
            result.sets.insert(
                name,
                ArtifactSet {
                    descriptor: canonical,
                    partition,
                    handles: set.handles,
                    warnings: set.warnings,
                },
            );
        }
        result
    }

    /// True if `name` exists in either partition.
    pub fn is_name_taken<S: AssetStore>(&mut self, store: &mut S, name: &str) -> bool {
        self.ensure_fresh(store);
        self.system.contains_key(name) || self.custom.contains_key(name)
    }

    /// Look up a set in either partition.
    pub fn get<S: AssetStore>(&mut self, store: &mut S, name: &str) -> Option<&ArtifactSet> {
        self.ensure_fresh(store);
        self.system.get(name).or_else(|| self.custom.get(name))
    }

    /// All sets of one partition, in discovery order.
    pub fn partition<S: AssetStore>(&mut self, store: &mut S, which: Partition) -> &IndexMap<String, ArtifactSet> {
        self.ensure_fresh(store);
        match which {
            Partition::System => &self.system,
            Partition::Custom => &self.custom,
        }
    }

    /// Display rows of one partition, ordered by menu order, then name.
    pub fn list_partition<S: AssetStore>(
        &mut self,
        store: &mut S,
        settings: &Settings,
        which: Partition,
    ) -> Vec<PartitionEntry> {
        self.ensure_fresh(store);
        let sets = match which {
            Partition::System => &self.system,
            Partition::Custom => &self.custom,
        };
        let mut entries: Vec<PartitionEntry> = sets
            .iter()
            .map(|(name, set)| PartitionEntry {
                name: name.clone(),
                descriptor: set.descriptor.clone(),
                dominant_location: set.dominant_location(&*store, settings),
                artifacts: set.len(),
                warnings: set.warnings.len(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.descriptor
                .menu_order
                .cmp(&b.descriptor.menu_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        entries
    }

    /// Warnings from the most recent scan.
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }
}
