//! End-to-end generation against a temporary project.

use std::path::{Path, PathBuf};

use vargen_codegen::{Generator, Partition, Registry, ReloadLock, TemplateCatalog};
use vargen_core::descriptor::metadata;
use vargen_core::{ErrorKind, Referability, Settings, TypeDescriptor};
use vargen_store::{AssetHandle, AssetStore, FsAssetStore, StoreError, StoreResult, sidecar_path};

/// Store that can fail to import one file name and records every delete
/// together with whether reloads were suppressed at the time.
struct SpyStore<'r> {
    inner: FsAssetStore,
    fail_on: Option<String>,
    reload: Option<&'r ReloadLock>,
    deletes: Vec<(PathBuf, bool)>,
}

impl<'r> SpyStore<'r> {
    fn failing(inner: FsAssetStore, fail_on: &str) -> Self {
        Self {
            inner,
            fail_on: Some(fail_on.to_string()),
            reload: None,
            deletes: Vec::new(),
        }
    }

    fn watching(inner: FsAssetStore, reload: &'r ReloadLock) -> Self {
        Self {
            inner,
            fail_on: None,
            reload: Some(reload),
            deletes: Vec::new(),
        }
    }
}

impl AssetStore for SpyStore<'_> {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn refresh(&mut self) -> StoreResult<()> {
        self.inner.refresh()
    }

    fn find_labeled(&self, label: &str) -> Vec<AssetHandle> {
        self.inner.find_labeled(label)
    }

    fn resolve(&self, handle: &AssetHandle) -> Option<PathBuf> {
        self.inner.resolve(handle)
    }

    fn handle_for(&self, path: &Path) -> Option<AssetHandle> {
        self.inner.handle_for(path)
    }

    fn labels(&self, handle: &AssetHandle) -> Vec<String> {
        self.inner.labels(handle)
    }

    fn import(&mut self, path: &Path) -> StoreResult<AssetHandle> {
        if path.file_name().and_then(|n| n.to_str()) == self.fail_on.as_deref() {
            return Err(StoreError::io(path, std::io::Error::other("simulated write failure")));
        }
        self.inner.import(path)
    }

    fn add_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()> {
        self.inner.add_label(handle, label)
    }

    fn remove_label(&mut self, handle: &AssetHandle, label: &str) -> StoreResult<()> {
        self.inner.remove_label(handle, label)
    }

    fn delete(&mut self, path: &Path) -> StoreResult<()> {
        let suppressed = self.reload.is_some_and(ReloadLock::is_suppressed);
        self.deletes.push((path.to_path_buf(), suppressed));
        self.inner.delete(path)
    }
}

struct Project {
    dir: tempfile::TempDir,
    settings: Settings,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        std::fs::create_dir_all(dir.path().join("Assets/Vars")).unwrap();
        Self { dir, settings }
    }

    fn template(&self, relative: &str, body: &str) {
        let path = self.settings.templates_dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn remove_template(&self, relative: &str) {
        std::fs::remove_file(self.settings.templates_dir.join(relative)).unwrap();
    }

    fn catalog(&self) -> TemplateCatalog {
        TemplateCatalog::scan(&self.settings).unwrap()
    }

    fn store(&self) -> FsAssetStore {
        FsAssetStore::open(self.dir.path()).unwrap()
    }

    fn vars(&self) -> PathBuf {
        self.dir.path().join("Assets/Vars")
    }
}

/// Every file under `dir` with its bytes, hidden files included.
fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), std::fs::read(e.path()).unwrap()))
        .collect()
}

fn meter() -> TypeDescriptor {
    TypeDescriptor::new("Meter", "float", Referability::Value).with_menu_order(1)
}

#[test]
fn test_end_to_end_meter() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "public class @Name@Variable : Variable<@Type@> {}\n");
    project.template("Editor/@Name@Editor.cs.tmpl", "public class @Name@Editor {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    let written = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), Path::new("Assets/Vars"), false)
        .unwrap();

    assert_eq!(written.len(), 2);
    for artifact in &written {
        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(metadata::decode(&text).unwrap(), meter());
    }
    assert!(std::fs::read_to_string(project.vars().join("MeterVariable.cs"))
        .unwrap()
        .starts_with("public class MeterVariable : Variable<float> {}"));
    assert!(project.vars().join("Editor/MeterEditor.cs").is_file());
    assert!(registry.is_name_taken(&mut store, "Meter"));

    let entries = registry.list_partition(&mut store, &project.settings, Partition::Custom);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].dominant_location, Some(project.vars()));
    assert_eq!(entries[0].artifacts, 2);
}

#[test]
fn test_registry_survives_fresh_process() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    let catalog = project.catalog();
    let reload = ReloadLock::new();
    {
        let mut store = project.store();
        let mut registry = Registry::new();
        Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
            .create(&meter(), &project.vars(), false)
            .unwrap();
    }

    let mut store = project.store();
    let mut registry = Registry::new();
    let set = registry.get(&mut store, "Meter").unwrap();
    assert_eq!(set.descriptor, meter());
    assert_eq!(set.partition, Partition::Custom);
    assert!(registry.warnings().is_empty());
}

#[test]
fn test_rollback_on_third_template() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "a\n");
    project.template("@Name@C.cs.tmpl", "c\n");
    project.template("Editor/@Name@B.cs.tmpl", "b\n");
    let catalog = project.catalog();
    assert_eq!(catalog.len(), 3);

    // Catalog order is A, C, Editor/B.
    let mut store = SpyStore::failing(project.store(), "MeterB.cs");
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    let err = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    let vars = project.vars();
    for path in [vars.join("MeterA.cs"), vars.join("Editor/MeterB.cs"), vars.join("MeterC.cs")] {
        assert!(!path.exists(), "{} survived rollback", path.display());
        assert!(!sidecar_path(&path).exists());
    }
    assert!(!vars.join("Editor").exists());
    assert!(!sidecar_path(&vars.join("Editor")).exists());
    assert!(!reload.is_suppressed());
    assert!(!registry.is_name_taken(&mut store, "Meter"));
}

#[test]
fn test_rollback_keeps_existing_tool_only_dir() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "a\n");
    project.template("Editor/@Name@B.cs.tmpl", "b\n");
    let catalog = project.catalog();
    let editor = project.vars().join("Editor");
    std::fs::create_dir(&editor).unwrap();

    let mut store = SpyStore::failing(project.store(), "MeterB.cs");
    let mut registry = Registry::new();
    let reload = ReloadLock::new();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap_err();

    assert!(editor.is_dir());
    assert!(!project.vars().join("MeterA.cs").exists());
}

#[test]
fn test_rebuild_prunes_orphans() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "old a @Type@\n");
    project.template("@Name@B.cs.tmpl", "old b\n");
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    let catalog = project.catalog();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let a = project.vars().join("MeterA.cs");
    let b = project.vars().join("MeterB.cs");
    let a_handle = store.handle_for(&a).unwrap();

    project.remove_template("@Name@B.cs.tmpl");
    project.template("@Name@A.cs.tmpl", "new a @Type@\n");
    let catalog = project.catalog();
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    assert_eq!(set.len(), 2);

    let written = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, None)
        .unwrap();

    assert_eq!(written.len(), 1);
    assert_eq!(written[0].handle, a_handle);
    assert!(!b.exists());
    assert!(!sidecar_path(&b).exists());
    assert!(std::fs::read_to_string(&a).unwrap().starts_with("new a float"));
    assert_eq!(registry.get(&mut store, "Meter").unwrap().len(), 1);
}

#[test]
fn test_rebuild_prunes_while_reloads_are_suppressed() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "a\n");
    project.template("@Name@B.cs.tmpl", "b\n");
    let reload = ReloadLock::new();
    let mut store = project.store();
    let mut registry = Registry::new();

    let catalog = project.catalog();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();

    project.remove_template("@Name@B.cs.tmpl");
    let catalog = project.catalog();
    let mut spy = SpyStore::watching(store, &reload);
    Generator::new(&project.settings, &catalog, &mut spy, &mut registry, &reload)
        .rebuild(&set, None)
        .unwrap();

    assert_eq!(spy.deletes, vec![(project.vars().join("MeterB.cs"), true)]);
    assert!(!reload.is_suppressed());
}

#[test]
fn test_failed_rebuild_keeps_existing_set() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "old a\n");
    project.template("@Name@C.cs.tmpl", "old c\n");
    project.template("Editor/@Name@B.cs.tmpl", "old b\n");
    let reload = ReloadLock::new();
    let mut store = project.store();
    let mut registry = Registry::new();

    let catalog = project.catalog();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    let before = snapshot(&project.vars());

    project.template("@Name@A.cs.tmpl", "a much longer replacement body\n");
    project.template("@Name@C.cs.tmpl", "new c\n");
    project.template("Editor/@Name@B.cs.tmpl", "new b\n");
    let catalog = project.catalog();
    let mut spy = SpyStore::failing(store, "MeterB.cs");
    let err = Generator::new(&project.settings, &catalog, &mut spy, &mut registry, &reload)
        .rebuild(&set, None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert_eq!(snapshot(&project.vars()), before);
    let set_after = registry.get(&mut spy, "Meter").unwrap();
    assert_eq!(set_after.len(), 3);
    assert_eq!(set_after.descriptor, meter());
}

#[test]
fn test_failed_write_during_rebuild_restores_overwritten_files() {
    let project = Project::new();
    project.template("@Name@A.cs.tmpl", "old a\n");
    project.template("@Name@C.cs.tmpl", "old c\n");
    let reload = ReloadLock::new();
    let mut store = project.store();
    let mut registry = Registry::new();

    let catalog = project.catalog();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    let before = snapshot(&project.vars());

    // A directory where the replacement for MeterC.cs is staged makes its write fail.
    let obstruction = project.vars().join(".MeterC.cs.tmp");
    std::fs::create_dir(&obstruction).unwrap();
    project.template("@Name@A.cs.tmpl", "new a\n");
    let catalog = project.catalog();
    let err = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IoFailure);
    std::fs::remove_dir(&obstruction).unwrap();
    assert_eq!(snapshot(&project.vars()), before);
}

#[test]
fn test_rename_reuses_name_independent_artifact() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    project.template("Shared.cs.tmpl", "// shared by @Name@\n");
    let catalog = project.catalog();
    let reload = ReloadLock::new();
    let mut store = project.store();
    let mut registry = Registry::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    let shared = project.vars().join("Shared.cs");
    let shared_handle = store.handle_for(&shared).unwrap();

    let renamed = TypeDescriptor::new("Length", "float", Referability::Value);
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, Some(&renamed))
        .unwrap();

    let text = std::fs::read_to_string(&shared).unwrap();
    assert!(text.starts_with("// shared by Length"));
    assert_eq!(metadata::decode(&text).unwrap(), renamed);
    assert_eq!(store.handle_for(&shared), Some(shared_handle));
    assert!(!project.vars().join("MeterVariable.cs").exists());
    assert_eq!(registry.get(&mut store, "Length").unwrap().len(), 2);
    assert!(!registry.is_name_taken(&mut store, "Meter"));
}

#[test]
fn test_rename_does_not_replace_foreign_files() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    let catalog = project.catalog();
    let reload = ReloadLock::new();
    let mut store = project.store();
    let mut registry = Registry::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    let foreign = project.vars().join("LengthVariable.cs");
    std::fs::write(&foreign, "handwritten").unwrap();

    let renamed = TypeDescriptor::new("Length", "float", Referability::Value);
    let err = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, Some(&renamed))
        .unwrap_err();

    assert!(matches!(err, vargen_core::VarTypeError::ArtifactExists(_)));
    assert_eq!(std::fs::read_to_string(&foreign).unwrap(), "handwritten");
    assert!(project.vars().join("MeterVariable.cs").is_file());
    assert!(registry.is_name_taken(&mut store, "Meter"));
}

#[test]
fn test_rebuild_with_new_descriptor() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable : Variable<@Type@> {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let other = TypeDescriptor::new("Distance", "double", Referability::Value);
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&other, &project.vars(), false)
        .unwrap();

    let set = registry.get(&mut store, "Meter").unwrap().clone();

    let taken = TypeDescriptor::new("Distance", "float", Referability::Value);
    let err = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, Some(&taken))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameCollision);

    let renamed = TypeDescriptor::new("Length", "double", Referability::Value).with_menu_order(4);
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, Some(&renamed))
        .unwrap();

    assert!(!project.vars().join("MeterVariable.cs").exists());
    let text = std::fs::read_to_string(project.vars().join("LengthVariable.cs")).unwrap();
    assert_eq!(metadata::decode(&text).unwrap(), renamed);
    assert!(!registry.is_name_taken(&mut store, "Meter"));
    assert!(registry.is_name_taken(&mut store, "Length"));
}

#[test]
fn test_delete_prunes_empty_tool_only_dir() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    project.template("Editor/@Name@Editor.cs.tmpl", "class @Name@Editor {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();

    let deleted = Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .delete(&set)
        .unwrap();

    assert_eq!(deleted.len(), 2);
    let editor = project.vars().join("Editor");
    assert!(!editor.exists());
    assert!(!sidecar_path(&editor).exists());
    assert!(project.vars().is_dir());
    assert!(!registry.is_name_taken(&mut store, "Meter"));
}

#[test]
fn test_delete_keeps_shared_tool_only_dir() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    project.template("Editor/@Name@Editor.cs.tmpl", "class @Name@Editor {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    for d in [meter(), TypeDescriptor::new("Speed", "float", Referability::Value)] {
        Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
            .create(&d, &project.vars(), false)
            .unwrap();
    }
    let set = registry.get(&mut store, "Meter").unwrap().clone();
    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .delete(&set)
        .unwrap();

    assert!(project.vars().join("Editor/SpeedEditor.cs").is_file());
    assert!(registry.is_name_taken(&mut store, "Speed"));
}

#[test]
fn test_names_unique_across_partitions() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();

    let elevated = project.settings.clone().with_builtin_mode(true);
    let other_dir = project.dir.path().join("Assets/System");
    std::fs::create_dir_all(&other_dir).unwrap();
    let err = Generator::new(&elevated, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &other_dir, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameCollision);

    let system = registry.partition(&mut store, Partition::System).len();
    let custom = registry.partition(&mut store, Partition::Custom).len();
    assert_eq!((system, custom), (0, 1));
}

#[test]
fn test_rebuild_in_builtin_mode_moves_set_to_system() {
    let project = Project::new();
    project.template("@Name@Variable.cs.tmpl", "class @Name@Variable {}\n");
    let catalog = project.catalog();
    let mut store = project.store();
    let mut registry = Registry::new();
    let reload = ReloadLock::new();

    Generator::new(&project.settings, &catalog, &mut store, &mut registry, &reload)
        .create(&meter(), &project.vars(), false)
        .unwrap();
    let set = registry.get(&mut store, "Meter").unwrap().clone();

    let elevated = project.settings.clone().with_builtin_mode(true);
    Generator::new(&elevated, &catalog, &mut store, &mut registry, &reload)
        .rebuild(&set, None)
        .unwrap();

    assert!(registry.partition(&mut store, Partition::Custom).is_empty());
    let set = registry.get(&mut store, "Meter").unwrap();
    assert_eq!(set.partition, Partition::System);
    assert!(set.descriptor.builtin);
    assert!(registry.warnings().is_empty());
}
