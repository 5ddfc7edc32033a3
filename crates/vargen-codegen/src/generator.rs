//! Code generator.
//!
//! Instantiates the template catalog for a descriptor, writes the resulting
//! artifact set transactionally and labels it for discovery. Rebuild and
//! delete keep the files on disk and the registry consistent.

use indexmap::IndexSet;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use vargen_core::descriptor::{expand_placeholders, metadata};
use vargen_core::{Settings, TypeDescriptor, VarTypeError, VarTypeResult, identifier};
use vargen_store::{AssetHandle, AssetStore};

use crate::catalog::{Placement, TemplateCatalog};
use crate::registry::{ArtifactSet, Partition, Registry};
use crate::reload::ReloadLock;
use crate::transaction::{GeneratedArtifact, WriteTransaction, is_empty_dir};

/// Generator over one project. Borrows every collaborator for its lifetime.
pub struct Generator<'a, S: AssetStore> {
    settings: &'a Settings,
    catalog: &'a TemplateCatalog,
    store: &'a mut S,
    registry: &'a mut Registry,
    reload: &'a ReloadLock,
}

impl<'a, S: AssetStore> Generator<'a, S> {
    pub fn new(
        settings: &'a Settings,
        catalog: &'a TemplateCatalog,
        store: &'a mut S,
        registry: &'a mut Registry,
        reload: &'a ReloadLock,
    ) -> Self {
        Self {
            settings,
            catalog,
            store,
            registry,
            reload,
        }
    }

    /// Generate the artifact set for `descriptor` into `target_dir`.
    ///
    /// Every precondition is checked before the filesystem is touched. Any
    /// failure after the first write rolls the whole set back.
    pub fn create(
        &mut self,
        descriptor: &TypeDescriptor,
        target_dir: &Path,
        override_existing: bool,
    ) -> VarTypeResult<Vec<GeneratedArtifact>> {
        let target = self.settings.resolve(target_dir);
        self.check_preconditions(descriptor, &target, !override_existing)?;

        let none = IndexSet::new();
        let overwrite = if override_existing {
            Overwrite::Any
        } else {
            Overwrite::Owned(&none)
        };
        let guard = self.reload.suppress();
        let result = self.write_set(descriptor, &target, &overwrite);
        drop(guard);
        self.finish_writes();

        let written = result?;
        info!(
            name = %descriptor.name,
            dir = %target.display(),
            artifacts = written.len(),
            "Generated variable type"
        );
        Ok(written)
    }

    /// Regenerate `set` in its dominant location and delete artifacts the
    /// current templates no longer produce.
    ///
    /// With `new_descriptor` the set is regenerated under the new identity;
    /// a changed name must not be taken, but the set may still replace the
    /// files it owns.
    pub fn rebuild(
        &mut self,
        set: &ArtifactSet,
        new_descriptor: Option<&TypeDescriptor>,
    ) -> VarTypeResult<Vec<GeneratedArtifact>> {
        let descriptor = new_descriptor.unwrap_or(&set.descriptor);
        let location = set
            .dominant_location(&*self.store, self.settings)
            .ok_or_else(|| VarTypeError::NoLocation(set.descriptor.name.clone()))?;
        let renamed = descriptor.name != set.descriptor.name;
        self.check_preconditions(descriptor, &location, renamed)?;

        let owned: IndexSet<PathBuf> = set.paths(&*self.store).into_iter().collect();
        let overwrite = if renamed {
            Overwrite::Owned(&owned)
        } else {
            Overwrite::Any
        };

        // Regenerate and prune as one write sequence.
        let guard = self.reload.suppress();
        let result = self.write_set(descriptor, &location, &overwrite);
        if let Ok(written) = &result {
            self.prune_orphans(&owned, written);
        }
        drop(guard);
        self.finish_writes();

        let written = result?;
        info!(
            name = %descriptor.name,
            previous = %set.descriptor.name,
            dir = %location.display(),
            artifacts = written.len(),
            "Rebuilt variable type"
        );
        Ok(written)
    }

    /// Delete every artifact of `set`, then its tool-only directory if that
    /// is left empty. Returns the deleted paths.
    ///
    /// Deletion continues past failures; the first failure is returned once
    /// every artifact has been attempted.
    pub fn delete(&mut self, set: &ArtifactSet) -> VarTypeResult<Vec<PathBuf>> {
        let paths = set.paths(&*self.store);
        let location = set
            .dominant_location(&*self.store, self.settings)
            .or_else(|| paths.first().and_then(|p| p.parent()).map(Path::to_path_buf));

        let guard = self.reload.suppress();
        let mut deleted = Vec::new();
        let mut first_error = None;
        for path in paths {
            match self.store.delete(&path) {
                Ok(()) => deleted.push(path),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to delete artifact");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(location) = location {
            let sibling = self.settings.tool_only_sibling(&location);
            if is_empty_dir(&sibling) {
                match self.store.delete(&sibling) {
                    Ok(()) => debug!(path = %sibling.display(), "Pruned empty tool-only directory"),
                    Err(e) => warn!(path = %sibling.display(), error = %e, "Failed to prune tool-only directory"),
                }
            }
        }
        drop(guard);
        self.finish_writes();

        if let Some(e) = first_error {
            return Err(e.into());
        }
        info!(name = %set.descriptor.name, artifacts = deleted.len(), "Deleted variable type");
        Ok(deleted)
    }

    fn check_preconditions(
        &mut self,
        descriptor: &TypeDescriptor,
        target: &Path,
        check_name: bool,
    ) -> VarTypeResult<()> {
        if !identifier::is_valid(&descriptor.name) {
            return Err(VarTypeError::invalid_identifier("name", &descriptor.name));
        }
        if check_name && self.registry.is_name_taken(self.store, &descriptor.name) {
            return Err(VarTypeError::NameCollision(descriptor.name.clone()));
        }
        if !identifier::is_valid(&descriptor.target_type) {
            return Err(VarTypeError::invalid_identifier("type", &descriptor.target_type));
        }
        if !descriptor.referability.is_resolved() {
            return Err(VarTypeError::InvalidReferability(descriptor.name.clone()));
        }
        if !target.is_dir() {
            return Err(VarTypeError::PathNotFound(target.to_path_buf()));
        }
        if self.settings.is_tool_only(target) {
            return Err(VarTypeError::InvalidPlacement(target.to_path_buf()));
        }
        let sibling = self.settings.tool_only_sibling(target);
        if sibling.exists() && !sibling.is_dir() {
            return Err(VarTypeError::Obstructed(sibling));
        }
        if self.catalog.templates_for(descriptor.referability).next().is_none() {
            return Err(VarTypeError::Template(format!(
                "no template supports {} referability",
                descriptor.referability
            )));
        }
        Ok(())
    }

    fn write_set(
        &mut self,
        descriptor: &TypeDescriptor,
        target: &Path,
        overwrite: &Overwrite<'_>,
    ) -> VarTypeResult<Vec<GeneratedArtifact>> {
        let settings = self.settings;
        let catalog = self.catalog;
        let descriptor = descriptor.clone().with_builtin(settings.builtin_mode);
        let descriptor = &descriptor;
        let sibling = settings.tool_only_sibling(target);

        let mut tx = WriteTransaction::new(&mut *self.store);
        if !sibling.exists() {
            tx.create_dir(&sibling)?;
        }

        for template in catalog.templates_for(descriptor.referability) {
            let file_name = expand_placeholders(&template.name_pattern, descriptor);
            let dir = match template.placement {
                Placement::RuntimeVisible => target,
                Placement::ToolOnly => sibling.as_path(),
            };
            let path = dir.join(&file_name);
            if path.exists() && !overwrite.allows(&path) {
                return Err(VarTypeError::ArtifactExists(path));
            }

            let body = expand_placeholders(&template.load_body()?, descriptor);
            let contents = metadata::append_block(&body, descriptor)
                .map_err(|e| VarTypeError::Template(format!("{}: {}", template.source_path.display(), e)))?;
            tx.write_file(&path, &contents, template.placement)?;
        }

        let partition = Partition::for_builtin_mode(settings.builtin_mode);
        let handles: Vec<AssetHandle> = tx.written().iter().map(|a| a.handle.clone()).collect();
        for handle in &handles {
            tx.store().remove_label(handle, partition.other().label())?;
            tx.store().add_label(handle, partition.label())?;
        }

        Ok(tx.commit())
    }

    /// Delete previously owned artifacts that `written` did not reproduce.
    fn prune_orphans(&mut self, owned: &IndexSet<PathBuf>, written: &[GeneratedArtifact]) {
        let fresh: HashSet<&Path> = written.iter().map(|a| a.path.as_path()).collect();
        for path in owned.iter().filter(|p| !fresh.contains(p.as_path())) {
            match self.store.delete(path) {
                Ok(()) => debug!(path = %path.display(), "Deleted orphaned artifact"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete orphaned artifact"),
            }
        }
    }

    /// Invalidate after a write sequence and apply any reload deferred meanwhile.
    fn finish_writes(&mut self) {
        if self.reload.take_deferred() {
            debug!("Applying reload deferred during writes");
        }
        self.registry.invalidate();
    }
}

/// Which existing files a write sequence may replace.
enum Overwrite<'p> {
    Any,
    Owned(&'p IndexSet<PathBuf>),
}

impl Overwrite<'_> {
    fn allows(&self, path: &Path) -> bool {
        match self {
            Overwrite::Any => true,
            Overwrite::Owned(paths) => paths.contains(path),
        }
    }
}
