//! CLI command definitions and handlers.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use vargen_codegen::{ArtifactSet, Generator, Registry, ReloadLock, TemplateCatalog};
use vargen_core::{Referability, Settings, VarTypeError};
use vargen_store::FsAssetStore;

pub mod create;
pub mod delete;
pub mod init;
pub mod list;
pub mod rebuild;

/// Vargen - variable type wrapper generator
#[derive(Parser)]
#[command(name = "vargen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Elevated mode: new sets are system-owned and system sets are editable
    #[arg(long, global = true)]
    pub builtin: bool,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write vargen.toml and the default templates
    Init(init::InitArgs),

    /// List generated variable types
    List(list::ListArgs),

    /// Check whether a name can be used for a new variable type
    Check(list::CheckArgs),

    /// List the template catalog
    Templates(list::TemplatesArgs),

    /// Generate a new variable type
    Create(create::CreateArgs),

    /// Regenerate existing variable types from the current templates
    Rebuild(rebuild::RebuildArgs),

    /// Delete a generated variable type
    Delete(delete::DeleteArgs),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let project_dir = match self.project {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        match self.command {
            Commands::Init(args) => init::execute(args, &project_dir),
            Commands::List(args) => list::execute(args, &project_dir, self.builtin),
            Commands::Check(args) => list::execute_check(args, &project_dir, self.builtin),
            Commands::Templates(args) => list::execute_templates(args, &project_dir, self.builtin),
            Commands::Create(args) => create::execute(args, &project_dir, self.builtin),
            Commands::Rebuild(args) => rebuild::execute(args, &project_dir, self.builtin),
            Commands::Delete(args) => delete::execute(args, &project_dir, self.builtin),
        }
    }
}

/// Everything one command needs to talk to the engine.
pub struct Session {
    pub settings: Settings,
    pub catalog: TemplateCatalog,
    pub store: FsAssetStore,
    pub registry: Registry,
    pub reload: ReloadLock,
}

impl Session {
    /// Load settings, scan templates and index the project.
    pub fn open(project_dir: &Path, builtin: bool) -> Result<Self> {
        let mut settings = Settings::load(project_dir)?;
        if builtin {
            settings.builtin_mode = true;
        }
        let catalog = TemplateCatalog::scan(&settings)?;
        let store = FsAssetStore::open(&settings.project_root)?;
        debug!(
            root = %settings.project_root.display(),
            templates = catalog.len(),
            assets = store.len(),
            "Session opened"
        );

        Ok(Self {
            settings,
            catalog,
            store,
            registry: Registry::new(),
            reload: ReloadLock::new(),
        })
    }

    pub fn generator(&mut self) -> Generator<'_, FsAssetStore> {
        Generator::new(
            &self.settings,
            &self.catalog,
            &mut self.store,
            &mut self.registry,
            &self.reload,
        )
    }

    /// Look up a set by name, cloned out of the registry.
    pub fn find_set(&mut self, name: &str) -> Result<ArtifactSet> {
        self.registry
            .get(&mut self.store, name)
            .cloned()
            .ok_or_else(|| anyhow!("No variable type named '{}'. Run 'vargen list' to see existing types.", name))
    }

    /// Refuse to edit a system-owned set outside elevated mode.
    pub fn ensure_editable(&self, set: &ArtifactSet) -> Result<()> {
        if set.is_editable(self.settings.builtin_mode) {
            Ok(())
        } else {
            Err(anyhow!(
                "'{}' is a system type. Re-run with --builtin to edit it.",
                set.descriptor.name
            ))
        }
    }
}

/// Referability selected by a `--value`/`--reference` flag pair.
pub fn referability_flag(value: bool, reference: bool) -> Option<Referability> {
    match (value, reference) {
        (true, false) => Some(Referability::Value),
        (false, true) => Some(Referability::Reference),
        _ => None,
    }
}

/// Attach the error kind so scripts can branch on it.
pub fn generation_error(err: VarTypeError) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!("Generation failed [{}]", kind.as_str()))
}
