//! Rebuild command.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use std::path::Path;

use vargen_codegen::{ArtifactSet, Partition};
use vargen_core::TypeDescriptor;

use super::{Session, generation_error, referability_flag};
use crate::output;

#[derive(Args)]
pub struct RebuildArgs {
    /// Variable type to rebuild
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub name: Option<String>,

    /// Rebuild every editable type
    #[arg(long)]
    pub all: bool,

    /// New name
    #[arg(long, value_name = "NAME")]
    pub rename: Option<String>,

    /// New target type
    #[arg(long = "type", value_name = "TYPE")]
    pub target_type: Option<String>,

    /// Switch to by-value
    #[arg(long, conflicts_with = "reference")]
    pub value: bool,

    /// Switch to by-reference
    #[arg(long)]
    pub reference: bool,

    /// New menu order
    #[arg(long, allow_negative_numbers = true)]
    pub order: Option<i32>,
}

impl RebuildArgs {
    fn has_changes(&self) -> bool {
        self.rename.is_some() || self.target_type.is_some() || self.value || self.reference || self.order.is_some()
    }

    /// Descriptor with the requested changes applied, or `None` if unchanged.
    fn updated(&self, current: &TypeDescriptor) -> Option<TypeDescriptor> {
        if !self.has_changes() {
            return None;
        }
        let mut next = current.clone();
        if let Some(name) = &self.rename {
            next.name = name.clone();
        }
        if let Some(target_type) = &self.target_type {
            next.target_type = target_type.clone();
        }
        if let Some(referability) = referability_flag(self.value, self.reference) {
            next.referability = referability;
        }
        if let Some(order) = self.order {
            next.menu_order = order;
        }
        Some(next)
    }
}

pub fn execute(args: RebuildArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let mut session = Session::open(project_dir, builtin)?;

    if args.all {
        if args.has_changes() {
            bail!("--all cannot be combined with descriptor changes");
        }
        return rebuild_all(&mut session);
    }

    let Some(name) = args.name.as_deref() else {
        bail!("Name a variable type or pass --all");
    };
    let set = session.find_set(name)?;
    session.ensure_editable(&set)?;
    let next = args.updated(&set.descriptor);

    println!("{} Rebuilding {}", "→".blue().bold(), name.cyan());
    let written = session
        .generator()
        .rebuild(&set, next.as_ref())
        .map_err(generation_error)?;
    output::print_written(&written, &session.settings.project_root);
    Ok(())
}

fn rebuild_all(session: &mut Session) -> Result<()> {
    let mut sets: Vec<ArtifactSet> = Vec::new();
    for which in Partition::ALL {
        sets.extend(session.registry.partition(&mut session.store, which).values().cloned());
    }

    if sets.is_empty() {
        println!("{}", "No variable types found.".dimmed());
        return Ok(());
    }

    let mut rebuilt = 0;
    let mut failed = 0;
    for set in &sets {
        let name = &set.descriptor.name;
        if !set.is_editable(session.settings.builtin_mode) {
            println!("  {} {} {}", "·".dimmed(), name, "(system, skipped)".dimmed());
            continue;
        }
        match session.generator().rebuild(set, None) {
            Ok(written) => {
                rebuilt += 1;
                println!("  {} {} ({} artifacts)", "✓".green(), name, written.len());
            }
            Err(e) => {
                failed += 1;
                println!("  {} {} [{}] {}", "✗".red(), name, e.kind().as_str(), e);
            }
        }
    }

    println!();
    println!("{} rebuilt, {} failed", rebuilt.to_string().green(), failed.to_string().red());
    if failed > 0 {
        bail!("{} variable type(s) failed to rebuild", failed);
    }
    Ok(())
}
