//! Read-only registry and catalog commands.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use vargen_codegen::{Partition, PartitionEntry, ScanWarning};
use vargen_core::identifier;

use super::Session;
use crate::output;

#[derive(Args)]
pub struct ListArgs {
    /// Only system types
    #[arg(long, conflicts_with = "custom")]
    pub system: bool,

    /// Only custom types
    #[arg(long)]
    pub custom: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Candidate name
    pub name: String,

    /// Also validate a target type
    #[arg(long = "type", value_name = "TYPE")]
    pub target_type: Option<String>,
}

#[derive(Args)]
pub struct TemplatesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    system: Option<Vec<PartitionEntry>>,
    custom: Option<Vec<PartitionEntry>>,
    warnings: &'a [ScanWarning],
}

pub fn execute(args: ListArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let mut session = Session::open(project_dir, builtin)?;
    let Session {
        settings,
        store,
        registry,
        ..
    } = &mut session;

    let system = (!args.custom).then(|| registry.list_partition(store, settings, Partition::System));
    let custom = (!args.system).then(|| registry.list_partition(store, settings, Partition::Custom));

    if args.json {
        let out = ListOutput {
            system,
            custom,
            warnings: session.registry.warnings(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let root = &session.settings.project_root;
    if let Some(entries) = &system {
        output::print_partition(Partition::System, entries, root);
    }
    if let Some(entries) = &custom {
        if system.is_some() {
            println!();
        }
        output::print_partition(Partition::Custom, entries, root);
    }
    output::print_warnings(session.registry.warnings());
    Ok(())
}

pub fn execute_check(args: CheckArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let mut session = Session::open(project_dir, builtin)?;

    let valid = identifier::is_valid(&args.name);
    let taken = session.registry.is_name_taken(&mut session.store, &args.name);
    output::print_check("Name", &args.name, valid);
    if taken {
        println!("  {} '{}' is already in use", "✗".red().bold(), args.name);
    }

    let mut ok = valid && !taken;
    if let Some(target_type) = &args.target_type {
        let type_valid = identifier::is_valid(target_type);
        output::print_check("Type", target_type, type_valid);
        ok &= type_valid;
    }

    if ok {
        println!("{} '{}' is available", "✓".green().bold(), args.name);
        Ok(())
    } else {
        anyhow::bail!("'{}' cannot be used", args.name)
    }
}

pub fn execute_templates(args: TemplatesArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let session = Session::open(project_dir, builtin)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.catalog.templates())?);
        return Ok(());
    }

    output::print_templates(session.catalog.templates(), &session.settings.templates_dir);
    Ok(())
}
