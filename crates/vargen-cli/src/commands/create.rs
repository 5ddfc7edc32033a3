//! Create command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

use vargen_core::{Referability, TypeDescriptor};

use super::{Session, generation_error, referability_flag};
use crate::output;

#[derive(Args)]
pub struct CreateArgs {
    /// Name of the new variable type
    pub name: String,

    /// Wrapped target type (e.g. float, UnityEngine.Vector3, int[])
    #[arg(value_name = "TYPE")]
    pub target_type: String,

    /// The target type is passed by value
    #[arg(long, conflicts_with = "reference")]
    pub value: bool,

    /// The target type is passed by reference
    #[arg(long)]
    pub reference: bool,

    /// Menu order
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub order: i32,

    /// Runtime-visible directory to generate into, relative to the project
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Overwrite existing artifacts and skip the name check
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: CreateArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let mut session = Session::open(project_dir, builtin)?;

    let referability = referability_flag(args.value, args.reference).unwrap_or(Referability::Unknown);
    let descriptor = TypeDescriptor::new(&args.name, &args.target_type, referability)
        .with_menu_order(args.order);

    println!(
        "{} Creating {} ({} {})",
        "→".blue().bold(),
        args.name.cyan(),
        args.target_type,
        referability.to_string().to_lowercase().dimmed()
    );

    let written = session
        .generator()
        .create(&descriptor, &args.dir, args.force)
        .map_err(generation_error)?;

    output::print_written(&written, &session.settings.project_root);
    Ok(())
}
