//! Delete command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::Path;

use super::{Session, generation_error};

#[derive(Args)]
pub struct DeleteArgs {
    /// Variable type to delete
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: DeleteArgs, project_dir: &Path, builtin: bool) -> Result<()> {
    let mut session = Session::open(project_dir, builtin)?;
    let set = session.find_set(&args.name)?;
    session.ensure_editable(&set)?;

    let root = session.settings.project_root.clone();
    let paths = set.paths(&session.store);
    println!("{} {} artifact(s) of {}:", "→".blue().bold(), paths.len(), args.name.cyan());
    for path in &paths {
        println!("  {}", path.strip_prefix(&root).unwrap_or(path).display());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete '{}'?", args.name))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Cancelled.".dimmed());
            return Ok(());
        }
    }

    let deleted = session.generator().delete(&set).map_err(generation_error)?;
    println!("{} Deleted {} ({} artifacts)", "✓".green().bold(), args.name.cyan(), deleted.len());
    Ok(())
}
