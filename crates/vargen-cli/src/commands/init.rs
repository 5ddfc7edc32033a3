//! Project initialization command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::Path;

use vargen_core::Settings;
use vargen_core::config::CONFIG_FILE_NAME;

#[derive(Args)]
pub struct InitArgs {
    /// Do not write the default templates
    #[arg(long)]
    pub no_templates: bool,
}

pub fn execute(args: InitArgs, project_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create {}", project_dir.display()))?;

    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        println!("{} {} already present", "·".dimmed(), CONFIG_FILE_NAME);
    } else {
        std::fs::write(&config_path, Settings::default_config_toml())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("{} Created {}", "✓".green().bold(), CONFIG_FILE_NAME);
    }

    let settings = Settings::load(project_dir)?;
    if !args.no_templates {
        let written = vargen_codegen::write_default_templates(&settings.templates_dir)?;
        if written.is_empty() {
            println!("{} Default templates already present", "·".dimmed());
        }
        for path in &written {
            let shown = path.strip_prefix(project_dir).unwrap_or(path);
            println!("{} Wrote {}", "✓".green().bold(), shown.display());
        }
    }

    println!();
    println!("{}", "Next steps:".bold());
    println!("  vargen templates                               # Review the template catalog");
    println!("  vargen create Meter float --value --dir <dir>  # Generate your first type");
    println!("  vargen list                                    # See generated types");

    Ok(())
}
