//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

use vargen_codegen::{GeneratedArtifact, Partition, PartitionEntry, Placement, ScanWarning, TemplateDescriptor};
use vargen_core::Referability;

const NAME_WIDTH: usize = 22;
const TYPE_WIDTH: usize = 26;
const KIND_WIDTH: usize = 10;

/// Print one registry partition as a table.
pub fn print_partition(which: Partition, entries: &[PartitionEntry], root: &Path) {
    let title = match which {
        Partition::System => "System types".bold(),
        Partition::Custom => "Custom types".bold(),
    };
    println!("{} {}", title, format!("({})", entries.len()).dimmed());

    if entries.is_empty() {
        println!("  {}", "None.".dimmed());
        return;
    }

    println!(
        "  {:>5} {} {} {} {}",
        "ORDER",
        pad_right("NAME", NAME_WIDTH),
        pad_right("TYPE", TYPE_WIDTH),
        pad_right("KIND", KIND_WIDTH),
        "LOCATION"
    );
    println!("  {}", "─".repeat(5 + NAME_WIDTH + TYPE_WIDTH + KIND_WIDTH + 14).dimmed());

    for entry in entries {
        let label = location_label(entry.dominant_location.as_deref(), root);
        let location = if entry.dominant_location.is_some() { label.normal() } else { label.yellow() };
        let name = pad_right(&truncate_visual(&entry.name, NAME_WIDTH), NAME_WIDTH);
        let name = if entry.warnings > 0 { name.yellow() } else { name.cyan() };

        println!(
            "  {:>5} {} {} {} {}",
            entry.descriptor.menu_order,
            name,
            pad_right(&truncate_visual(&entry.descriptor.target_type, TYPE_WIDTH), TYPE_WIDTH),
            referability_colored(entry.descriptor.referability, KIND_WIDTH),
            location
        );
    }
}

/// Print scan warnings, if any.
pub fn print_warnings(warnings: &[ScanWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!();
    println!("{} {}", "⚠".yellow(), format!("{} scan warning(s)", warnings.len()).yellow().bold());
    for warning in warnings {
        println!("  {} {}", "·".dimmed(), warning);
    }
}

/// Print the template catalog.
pub fn print_templates(templates: &[TemplateDescriptor], templates_dir: &Path) {
    if templates.is_empty() {
        println!(
            "{}",
            format!("No templates found in {}. Run 'vargen init' to write the defaults.", templates_dir.display())
                .dimmed()
        );
        return;
    }

    println!(
        "{} {} {}",
        pad_right("OUTPUT", 36),
        pad_right("REFERABILITY", 18),
        "PLACEMENT"
    );
    println!("{}", "─".repeat(66).dimmed());

    for template in templates {
        let placement = match template.placement {
            Placement::RuntimeVisible => template.placement.as_str().normal(),
            Placement::ToolOnly => template.placement.as_str().magenta(),
        };
        println!(
            "{} {} {}",
            pad_right(&truncate_visual(&template.name_pattern, 36), 36).cyan(),
            pad_right(template.applicability.as_str(), 18),
            placement
        );
    }
    println!();
    println!("{} template(s) total", templates.len());
}

/// Print the artifacts written by a create or rebuild.
pub fn print_written(written: &[GeneratedArtifact], root: &Path) {
    println!("{} Wrote {} artifact(s):", "✓".green().bold(), written.len());
    for artifact in written {
        let shown = artifact.path.strip_prefix(root).unwrap_or(&artifact.path);
        let marker = match artifact.placement {
            Placement::RuntimeVisible => "  ".normal(),
            Placement::ToolOnly => "T ".magenta(),
        };
        println!("  {}{}", marker, shown.display());
    }
}

/// Print one identifier check line.
pub fn print_check(field: &str, value: &str, valid: bool) {
    if valid {
        println!("  {} {} '{}' is a valid identifier", "✓".green(), field, value);
    } else {
        println!("  {} {} '{}' is not a valid identifier", "✗".red().bold(), field, value);
    }
}

/// Location column text: the dominant location relative to `root`.
fn location_label(location: Option<&Path>, root: &Path) -> String {
    match location {
        Some(dir) => dir.strip_prefix(root).unwrap_or(dir).display().to_string(),
        None => "(no runtime location)".to_string(),
    }
}

fn referability_colored(referability: Referability, width: usize) -> ColoredString {
    let label = pad_right(&referability.to_string().to_lowercase(), width);
    match referability {
        Referability::Value => label.blue(),
        Referability::Reference => label.green(),
        Referability::Unknown => label.red(),
    }
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
fn truncate_visual(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width > max_width - 2 {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("..");
    result
}
