use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::models::Entry;
use crate::stats::TreeStats;

/// Output formats for a (possibly filtered) requirement tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    /// Guess the format from an output path, if the extension is known
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            other => Err(format!(
                "Invalid format '{}'. Expected one of: markdown, json, yaml",
                other
            )),
        }
    }
}

/// Render entries in the requested format
pub fn render(entries: &[Entry], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(entries)),
        ExportFormat::Json => {
            serde_json::to_string_pretty(entries).context("Failed to serialize entries as JSON")
        }
        ExportFormat::Yaml => {
            serde_yaml::to_string(entries).context("Failed to serialize entries as YAML")
        }
    }
}

/// Render entries and write them to a file
pub fn export_to_file(entries: &[Entry], format: ExportFormat, output_path: &Path) -> Result<()> {
    let output = render(entries, format)?;
    fs::write(output_path, output)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    log::info!("Exported {} as {} to {}", entries.len(), format, output_path.display());
    Ok(())
}

fn render_markdown(entries: &[Entry]) -> String {
    let mut output = String::from("# SRS Mapping\n\n");

    let stats = TreeStats::from_entries(entries);
    output.push_str(&format!(
        "{} requirements: {} implemented, {} partial, {} pending\n\n",
        stats.total, stats.implemented, stats.partial, stats.pending
    ));

    let mut stack: Vec<(&Entry, usize)> = entries.iter().rev().map(|e| (e, 0)).collect();
    while let Some((entry, depth)) = stack.pop() {
        output.push_str(&"  ".repeat(depth));
        output.push_str(&format!(
            "- {} **{}** {}",
            entry.status.marker(),
            entry.external_id,
            entry.title
        ));
        if let Some(path) = &entry.file_path {
            match &entry.function_name {
                Some(function) => output.push_str(&format!(" (`{}` :: `{}`)", path, function)),
                None => output.push_str(&format!(" (`{}`)", path)),
            }
        }
        output.push('\n');
        stack.extend(entry.children.iter().rev().map(|c| (c, depth + 1)));
    }

    output
}
