mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::{ColoredString, Colorize};
use std::path::PathBuf;

use srsmap_core::{
    create_source, export, find_by_external_id, find_by_id, DetailView, Entry, EntryFilter,
    EntryStatus, ExportFormat, LoadState, MappingSession, ParentMatchChildren, Settings,
    SourceKind, TreeStats,
};

use crate::cli::{Cli, Command, ConfigCommand};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let mut settings = Settings::load();

    // Config edits persist, so they only see the settings file
    if !matches!(cli.command, Command::Config(_)) {
        settings.apply_env_overrides();
        apply_cli_overrides(&cli, &mut settings)?;
    }

    run_command(&cli.command, &mut settings)
}

fn run_command(command: &Command, settings: &mut Settings) -> Result<()> {
    match command {
        Command::List {
            query,
            status,
            refilter,
            collapsed,
        } => {
            let session = load_session(settings, query, status, *refilter)?;
            list_entries(session, *collapsed, settings.indent_per_level());
        }
        Command::Show { id } => {
            let session = load_session(settings, &None, &None, false)?;
            show_entry(&session, id)?;
        }
        Command::Stats { query, status } => {
            let session = load_session(settings, query, status, false)?;
            print_stats(&TreeStats::from_entries(&session.filtered().entries));
        }
        Command::Export {
            format,
            output,
            query,
            status,
            refilter,
        } => {
            let session = load_session(settings, query, status, *refilter)?;
            handle_export_command(&session, format.as_deref(), output.as_deref())?;
        }
        Command::Browse => {
            let mut session = load_session(settings, &None, &None, false)?;
            prompts::browse(&mut session, settings.indent_per_level())?;
        }
        Command::Config(config_cmd) => {
            handle_config_command(config_cmd, settings)?;
        }
    }

    Ok(())
}

/// Command-line flags win over settings and environment
fn apply_cli_overrides(cli: &Cli, settings: &mut Settings) -> Result<()> {
    if let Some(kind) = &cli.source {
        let kind: SourceKind = kind.parse().map_err(anyhow::Error::msg)?;
        settings.set_source_kind(kind);
    }
    let file = cli.file.as_ref().map(|p| p.display().to_string());
    settings.apply_overrides(cli.url.clone(), file);
    if let Some(collection) = &cli.collection {
        settings.set_collection_id(collection.clone());
    }
    if let Some(timeout) = cli.timeout {
        settings.set_timeout_secs(timeout);
    }
    Ok(())
}

fn parse_status(status: &str) -> Result<EntryStatus> {
    status.parse().map_err(anyhow::Error::msg)
}

/// Fetches the tree and prepares a session with the requested filter
fn load_session(
    settings: &Settings,
    query: &Option<String>,
    status: &Option<String>,
    refilter: bool,
) -> Result<MappingSession> {
    let source = create_source(settings.source()).context("Failed to set up the entry source")?;
    let collection_id = &settings.source().collection_id;
    log::debug!("Loading collection '{}' from {}", collection_id, source.describe());

    let mut session = MappingSession::new(settings);
    session.begin_fetch();
    let result = source.fetch_entries(collection_id);
    session.apply_result(result, chrono::Utc::now());

    if let LoadState::Failed { message } = session.load_state() {
        anyhow::bail!("Error loading SRS mappings from {}: {}", source.describe(), message);
    }

    if let Some(query) = query {
        session.set_query(query.clone());
    }
    if let Some(status) = status {
        session.set_status(Some(parse_status(status)?));
    }
    if refilter {
        session.set_policy(ParentMatchChildren::Refilter);
    }
    Ok(session)
}

fn status_colored(status: EntryStatus, text: &str) -> ColoredString {
    let (r, g, b) = status.rgb();
    text.truecolor(r, g, b)
}

fn describe_filter(filter: &EntryFilter) -> String {
    let mut parts = Vec::new();
    if !filter.query.is_empty() {
        parts.push(format!("\"{}\"", filter.query));
    }
    if let Some(status) = filter.status {
        parts.push(format!("status {}", status));
    }
    parts.join(", ")
}

/// Prints the visible rows of a filtered tree
pub(crate) fn print_tree(session: &MappingSession, indent_per_level: f32) -> usize {
    let result = session.filtered();
    let rows = session.tree().visible_rows(&result.entries);
    let spaces_per_level = (indent_per_level / 8.0).round().max(1.0) as usize;

    for row in &rows {
        let toggle = if !row.has_children {
            " "
        } else if row.expanded {
            "-"
        } else {
            "+"
        };
        let entry = row.entry;
        let line = format!(
            "{}{} {} {:<12} {}",
            " ".repeat(row.depth * spaces_per_level),
            toggle,
            entry.status.marker(),
            entry.external_id,
            entry.title
        );

        if result.is_context(&entry.id) {
            println!("{}", line.dimmed());
        } else if row.selected {
            println!("{}", status_colored(entry.status, &line).bold());
        } else {
            println!("{}", status_colored(entry.status, &line));
        }
    }
    rows.len()
}

fn list_entries(mut session: MappingSession, collapsed: bool, indent_per_level: f32) {
    let filtered = session.filtered();
    if filtered.entries.is_empty() {
        let filter = describe_filter(session.filter());
        if filter.is_empty() {
            println!("{}", "No requirements found.".yellow());
        } else {
            println!("{} {}", "No requirements match".yellow(), filter);
        }
        return;
    }

    if !collapsed {
        session.tree_mut().expand_all(&filtered.entries);
    }
    print_tree(&session, indent_per_level);
}

/// Prints the detail panel for the selected entry
pub(crate) fn print_detail(detail: &DetailView) {
    if let Some(entry) = detail.entry() {
        println!("{} {}", entry.external_id.blue().bold(), entry.title.bold());
        println!(
            "{}: {}",
            "Status".blue(),
            status_colored(entry.status, &format!("{} {}", entry.status.icon(), entry.status))
        );
        if !entry.description.is_empty() {
            println!("{}: {}", "Description".blue(), entry.description);
        }
        println!();
    }

    match detail {
        DetailView::Implementation(info) => {
            println!("{}", detail.headline().green().bold());
            println!("{}: {}", "File".cyan(), info.file_path);
            if let Some(function) = info.function_name {
                println!("{}: {}", "Function".cyan(), function);
            }
            if let Some(timestamp) = info.timestamp {
                println!("{}: {}", "Last modified".cyan(), timestamp);
            }
            if let Some(commit) = info.last_commit {
                println!("{}: {}", "Commit".cyan(), commit);
            }
            println!();
            println!("{} {}", "──".dimmed(), info.file_name.dimmed());
            for (number, line) in info.snippet.lines().enumerate() {
                println!("{} {}", format!("{:>4}", number + 1).dimmed(), line);
            }
        }
        DetailView::NoImplementation { .. } | DetailView::Empty => {
            println!("{}", detail.headline().yellow().bold());
            println!("{}", detail.message());
        }
    }
}

/// Looks an entry up by SRS id first, then by internal id
fn lookup<'a>(entries: &'a [Entry], id: &str) -> Option<&'a Entry> {
    find_by_external_id(entries, id).or_else(|| find_by_id(entries, id))
}

fn show_entry(session: &MappingSession, id: &str) -> Result<()> {
    let entry = lookup(session.entries(), id)
        .with_context(|| format!("Requirement '{}' not found", id))?;
    print_detail(&DetailView::for_selection(Some(entry)));
    Ok(())
}

fn print_stats(stats: &TreeStats) {
    println!("{}", "SRS Mapping Statistics".blue().bold());
    println!();
    println!("{}: {}", "Requirements".cyan(), stats.total);
    for status in EntryStatus::ALL {
        let label = format!("{} {}", status.icon(), status.label());
        println!("  {:<16} {}", status_colored(status, &label), stats.count(status));
    }
    println!("{}: {}", "With implementation".cyan(), stats.with_implementation);
    println!("{}: {}", "Maximum depth".cyan(), stats.max_depth);
    println!(
        "{}: {:.1}%",
        "Implemented".cyan(),
        stats.implemented_percent()
    );
}

fn handle_export_command(
    session: &MappingSession,
    format: Option<&str>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let format = match (format, output) {
        (Some(format), _) => format.parse::<ExportFormat>().map_err(anyhow::Error::msg)?,
        (None, Some(path)) => ExportFormat::from_path(path).unwrap_or_default(),
        (None, None) => ExportFormat::default(),
    };

    let entries = session.filtered().entries;
    match output {
        Some(path) => {
            export::export_to_file(&entries, format, path)?;
            println!("Exported to {}: {}", format, path.display());
            println!("  Total requirements: {}", srsmap_core::count_entries(&entries));
        }
        None => print!("{}", export::render(&entries, format)?),
    }
    Ok(())
}

fn handle_config_command(cmd: &ConfigCommand, settings: &mut Settings) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let source = settings.source();
            println!("{}", "Settings:".blue().bold());
            println!();
            println!("{}: {}", "Source".cyan(), source.kind);
            match source.kind {
                SourceKind::Http => println!("{}: {}", "Base URL".cyan(), source.base_url),
                SourceKind::File => println!(
                    "{}: {}",
                    "File".cyan(),
                    source
                        .path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(not set)".to_string())
                ),
                SourceKind::Sample => {}
            }
            println!("{}: {}", "Collection".cyan(), source.collection_id);
            println!("{}: {}s", "Timeout".cyan(), source.timeout_secs);
            println!(
                "{}: {}",
                "Matching entries keep".cyan(),
                match settings.parent_match_children() {
                    ParentMatchChildren::KeepAll => "all children",
                    ParentMatchChildren::Refilter => "matching children only",
                }
            );
            println!(
                "{}: {}",
                "Theme".cyan(),
                if settings.dark_mode() { "dark" } else { "light" }
            );
            return Ok(());
        }
        ConfigCommand::Path => {
            println!("{}", Settings::default_path()?.display());
            return Ok(());
        }
        ConfigCommand::SetSource {
            kind,
            url,
            path,
            collection,
            timeout,
        } => {
            let kind: SourceKind = kind.parse().map_err(anyhow::Error::msg)?;
            match kind {
                SourceKind::Http => {
                    let url = url.clone().unwrap_or_else(|| settings.source().base_url.clone());
                    settings.set_http_source(url);
                }
                SourceKind::File => {
                    let path: PathBuf = path
                        .clone()
                        .or_else(|| settings.source().path.clone())
                        .context("The file source needs --path")?;
                    settings.set_file_source(path);
                }
                SourceKind::Sample => settings.set_source_kind(SourceKind::Sample),
            }
            if let Some(collection) = collection {
                settings.set_collection_id(collection.clone());
            }
            if let Some(timeout) = timeout {
                settings.set_timeout_secs(*timeout);
            }
            println!("{} {}", "Source set to".green(), settings.source().kind);
        }
        ConfigCommand::ToggleDark => {
            let dark = settings.toggle_dark_mode();
            println!(
                "{} {}",
                "Theme set to".green(),
                if dark { "dark" } else { "light" }
            );
        }
        ConfigCommand::Children { policy } => {
            let policy: ParentMatchChildren = policy.parse().map_err(anyhow::Error::msg)?;
            settings.set_parent_match_children(policy);
            println!("{} {}", "Matching entries now use".green(), policy);
        }
    }

    let path = settings.save().context("Failed to save settings")?;
    log::debug!("Saved settings to {}", path.display());
    Ok(())
}
