use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Browse SRS requirements mapped to their implementing code")]
pub struct Cli {
    /// Entry source: http, file or sample (overrides settings)
    #[clap(long, global = true)]
    pub source: Option<String>,

    /// Base URL of the SRS mapping API (selects the http source)
    #[clap(long, global = true)]
    pub url: Option<String>,

    /// JSON or YAML mapping file (selects the file source)
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// Repository whose mapping is loaded
    #[clap(long, short = 'c', global = true)]
    pub collection: Option<String>,

    /// Request timeout in seconds
    #[clap(long, global = true)]
    pub timeout: Option<u64>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the requirement tree
    List {
        /// Case-insensitive text to search for in id, title and description
        #[clap(long, short = 'q')]
        query: Option<String>,

        /// Only show entries with this status (implemented, partial, pending)
        #[clap(long, short = 's')]
        status: Option<String>,

        /// Also filter the children of entries that match themselves
        #[clap(long)]
        refilter: bool,

        /// Collapse the tree to its roots
        #[clap(long)]
        collapsed: bool,
    },

    /// Show implementation details for a requirement
    Show {
        /// SRS id (e.g. REQ-001.1) or internal id
        id: String,
    },

    /// Print summary statistics
    Stats {
        /// Only count entries matching this text
        #[clap(long, short = 'q')]
        query: Option<String>,

        /// Only count entries with this status
        #[clap(long, short = 's')]
        status: Option<String>,
    },

    /// Export the (filtered) tree
    Export {
        /// Output format: markdown, json or yaml
        #[clap(long, short = 'f')]
        format: Option<String>,

        /// Output file (stdout if omitted)
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,

        #[clap(long, short = 'q')]
        query: Option<String>,

        #[clap(long, short = 's')]
        status: Option<String>,

        #[clap(long)]
        refilter: bool,
    },

    /// Browse the tree interactively
    Browse,

    /// Inspect or edit settings
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective settings
    Show,

    /// Print the path to the settings file
    Path,

    /// Choose where entries are loaded from
    SetSource {
        /// http, file or sample
        kind: String,

        /// Base URL for the http source
        #[clap(long)]
        url: Option<String>,

        /// Mapping file for the file source
        #[clap(long)]
        path: Option<PathBuf>,

        /// Repository to load
        #[clap(long)]
        collection: Option<String>,

        /// Request timeout in seconds
        #[clap(long)]
        timeout: Option<u64>,
    },

    /// Switch between the light and dark theme
    ToggleDark,

    /// Choose whether matching entries keep all their children
    Children {
        /// keep-all or refilter
        policy: String,
    },
}
