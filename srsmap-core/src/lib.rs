pub mod detail;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod models;
pub mod notice;
pub mod sample;
pub mod session;
pub mod settings;
pub mod source;
pub mod stats;
pub mod tree_view;

// Re-export commonly used types
pub use detail::{copy_snippet, Clipboard, DetailView, ImplementationDetail};
pub use error::{ClipboardError, FetchError, SettingsError};
pub use export::ExportFormat;
pub use fetcher::{BackgroundFetcher, FetchOutcome};
pub use filter::{filter_entries, filter_with_context, EntryFilter, FilterResult, ParentMatchChildren};
pub use models::{
    collect_ids, count_entries, decode_json, decode_yaml, find_by_external_id, find_by_id,
    DecodedTree, Entry, EntryStatus,
};
pub use notice::{Notice, NoticeAction, NoticeKind};
pub use sample::sample_entries;
pub use session::{LoadState, MappingSession};
pub use settings::Settings;
pub use source::{
    create_source, EntrySource, FileSource, HttpSource, SampleSource, SourceConfig, SourceKind,
};
pub use stats::TreeStats;
pub use tree_view::{TreeRow, TreeViewState};
