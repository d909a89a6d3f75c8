//! Browsing session: the state behind one SRS mapping view
//!
//! Owns the current tree snapshot, the filter inputs, the tree view state and
//! the notices shown to the user. Front ends feed it user input and fetch
//! results and render what it exposes.

use chrono::{DateTime, Duration, Utc};

use crate::detail::{copy_snippet, Clipboard, DetailView};
use crate::error::FetchError;
use crate::fetcher::{BackgroundFetcher, FetchOutcome};
use crate::filter::{filter_with_context, EntryFilter, FilterResult, ParentMatchChildren};
use crate::models::{find_by_id, Entry, EntryStatus};
use crate::notice::{Notice, NoticeAction};
use crate::settings::Settings;
use crate::tree_view::TreeViewState;

/// Progress of loading the tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    /// Nothing requested yet
    #[default]
    Idle,
    Loading,
    Loaded {
        at: DateTime<Utc>,
    },
    /// Last fetch failed; any previous snapshot is still shown
    Failed {
        message: String,
    },
}

pub struct MappingSession {
    /// Last successfully loaded tree; replaced wholesale, never edited
    snapshot: Option<Vec<Entry>>,
    filter: EntryFilter,
    policy: ParentMatchChildren,
    tree: TreeViewState,
    load_state: LoadState,
    notices: Vec<Notice>,
    notice_lifetime: Duration,
}

impl Default for MappingSession {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl MappingSession {
    pub fn new(settings: &Settings) -> Self {
        Self {
            snapshot: None,
            filter: EntryFilter::default(),
            policy: settings.parent_match_children(),
            tree: TreeViewState::new(),
            load_state: LoadState::Idle,
            notices: Vec::new(),
            notice_lifetime: Duration::seconds(settings.notice_secs() as i64),
        }
    }

    /// Session pre-loaded with a tree (CLI, tests)
    pub fn with_entries(settings: &Settings, entries: Vec<Entry>) -> Self {
        let mut session = Self::new(settings);
        session.apply_result(Ok(entries), Utc::now());
        session
    }

    // =========================================================================
    // Tree snapshot and loading
    // =========================================================================

    /// Full, unfiltered tree (empty before the first successful load)
    pub fn entries(&self) -> &[Entry] {
        self.snapshot.as_deref().unwrap_or(&[])
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Marks a fetch as started; refused while one is already pending
    pub fn begin_fetch(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.load_state = LoadState::Loading;
        true
    }

    /// Asks the fetcher for a fresh tree; refused while a fetch is pending
    pub fn refresh(&mut self, fetcher: &mut BackgroundFetcher, collection_id: &str) -> bool {
        if self.is_loading() || !fetcher.request(collection_id) {
            return false;
        }
        self.begin_fetch()
    }

    /// Abandons the fetch in flight; the snapshot stays as it was
    pub fn cancel_fetch(&mut self, fetcher: &mut BackgroundFetcher) {
        fetcher.cancel();
        if self.is_loading() {
            self.load_state = LoadState::Idle;
        }
    }

    /// Applies a finished fetch if the fetcher has one
    pub fn poll(&mut self, fetcher: &mut BackgroundFetcher) -> bool {
        match fetcher.poll() {
            Some(outcome) => {
                self.apply_fetch(outcome);
                true
            }
            None => false,
        }
    }

    pub fn apply_fetch(&mut self, outcome: FetchOutcome) {
        self.apply_result(outcome.result, outcome.finished_at);
    }

    /// Success replaces the snapshot; failure keeps it and raises a notice
    pub fn apply_result(&mut self, result: Result<Vec<Entry>, FetchError>, at: DateTime<Utc>) {
        match result {
            Ok(entries) => {
                log::debug!("Loaded {} root requirements", entries.len());
                let selection_gone = self
                    .tree
                    .selected_id()
                    .is_some_and(|id| find_by_id(&entries, id).is_none());
                if selection_gone {
                    self.tree.clear_selection();
                }
                self.snapshot = Some(entries);
                self.load_state = LoadState::Loaded { at };
            }
            Err(e) => {
                log::warn!("Failed to load SRS mappings: {}", e);
                self.load_state = LoadState::Failed {
                    message: e.to_string(),
                };
                self.push_notice(
                    Notice::error(
                        "Error loading SRS mappings",
                        format!("Could not load SRS mappings: {}", e),
                    )
                    .with_action(NoticeAction::Retry),
                );
            }
        }
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    pub fn filter(&self) -> &EntryFilter {
        &self.filter
    }

    pub fn policy(&self) -> ParentMatchChildren {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ParentMatchChildren) {
        self.policy = policy;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    pub fn set_status(&mut self, status: Option<EntryStatus>) {
        self.filter.status = status;
    }

    /// Selecting the active status again clears the status filter
    pub fn toggle_status(&mut self, status: EntryStatus) {
        self.filter.status = if self.filter.status == Some(status) {
            None
        } else {
            Some(status)
        };
    }

    pub fn clear_filters(&mut self) {
        self.filter = EntryFilter::default();
    }

    /// Pruned tree for the current filter, recomputed on every call
    pub fn filtered(&self) -> FilterResult {
        filter_with_context(self.entries(), &self.filter, self.policy)
    }

    // =========================================================================
    // Tree view and selection
    // =========================================================================

    pub fn tree(&self) -> &TreeViewState {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TreeViewState {
        &mut self.tree
    }

    pub fn toggle_expand(&mut self, id: &str) {
        self.tree.toggle_expand(id);
    }

    /// Selects a row of the rendered tree
    pub fn select(&mut self, entry: &Entry) {
        self.tree.select(entry, |e| log::debug!("Selected {}", e.external_id));
    }

    /// Selects an entry of the current snapshot by id; false if unknown
    pub fn select_id(&mut self, id: &str) -> bool {
        let Some(snapshot) = self.snapshot.as_deref() else {
            return false;
        };
        match find_by_id(snapshot, id) {
            Some(entry) => {
                self.tree.select(entry, |e| log::debug!("Selected {}", e.external_id));
                true
            }
            None => false,
        }
    }

    /// Currently selected entry, looked up in the full snapshot
    pub fn selected_entry(&self) -> Option<&Entry> {
        let id = self.tree.selected_id()?;
        find_by_id(self.entries(), id)
    }

    /// Detail panel content for the current selection
    pub fn detail(&self) -> DetailView<'_> {
        DetailView::for_selection(self.selected_entry())
    }

    /// Copies the selected entry's snippet and records the resulting notice
    pub fn copy_selected_snippet(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        let Some(snippet) = self.selected_entry().and_then(|e| e.snippet.clone()) else {
            return false;
        };
        let mut notice = copy_snippet(clipboard, &snippet);
        let copied = !notice.is_error();
        if copied {
            notice = notice.with_lifetime(self.notice_lifetime);
        }
        self.push_notice(notice);
        copied
    }

    // =========================================================================
    // Notices
    // =========================================================================

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Transient info notice with the configured lifetime
    pub fn push_info(&mut self, title: impl Into<String>) {
        let notice = Notice::info(title, self.notice_lifetime);
        self.notices.push(notice);
    }

    pub fn dismiss_notice(&mut self, index: usize) {
        if index < self.notices.len() {
            self.notices.remove(index);
        }
    }

    /// Drops transient notices whose lifetime has passed
    pub fn expire_notices(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|n| !n.is_expired(now));
    }
}
