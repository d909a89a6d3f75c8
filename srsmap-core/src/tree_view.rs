//! Expansion and selection state for the requirement tree view

use std::collections::HashMap;

use crate::models::Entry;

/// Width reserved for the expand/collapse button, and for the placeholder
/// that replaces it on leaves so rows at the same depth line up
pub const TOGGLE_WIDTH: f32 = 22.0;

/// Default indentation added per depth level
pub const DEFAULT_INDENT: f32 = 16.0;

/// A single row of the flattened, currently visible tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow<'a> {
    pub entry: &'a Entry,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
}

impl TreeRow<'_> {
    /// Horizontal offset of the row's toggle/placeholder
    pub fn indent(&self, indent_per_level: f32) -> f32 {
        self.depth as f32 * indent_per_level
    }
}

/// Per-node expansion flags plus the single selected entry
///
/// Missing ids are collapsed. The state is keyed by entry id, so it survives
/// re-filtering and refetches as long as ids are stable.
#[derive(Debug, Clone, Default)]
pub struct TreeViewState {
    expanded: HashMap<String, bool>,
    selected_id: Option<String>,
}

impl TreeViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    /// Flips one node's flag; no other node is touched
    pub fn toggle_expand(&mut self, id: &str) {
        let flag = self.expanded.entry(id.to_string()).or_insert(false);
        *flag = !*flag;
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string(), true);
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.insert(id.to_string(), false);
    }

    /// Expands every node that has children
    pub fn expand_all(&mut self, entries: &[Entry]) {
        let mut stack: Vec<&Entry> = entries.iter().collect();
        while let Some(entry) = stack.pop() {
            if entry.has_children() {
                self.expanded.insert(entry.id.clone(), true);
                stack.extend(entry.children.iter());
            }
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// Records the selection and hands the entry to the owner
    pub fn select<F>(&mut self, entry: &Entry, on_select: F)
    where
        F: FnOnce(&Entry),
    {
        self.selected_id = Some(entry.id.clone());
        on_select(entry);
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    /// Flattens the visible part of the tree into display order
    ///
    /// Children follow their parent only while the parent is expanded.
    pub fn visible_rows<'a>(&self, entries: &'a [Entry]) -> Vec<TreeRow<'a>> {
        let mut rows = Vec::new();
        let mut stack: Vec<(&'a Entry, usize)> = entries.iter().rev().map(|e| (e, 0)).collect();

        while let Some((entry, depth)) = stack.pop() {
            let has_children = entry.has_children();
            let expanded = has_children && self.is_expanded(&entry.id);
            rows.push(TreeRow {
                entry,
                depth,
                has_children,
                expanded,
                selected: self.selected_id.as_deref() == Some(entry.id.as_str()),
            });
            if expanded {
                stack.extend(entry.children.iter().rev().map(|c| (c, depth + 1)));
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_entries;

    fn row_ids(rows: &[TreeRow<'_>]) -> Vec<String> {
        rows.iter().map(|r| r.entry.id.clone()).collect()
    }

    #[test]
    fn test_default_collapsed() {
        let state = TreeViewState::new();
        let entries = sample_entries();
        let rows = state.visible_rows(&entries);
        assert_eq!(row_ids(&rows), vec!["1", "2", "3", "4"]);
        assert!(rows.iter().all(|r| r.depth == 0 && !r.expanded));
        assert!(rows[0].has_children);
        assert!(!rows[3].has_children);
    }

    #[test]
    fn test_toggle_is_independent() {
        let mut state = TreeViewState::new();
        state.expand("3");
        state.toggle_expand("1");
        assert!(state.is_expanded("1"));
        assert!(state.is_expanded("3"));
        assert!(!state.is_expanded("2"));

        state.toggle_expand("1");
        assert!(!state.is_expanded("1"));
        assert!(state.is_expanded("3"));
        assert!(!state.is_expanded("2"));
    }

    #[test]
    fn test_expanded_children_follow_parent() {
        let mut state = TreeViewState::new();
        state.toggle_expand("2");
        let entries = sample_entries();
        let rows = state.visible_rows(&entries);
        assert_eq!(row_ids(&rows), vec!["1", "2", "2.1", "2.2", "3", "4"]);
        assert_eq!(rows[2].depth, 1);
        assert_eq!(rows[2].indent(DEFAULT_INDENT), DEFAULT_INDENT);
        assert!(rows[1].expanded);
    }

    #[test]
    fn test_leaf_never_reports_expanded() {
        let mut state = TreeViewState::new();
        state.expand("4");
        let entries = sample_entries();
        let rows = state.visible_rows(&entries);
        assert!(!rows[3].expanded);
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let mut state = TreeViewState::new();
        let entries = sample_entries();
        state.expand_all(&entries);
        assert_eq!(state.visible_rows(&entries).len(), 10);
        state.collapse_all();
        assert_eq!(state.visible_rows(&entries).len(), 4);
    }

    #[test]
    fn test_select_forwards_entry() {
        let mut state = TreeViewState::new();
        let entries = sample_entries();
        let mut chosen = None;
        state.select(&entries[1].children[1], |e| chosen = Some(e.external_id.clone()));
        assert_eq!(chosen.as_deref(), Some("REQ-002.2"));
        assert_eq!(state.selected_id(), Some("2.2"));

        state.expand("2");
        let rows = state.visible_rows(&entries);
        let selected: Vec<_> = rows.iter().filter(|r| r.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].entry.id, "2.2");

        state.clear_selection();
        assert_eq!(state.selected_id(), None);
    }
}
