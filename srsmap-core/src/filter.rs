//! Search/status filtering of the requirement tree
//!
//! An entry is kept when it matches the filter itself, or when any of its
//! descendants does. Entries kept only for a descendant ("context" entries)
//! carry just the matching part of their subtree so the path to every match
//! stays navigable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::models::{Entry, EntryStatus};

/// Active search text and status restriction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Case-insensitive substring searched in title, description and external id
    pub query: String,
    /// Only entries with exactly this status match
    pub status: Option<EntryStatus>,
}

impl EntryFilter {
    pub fn new(query: impl Into<String>, status: Option<EntryStatus>) -> Self {
        Self {
            query: query.into(),
            status,
        }
    }

    /// True when the filter lets every entry through
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.status.is_none()
    }

    /// Direct match: decided from the entry's own fields only, never its children
    pub fn matches(&self, entry: &Entry) -> bool {
        self.matcher().matches(entry)
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher {
            query: self.query.to_lowercase(),
            status: self.status.as_ref(),
        }
    }
}

/// Filter with the query lowercased once per pass
struct Matcher<'a> {
    query: String,
    status: Option<&'a EntryStatus>,
}

impl Matcher<'_> {
    fn matches(&self, entry: &Entry) -> bool {
        let matches_query = self.query.is_empty()
            || entry.title.to_lowercase().contains(&self.query)
            || entry.description.to_lowercase().contains(&self.query)
            || entry.external_id.to_lowercase().contains(&self.query);

        let matches_status = self.status.map_or(true, |s| *s == entry.status);

        matches_query && matches_status
    }
}

/// What happens to the children of an entry that matches the filter itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParentMatchChildren {
    /// Keep all original children, unfiltered
    #[default]
    KeepAll,
    /// Filter the children too, like for context entries
    Refilter,
}

impl fmt::Display for ParentMatchChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentMatchChildren::KeepAll => write!(f, "keep-all"),
            ParentMatchChildren::Refilter => write!(f, "refilter"),
        }
    }
}

impl std::str::FromStr for ParentMatchChildren {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep-all" | "keepall" | "all" => Ok(ParentMatchChildren::KeepAll),
            "refilter" | "filter" => Ok(ParentMatchChildren::Refilter),
            other => Err(format!(
                "Invalid policy '{}'. Expected keep-all or refilter",
                other
            )),
        }
    }
}

/// Pruned tree plus the ids of entries kept only because a descendant matched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub entries: Vec<Entry>,
    pub context_ids: HashSet<String>,
}

impl FilterResult {
    pub fn is_context(&self, id: &str) -> bool {
        self.context_ids.contains(id)
    }
}

/// Filters the forest, returning only the pruned tree
pub fn filter_entries(
    entries: &[Entry],
    filter: &EntryFilter,
    policy: ParentMatchChildren,
) -> Vec<Entry> {
    filter_with_context(entries, filter, policy).entries
}

/// One sibling list being filtered
struct Frame<'a> {
    siblings: &'a [Entry],
    pos: usize,
    kept: Vec<Entry>,
    /// Context ids found inside `kept`
    context: Vec<String>,
}

impl<'a> Frame<'a> {
    fn new(siblings: &'a [Entry]) -> Self {
        Self {
            siblings,
            pos: 0,
            kept: Vec::new(),
            context: Vec::new(),
        }
    }

    /// Takes over the context ids of a child list that is attached as-is
    fn adopt_context(&mut self, mut ids: Vec<String>) {
        // Append the shorter list so deep chains stay linear
        if ids.len() > self.context.len() {
            std::mem::swap(&mut self.context, &mut ids);
        }
        self.context.append(&mut ids);
    }
}

/// Filters the forest, also reporting which kept entries are context entries
///
/// Post-order traversal over an explicit stack: an entry is decided once its
/// children have been filtered. Input order is preserved.
pub fn filter_with_context(
    entries: &[Entry],
    filter: &EntryFilter,
    policy: ParentMatchChildren,
) -> FilterResult {
    if filter.is_empty() {
        return FilterResult {
            entries: entries.to_vec(),
            context_ids: HashSet::new(),
        };
    }

    let matcher = filter.matcher();
    let mut stack = vec![Frame::new(entries)];

    loop {
        let Some(top) = stack.last_mut() else {
            break;
        };

        if top.pos < top.siblings.len() {
            let siblings = top.siblings;
            let entry = &siblings[top.pos];
            if entry.has_children() {
                // Decided when the child frame is popped
                stack.push(Frame::new(&entry.children));
            } else {
                if matcher.matches(entry) {
                    top.kept.push(entry.clone());
                }
                top.pos += 1;
            }
            continue;
        }

        let finished = match stack.pop() {
            Some(frame) => frame,
            None => break,
        };
        let Some(parent) = stack.last_mut() else {
            return FilterResult {
                entries: finished.kept,
                context_ids: finished.context.into_iter().collect(),
            };
        };

        let siblings = parent.siblings;
        let entry = &siblings[parent.pos];
        let filtered_children = finished.kept;

        if matcher.matches(entry) {
            let children = match policy {
                // Original children carry no context entries
                ParentMatchChildren::KeepAll => entry.children.clone(),
                ParentMatchChildren::Refilter => {
                    parent.adopt_context(finished.context);
                    filtered_children
                }
            };
            parent.kept.push(entry.with_replaced_children(children));
        } else if !filtered_children.is_empty() {
            parent.adopt_context(finished.context);
            parent.context.push(entry.id.clone());
            parent.kept.push(entry.with_replaced_children(filtered_children));
        }
        parent.pos += 1;
    }

    FilterResult::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{collect_ids, find_by_id};
    use crate::sample::sample_entries;

    fn repo_integration() -> Vec<Entry> {
        vec![Entry::new(
            "2",
            "REQ-002",
            "Repository Integration",
            "The system shall integrate with GitHub repositories.",
            EntryStatus::Partial,
        )
        .with_children(vec![
            Entry::new(
                "2.1",
                "REQ-002.1",
                "Repository Selection",
                "Allow users to select repositories to connect",
                EntryStatus::Implemented,
            )
            .with_implementation("src/RepoSelector.tsx", "RepoSelector", "const x = 1;"),
            Entry::new(
                "2.2",
                "REQ-002.2",
                "Repository Sync",
                "Implement background syncing of repositories",
                EntryStatus::Pending,
            ),
        ])]
    }

    /// Builds a chain `depth` levels deep with a single matching leaf at the bottom
    fn deep_chain(depth: usize) -> Vec<Entry> {
        let mut node = Entry::new("leaf", "REQ-LEAF", "needle", "", EntryStatus::Pending);
        for level in (0..depth).rev() {
            node = Entry::new(
                format!("n{}", level),
                format!("REQ-{}", level),
                "hay",
                "",
                EntryStatus::Partial,
            )
            .with_children(vec![node]);
        }
        vec![node]
    }

    #[test]
    fn test_predicate_query_fields() {
        let entry = &repo_integration()[0];
        assert!(EntryFilter::new("", None).matches(entry));
        assert!(EntryFilter::new("INTEGRATION", None).matches(entry));
        assert!(EntryFilter::new("github", None).matches(entry));
        assert!(EntryFilter::new("req-002", None).matches(entry));
        assert!(!EntryFilter::new("sync", None).matches(entry));
    }

    #[test]
    fn test_predicate_requires_both_conditions() {
        let entry = &repo_integration()[0];
        assert!(EntryFilter::new("", Some(EntryStatus::Partial)).matches(entry));
        assert!(!EntryFilter::new("", Some(EntryStatus::Pending)).matches(entry));
        assert!(!EntryFilter::new("integration", Some(EntryStatus::Implemented)).matches(entry));
        assert!(EntryFilter::new("integration", Some(EntryStatus::Partial)).matches(entry));
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let tree = sample_entries();
        let out = filter_entries(&tree, &EntryFilter::default(), ParentMatchChildren::KeepAll);
        assert_eq!(out, tree);
        let out = filter_entries(&tree, &EntryFilter::default(), ParentMatchChildren::Refilter);
        assert_eq!(out, tree);
    }

    #[test]
    fn test_empty_input() {
        let out = filter_entries(&[], &EntryFilter::new("x", None), ParentMatchChildren::KeepAll);
        assert!(out.is_empty());
    }

    #[test]
    fn test_query_keeps_context_parent() {
        let tree = repo_integration();
        let result = filter_with_context(
            &tree,
            &EntryFilter::new("sync", None),
            ParentMatchChildren::KeepAll,
        );
        assert_eq!(result.entries.len(), 1);
        let root = &result.entries[0];
        assert_eq!(root.external_id, "REQ-002");
        assert_eq!(root.title, "Repository Integration");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].external_id, "REQ-002.2");
        assert!(result.is_context("2"));
        assert!(!result.is_context("2.2"));
    }

    #[test]
    fn test_status_keeps_context_parent() {
        let tree = repo_integration();
        let out = filter_entries(
            &tree,
            &EntryFilter::new("", Some(EntryStatus::Implemented)),
            ParentMatchChildren::KeepAll,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].external_id, "REQ-002");
        assert_eq!(out[0].children.len(), 1);
        assert_eq!(out[0].children[0].external_id, "REQ-002.1");
    }

    #[test]
    fn test_no_match_yields_empty() {
        let out = filter_entries(
            &repo_integration(),
            &EntryFilter::new("nonexistent-string-xyz", None),
            ParentMatchChildren::KeepAll,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_parent_match_keeps_all_children_by_default() {
        // "repositor" hits the parent and both children; "github" hits only the parent
        let tree = repo_integration();
        let out = filter_entries(
            &tree,
            &EntryFilter::new("github", None),
            ParentMatchChildren::KeepAll,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].children, tree[0].children);
    }

    #[test]
    fn test_parent_match_refilter_policy() {
        let tree = repo_integration();
        let out = filter_entries(
            &tree,
            &EntryFilter::new("github", None),
            ParentMatchChildren::Refilter,
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].children.is_empty());

        let out = filter_entries(
            &tree,
            &EntryFilter::new("repositor", None),
            ParentMatchChildren::Refilter,
        );
        assert_eq!(out[0].children.len(), 2);
    }

    fn matching_parent_over_context_child() -> Vec<Entry> {
        vec![Entry::new("p", "REQ-P", "alpha parent", "", EntryStatus::Partial)
            .with_children(vec![Entry::new("c", "REQ-C", "middle", "", EntryStatus::Partial)
                .with_children(vec![
                    Entry::new("g", "REQ-G", "alpha leaf", "", EntryStatus::Implemented),
                    Entry::new("h", "REQ-H", "other leaf", "", EntryStatus::Pending),
                ])])]
    }

    #[test]
    fn test_kept_children_are_not_context() {
        let tree = matching_parent_over_context_child();
        let filter = EntryFilter::new("alpha", None);

        let result = filter_with_context(&tree, &filter, ParentMatchChildren::KeepAll);
        let middle = find_by_id(&result.entries, "c").unwrap();
        assert_eq!(middle.children.len(), 2);
        assert!(!result.is_context("c"));
        assert!(result.context_ids.is_empty());

        let result = filter_with_context(&tree, &filter, ParentMatchChildren::Refilter);
        let middle = find_by_id(&result.entries, "c").unwrap();
        let ids: Vec<_> = middle.children.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["g"]);
        assert!(result.is_context("c"));
        assert!(!result.is_context("p"));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Keep-All".parse::<ParentMatchChildren>(), Ok(ParentMatchChildren::KeepAll));
        assert_eq!("refilter".parse::<ParentMatchChildren>(), Ok(ParentMatchChildren::Refilter));
        assert!("some".parse::<ParentMatchChildren>().is_err());
    }

    #[test]
    fn test_order_preserved() {
        let tree = sample_entries();
        let out = filter_entries(
            &tree,
            &EntryFilter::new("", Some(EntryStatus::Implemented)),
            ParentMatchChildren::KeepAll,
        );
        let roots: Vec<_> = out.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(roots, vec!["REQ-001", "REQ-002", "REQ-003"]);
    }

    #[test]
    fn test_result_is_subset_of_input() {
        let tree = sample_entries();
        let all_ids: HashSet<String> = collect_ids(&tree).into_iter().collect();
        let queries = ["", "a", "repo", "implement", "REQ-00", "zzz", "mapping"];
        for query in queries {
            for status in [None, Some(EntryStatus::Implemented), Some(EntryStatus::Partial), Some(EntryStatus::Pending)] {
                for policy in [ParentMatchChildren::KeepAll, ParentMatchChildren::Refilter] {
                    let out = filter_entries(&tree, &EntryFilter::new(query, status), policy);
                    for id in collect_ids(&out) {
                        assert!(all_ids.contains(&id), "invented id {}", id);
                        let original = find_by_id(&tree, &id).unwrap();
                        let kept = find_by_id(&out, &id).unwrap();
                        assert_eq!(original.title, kept.title);
                        assert_eq!(original.status, kept.status);
                    }
                }
            }
        }
    }

    #[test]
    fn test_ancestors_of_matches_are_kept() {
        let tree = sample_entries();
        let filter = EntryFilter::new("", Some(EntryStatus::Pending));
        let out = filter_entries(&tree, &filter, ParentMatchChildren::Refilter);
        // REQ-002.2 is pending, so REQ-002 must be present as its ancestor
        let parent = find_by_id(&out, "2").unwrap();
        assert!(parent.children.iter().any(|c| c.id == "2.2"));
        assert!(find_by_id(&out, "4").is_some());
        assert!(find_by_id(&out, "1").is_none());
    }

    #[test]
    fn test_deep_tree_does_not_overflow() {
        let tree = deep_chain(50_000);
        let result = filter_with_context(
            &tree,
            &EntryFilter::new("needle", None),
            ParentMatchChildren::KeepAll,
        );
        assert_eq!(result.context_ids.len(), 50_000);
        assert!(find_by_id(&result.entries, "leaf").is_some());
        // Dropping a 50k-deep tree recurses in Drop; forget it to keep the test stack-safe
        std::mem::forget(result);
        std::mem::forget(tree);
    }
}
