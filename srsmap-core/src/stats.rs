use serde::Serialize;

use crate::models::{Entry, EntryStatus};

/// Summary counts for a requirement tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeStats {
    pub total: usize,
    pub implemented: usize,
    pub partial: usize,
    pub pending: usize,
    /// Entries with a file path and a snippet
    pub with_implementation: usize,
    /// Depth of the deepest entry; roots are depth 1, an empty tree is 0
    pub max_depth: usize,
}

impl TreeStats {
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut stats = TreeStats::default();
        let mut stack: Vec<(&Entry, usize)> = entries.iter().rev().map(|e| (e, 1)).collect();

        while let Some((entry, depth)) = stack.pop() {
            stats.total += 1;
            match entry.status {
                EntryStatus::Implemented => stats.implemented += 1,
                EntryStatus::Partial => stats.partial += 1,
                EntryStatus::Pending => stats.pending += 1,
            }
            if entry.has_implementation() {
                stats.with_implementation += 1;
            }
            stats.max_depth = stats.max_depth.max(depth);
            stack.extend(entry.children.iter().rev().map(|c| (c, depth + 1)));
        }

        stats
    }

    pub fn count(&self, status: EntryStatus) -> usize {
        match status {
            EntryStatus::Implemented => self.implemented,
            EntryStatus::Partial => self.partial,
            EntryStatus::Pending => self.pending,
        }
    }

    /// Share of implemented entries, 0.0 for an empty tree
    pub fn implemented_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.implemented as f64 * 100.0 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_entries;

    #[test]
    fn test_sample_stats() {
        let stats = TreeStats::from_entries(&sample_entries());
        assert_eq!(stats.total, 10);
        assert_eq!(stats.implemented, 7);
        assert_eq!(stats.partial, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.with_implementation, 5);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.count(EntryStatus::Pending), 2);
        assert!((stats.implemented_percent() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_tree() {
        let stats = TreeStats::from_entries(&[]);
        assert_eq!(stats, TreeStats::default());
        assert_eq!(stats.implemented_percent(), 0.0);
    }
}
