//! Detail panel contract: what to show for the current selection

use chrono::Duration;

use crate::error::ClipboardError;
use crate::models::{Entry, EntryStatus};
use crate::notice::Notice;

/// Lifetime of the "copied" confirmation
pub const COPY_NOTICE_SECS: i64 = 2;

/// What the detail panel renders
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView<'a> {
    /// Nothing selected
    Empty,
    /// Selected entry has no file path or no code excerpt
    NoImplementation {
        entry: &'a Entry,
        /// Show the "pending implementation" note
        pending: bool,
    },
    /// Selected entry with code to show
    Implementation(ImplementationDetail<'a>),
}

/// Metadata and excerpt for an implemented entry
#[derive(Debug, Clone, PartialEq)]
pub struct ImplementationDetail<'a> {
    pub entry: &'a Entry,
    pub file_path: &'a str,
    pub file_name: &'a str,
    pub function_name: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub last_commit: Option<&'a str>,
    pub snippet: &'a str,
    /// Highlighting hint, derived from the file extension
    pub language: &'a str,
}

impl<'a> DetailView<'a> {
    pub fn for_selection(selected: Option<&'a Entry>) -> Self {
        let Some(entry) = selected else {
            return DetailView::Empty;
        };

        match (entry.file_path.as_deref(), entry.snippet.as_deref()) {
            (Some(file_path), Some(snippet)) => DetailView::Implementation(ImplementationDetail {
                entry,
                file_path,
                file_name: entry.file_name().unwrap_or(file_path),
                function_name: entry.function_name.as_deref(),
                timestamp: entry.timestamp.as_deref(),
                last_commit: entry.last_commit.as_deref(),
                snippet,
                language: language_for(file_path),
            }),
            _ => DetailView::NoImplementation {
                entry,
                pending: entry.status == EntryStatus::Pending,
            },
        }
    }

    /// Selected entry, if any
    pub fn entry(&self) -> Option<&'a Entry> {
        match self {
            DetailView::Empty => None,
            DetailView::NoImplementation { entry, .. } => Some(*entry),
            DetailView::Implementation(detail) => Some(detail.entry),
        }
    }

    /// Heading for the panel body
    pub fn headline(&self) -> &'static str {
        match self {
            DetailView::Empty => "Select a requirement",
            DetailView::NoImplementation { .. } => "No implementation details",
            DetailView::Implementation(_) => "Implementation",
        }
    }

    /// Explanatory text under the heading
    pub fn message(&self) -> String {
        match self {
            DetailView::Empty => "Choose a requirement from the list to view its implementation \
                                  details and code snippets."
                .to_string(),
            DetailView::NoImplementation { pending, .. } => {
                let mut msg =
                    "This requirement doesn't have implementation details yet.".to_string();
                if *pending {
                    msg.push_str(" It's currently pending implementation.");
                }
                msg
            }
            DetailView::Implementation(detail) => match detail.function_name {
                Some(func) => format!("{} → {}()", detail.file_name, func),
                None => detail.file_name.to_string(),
            },
        }
    }
}

fn language_for(file_path: &str) -> &'static str {
    match file_path.rsplit('.').next().unwrap_or_default() {
        "rs" => "rs",
        "ts" => "ts",
        "tsx" => "tsx",
        "js" | "jsx" => "js",
        "py" => "py",
        "go" => "go",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        _ => "txt",
    }
}

/// Access to the system clipboard
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Copies the snippet, turning the outcome into a notice instead of an error
pub fn copy_snippet(clipboard: &mut dyn Clipboard, text: &str) -> Notice {
    match clipboard.set_text(text) {
        Ok(()) => Notice::info(
            "Code copied to clipboard",
            Duration::seconds(COPY_NOTICE_SECS),
        ),
        Err(e) => {
            log::warn!("Copy to clipboard failed: {}", e);
            Notice::error("Failed to copy", "Please try again or copy manually")
                .with_lifetime(Duration::seconds(COPY_NOTICE_SECS * 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::find_by_id;
    use crate::sample::sample_entries;

    struct MemoryClipboard {
        contents: String,
        fail_with: Option<ClipboardError>,
    }

    impl Clipboard for MemoryClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if let Some(e) = &self.fail_with {
                return Err(e.clone());
            }
            self.contents = text.to_string();
            Ok(())
        }
    }

    #[test]
    fn test_empty_selection() {
        let view = DetailView::for_selection(None);
        assert_eq!(view, DetailView::Empty);
        assert_eq!(view.headline(), "Select a requirement");
        assert!(view.entry().is_none());
    }

    #[test]
    fn test_pending_without_details() {
        let entries = sample_entries();
        let sync = find_by_id(&entries, "2.2").unwrap();
        let view = DetailView::for_selection(Some(sync));
        assert!(matches!(view, DetailView::NoImplementation { pending: true, .. }));
        assert_eq!(view.headline(), "No implementation details");
        assert!(view.message().contains("pending implementation"));
    }

    #[test]
    fn test_non_pending_without_details_has_no_note() {
        let entries = sample_entries();
        let root = find_by_id(&entries, "2").unwrap();
        let view = DetailView::for_selection(Some(root));
        assert!(matches!(view, DetailView::NoImplementation { pending: false, .. }));
        assert!(!view.message().contains("pending"));
    }

    #[test]
    fn test_file_without_snippet_has_no_details() {
        let mut entry = Entry::new("x", "REQ-X", "T", "", EntryStatus::Partial);
        entry.file_path = Some("src/lib.rs".to_string());
        let view = DetailView::for_selection(Some(&entry));
        assert!(matches!(view, DetailView::NoImplementation { .. }));
    }

    #[test]
    fn test_implementation_view() {
        let entries = sample_entries();
        let login = find_by_id(&entries, "1.1").unwrap();
        let DetailView::Implementation(detail) = DetailView::for_selection(Some(login)) else {
            panic!("expected implementation view");
        };
        assert_eq!(detail.file_name, "Login.tsx");
        assert_eq!(detail.function_name, Some("LoginComponent"));
        assert_eq!(detail.timestamp, Some("2 days ago"));
        assert_eq!(detail.language, "tsx");
        assert!(detail.snippet.contains("handleGitHubLogin"));
    }

    #[test]
    fn test_copy_success_and_failure() {
        let mut ok = MemoryClipboard {
            contents: String::new(),
            fail_with: None,
        };
        let notice = copy_snippet(&mut ok, "let x = 1;");
        assert!(!notice.is_error());
        assert_eq!(ok.contents, "let x = 1;");

        let mut denied = MemoryClipboard {
            contents: String::new(),
            fail_with: Some(ClipboardError::PermissionDenied),
        };
        let notice = copy_snippet(&mut denied, "let x = 1;");
        assert!(notice.is_error());
        assert_eq!(notice.title, "Failed to copy");
        assert!(denied.contents.is_empty());
    }
}
