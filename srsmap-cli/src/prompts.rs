use anyhow::Result;
use colored::Colorize;
use inquire::{InquireError, Select, Text};
use std::fmt;

use srsmap_core::{EntryStatus, MappingSession};

use crate::{print_detail, print_tree};

/// One line of the browse menu
enum BrowseChoice {
    Row {
        id: String,
        label: String,
        has_children: bool,
    },
    Details,
    Search,
    Status,
    ExpandAll,
    CollapseAll,
    Quit,
}

impl fmt::Display for BrowseChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseChoice::Row { label, .. } => write!(f, "{}", label),
            BrowseChoice::Details => write!(f, "» Show details of selection"),
            BrowseChoice::Search => write!(f, "» Search…"),
            BrowseChoice::Status => write!(f, "» Filter by status…"),
            BrowseChoice::ExpandAll => write!(f, "» Expand all"),
            BrowseChoice::CollapseAll => write!(f, "» Collapse all"),
            BrowseChoice::Quit => write!(f, "» Quit"),
        }
    }
}

/// Status filter options, "All" clears the filter
struct StatusChoice(Option<EntryStatus>);

impl fmt::Display for StatusChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(status) => write!(f, "{} {}", status.icon(), status.label()),
            None => write!(f, "All"),
        }
    }
}

/// Returns None when the user cancels the prompt
fn cancellable<T>(result: Result<T, InquireError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn browse_choices(session: &MappingSession) -> Vec<BrowseChoice> {
    let result = session.filtered();
    let rows = session.tree().visible_rows(&result.entries);

    let mut choices: Vec<BrowseChoice> = rows
        .iter()
        .map(|row| {
            let toggle = match (row.has_children, row.expanded) {
                (false, _) => " ",
                (true, true) => "▾",
                (true, false) => "▸",
            };
            let mut label = format!(
                "{}{} {} {}  {}",
                "  ".repeat(row.depth),
                toggle,
                row.entry.status.icon(),
                row.entry.external_id,
                row.entry.title
            );
            if result.is_context(&row.entry.id) {
                label.push_str(" (context)");
            }
            BrowseChoice::Row {
                id: row.entry.id.clone(),
                label,
                has_children: row.has_children,
            }
        })
        .collect();

    if session.selected_entry().is_some() {
        choices.push(BrowseChoice::Details);
    }
    choices.extend([
        BrowseChoice::Search,
        BrowseChoice::Status,
        BrowseChoice::ExpandAll,
        BrowseChoice::CollapseAll,
        BrowseChoice::Quit,
    ]);
    choices
}

/// Interactive tree browser
///
/// Choosing a branch toggles it, choosing a leaf shows its details.
pub fn browse(session: &mut MappingSession, indent_per_level: f32) -> Result<()> {
    loop {
        let filter = session.filter();
        let mut heading = String::from("Requirements");
        if !filter.query.is_empty() {
            heading.push_str(&format!(" matching \"{}\"", filter.query));
        }
        if let Some(status) = filter.status {
            heading.push_str(&format!(" [{}]", status));
        }

        let choices = browse_choices(session);
        let Some(choice) = cancellable(
            Select::new(&format!("{}:", heading), choices)
                .with_page_size(20)
                .prompt(),
        )?
        else {
            break;
        };

        match choice {
            BrowseChoice::Row {
                id, has_children, ..
            } => {
                session.select_id(&id);
                if has_children {
                    session.toggle_expand(&id);
                } else {
                    println!();
                    print_detail(&session.detail());
                    println!();
                }
            }
            BrowseChoice::Details => {
                println!();
                print_detail(&session.detail());
                println!();
            }
            BrowseChoice::Search => {
                let current = session.filter().query.clone();
                if let Some(query) = cancellable(
                    Text::new("Search:")
                        .with_initial_value(&current)
                        .with_help_message("Empty to clear")
                        .prompt(),
                )? {
                    session.set_query(query);
                }
            }
            BrowseChoice::Status => {
                let options: Vec<StatusChoice> = std::iter::once(StatusChoice(None))
                    .chain(EntryStatus::ALL.into_iter().map(|s| StatusChoice(Some(s))))
                    .collect();
                if let Some(StatusChoice(status)) =
                    cancellable(Select::new("Status:", options).prompt())?
                {
                    session.set_status(status);
                }
            }
            BrowseChoice::ExpandAll => {
                let filtered = session.filtered();
                session.tree_mut().expand_all(&filtered.entries);
            }
            BrowseChoice::CollapseAll => session.tree_mut().collapse_all(),
            BrowseChoice::Quit => break,
        }

        if session.filtered().entries.is_empty() {
            println!("{}", "No requirements match the current filter.".yellow());
        }
    }

    println!();
    print_tree(session, indent_per_level);
    Ok(())
}
