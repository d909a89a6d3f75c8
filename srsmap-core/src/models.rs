use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Implementation status of a requirement entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Implemented,
    Partial,
    Pending,
}

impl EntryStatus {
    /// All statuses in display order
    pub const ALL: [EntryStatus; 3] = [
        EntryStatus::Implemented,
        EntryStatus::Partial,
        EntryStatus::Pending,
    ];

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Implemented => "implemented",
            EntryStatus::Partial => "partial",
            EntryStatus::Pending => "pending",
        }
    }

    /// Capitalized label for badges and buttons
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Implemented => "Implemented",
            EntryStatus::Partial => "Partial",
            EntryStatus::Pending => "Pending",
        }
    }

    /// Glyph shown next to an entry in the tree view
    pub fn icon(&self) -> &'static str {
        match self {
            EntryStatus::Implemented => "✔",
            EntryStatus::Partial => "🕑",
            EntryStatus::Pending => "⚠",
        }
    }

    /// Plain-text marker for terminals that can't render the glyphs
    pub fn marker(&self) -> &'static str {
        match self {
            EntryStatus::Implemented => "[x]",
            EntryStatus::Partial => "[~]",
            EntryStatus::Pending => "[!]",
        }
    }

    /// RGB color used for the icon and the status badge
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            // green-500, amber-500, red-500
            EntryStatus::Implemented => (34, 197, 94),
            EntryStatus::Partial => (245, 158, 11),
            EntryStatus::Pending => (239, 68, 68),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "implemented" => Ok(EntryStatus::Implemented),
            "partial" => Ok(EntryStatus::Partial),
            "pending" => Ok(EntryStatus::Pending),
            other => Err(format!(
                "Invalid status '{}'. Expected one of: implemented, partial, pending",
                other
            )),
        }
    }
}

/// A node in the requirement tree, optionally mapped to the code implementing it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique identifier, stable across renders
    pub id: String,
    /// Human-facing requirement code (e.g. "REQ-001")
    #[serde(rename = "srsId", alias = "externalId")]
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: EntryStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Entry {
    /// Creates an entry with no children and no implementation details
    pub fn new(
        id: impl Into<String>,
        external_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        status: EntryStatus,
    ) -> Self {
        Self {
            id: id.into(),
            external_id: external_id.into(),
            title: title.into(),
            description: description.into(),
            status,
            children: Vec::new(),
            file_path: None,
            function_name: None,
            last_commit: None,
            timestamp: None,
            snippet: None,
        }
    }

    /// Builder: attach children
    pub fn with_children(mut self, children: Vec<Entry>) -> Self {
        self.children = children;
        self
    }

    /// Builder: attach the implementing file and code excerpt
    pub fn with_implementation(
        mut self,
        file_path: impl Into<String>,
        function_name: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        self.file_path = non_empty(Some(file_path.into()));
        self.function_name = non_empty(Some(function_name.into()));
        self.snippet = non_empty(Some(snippet.into()));
        self
    }

    /// Builder: attach commit metadata
    pub fn with_commit(mut self, last_commit: impl Into<String>, timestamp: impl Into<String>) -> Self {
        self.last_commit = non_empty(Some(last_commit.into()));
        self.timestamp = non_empty(Some(timestamp.into()));
        self
    }

    /// Copy of this entry's own fields with a different set of children
    pub fn with_replaced_children(&self, children: Vec<Entry>) -> Entry {
        Entry {
            id: self.id.clone(),
            external_id: self.external_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            children,
            file_path: self.file_path.clone(),
            function_name: self.function_name.clone(),
            last_commit: self.last_commit.clone(),
            timestamp: self.timestamp.clone(),
            snippet: self.snippet.clone(),
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True when both a file path and a code excerpt are known
    pub fn has_implementation(&self) -> bool {
        self.file_path.is_some() && self.snippet.is_some()
    }

    /// Last segment of the file path, if any
    pub fn file_name(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .and_then(|p| p.rsplit(['/', '\\']).next())
            .filter(|name| !name.is_empty())
    }
}

/// Finds an entry anywhere in the forest by its id (depth-first, pre-order)
pub fn find_by_id<'a>(entries: &'a [Entry], id: &str) -> Option<&'a Entry> {
    find_entry(entries, |e| e.id == id)
}

/// Finds an entry anywhere in the forest by its external id, ignoring case
pub fn find_by_external_id<'a>(entries: &'a [Entry], external_id: &str) -> Option<&'a Entry> {
    find_entry(entries, |e| e.external_id.eq_ignore_ascii_case(external_id))
}

fn find_entry<'a, F>(entries: &'a [Entry], pred: F) -> Option<&'a Entry>
where
    F: Fn(&Entry) -> bool,
{
    let mut stack: Vec<&Entry> = entries.iter().rev().collect();
    while let Some(entry) = stack.pop() {
        if pred(entry) {
            return Some(entry);
        }
        stack.extend(entry.children.iter().rev());
    }
    None
}

/// Number of nodes in the forest
pub fn count_entries(entries: &[Entry]) -> usize {
    let mut stack: Vec<&Entry> = entries.iter().collect();
    let mut count = 0;
    while let Some(entry) = stack.pop() {
        count += 1;
        stack.extend(entry.children.iter());
    }
    count
}

/// Collects every id in the forest
pub fn collect_ids(entries: &[Entry]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut stack: Vec<&Entry> = entries.iter().rev().collect();
    while let Some(entry) = stack.pop() {
        ids.push(entry.id.clone());
        stack.extend(entry.children.iter().rev());
    }
    ids
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// =============================================================================
// Wire decoding
// =============================================================================

/// Permissive wire shape; validated into `Entry` by `decode_entries`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    id: Option<String>,
    #[serde(alias = "externalId")]
    srs_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    #[serde(default)]
    children: Option<Vec<RawEntry>>,
    file_path: Option<String>,
    function_name: Option<String>,
    last_commit: Option<String>,
    timestamp: Option<String>,
    snippet: Option<String>,
}

/// Result of decoding a fetched tree
#[derive(Debug, Clone, Default)]
pub struct DecodedTree {
    pub entries: Vec<Entry>,
    /// Number of malformed nodes dropped (each drop takes its subtree with it)
    pub skipped: usize,
}

/// Decodes a JSON array of entries, skipping malformed nodes
pub fn decode_json(text: &str) -> Result<DecodedTree, serde_json::Error> {
    let raw: Vec<RawEntry> = serde_json::from_str(text)?;
    Ok(validate(raw))
}

/// Decodes a YAML sequence of entries, skipping malformed nodes
pub fn decode_yaml(text: &str) -> Result<DecodedTree, serde_yaml::Error> {
    let raw: Vec<RawEntry> = serde_yaml::from_str(text)?;
    Ok(validate(raw))
}

/// Decodes an already-parsed JSON value
pub fn decode_value(value: serde_json::Value) -> Result<DecodedTree, serde_json::Error> {
    let raw: Vec<RawEntry> = serde_json::from_value(value)?;
    Ok(validate(raw))
}

fn validate(raw: Vec<RawEntry>) -> DecodedTree {
    let mut skipped = 0;
    let entries = raw
        .into_iter()
        .enumerate()
        .filter_map(|(pos, node)| convert(node, &format!("[{}]", pos), &mut skipped))
        .collect();
    DecodedTree { entries, skipped }
}

fn convert(raw: RawEntry, path: &str, skipped: &mut usize) -> Option<Entry> {
    let Some(id) = non_empty(raw.id) else {
        log::warn!("Skipping entry at {}: missing id", path);
        *skipped += 1;
        return None;
    };

    let status = match raw.status.as_deref().map(EntryStatus::from_str) {
        Some(Ok(status)) => status,
        Some(Err(e)) => {
            log::warn!("Skipping entry '{}' at {}: {}", id, path, e);
            *skipped += 1;
            return None;
        }
        None => {
            log::warn!("Skipping entry '{}' at {}: missing status", id, path);
            *skipped += 1;
            return None;
        }
    };

    let children = raw
        .children
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(pos, child)| convert(child, &format!("{}.children[{}]", path, pos), skipped))
        .collect();

    Some(Entry {
        external_id: raw.srs_id.unwrap_or_else(|| id.clone()),
        id,
        title: raw.title.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        status,
        children,
        file_path: non_empty(raw.file_path),
        function_name: non_empty(raw.function_name),
        last_commit: non_empty(raw.last_commit),
        timestamp: non_empty(raw.timestamp),
        snippet: non_empty(raw.snippet),
    })
}
