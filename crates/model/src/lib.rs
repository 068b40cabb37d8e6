//! # Trackdown Model
//!
//! Shared data model for the trackdown indexing engine: the normalized task
//! record, per-project rollups, milestones, and the value types exchanged
//! with the document-store seam.
//!
//! Everything here is plain data. All parsing lives in `trackdown-parser`,
//! all orchestration and I/O in `trackdown-indexer`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Checkbox-glyph state machine, derived deterministically during assembly.
///
/// `[x]`/`[X]` → done, `[/]` → in-progress, `[-]` → on-hold, anything else
/// (including `[ ]`) → not-started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    OnHold,
    Done,
}

impl TaskStatus {
    /// Canonical kebab-case name, matching the serialized form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::OnHold => "on-hold",
            TaskStatus::Done => "done",
        }
    }
}

/// Task flavor, computed once from the id prefix during assembly and carried
/// on the record instead of re-deriving the prefix check at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Epic,
    Story,
    Subtask,
    #[default]
    Unknown,
}

impl TaskKind {
    /// Infer the flavor from a normalized (lowercase) id.
    ///
    /// Convention: `e`-prefixed ids are epics, `sb` subtasks, `s` (but not
    /// `sb`) stories. The prefix must be followed by digits, optionally
    /// separated by a single `-` or `_`.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        fn rest_is_numeric(rest: &str) -> bool {
            let rest = rest.strip_prefix(['-', '_']).unwrap_or(rest);
            !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
        }

        if let Some(rest) = id.strip_prefix("sb") {
            if rest_is_numeric(rest) {
                return TaskKind::Subtask;
            }
        }
        if let Some(rest) = id.strip_prefix('s') {
            if rest_is_numeric(rest) {
                return TaskKind::Story;
            }
        }
        if let Some(rest) = id.strip_prefix('e') {
            if rest_is_numeric(rest) {
                return TaskKind::Epic;
            }
        }
        TaskKind::Unknown
    }
}

/// One checkbox/table-row action item, normalized from its source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Normalized lowercase identifier.
    pub id: String,

    /// Path of the owning document.
    pub doc_path: String,

    /// Zero-based source line of the primary row; display-jump target and
    /// mutation anchor.
    pub line_index: usize,

    /// Display text with checkbox markup, annotations, and pipes stripped.
    pub text: String,

    /// Merged annotation bag (lowercase keys).
    pub properties: HashMap<String, String>,

    /// True only for the completed checkbox glyph (or a host-supplied
    /// checked flag).
    pub is_checked: bool,

    pub status: TaskStatus,

    pub kind: TaskKind,

    /// Normalized dependency ids. Each entry may carry a relationship-type
    /// prefix (`fs:e-1`); consumers parse the prefix at use time.
    pub depends_on: Vec<String>,
}

impl Task {
    /// Composite lookup key for this task.
    #[must_use]
    pub fn composite_key(&self) -> String {
        composite_key(&self.doc_path, &self.id)
    }
}

/// Unique lookup key for a task: `documentPath::lowercasedId`.
#[must_use]
pub fn composite_key(doc_path: &str, id: &str) -> String {
    format!("{doc_path}::{}", id.to_lowercase())
}

/// One document flagged as a project, with rollup statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub doc_path: String,

    /// Tasks in scan order (not hierarchy order).
    pub tasks: Vec<Task>,

    /// Fraction of checked tasks in [0, 1]. An empty project reads as 1.0.
    pub percent_complete: f64,

    /// Minimum due date among unchecked tasks, ISO `YYYY-MM-DD`.
    pub next_due_date: Option<String>,
}

/// One dated row from a "Title"+"Date" table, independent of the task
/// hierarchy. Rebuilt wholesale on every scan, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub description: Option<String>,
    pub doc_path: String,
}

/// Engine configuration, supplied by the embedding application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Front-matter key whose truthy value flags a document as a project.
    pub project_flag_property: String,

    /// Property key written by `move_task_to_status`.
    pub status_property: String,

    /// Property key consulted for the next-due-date rollup.
    pub due_property: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            project_flag_property: "project".to_string(),
            status_property: "status".to_string(),
            due_property: "due".to_string(),
        }
    }
}

/// Field updates for a single task, applied by the mutation gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// Swap the checkbox glyph between `[ ]` and `[x]`.
    pub checked: Option<bool>,

    /// Replace the task's display text, preserving any trailing `^anchor`.
    pub text: Option<String>,

    /// Annotation updates; unknown keys are appended without validation.
    /// Ordered map so repeated appends land deterministically.
    pub properties: BTreeMap<String, String>,
}

impl TaskChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checked.is_none() && self.text.is_none() && self.properties.is_empty()
    }

    /// Convenience constructor for a single property update.
    #[must_use]
    pub fn property(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut changes = Self::default();
        changes.properties.insert(key.into(), value.into());
        changes
    }
}

/// Document listing entry handed over by the store: path plus the
/// front-matter-equivalent property mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub path: String,
    pub properties: HashMap<String, String>,
}

/// One host-provided structured list item. The host surface may omit items
/// for table-embedded checkboxes; the scanner's raw-line fallback walk covers
/// those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Zero-based line of the item's primary row.
    pub line: usize,

    /// Last line of the item block (continuation/attribute lines included).
    pub end_line: usize,

    /// Trailing `^block-id` anchor, if any.
    pub block_id: Option<String>,

    /// Host-side checked flag; OR'd into the done signal during assembly.
    pub checked: Option<bool>,
}

/// Full snapshot of one document: raw text plus host metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub path: String,
    pub text: String,
    pub items: Vec<ListItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let back: TaskStatus = serde_json::from_str("\"on-hold\"").unwrap();
        assert_eq!(back, TaskStatus::OnHold);
    }

    #[test]
    fn kind_from_id_prefixes() {
        assert_eq!(TaskKind::from_id("e-1"), TaskKind::Epic);
        assert_eq!(TaskKind::from_id("e12"), TaskKind::Epic);
        assert_eq!(TaskKind::from_id("s-4"), TaskKind::Story);
        assert_eq!(TaskKind::from_id("sb-4"), TaskKind::Subtask);
        assert_eq!(TaskKind::from_id("sb12"), TaskKind::Subtask);
        assert_eq!(TaskKind::from_id("m-1"), TaskKind::Unknown);
        assert_eq!(TaskKind::from_id("epic"), TaskKind::Unknown);
        assert_eq!(TaskKind::from_id(""), TaskKind::Unknown);
    }

    #[test]
    fn composite_key_lowercases_id() {
        assert_eq!(composite_key("plans/q3.md", "E-1"), "plans/q3.md::e-1");
    }

    #[test]
    fn default_config_keys() {
        let config = IndexConfig::default();
        assert_eq!(config.project_flag_property, "project");
        assert_eq!(config.status_property, "status");
        assert_eq!(config.due_property, "due");
    }
}
