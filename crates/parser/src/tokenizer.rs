use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Pipe-leading row carrying a checkbox glyph inside a table cell.
static TABLE_TASK_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|.*-\s*\[[ xX/-]\]").unwrap());

/// Checkbox marker at the start of a (structured) list item line.
static CHECKLIST_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*\[[ xX/-]\]").unwrap());

/// Classification of one raw document line.
///
/// The tokenizer never transforms the line; it only decides which downstream
/// path (if any) gets to see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Pipe-table row embedding a checkbox cell.
    TableTaskRow,
    /// Structured list item whose line starts with a checkbox marker.
    ChecklistTask,
    /// Pipe-leading header row containing both "Title" and "Date"; opens a
    /// milestone sub-scan of the following pipe rows.
    MilestoneHeader,
    /// Everything else. Ignored by the task assembler.
    Text,
}

/// Replace non-breaking spaces with ordinary spaces.
///
/// Authored tables frequently carry U+00A0 from copy-paste; this must run
/// before every regex test here and in all downstream components.
#[must_use]
pub fn normalize_line(line: &str) -> Cow<'_, str> {
    if line.contains('\u{00A0}') {
        Cow::Owned(line.replace('\u{00A0}', " "))
    } else {
        Cow::Borrowed(line)
    }
}

/// Classify one line. `is_structured_item` tells the tokenizer the caller has
/// independently identified this line as a structured list item; a bare
/// checkbox line outside the structured walk stays `Text` (the raw-line
/// fallback only rescues table rows).
#[must_use]
pub fn classify_line(line: &str, is_structured_item: bool) -> LineKind {
    let line = normalize_line(line);
    if TABLE_TASK_ROW.is_match(&line) {
        return LineKind::TableTaskRow;
    }
    if is_structured_item && CHECKLIST_START.is_match(&line) {
        return LineKind::ChecklistTask;
    }
    if is_milestone_header(&line) {
        return LineKind::MilestoneHeader;
    }
    LineKind::Text
}

/// Pipe-table row embedding a checkbox cell (fallback-walk predicate).
#[must_use]
pub fn is_table_task_row(line: &str) -> bool {
    TABLE_TASK_ROW.is_match(&normalize_line(line))
}

/// Checkbox marker at line start.
#[must_use]
pub fn is_checklist_start(line: &str) -> bool {
    CHECKLIST_START.is_match(&normalize_line(line))
}

/// Any pipe-leading line (table continuation predicate for sub-scans).
#[must_use]
pub fn is_pipe_row(line: &str) -> bool {
    normalize_line(line).trim_start().starts_with('|')
}

/// Pipe-leading header row containing both "Title" and "Date" tokens,
/// case-insensitive.
#[must_use]
pub fn is_milestone_header(line: &str) -> bool {
    let line = normalize_line(line);
    let trimmed = line.trim_start();
    if !trimmed.starts_with('|') {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    lowered.contains("title") && lowered.contains("date")
}
