use once_cell::sync::Lazy;
use regex::Regex;
use trackdown_model::{Task, TaskChanges};
use trackdown_parser::{is_checklist_start, is_pipe_row, keyed_tokens, normalize_line};

static CHECKBOX_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[ xX/-]\]").unwrap());

/// Checkbox marker plus the text segment that follows it, up to the next pipe
/// or line end. The trailing `^anchor` inside the segment is preserved across
/// text replacement.
static TEXT_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(-\s*\[[ xX/-]\]\s*)([^|\r\n]*)").unwrap());

static SEGMENT_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^[A-Za-z0-9_-]+\s*$").unwrap());

/// Rewrite the owning document's text for one task-field update.
///
/// Only the primary line (checked state, display text) and the attribute line
/// directly below it (everything else) are touched; the rest of the document
/// passes through byte-for-byte. Returns `None` when the task's line anchor
/// is out of range, which means the caller holds a stale record.
#[must_use]
pub fn apply_changes(text: &str, task: &Task, changes: &TaskChanges) -> Option<String> {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    if task.line_index >= lines.len() {
        return None;
    }

    if let Some(checked) = changes.checked {
        lines[task.line_index] = swap_checkbox(&lines[task.line_index], checked);
    }
    if let Some(new_text) = changes.text.as_deref() {
        lines[task.line_index] = replace_text_segment(&lines[task.line_index], new_text);
    }

    if !changes.properties.is_empty() {
        let attr_index = task.line_index + 1;
        if !has_attribute_line(&lines, attr_index) {
            lines.insert(attr_index, String::new());
        }
        for (key, value) in &changes.properties {
            lines[attr_index] = upsert_property(&lines[attr_index], key, value);
        }
    }

    let mut rewritten = lines.join("\n");
    if text.ends_with('\n') {
        rewritten.push('\n');
    }
    Some(rewritten)
}

/// Swap the first checkbox glyph on the line.
fn swap_checkbox(line: &str, checked: bool) -> String {
    let glyph = if checked { "[x]" } else { "[ ]" };
    let line = normalize_line(line);
    CHECKBOX_GLYPH.replace(&line, glyph).into_owned()
}

/// Replace the text segment after the checkbox marker, preserving a trailing
/// `^anchor` when one exists.
fn replace_text_segment(line: &str, new_text: &str) -> String {
    let line = normalize_line(line);
    TEXT_SEGMENT
        .replace(&line, |caps: &regex::Captures<'_>| {
            let segment = &caps[2];
            match SEGMENT_ANCHOR.find(segment.trim_end()) {
                Some(anchor) => format!("{}{} {}", &caps[1], new_text, anchor.as_str()),
                None => format!("{}{}", &caps[1], new_text),
            }
        })
        .into_owned()
}

/// The line below the primary qualifies as the attribute line only when it is
/// not itself task-shaped: blank lines, pipe rows (the next table row), and
/// new checklist items all force a fresh inserted line instead.
fn has_attribute_line(lines: &[String], attr_index: usize) -> bool {
    let Some(line) = lines.get(attr_index) else {
        return false;
    };
    !line.trim().is_empty() && !is_pipe_row(line) && !is_checklist_start(line)
}

/// Replace an existing `key:: value` occurrence in place, or append a new
/// `  key:: value` segment. Key matching is case-insensitive; unrecognized
/// keys are appended blindly, there is no schema to validate against.
fn upsert_property(line: &str, key: &str, value: &str) -> String {
    let line = normalize_line(line).into_owned();
    let wanted = key.to_lowercase();
    if let Some(token) = keyed_tokens(&line)
        .into_iter()
        .find(|token| token.key == wanted)
    {
        let mut out = line.clone();
        out.replace_range(token.span, &format!("{wanted}:: {value}"));
        return out;
    }
    format!("{line}  {wanted}:: {value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use trackdown_model::{TaskKind, TaskStatus};

    fn task_at(line_index: usize) -> Task {
        Task {
            id: "e-1".to_string(),
            doc_path: "plans/q3.md".to_string(),
            line_index,
            text: "E-1 Build API".to_string(),
            properties: HashMap::new(),
            is_checked: false,
            status: TaskStatus::NotStarted,
            kind: TaskKind::Epic,
            depends_on: Vec::new(),
        }
    }

    fn checked_change(checked: bool) -> TaskChanges {
        TaskChanges {
            checked: Some(checked),
            ..TaskChanges::default()
        }
    }

    #[test]
    fn swaps_checkbox_glyph_only() {
        let text = "- [ ] E-1 Build API\n  due:: 2025-08-01\n";
        let out = apply_changes(text, &task_at(0), &checked_change(true)).unwrap();
        assert_eq!(out, "- [x] E-1 Build API\n  due:: 2025-08-01\n");
        let back = apply_changes(&out, &task_at(0), &checked_change(false)).unwrap();
        assert_eq!(back, text);
    }

    #[test]
    fn swaps_glyph_inside_a_table_cell() {
        let text = "| S-1 | E-1 | - [/] Design | |";
        let out = apply_changes(text, &task_at(0), &checked_change(true)).unwrap();
        assert_eq!(out, "| S-1 | E-1 | - [x] Design | |");
    }

    #[test]
    fn replaces_text_preserving_trailing_anchor() {
        let text = "- [ ] Old title ^e-1";
        let changes = TaskChanges {
            text: Some("New title".to_string()),
            ..TaskChanges::default()
        };
        let out = apply_changes(text, &task_at(0), &changes).unwrap();
        assert_eq!(out, "- [ ] New title ^e-1");
    }

    #[test]
    fn table_text_replacement_stops_at_next_pipe() {
        let text = "| S-1 | E-1 | - [ ] Old cell | Ann |";
        let changes = TaskChanges {
            text: Some("New cell".to_string()),
            ..TaskChanges::default()
        };
        let out = apply_changes(text, &task_at(0), &changes).unwrap();
        assert_eq!(out, "| S-1 | E-1 | - [ ] New cell| Ann |");
    }

    #[test]
    fn rewrites_existing_property_on_attribute_line() {
        let text = "- [ ] E-1 Build API\n  due:: 2025-08-01  assignee:: Ann\n";
        let out = apply_changes(text, &task_at(0), &TaskChanges::property("due", "2025-03-03"))
            .unwrap();
        assert_eq!(out, "- [ ] E-1 Build API\n  due:: 2025-03-03  assignee:: Ann\n");
    }

    #[test]
    fn appends_new_property_segment() {
        let text = "- [ ] E-1 Build API\n  due:: 2025-08-01\n";
        let out = apply_changes(
            text,
            &task_at(0),
            &TaskChanges::property("priority", "high"),
        )
        .unwrap();
        assert_eq!(
            out,
            "- [ ] E-1 Build API\n  due:: 2025-08-01  priority:: high\n"
        );
    }

    #[test]
    fn inserts_attribute_line_when_none_exists() {
        let text = "- [ ] E-1 Build API\n\nMore prose.\n";
        let out = apply_changes(text, &task_at(0), &TaskChanges::property("due", "2025-03-03"))
            .unwrap();
        assert_eq!(out, "- [ ] E-1 Build API\n  due:: 2025-03-03\n\nMore prose.\n");
    }

    #[test]
    fn inserts_attribute_line_at_end_of_document() {
        let text = "- [ ] E-1 Build API";
        let out = apply_changes(text, &task_at(0), &TaskChanges::property("due", "2025-03-03"))
            .unwrap();
        assert_eq!(out, "- [ ] E-1 Build API\n  due:: 2025-03-03");
    }

    #[test]
    fn next_checklist_item_is_not_an_attribute_line() {
        let text = "- [ ] E-1 Build API\n- [ ] E-2 Ship it\n";
        let out = apply_changes(text, &task_at(0), &TaskChanges::property("due", "2025-03-03"))
            .unwrap();
        assert_eq!(
            out,
            "- [ ] E-1 Build API\n  due:: 2025-03-03\n- [ ] E-2 Ship it\n"
        );
    }

    #[test]
    fn property_key_match_is_case_insensitive() {
        let text = "- [ ] E-1 Build API\n  Due:: 2025-08-01\n";
        let out = apply_changes(text, &task_at(0), &TaskChanges::property("due", "2025-09-09"))
            .unwrap();
        assert_eq!(out, "- [ ] E-1 Build API\n  due:: 2025-09-09\n");
    }

    #[test]
    fn stale_line_anchor_yields_none() {
        assert!(apply_changes("one line", &task_at(5), &checked_change(true)).is_none());
    }
}
