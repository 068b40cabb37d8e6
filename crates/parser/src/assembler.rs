use crate::annotations;
use crate::table::{apply_row_heuristics, split_cells};
use crate::tokenizer::{classify_line, normalize_line, LineKind};
use once_cell::sync::Lazy;
use regex::Regex;
use trackdown_model::{Task, TaskKind, TaskStatus};

/// Substituted when stripping leaves no display text.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "(no text)";

static DONE_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[xX]\]").unwrap());
static IN_PROGRESS_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[/\]").unwrap());
static ON_HOLD_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[-\]").unwrap());

/// Any checkbox marker, for stripping.
static CHECKBOX_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"-\s*\[[ xX/-]\]\s*").unwrap());
static BLOCK_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^[A-Za-z0-9_-]+").unwrap());
static TRAILING_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^([A-Za-z0-9_-]+)\s*$").unwrap());

/// First-cell id shape: letters, optional single separator, digits.
static IDENTIFIER_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+[-_]?\d+$").unwrap());

/// Trailing `^anchor` on a line, without the caret.
#[must_use]
pub fn trailing_anchor(line: &str) -> Option<String> {
    let line = normalize_line(line);
    TRAILING_ANCHOR
        .captures(&line)
        .map(|caps| caps[1].to_string())
}

/// One task-shaped line or multi-line block, ready for assembly.
#[derive(Debug, Clone)]
pub struct BlockSource<'a> {
    pub doc_path: &'a str,

    /// Zero-based line of the primary row.
    pub line_index: usize,

    /// Primary row, byte-for-byte.
    pub primary: &'a str,

    /// Primary row plus continuation lines, newline-joined.
    pub block: &'a str,

    /// Host-supplied structured-item identifier, if any.
    pub item_id: Option<&'a str>,

    /// Host-side checked flag, OR'd into the done signal.
    pub item_checked: Option<bool>,

    /// True when this block came from the structured-item walk rather than
    /// the raw-line fallback walk.
    pub from_structured_walk: bool,
}

/// Combine tokenizer, annotation, and table-heuristic output for one block
/// into one normalized [`Task`]. Returns `None` when the primary line is not
/// task-shaped; malformed content never errors, it degrades to plain text.
#[must_use]
pub fn assemble(src: &BlockSource<'_>) -> Option<Task> {
    let kind = classify_line(src.primary, src.from_structured_walk);
    let is_table_row = match kind {
        LineKind::TableTaskRow => true,
        LineKind::ChecklistTask => false,
        LineKind::MilestoneHeader | LineKind::Text => {
            log::debug!(
                "Skipping non-task line {} in {}",
                src.line_index,
                src.doc_path
            );
            return None;
        }
    };

    let mut properties = annotations::parse_block(src.block);

    let cells = if is_table_row {
        let cells = split_cells(src.primary);
        apply_row_heuristics(&cells, &mut properties);
        cells
    } else {
        Vec::new()
    };

    let primary = normalize_line(src.primary);
    let (status, glyph_checked) = derive_status(&primary);
    let is_checked = glyph_checked || src.item_checked == Some(true);

    let depends_on = parse_depends(properties.get("depends").map(String::as_str));

    let stripped = strip_display_text(src.block);
    let id = resolve_id(src, is_table_row, &cells, &stripped);
    let kind = TaskKind::from_id(&id);
    let text = if stripped.is_empty() {
        EMPTY_TEXT_PLACEHOLDER.to_string()
    } else {
        stripped
    };

    Some(Task {
        id,
        doc_path: src.doc_path.to_string(),
        line_index: src.line_index,
        text,
        properties,
        is_checked,
        status,
        kind,
        depends_on,
    })
}

/// Glyph state machine, highest-priority match first. The glyph is the
/// authoritative source for `status`; `is_checked` is computed from the done
/// glyph alone so a host checked flag can be OR'd in separately.
fn derive_status(primary: &str) -> (TaskStatus, bool) {
    if DONE_GLYPH.is_match(primary) {
        (TaskStatus::Done, true)
    } else if IN_PROGRESS_GLYPH.is_match(primary) {
        (TaskStatus::InProgress, false)
    } else if ON_HOLD_GLYPH.is_match(primary) {
        (TaskStatus::OnHold, false)
    } else {
        (TaskStatus::NotStarted, false)
    }
}

/// Split a `depends::` value on commas/whitespace, strip a leading anchor
/// marker, lowercase, drop empties. Relationship-type prefixes (`fs:e-1`)
/// pass through untouched for dependents to parse.
fn parse_depends(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|token| token.trim_start_matches('^').to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Strip checkbox markers, `key:: value` tokens, block anchors, and table
/// pipes from the joined block; collapse whitespace. Multi-line blocks are
/// stripped as one unit. May return the empty string; the caller substitutes
/// the placeholder.
fn strip_display_text(block: &str) -> String {
    let block = if block.contains('\u{00A0}') {
        block.replace('\u{00A0}', " ")
    } else {
        block.to_string()
    };
    let without_tokens = block
        .lines()
        .map(annotations::strip_keyed_tokens)
        .collect::<Vec<_>>()
        .join("\n");
    let stripped = CHECKBOX_MARKER.replace_all(&without_tokens, "");
    let stripped = BLOCK_ANCHOR.replace_all(&stripped, "");
    let stripped = stripped.replace('|', " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Id precedence: host structured-item id, then (fallback-path table rows) a
/// trailing anchor suffix, then an identifier-shaped first cell, then the
/// identifier-shaped leading token of a checklist line's text (the creation
/// wizard emits `- [ ] <ID> <Title>`), then a synthetic path+line fallback.
/// Always lowercased.
fn resolve_id(
    src: &BlockSource<'_>,
    is_table_row: bool,
    cells: &[String],
    stripped_text: &str,
) -> String {
    if let Some(item_id) = src.item_id {
        if !item_id.is_empty() {
            return item_id.to_lowercase();
        }
    }
    if is_table_row && !src.from_structured_walk {
        if let Some(anchor) = trailing_anchor(src.primary) {
            return anchor.to_lowercase();
        }
    }
    if is_table_row {
        if let Some(first) = cells.first() {
            if IDENTIFIER_CELL.is_match(first) {
                return first.to_lowercase();
            }
        }
    } else if let Some(leading) = stripped_text.split_whitespace().next() {
        if IDENTIFIER_CELL.is_match(leading) {
            return leading.to_lowercase();
        }
    }
    format!("{}-{}", src.doc_path, src.line_index).to_lowercase()
}
