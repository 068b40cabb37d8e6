use crate::tokenizer::normalize_line;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static EPIC_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Ee]-\d+$").unwrap());
static STORY_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Ss]-\d+$").unwrap());
static ISO_DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Closed priority vocabulary. Matching is case-insensitive against the whole
/// cell; the matching cell is stored verbatim, not normalized.
const PRIORITY_WORDS: &[&str] = &[
    "critical", "crit", "c", "p0", "highest", "high", "h", "1", "p1", "medium", "med", "m", "2",
    "p2", "low", "l", "3", "p3",
];

/// Split a pipe row into trimmed cells, dropping the leading/trailing empty
/// cells produced by boundary pipes. Interior empty cells are kept.
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    let line = normalize_line(line);
    let mut cells: Vec<String> = line.split('|').map(|cell| cell.trim().to_string()).collect();
    if cells.first().is_some_and(|cell| cell.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|cell| cell.is_empty()) {
        cells.pop();
    }
    cells
}

/// Strict ISO date check: `YYYY-MM-DD` shape plus component ranges. Anything
/// that fails is treated as non-date content, never an error.
#[must_use]
pub fn is_iso_date(value: &str) -> bool {
    if !ISO_DATE_SHAPE.is_match(value) {
        return false;
    }
    let month: u32 = value[5..7].parse().unwrap_or(0);
    let day: u32 = value[8..10].parse().unwrap_or(0);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

/// Positional inference over an already-split table row.
///
/// - `cells[1]` shaped like `E-n` marks this row a story (`epic` ref);
///   shaped like `S-n`, a subtask (`story` ref).
/// - The first cell matching the priority vocabulary becomes `priority`.
/// - Scanning right-to-left from index 2, the first non-empty cell that is
///   not an ISO date becomes `description` — a fallback only, an explicit
///   `description::` annotation always wins.
///
/// `epic`/`story`/`priority` are positional facts absent from inline syntax
/// in practice and overwrite unconditionally.
pub fn apply_row_heuristics(cells: &[String], props: &mut HashMap<String, String>) {
    if let Some(parent) = cells.get(1) {
        if EPIC_REF.is_match(parent) {
            props.insert("epic".to_string(), parent.clone());
        } else if STORY_REF.is_match(parent) {
            props.insert("story".to_string(), parent.clone());
        }
    }

    if let Some(priority) = cells.iter().find(|cell| {
        let lowered = cell.to_lowercase();
        PRIORITY_WORDS.contains(&lowered.as_str())
    }) {
        props.insert("priority".to_string(), priority.clone());
    }

    if !props.contains_key("description") {
        let description = cells
            .iter()
            .enumerate()
            .skip(2)
            .rev()
            .map(|(_, cell)| cell)
            .find(|cell| !cell.is_empty() && !is_iso_date(cell));
        if let Some(description) = description {
            props.insert("description".to_string(), description.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(line: &str) -> Vec<String> {
        split_cells(line)
    }

    #[test]
    fn boundary_pipes_drop_but_interior_empties_stay() {
        let cells = row("| S-1 | E-1 | - [ ] Design | | Ann |");
        assert_eq!(cells, vec!["S-1", "E-1", "- [ ] Design", "", "Ann"]);
    }

    #[test]
    fn story_row_sets_epic_ref() {
        let cells = row(
            "| S-1 | E-1 | - [ ] Design | | Ann | high | 1 | 2025-01-01 | 2025-02-01 | Improve onboarding |",
        );
        let mut props = HashMap::new();
        apply_row_heuristics(&cells, &mut props);
        assert_eq!(props.get("epic").map(String::as_str), Some("E-1"));
        assert_eq!(props.get("priority").map(String::as_str), Some("high"));
        assert_eq!(
            props.get("description").map(String::as_str),
            Some("Improve onboarding")
        );
    }

    #[test]
    fn subtask_row_sets_story_ref() {
        let cells = row("| SB-2 | S-1 | - [ ] Wire modal | | Bob | low | 2025-03-01 | 2025-03-05 | |");
        let mut props = HashMap::new();
        apply_row_heuristics(&cells, &mut props);
        assert_eq!(props.get("story").map(String::as_str), Some("S-1"));
        assert_eq!(props.get("epic"), None);
    }

    #[test]
    fn priority_stored_verbatim_first_match_wins() {
        let cells = row("| E-1 | - [ ] Build | Ann | P0 | low |");
        let mut props = HashMap::new();
        apply_row_heuristics(&cells, &mut props);
        assert_eq!(props.get("priority").map(String::as_str), Some("P0"));
    }

    #[test]
    fn description_skips_date_shaped_cells() {
        let cells = row("| E-1 | - [ ] Build | Ann | 2025-01-01 | 2025-06-30 | Ship the MVP |");
        let mut props = HashMap::new();
        apply_row_heuristics(&cells, &mut props);
        assert_eq!(props.get("description").map(String::as_str), Some("Ship the MVP"));
    }

    #[test]
    fn explicit_description_annotation_wins() {
        let cells = row("| E-1 | - [ ] Build | Ann | From the table |");
        let mut props = HashMap::new();
        props.insert("description".to_string(), "From the annotation".to_string());
        apply_row_heuristics(&cells, &mut props);
        assert_eq!(
            props.get("description").map(String::as_str),
            Some("From the annotation")
        );
    }

    #[test]
    fn strict_iso_validation() {
        assert!(is_iso_date("2025-08-01"));
        assert!(!is_iso_date("2025-13-01"));
        assert!(!is_iso_date("2025-00-10"));
        assert!(!is_iso_date("2025-01-32"));
        assert!(!is_iso_date("2025-1-2"));
        assert!(!is_iso_date("yesterday"));
    }
}
