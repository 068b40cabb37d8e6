use std::collections::HashSet;
use trackdown_model::{DocumentSnapshot, IndexConfig, Milestone, ProjectEntry, Task};
use trackdown_parser::{
    assemble, is_iso_date, is_milestone_header, is_pipe_row, is_table_task_row, split_cells,
    BlockSource,
};

/// Result of scanning one project document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub entry: ProjectEntry,
    pub milestones: Vec<Milestone>,
}

/// Walk one document's full line list and assemble every task-shaped block
/// exactly once.
///
/// Two independent strategies run over the same lines: the host-provided
/// structured-item walk, then a raw-line fallback walk that rescues
/// table-embedded rows the host surface failed to expose. Both record primary
/// line indices in one seen-set, so no line ever produces two task records.
#[must_use]
pub fn scan_document(doc: &DocumentSnapshot, config: &IndexConfig) -> ScanOutcome {
    let lines: Vec<&str> = doc.text.lines().collect();
    let mut tasks: Vec<Task> = Vec::new();
    let mut seen: HashSet<usize> = HashSet::new();

    for item in &doc.items {
        if item.line >= lines.len() || seen.contains(&item.line) {
            continue;
        }
        seen.insert(item.line);
        let end = item.end_line.min(lines.len() - 1).max(item.line);
        let block = lines[item.line..=end].join("\n");
        let src = BlockSource {
            doc_path: &doc.path,
            line_index: item.line,
            primary: lines[item.line],
            block: &block,
            item_id: item.block_id.as_deref(),
            item_checked: item.checked,
            from_structured_walk: true,
        };
        if let Some(task) = assemble(&src) {
            tasks.push(task);
        }
    }

    for (idx, line) in lines.iter().enumerate() {
        if seen.contains(&idx) || !is_table_task_row(line) {
            continue;
        }
        let src = BlockSource {
            doc_path: &doc.path,
            line_index: idx,
            primary: line,
            block: line,
            item_id: None,
            item_checked: None,
            from_structured_walk: false,
        };
        if let Some(task) = assemble(&src) {
            seen.insert(idx);
            tasks.push(task);
        }
    }

    let milestones = scan_milestones(&doc.path, &lines);

    let total = tasks.len();
    let done = tasks.iter().filter(|task| task.is_checked).count();
    let percent_complete = if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    };

    let next_due_date = tasks
        .iter()
        .filter(|task| !task.is_checked)
        .filter_map(|task| task.properties.get(&config.due_property))
        .filter(|value| is_iso_date(value))
        .min()
        .cloned();

    log::debug!(
        "Scanned {}: {} tasks ({} done), {} milestones",
        doc.path,
        total,
        done,
        milestones.len()
    );

    ScanOutcome {
        entry: ProjectEntry {
            doc_path: doc.path.clone(),
            tasks,
            percent_complete,
            next_due_date,
        },
        milestones,
    }
}

/// Milestone sub-scan: each "Title"+"Date" header opens a run of pipe rows
/// ending at the first non-pipe line. A row needs at least 4 cells and a
/// valid ISO date in cell 3; divider rows fail the date check and drop out.
fn scan_milestones(doc_path: &str, lines: &[&str]) -> Vec<Milestone> {
    let mut milestones = Vec::new();
    let mut idx = 0;
    while idx < lines.len() {
        if !is_milestone_header(lines[idx]) {
            idx += 1;
            continue;
        }
        let mut row = idx + 1;
        while row < lines.len() && is_pipe_row(lines[row]) {
            let cells = split_cells(lines[row]);
            if cells.len() >= 4 && is_iso_date(&cells[3]) {
                milestones.push(Milestone {
                    id: cells[0].clone(),
                    title: cells[1].clone(),
                    date: cells[3].clone(),
                    description: cells.get(4).filter(|d| !d.is_empty()).cloned(),
                    doc_path: doc_path.to_string(),
                });
            }
            row += 1;
        }
        idx = row;
    }
    milestones
}
