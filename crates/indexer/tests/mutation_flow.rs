use pretty_assertions::assert_eq;
use std::sync::Arc;
use trackdown_indexer::{MemoryStore, ProjectIndex};
use trackdown_model::{IndexConfig, TaskChanges, TaskStatus};

const PLAN: &str = concat!(
    "---\n",
    "project: true\n",
    "---\n",
    "- [ ] E-1 Build API\n",
    "  due:: 2025-08-01\n",
    "  assignee:: Ann\n",
    "- [ ] E-2 Write RFC ^e-2\n",
);

async fn build(store: Arc<MemoryStore>) -> ProjectIndex {
    let mut index = ProjectIndex::new(store, IndexConfig::default());
    index.reindex().await.expect("reindex");
    index
}

#[tokio::test]
async fn property_update_persists_and_survives_reindex() {
    let store = Arc::new(MemoryStore::new());
    store.put("plans/q3.md", PLAN).await;
    let mut index = build(Arc::clone(&store)).await;

    let untouched_before = index.get_task("e-2").expect("e-2").clone();

    index
        .update_task("e-1", &TaskChanges::property("due", "2025-03-03"))
        .await
        .expect("update");

    let task = index.get_task("e-1").expect("e-1");
    assert_eq!(task.properties.get("due").map(String::as_str), Some("2025-03-03"));
    assert_eq!(task.properties.get("assignee").map(String::as_str), Some("Ann"));

    // No other task changed.
    assert_eq!(index.get_task("e-2").expect("e-2"), &untouched_before);

    // The rewrite touched only the attribute line directly below the task.
    let text = store.text("plans/q3.md").await.expect("doc");
    assert!(text.contains("- [ ] E-1 Build API\n  due:: 2025-03-03\n  assignee:: Ann\n"));
}

#[tokio::test]
async fn checked_update_swaps_the_glyph_and_rolls_up() {
    let store = Arc::new(MemoryStore::new());
    store.put("plans/q3.md", PLAN).await;
    let mut index = build(Arc::clone(&store)).await;

    let changes = TaskChanges {
        checked: Some(true),
        ..TaskChanges::default()
    };
    index.update_task("e-1", &changes).await.expect("update");

    let task = index.get_task("e-1").expect("e-1");
    assert!(task.is_checked);
    assert_eq!(task.status, TaskStatus::Done);

    let entry = index.projects().get("plans/q3.md").expect("project");
    assert_eq!(entry.percent_complete, 0.5);
    // E-1 is checked now, so its due date drops out of the rollup.
    assert_eq!(entry.next_due_date, None);
}

#[tokio::test]
async fn text_update_preserves_the_block_anchor() {
    let store = Arc::new(MemoryStore::new());
    store.put("plans/q3.md", PLAN).await;
    let mut index = build(Arc::clone(&store)).await;

    let changes = TaskChanges {
        text: Some("E-2 Publish RFC".to_string()),
        ..TaskChanges::default()
    };
    index.update_task("e-2", &changes).await.expect("update");

    let text = store.text("plans/q3.md").await.expect("doc");
    assert!(text.contains("- [ ] E-2 Publish RFC ^e-2\n"));

    // The anchor still resolves the task after the rewrite.
    let task = index.get_task("e-2").expect("e-2");
    assert_eq!(task.text, "E-2 Publish RFC");
}

#[tokio::test]
async fn move_to_status_writes_the_property_not_the_glyph() {
    let store = Arc::new(MemoryStore::new());
    store.put("plans/q3.md", PLAN).await;
    let mut index = build(Arc::clone(&store)).await;

    index
        .move_task_to_status("e-1", "on-hold")
        .await
        .expect("move");

    let task = index.get_task("e-1").expect("e-1");
    // The status property and the checkbox glyph are independent signals;
    // the glyph stays authoritative for `status`.
    assert_eq!(task.properties.get("status").map(String::as_str), Some("on-hold"));
    assert_eq!(task.status, TaskStatus::NotStarted);
    assert!(!task.is_checked);
}

#[tokio::test]
async fn unknown_id_is_a_silent_noop_and_index_is_unchanged() {
    let store = Arc::new(MemoryStore::new());
    store.put("plans/q3.md", PLAN).await;
    let mut index = build(Arc::clone(&store)).await;

    let before = store.text("plans/q3.md").await.expect("doc");
    index
        .update_task("ghost-9", &TaskChanges::property("due", "2030-01-01"))
        .await
        .expect("noop");
    assert_eq!(store.text("plans/q3.md").await.expect("doc"), before);
}

#[tokio::test]
async fn custom_config_keys_drive_flagging_and_rollup() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            "boards/roadmap.md",
            "---\ntracked: true\n---\n- [ ] E-1 Launch\n  deadline:: 2025-10-01\n",
        )
        .await;

    let config = IndexConfig {
        project_flag_property: "tracked".to_string(),
        status_property: "stage".to_string(),
        due_property: "deadline".to_string(),
    };
    let mut index = ProjectIndex::new(store.clone(), config);
    index.reindex().await.expect("reindex");

    let entry = index.projects().get("boards/roadmap.md").expect("flagged");
    assert_eq!(entry.next_due_date.as_deref(), Some("2025-10-01"));

    index
        .move_task_to_status("e-1", "doing")
        .await
        .expect("move");
    let task = index.get_task("e-1").expect("e-1");
    assert_eq!(task.properties.get("stage").map(String::as_str), Some("doing"));
}
