use crate::error::Result;
use crate::mutation;
use crate::scanner::scan_document;
use crate::store::DocumentStore;
use std::collections::HashMap;
use std::sync::Arc;
use trackdown_model::{
    composite_key, DocumentHandle, IndexConfig, Milestone, ProjectEntry, Task, TaskChanges,
};

/// Handle returned by [`ProjectIndex::on_change`]; pass it back to
/// [`ProjectIndex::unsubscribe`] to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverCallback = Box<dyn Fn() + Send + Sync>;

/// One fully built generation of the index. Replaced wholesale on every
/// `reindex`; never patched field-by-field, so readers either see the old
/// generation or the new one, nothing in between.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSnapshot {
    /// Document path → project entry.
    pub projects: HashMap<String, ProjectEntry>,

    /// Composite key (`documentPath::lowercasedId`) → task. When the same id
    /// recurs in one document the later occurrence wins here, while both stay
    /// in the project's task list.
    pub tasks: HashMap<String, Task>,

    pub milestones: Vec<Milestone>,
}

/// Single source of truth for the entity graph extracted from all project
/// documents. Holds the store handle, the current snapshot, and the observer
/// registry.
///
/// All mutation goes through `&mut self`, so overlapping `reindex` calls are
/// serialized by the borrow checker; the only suspension points are store
/// reads and writes.
pub struct ProjectIndex {
    store: Arc<dyn DocumentStore>,
    config: IndexConfig,
    snapshot: IndexSnapshot,
    observers: Vec<(ObserverId, ObserverCallback)>,
    next_observer: u64,
}

impl ProjectIndex {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: IndexConfig) -> Self {
        Self {
            store,
            config,
            snapshot: IndexSnapshot::default(),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Path → project entry for the current generation.
    #[must_use]
    pub fn projects(&self) -> &HashMap<String, ProjectEntry> {
        &self.snapshot.projects
    }

    /// Composite key → task for the current generation.
    #[must_use]
    pub fn tasks(&self) -> &HashMap<String, Task> {
        &self.snapshot.tasks
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.snapshot.milestones
    }

    /// Tasks of one project in scan order, empty for unknown paths.
    #[must_use]
    pub fn get_project_tasks(&self, path: &str) -> &[Task] {
        self.snapshot
            .projects
            .get(path)
            .map_or(&[], |entry| entry.tasks.as_slice())
    }

    /// Exact composite-key match first, then a linear fallback over composite
    /// keys whose id suffix equals the lowercased bare id. The fallback's
    /// match order across documents is unspecified; callers that need a
    /// specific document should use the composite key.
    #[must_use]
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        if let Some(task) = self.snapshot.tasks.get(id) {
            return Some(task);
        }
        let bare = id.to_lowercase();
        self.snapshot
            .tasks
            .iter()
            .find(|(key, _)| {
                key.rfind("::")
                    .is_some_and(|split| key[split + 2..] == bare)
            })
            .map(|(_, task)| task)
    }

    /// Register a zero-argument callback fired synchronously after every
    /// completed rebuild, in registration order. Observers never see a
    /// partially rebuilt index.
    pub fn on_change(&mut self, callback: impl Fn() + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) {
        self.observers.retain(|(observer, _)| *observer != id);
    }

    /// Rebuild the whole index from scratch: enumerate documents, keep the
    /// ones flagged as projects, scan each, then swap the finished snapshot
    /// in and notify observers. On error the previous snapshot stays current.
    pub async fn reindex(&mut self) -> Result<()> {
        let handles = self.store.list().await?;
        let mut next = IndexSnapshot::default();
        let mut scanned = 0usize;

        for handle in handles {
            if !self.is_project(&handle) {
                continue;
            }
            let doc = self.store.read(&handle.path).await?;
            let outcome = scan_document(&doc, &self.config);
            for task in &outcome.entry.tasks {
                next.tasks.insert(task.composite_key(), task.clone());
            }
            next.milestones.extend(outcome.milestones);
            next.projects.insert(handle.path.clone(), outcome.entry);
            scanned += 1;
        }

        log::info!(
            "Reindexed {scanned} projects: {} tasks, {} milestones",
            next.tasks.len(),
            next.milestones.len()
        );
        self.snapshot = next;
        for (_, callback) in &self.observers {
            callback();
        }
        Ok(())
    }

    /// Apply a single-task field update: rewrite the touched line(s) in the
    /// owning document, persist the full replacement text, then rebuild the
    /// index unconditionally. Silently no-ops when the id is unknown; callers
    /// that must distinguish should check [`ProjectIndex::get_task`] first.
    pub async fn update_task(&mut self, id: &str, changes: &TaskChanges) -> Result<()> {
        let Some(task) = self.get_task(id).cloned() else {
            log::debug!("update_task: unknown id {id}, ignoring");
            return Ok(());
        };
        if changes.is_empty() {
            return Ok(());
        }

        let doc = self.store.read(&task.doc_path).await?;
        let Some(rewritten) = mutation::apply_changes(&doc.text, &task, changes) else {
            log::warn!(
                "update_task: stale line anchor {} for {} in {}, ignoring",
                task.line_index,
                task.id,
                task.doc_path
            );
            return Ok(());
        };
        self.store.write(&task.doc_path, &rewritten).await?;
        self.reindex().await
    }

    /// Write the configured status property on a task. Deliberately does not
    /// touch the checkbox glyph: the glyph stays the authoritative source for
    /// `Task::status`, and this annotation rides alongside it.
    pub async fn move_task_to_status(&mut self, id: &str, status: &str) -> Result<()> {
        let key = self.config.status_property.clone();
        self.update_task(id, &TaskChanges::property(key, status))
            .await
    }

    fn is_project(&self, handle: &DocumentHandle) -> bool {
        handle
            .properties
            .get(&self.config.project_flag_property)
            .is_some_and(|value| {
                matches!(value.to_lowercase().as_str(), "true" | "yes" | "1")
            })
    }

    /// Composite key for a task in this index.
    #[must_use]
    pub fn key_for(&self, doc_path: &str, id: &str) -> String {
        composite_key(doc_path, id)
    }
}
