//! # Trackdown Indexer
//!
//! In-memory index of project-management entities (epics, stories, subtasks,
//! milestones) extracted from checkbox items and pipe tables in free-form
//! text documents, kept in sync with the on-disk text as both are edited.
//!
//! ## Pipeline
//!
//! ```text
//! DocumentStore
//!     │
//!     ├──> Document Scanner (structured walk + raw-line fallback, deduped)
//!     │      └─> Tasks + Milestones per document
//!     │
//!     ├──> Project Index (composite-key lookups, rollups, observers)
//!     │
//!     └──> Mutation Gateway (line rewrite + full reindex)
//! ```
//!
//! The index is rebuilt wholesale on every [`ProjectIndex::reindex`]; task
//! references do not stay valid across a rebuild, so consumers re-fetch.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trackdown_indexer::{MemoryStore, ProjectIndex};
//! use trackdown_model::IndexConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryStore::new();
//!     store
//!         .put(
//!             "plans/q3.md",
//!             "---\nproject: true\n---\n- [ ] E-1 Build API\n  due:: 2025-08-01\n",
//!         )
//!         .await;
//!
//!     let mut index = ProjectIndex::new(Arc::new(store), IndexConfig::default());
//!     index.reindex().await?;
//!
//!     let task = index.get_task("e-1").expect("indexed");
//!     println!("{} due {:?}", task.text, task.properties.get("due"));
//!     Ok(())
//! }
//! ```

mod error;
mod index;
mod mutation;
mod scanner;
mod store;

pub use error::{IndexError, Result};
pub use index::{IndexSnapshot, ObserverId, ProjectIndex};
pub use mutation::apply_changes;
pub use scanner::{scan_document, ScanOutcome};
pub use store::{parse_front_matter, DocumentStore, MemoryStore};
