use crate::error::{IndexError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use trackdown_model::{DocumentHandle, DocumentSnapshot, ListItem};
use trackdown_parser::{is_checklist_start, normalize_line, trailing_anchor};

/// Storage seam. The engine is handed raw text and returns edits as full
/// replacement text; reading and writing are the only suspension points.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every known document, with its front-matter-equivalent properties.
    async fn list(&self) -> Result<Vec<DocumentHandle>>;

    /// Full snapshot of one document: raw text plus host-provided structured
    /// list items. The item list may be empty or partial for table-embedded
    /// checkboxes; the scanner's fallback walk covers those.
    async fn read(&self, path: &str) -> Result<DocumentSnapshot>;

    /// Replace the document's full text.
    async fn write(&self, path: &str, text: &str) -> Result<()>;
}

static DONE_GLYPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[xX]\]").unwrap());

/// In-memory store emulating the host metadata layer: front matter becomes
/// handle properties, checklist lines become structured items with
/// continuation-aware end lines and trailing `^block-id` anchors.
///
/// Table-embedded checkboxes are deliberately not surfaced as items, matching
/// real host surfaces, so the scanner's dual-walk dedup path is exercised.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document.
    pub async fn put(&self, path: impl Into<String>, text: impl Into<String>) {
        self.docs.write().await.insert(path.into(), text.into());
    }

    pub async fn remove(&self, path: &str) {
        self.docs.write().await.remove(path);
    }

    /// Current raw text, if the document exists.
    pub async fn text(&self, path: &str) -> Option<String> {
        self.docs.read().await.get(path).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self) -> Result<Vec<DocumentHandle>> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .map(|(path, text)| DocumentHandle {
                path: path.clone(),
                properties: parse_front_matter(text),
            })
            .collect())
    }

    async fn read(&self, path: &str) -> Result<DocumentSnapshot> {
        let docs = self.docs.read().await;
        let text = docs
            .get(path)
            .ok_or_else(|| IndexError::DocumentMissing(path.to_string()))?;
        Ok(DocumentSnapshot {
            path: path.to_string(),
            text: text.clone(),
            items: derive_items(text),
        })
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        self.docs
            .write()
            .await
            .insert(path.to_string(), text.to_string());
        Ok(())
    }
}

/// Minimal `---` front matter block: `key: value` per line, keys lowercased.
#[must_use]
pub fn parse_front_matter(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    let mut lines = text.lines();
    if lines.next().map(str::trim) != Some("---") {
        return props;
    }
    for line in lines {
        if line.trim() == "---" {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase();
            if !key.is_empty() {
                props.insert(key, value.trim().to_string());
            }
        }
    }
    props
}

/// Derive structured checklist items the way a host surface would: one item
/// per checkbox line, extended over indented continuation lines.
fn derive_items(text: &str) -> Vec<ListItem> {
    let lines: Vec<&str> = text.lines().collect();
    let mut items = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        if !is_checklist_start(line) {
            continue;
        }
        let mut end = idx;
        while end + 1 < lines.len() && is_continuation(lines[end + 1]) {
            end += 1;
        }
        items.push(ListItem {
            line: idx,
            end_line: end,
            block_id: trailing_anchor(line),
            checked: Some(DONE_GLYPH.is_match(&normalize_line(line))),
        });
    }
    items
}

fn is_continuation(line: &str) -> bool {
    !line.trim().is_empty()
        && line.starts_with(|c: char| c.is_whitespace())
        && !is_checklist_start(line)
}
