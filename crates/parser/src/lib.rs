//! # Trackdown Parser
//!
//! Pure parsing helpers for loosely-structured, human-authored task text:
//! checklist bullets, pipe-table rows, `key:: value` annotations, and
//! emoji-coded dates.
//!
//! ## Pipeline
//!
//! ```text
//! Raw line(s)
//!     │
//!     ├──> Tokenizer (classify: table row / checklist / milestone header)
//!     │
//!     ├──> Annotation parser (key:: tokens, emoji dates)
//!     │
//!     ├──> Table heuristics (parent refs, priority, description)
//!     │
//!     └──> Assembler ──> one normalized Task
//! ```
//!
//! Everything here is a pure function of its input. Malformed content never
//! errors; it degrades to plain text and is excluded from the task set.

mod annotations;
mod assembler;
mod table;
mod tokenizer;

pub use annotations::{
    collect_emoji_dates, collect_keyed, keyed_tokens, parse_block, strip_keyed_tokens, KeyedToken,
};
pub use assembler::{assemble, trailing_anchor, BlockSource, EMPTY_TEXT_PLACEHOLDER};
pub use table::{apply_row_heuristics, is_iso_date, split_cells};
pub use tokenizer::{
    classify_line, is_checklist_start, is_milestone_header, is_pipe_row, is_table_task_row,
    normalize_line, LineKind,
};
