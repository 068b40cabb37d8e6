use crate::tokenizer::normalize_line;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

/// `key::` marker. The value is everything from the marker to the next pipe,
/// the next marker, or line end — resolved by [`keyed_tokens`], since several
/// tokens routinely share one attribute line.
static KEY_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z0-9_-]+)::\s*").unwrap());

/// Emoji date token: glyph, optional variation selector, then an ISO date.
/// Whitespace (including newlines; non-breaking spaces are normalized away
/// beforehand) may intervene.
static EMOJI_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(🔜|⏳|🛫|📅|✅)\x{FE0F}?\s*(\d{4}-\d{2}-\d{2})").unwrap()
});

pub(crate) fn emoji_property(glyph: &str) -> &'static str {
    match glyph {
        "🔜" | "⏳" | "🛫" => "start",
        "📅" => "due",
        _ => "done",
    }
}

/// One `key:: value` token located on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedToken {
    /// Lowercased key.
    pub key: String,
    /// Byte span of the whole token (marker through value), suitable for
    /// in-place removal or replacement.
    pub span: Range<usize>,
    /// Byte span of the raw (untrimmed) value.
    pub value_span: Range<usize>,
}

impl KeyedToken {
    #[must_use]
    pub fn value<'a>(&self, line: &'a str) -> &'a str {
        line[self.value_span.clone()].trim()
    }
}

/// Locate every `key:: value` token on one line. Values run to the next pipe
/// character, the next `key::` marker, or line end, whichever comes first.
#[must_use]
pub fn keyed_tokens(line: &str) -> Vec<KeyedToken> {
    let mut marks: Vec<(usize, usize, String)> = Vec::new();
    for caps in KEY_MARK.captures_iter(line) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        marks.push((whole.start(), whole.end(), caps[1].to_lowercase()));
    }

    let mut tokens = Vec::with_capacity(marks.len());
    for (idx, (start, value_start, key)) in marks.iter().enumerate() {
        let mut value_end = marks
            .get(idx + 1)
            .map_or(line.len(), |(next_start, _, _)| *next_start);
        if let Some(pipe) = line[*value_start..value_end].find('|') {
            value_end = value_start + pipe;
        }
        // Trailing separator whitespace belongs to the line, not the value.
        value_end = value_start + line[*value_start..value_end].trim_end().len();
        tokens.push(KeyedToken {
            key: key.clone(),
            span: *start..value_end,
            value_span: *value_start..value_end,
        });
    }
    tokens
}

/// Extract every `key:: value` token from the block into `props`.
///
/// Keys are lowercased; later occurrences of the same key overwrite earlier
/// ones within this single pass.
pub fn collect_keyed(block: &str, props: &mut HashMap<String, String>) {
    for line in block.lines() {
        let line = normalize_line(line);
        for token in keyed_tokens(&line) {
            props.insert(token.key.clone(), token.value(&line).to_string());
        }
    }
}

/// Extract emoji-coded dates from the full multi-line block into `props`.
///
/// 🔜/⏳/🛫 map to `start`, 📅 to `due`, ✅ to `done`. Runs after the keyed
/// pass and overwrites `start`/`due` set there: the emoji token is closer to
/// the end-user-visible text, so it wins on conflict.
pub fn collect_emoji_dates(block: &str, props: &mut HashMap<String, String>) {
    let block = if block.contains('\u{00A0}') {
        block.replace('\u{00A0}', " ")
    } else {
        block.to_string()
    };
    for caps in EMOJI_DATE.captures_iter(&block) {
        let key = emoji_property(&caps[1]);
        props.insert(key.to_string(), caps[2].to_string());
    }
}

/// Run both passes over one block and return the merged property bag.
#[must_use]
pub fn parse_block(block: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    collect_keyed(block, &mut props);
    collect_emoji_dates(block, &mut props);
    props
}

/// Remove every `key:: value` token from one line.
#[must_use]
pub fn strip_keyed_tokens(line: &str) -> String {
    let mut out = line.to_string();
    for token in keyed_tokens(line).into_iter().rev() {
        out.replace_range(token.span, "");
    }
    out
}
