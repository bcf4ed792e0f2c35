//! Document-aware truncation.
//!
//! Document-shaped fields hold several segments (lines, sentences) joined by
//! a separator such as `<docline>`. Truncation keeps the shortest trailing
//! run of whole segments that reaches a randomly drawn token budget, so the
//! model sees contexts of varying length that always end at the current
//! sentence.

use crate::record::Record;
use crate::stream::Stage;
use anyhow::{Result, bail};
use rand::Rng;
use rand::rngs::StdRng;

/// Default upper bound for the sampled token budget.
pub const DEFAULT_MAX_N: usize = 512;

/// Keep the last `n` whitespace tokens of `text`, joined by single spaces.
///
/// ```
/// use corpus_stream::stages::keep_last_tokens;
///
/// assert_eq!(keep_last_tokens("a  b c\td", 2), "c d");
/// assert_eq!(keep_last_tokens("a b", 10), "a b");
/// ```
#[must_use]
pub fn keep_last_tokens(text: &str, n: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let start = tokens.len().saturating_sub(n);
    tokens[start..].join(" ")
}

/// Keep the minimal trailing run of whole `separator`-delimited segments
/// whose whitespace-token count is at least `n`.
///
/// Segments are stripped and re-joined with `" {separator} "`; the separator
/// tokens themselves count toward `n`. If the whole text is shorter than `n`,
/// every segment is kept.
///
/// ```
/// use corpus_stream::stages::keep_trailing_segments;
///
/// let doc = "one two <docline> three <docline> four five";
/// assert_eq!(keep_trailing_segments(doc, "<docline>", 2), "four five");
/// assert_eq!(keep_trailing_segments(doc, "<docline>", 3), "three <docline> four five");
/// ```
#[must_use]
pub fn keep_trailing_segments(text: &str, separator: &str, n: usize) -> String {
    let separator_tokens = separator.split_whitespace().count();
    let mut segments = text.rsplit(separator);

    // rsplit always yields at least one (possibly empty) segment
    let mut kept = segments.next().unwrap_or_default().trim().to_string();
    let mut tokens = kept.split_whitespace().count();

    while tokens < n {
        let Some(segment) = segments.next() else {
            break;
        };
        let segment = segment.trim();
        tokens += segment.split_whitespace().count() + separator_tokens;
        kept = format!("{segment} {separator} {kept}");
    }
    kept
}

/// Truncates each target field to a randomly sized trailing context.
///
/// A fresh budget `n ~ U[1, max_n]` is drawn for every (record, field) pair.
/// With a single-space separator, segment boundaries are ignored and exactly
/// the last `n` tokens are kept.
pub struct DocumentTruncator {
    fields: Vec<usize>,
    max_n: usize,
    separator: String,
    rng: StdRng,
}

impl DocumentTruncator {
    /// # Errors
    /// Fails if `max_n` is zero or `separator` is empty.
    pub fn new(
        fields: Vec<usize>,
        max_n: usize,
        separator: impl Into<String>,
        rng: StdRng,
    ) -> Result<Self> {
        let separator = separator.into();
        if max_n == 0 {
            bail!("max_n must be at least 1");
        }
        if separator.is_empty() {
            bail!("document separator must not be empty");
        }
        Ok(Self {
            fields,
            max_n,
            separator,
            rng,
        })
    }

    fn truncate(&self, text: &str, n: usize) -> String {
        if self.separator == " " {
            keep_last_tokens(text, n)
        } else {
            keep_trailing_segments(text, &self.separator, n)
        }
    }
}

impl Stage for DocumentTruncator {
    fn name(&self) -> &'static str {
        "truncate_document"
    }

    fn apply(&mut self, mut record: Record) -> Record {
        for &idx in &self.fields {
            if idx >= record.len() {
                continue;
            }
            let n = self.rng.random_range(1..=self.max_n);
            record[idx] = self.truncate(&record[idx], n);
        }
        record
    }
}
