//! Placeholder injection for records that lack some fields.
//!
//! Mixed corpora often combine sources of different widths (sentence pairs
//! next to documents with context). Injecting a constant at fixed positions
//! brings the narrower records to the common shape.

use crate::record::Record;
use crate::stream::Stage;

/// Default placeholder value.
pub const DEFAULT_PLACEHOLDER: &str = "<placeholder>";

/// Inserts a constant at each target index, in ascending index order.
///
/// Each insertion shifts later fields right. An index equal to the current
/// length appends; a larger one is skipped. Repeated indices insert once per
/// occurrence.
#[derive(Clone, Debug)]
pub struct PlaceholderInjector {
    placeholder: String,
    fields: Vec<usize>,
}

impl PlaceholderInjector {
    #[must_use]
    pub fn new(placeholder: impl Into<String>, mut fields: Vec<usize>) -> Self {
        fields.sort_unstable();
        Self {
            placeholder: placeholder.into(),
            fields,
        }
    }
}

impl Stage for PlaceholderInjector {
    fn name(&self) -> &'static str {
        "inject_placeholder"
    }

    fn apply(&mut self, mut record: Record) -> Record {
        for &idx in &self.fields {
            if idx <= record.len() {
                record.insert(idx, self.placeholder.clone());
            }
        }
        record
    }
}
