//! Field projection: drop and reorder fields.

use crate::record::Record;
use crate::stream::Stage;

/// Keeps the listed fields, in list order. An empty list keeps everything.
///
/// Indices past the end of a record are skipped, so short records project
/// to fewer fields.
#[derive(Clone, Debug, Default)]
pub struct FieldProjector {
    keep: Vec<usize>,
}

impl FieldProjector {
    #[must_use]
    pub const fn new(keep: Vec<usize>) -> Self {
        Self { keep }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.keep.is_empty()
    }
}

impl Stage for FieldProjector {
    fn name(&self) -> &'static str {
        "keep_fields"
    }

    fn apply(&mut self, record: Record) -> Record {
        if self.is_identity() {
            return record;
        }
        self.keep
            .iter()
            .filter_map(|&idx| record.get(idx).cloned())
            .collect()
    }
}
