//! Replace list-valued fields with one uniformly chosen element.

use crate::record::Record;
use crate::stream::Stage;
use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// Splits each target field on a delimiter and keeps one random piece.
///
/// A field without the delimiter (including an empty field) splits into
/// itself, so it comes out unchanged. Indices are handled independently in
/// the order given.
pub struct FieldSampler {
    fields: Vec<usize>,
    delimiter: String,
    rng: StdRng,
}

impl FieldSampler {
    /// Build a sampler over `fields`.
    ///
    /// # Errors
    /// Fails if `delimiter` is empty.
    pub fn new(fields: Vec<usize>, delimiter: impl Into<String>, rng: StdRng) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            bail!("sample delimiter must not be empty");
        }
        Ok(Self {
            fields,
            delimiter,
            rng,
        })
    }
}

impl Stage for FieldSampler {
    fn name(&self) -> &'static str {
        "sample_fields"
    }

    fn apply(&mut self, mut record: Record) -> Record {
        for &idx in &self.fields {
            let Some(field) = record.get_mut(idx) else {
                continue;
            };
            if !field.contains(self.delimiter.as_str()) {
                continue;
            }
            let candidates: Vec<&str> = field.split(self.delimiter.as_str()).collect();
            let picked = candidates.choose(&mut self.rng).map(|s| (*s).to_string());
            if let Some(picked) = picked {
                *field = picked;
            }
        }
        record
    }
}
