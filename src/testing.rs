//! Helpers for testing stages and pipelines.
//!
//! ```
//! use corpus_stream::testing::*;
//! use corpus_stream::stages::FieldProjector;
//! use corpus_stream::stream::RecordStreamExt;
//!
//! let out = collect_records(stream_of(&[&["a", "b"], &["c", "d"]]).through(FieldProjector::new(vec![1])))?;
//! assert_records_equal(&out, &records(&[&["b"], &["d"]]));
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::io::compression::auto_detect_writer;
use crate::record::{Record, format_record, record_from};
use crate::stream::{RecordStream, from_records};
use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build records from nested string slices.
#[must_use]
pub fn records(rows: &[&[&str]]) -> Vec<Record> {
    rows.iter().map(|row| record_from(row.iter().copied())).collect()
}

/// In-memory stream over `rows`.
#[must_use]
pub fn stream_of(rows: &[&[&str]]) -> RecordStream {
    from_records(records(rows))
}

/// Stream that yields `rows` and then one error carrying `message`.
#[must_use]
pub fn failing_stream(rows: &[&[&str]], message: &'static str) -> RecordStream {
    let head = records(rows).into_iter().map(Ok);
    Box::new(head.chain(std::iter::once_with(move || Err(anyhow!(message)))))
}

/// Drain a stream, stopping at the first error.
///
/// # Errors
/// Returns the first error the stream yields.
pub fn collect_records<I>(stream: I) -> Result<Vec<Record>>
where
    I: Iterator<Item = Result<Record>>,
{
    stream.collect()
}

/// Assert two record lists are equal, reporting the first differing row.
///
/// # Panics
/// Panics when lengths or any row differ.
pub fn assert_records_equal(actual: &[Record], expected: &[Record]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "record count mismatch:\n  expected {} rows: {expected:?}\n  actual {} rows: {actual:?}",
        expected.len(),
        actual.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(a, e, "row {i} differs:\n  expected: {e:?}\n  actual: {a:?}");
    }
}

/// Write `rows` as a TSV shard at `dir/name`, compressed according to the
/// file extension.
///
/// # Errors
/// Fails if the file cannot be created or written.
pub fn write_shard(dir: impl AsRef<Path>, name: &str, rows: &[&[&str]]) -> Result<PathBuf> {
    let path = dir.as_ref().join(name);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = auto_detect_writer(file, &path)?;
    for row in records(rows) {
        writeln!(writer, "{}", format_record(&row))?;
    }
    writer
        .close()
        .with_context(|| format!("finish {}", path.display()))?;
    Ok(path)
}
