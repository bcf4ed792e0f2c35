//! Records and their line encoding.
//!
//! A [`Record`] is one row of a corpus shard: an ordered, growable list of
//! owned UTF-8 fields. Records in the same stream may have different
//! lengths, so every stage treats an index past the end as a no-op.

/// Field separator of the on-disk line format.
pub const FIELD_SEPARATOR: char = '\t';

/// One logical row: an ordered list of string fields.
pub type Record = Vec<String>;

/// Split one line (without its trailing newline) into fields.
///
/// ```
/// use corpus_stream::record::parse_line;
///
/// assert_eq!(parse_line("a\tb\t"), vec!["a", "b", ""]);
/// assert_eq!(parse_line(""), vec![""]);
/// ```
#[must_use]
pub fn parse_line(line: &str) -> Record {
    line.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

/// Join a record back into its tab-delimited line, without a newline.
#[must_use]
pub fn format_record(record: &[String]) -> String {
    record.join("\t")
}

/// Build a record from anything that yields string-like fields.
///
/// ```
/// use corpus_stream::record::record_from;
///
/// let r = record_from(["src", "tgt"]);
/// assert_eq!(r.len(), 2);
/// ```
pub fn record_from<I, S>(fields: I) -> Record
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fields.into_iter().map(Into::into).collect()
}
