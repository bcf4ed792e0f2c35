//! Lazy record streams and the [`Stage`] abstraction.
//!
//! A stream is any iterator of `anyhow::Result<Record>`. Nothing runs until
//! the consumer calls `next()`; each stage then pulls exactly one item from
//! its upstream, transforms it, and hands it on. Errors and end-of-stream
//! pass through every stage untouched.

use crate::record::Record;
use anyhow::Result;

/// A type-erased, single-pass record stream.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>>>;

/// A per-record transform applied lazily to a stream.
///
/// Implementations get the record by value and return it (possibly reshaped).
/// Field indices outside the record must be ignored, never reported.
pub trait Stage {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Transform one record.
    fn apply(&mut self, record: Record) -> Record;
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn apply(&mut self, record: Record) -> Record {
        (**self).apply(record)
    }
}

/// Iterator adapter produced by [`RecordStreamExt::through`].
pub struct Staged<I, S> {
    upstream: I,
    stage: S,
}

impl<I, S> Iterator for Staged<I, S>
where
    I: Iterator<Item = Result<Record>>,
    S: Stage,
{
    type Item = Result<Record>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        Some(item.map(|record| self.stage.apply(record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

/// Fluent stage composition on any record iterator.
///
/// ```
/// use corpus_stream::stream::{from_records, RecordStreamExt};
/// use corpus_stream::stages::FieldProjector;
///
/// let out: Vec<_> = from_records(vec![vec!["a".into(), "b".into()]])
///     .through(FieldProjector::new(vec![1]))
///     .collect::<anyhow::Result<_>>()
///     .unwrap();
/// assert_eq!(out, vec![vec!["b".to_string()]]);
/// ```
pub trait RecordStreamExt: Iterator<Item = Result<Record>> + Sized {
    /// Wrap this stream with `stage`.
    fn through<S: Stage>(self, stage: S) -> Staged<Self, S> {
        Staged {
            upstream: self,
            stage,
        }
    }

    /// Erase the concrete iterator type.
    fn boxed(self) -> RecordStream
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<I: Iterator<Item = Result<Record>>> RecordStreamExt for I {}

/// Wrap `stream` with every stage in order; the first stage sees records first.
#[must_use]
pub fn compose(stream: RecordStream, stages: Vec<Box<dyn Stage>>) -> RecordStream {
    stages
        .into_iter()
        .fold(stream, |upstream, stage| Box::new(upstream.through(stage)))
}

/// An in-memory stream over already-built records.
#[must_use]
pub fn from_records(records: Vec<Record>) -> RecordStream {
    Box::new(records.into_iter().map(Ok))
}
