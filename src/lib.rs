//! # corpus-stream
//!
//! Lazy, pull-based preparation of training corpora. Tab-delimited records
//! stream from (compressed) shards through a chain of field-level
//! augmentation stages, and several weighted sources can be interleaved into
//! one output stream. Nothing is materialized: each output record is produced
//! only when the consumer asks for it.
//!
//! ## Core Concepts
//!
//! - [`Record`] - one row, an ordered list of string fields of any width
//! - [`RecordStream`] - a single-pass iterator of `anyhow::Result<Record>`
//! - [`Stage`] - a per-record transform, attached with
//!   [`through`](RecordStreamExt::through) or [`compose`]
//! - [`Mixer`] - weighted interleaving of several streams
//! - [`Pipeline`] - a named recipe from the [`pipelines`] registry bound to
//!   source locations and a [`PipelineConfig`]
//!
//! ## Stages
//!
//! - [`FieldSampler`] - replace a delimited list with one random element
//! - [`UrlDomain`] - reduce a URL to its network location
//! - [`DocumentTruncator`] - keep a random-length trailing run of whole segments
//! - [`PlaceholderInjector`] - insert constant fields to even out record shapes
//! - [`FieldProjector`] - drop and reorder fields
//!
//! Every stage ignores field indices that a record does not have.
//!
//! ## Example
//!
//! ```
//! use corpus_stream::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn main() -> anyhow::Result<()> {
//! let rows = vec![
//!     record_from(["hello", "hallo,servus", "https://example.org/page"]),
//!     record_from(["bye", "tschuess"]),
//! ];
//!
//! let out: Vec<Record> = from_records(rows)
//!     .through(FieldSampler::new(vec![1], ",", StdRng::seed_from_u64(1))?)
//!     .through(UrlDomain::new(Some(2)))
//!     .through(FieldProjector::new(vec![2, 0]))
//!     .collect::<anyhow::Result<_>>()?;
//!
//! assert_eq!(out[0], vec!["example.org", "hello"]);
//! assert_eq!(out[1], vec!["bye"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a registered pipeline
//!
//! ```no_run
//! use corpus_stream::{Pipeline, PipelineConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PipelineConfig { url_domain_field: 2, ..Default::default() };
//! let stream = Pipeline::build("sample_from_fields", vec!["corpus/".into()], config)?
//!     .into_stream()?;
//! for record in stream.take(10) {
//!     println!("{}", corpus_stream::record::format_record(&record?));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod io;
pub mod mixer;
pub mod pipeline;
pub mod pipelines;
pub mod record;
pub mod stages;
pub mod stream;
pub mod testing;

pub use config::{PipelineConfig, RngSeeder, SeedDomain};
pub use io::{SourceOptions, TsvSource};
pub use mixer::Mixer;
pub use pipeline::{Pipeline, compose_streams};
pub use pipelines::{PipelineSpec, REGISTRY, SourceSpec, lookup};
pub use record::{Record, record_from};
pub use stages::{DocumentTruncator, FieldProjector, FieldSampler, PlaceholderInjector, UrlDomain};
pub use stream::{RecordStream, RecordStreamExt, Stage, compose, from_records};
