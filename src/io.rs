//! Corpus I/O: shard discovery, transparent decompression, and the
//! tab-separated record source.

pub mod compression;
pub mod glob;
pub mod tsv;

pub use tsv::{SourceOptions, TsvSource};
