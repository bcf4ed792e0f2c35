//! Field-level augmentation stages.
//!
//! Every stage implements [`Stage`](crate::stream::Stage) and shares the same
//! bounds policy: an index that does not exist in the current record is
//! skipped silently, since corpora mix records of different widths.

pub mod placeholder;
pub mod project;
pub mod sample;
pub mod truncate;
pub mod url_domain;

pub use placeholder::PlaceholderInjector;
pub use project::FieldProjector;
pub use sample::FieldSampler;
pub use truncate::{DocumentTruncator, keep_last_tokens, keep_trailing_segments};
pub use url_domain::{UrlDomain, network_location};
