//! Typed pipeline options.
//!
//! One [`PipelineConfig`] parameterizes every stage of a pipeline. Missing
//! keys take their defaults, so a JSON file only needs the options it
//! changes:
//!
//! ```
//! use corpus_stream::config::PipelineConfig;
//!
//! let cfg = PipelineConfig::from_json_str(r#"{ "sample_fields": [2], "url_domain_field": 3 }"#)?;
//! assert_eq!(cfg.sample_fields, vec![2]);
//! assert_eq!(cfg.delimiter, ",");
//! assert_eq!(cfg.url_domain_index(), Some(3));
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::stages::placeholder::DEFAULT_PLACEHOLDER;
use crate::stages::truncate::DEFAULT_MAX_N;
use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Options shared by all built-in pipelines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Delimiter for list-valued fields.
    pub delimiter: String,
    /// Fields to sample one list element from.
    pub sample_fields: Vec<usize>,
    /// Field to reduce to its URL domain; `-1` disables.
    pub url_domain_field: i64,
    /// Fields to keep, in output order; empty keeps all.
    pub keep_fields: Vec<usize>,
    /// Fields to truncate to a random trailing context; empty disables.
    pub truncate_fields: Vec<usize>,
    /// Upper bound of the sampled token budget.
    pub max_n: usize,
    /// Segment separator inside document fields; `" "` means plain tokens.
    pub doc_separator: String,
    pub placeholder: String,
    pub placeholder_fields: Vec<usize>,
    /// Per-source weights; `None` uses the pipeline's defaults.
    pub weights: Option<Vec<f64>>,
    pub seed: Option<u64>,
    pub shuffle_shards: bool,
    /// Cycle over each source's shards forever.
    pub repeat: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            sample_fields: vec![1],
            url_domain_field: -1,
            keep_fields: Vec::new(),
            truncate_fields: Vec::new(),
            max_n: DEFAULT_MAX_N,
            doc_separator: " ".to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            placeholder_fields: Vec::new(),
            weights: None,
            seed: None,
            shuffle_shards: false,
            repeat: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    ///
    /// # Errors
    /// Fails on malformed JSON or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parse pipeline config")
    }

    /// Load a JSON config file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// URL-domain field as an index, or `None` when disabled.
    #[must_use]
    pub fn url_domain_index(&self) -> Option<usize> {
        usize::try_from(self.url_domain_field).ok()
    }

    /// Check every option once, for a pipeline with `sources` inputs.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self, sources: usize) -> Result<()> {
        if self.delimiter.is_empty() {
            bail!("delimiter must not be empty");
        }
        if self.url_domain_field < -1 {
            bail!(
                "url_domain_field must be a field index or -1, got {}",
                self.url_domain_field
            );
        }
        if self.max_n == 0 {
            bail!("max_n must be at least 1");
        }
        if self.doc_separator.is_empty() {
            bail!("doc_separator must not be empty");
        }
        if let Some(weights) = &self.weights {
            if weights.len() != sources {
                bail!(
                    "got {} weights for a pipeline with {} source(s)",
                    weights.len(),
                    sources
                );
            }
            if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
                bail!("weights must be finite and positive, got {bad}");
            }
            if !weights.iter().sum::<f64>().is_finite() {
                bail!("weights overflow when summed");
            }
        }
        Ok(())
    }

    /// Generator factory for this configuration's seed.
    #[must_use]
    pub const fn seeder(&self) -> RngSeeder {
        RngSeeder::new(self.seed)
    }
}

/// Hands out one independent generator per consumer.
///
/// Seeded configurations derive every generator from the seed and a running
/// counter, so a given pipeline layout replays the same draws. Unseeded ones
/// draw each generator from OS entropy.
///
/// Consumers that must never share a generator with the stages (shard
/// shuffling, for one) take their own [`SeedDomain`].
#[derive(Clone, Debug)]
pub struct RngSeeder {
    seed: Option<u64>,
    domain: SeedDomain,
    issued: u64,
}

/// Independent generator sequences derived from one seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedDomain {
    Stages,
    ShardOrder,
}

impl SeedDomain {
    const fn tag(self) -> u64 {
        match self {
            Self::Stages => 0,
            Self::ShardOrder => 1,
        }
    }
}

impl RngSeeder {
    #[must_use]
    pub const fn new(seed: Option<u64>) -> Self {
        Self::with_domain(seed, SeedDomain::Stages)
    }

    #[must_use]
    pub const fn with_domain(seed: Option<u64>, domain: SeedDomain) -> Self {
        Self {
            seed,
            domain,
            issued: 0,
        }
    }

    /// Next generator in the sequence.
    pub fn next_rng(&mut self) -> StdRng {
        let stream = self.issued;
        self.issued += 1;
        match self.seed {
            Some(seed) => {
                let mut seed_bytes = [0u8; 32];
                seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
                seed_bytes[8..16].copy_from_slice(&self.domain.tag().to_le_bytes());
                seed_bytes[16..24].copy_from_slice(&stream.to_le_bytes());
                StdRng::from_seed(seed_bytes)
            }
            None => StdRng::from_os_rng(),
        }
    }
}
