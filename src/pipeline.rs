//! Pipeline composition.
//!
//! A [`Pipeline`] binds a registered recipe to its source locations and a
//! validated configuration. [`Pipeline::into_stream`] opens every source,
//! wraps each in its own freshly built stage chain, and, when there is more
//! than one source, interleaves them with a [`Mixer`]. The returned stream is
//! lazy: no shard is read before the first pull.

use crate::config::{PipelineConfig, RngSeeder, SeedDomain};
use crate::io::{SourceOptions, TsvSource};
use crate::mixer::Mixer;
use crate::pipelines::{PipelineSpec, lookup};
use crate::stream::{RecordStream, compose};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use tracing::{debug, info};

/// A recipe ready to run.
#[derive(Debug)]
pub struct Pipeline {
    spec: &'static PipelineSpec,
    locations: Vec<PathBuf>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Look up `name` and check the locations and configuration against it.
    ///
    /// # Errors
    /// Fails for unknown pipelines, a wrong number of locations, or an
    /// invalid configuration.
    pub fn build(name: &str, locations: Vec<PathBuf>, config: PipelineConfig) -> Result<Self> {
        let spec = lookup(name)?;
        if locations.len() != spec.sources.len() {
            let expected: Vec<&str> = spec.sources.iter().map(|s| s.name).collect();
            bail!(
                "pipeline '{}' takes {} source path(s) ({}), got {}",
                spec.name,
                spec.sources.len(),
                expected.join(", "),
                locations.len()
            );
        }
        config
            .validate(spec.sources.len())
            .with_context(|| format!("invalid configuration for pipeline '{}'", spec.name))?;
        Ok(Self {
            spec,
            locations,
            config,
        })
    }

    #[must_use]
    pub const fn spec(&self) -> &'static PipelineSpec {
        self.spec
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Effective per-source weights: configured ones, else the defaults.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        effective_weights(self.spec, &self.config)
    }

    /// Open the sources and return the composed output stream.
    ///
    /// # Errors
    /// Fails if a source location cannot be resolved or a stage cannot be
    /// built. Read errors show up later, inside the stream.
    pub fn into_stream(self) -> Result<RecordStream> {
        let options = SourceOptions {
            shuffle_shards: self.config.shuffle_shards,
            repeat: self.config.repeat,
        };
        let mut seeder = RngSeeder::with_domain(self.config.seed, SeedDomain::ShardOrder);
        let mut streams: Vec<RecordStream> = Vec::with_capacity(self.locations.len());
        for (source, location) in self.spec.sources.iter().zip(&self.locations) {
            let src = TsvSource::open(location, options, seeder.next_rng())
                .with_context(|| format!("open source '{}'", source.name))?;
            streams.push(Box::new(src));
        }
        compose_streams(self.spec, &self.config, streams)
    }
}

/// Configured weights if present, otherwise the recipe defaults.
#[must_use]
pub fn effective_weights(spec: &PipelineSpec, config: &PipelineConfig) -> Vec<f64> {
    config
        .weights
        .clone()
        .unwrap_or_else(|| spec.default_weights.to_vec())
}

/// Apply `spec`'s stage chain to each already-open source stream and mix the
/// results when there are several.
///
/// `streams` must be in the recipe's source order.
///
/// # Errors
/// Fails if the stream count does not match the recipe, the configuration
/// is invalid, or a stage cannot be built.
pub fn compose_streams(
    spec: &PipelineSpec,
    config: &PipelineConfig,
    streams: Vec<RecordStream>,
) -> Result<RecordStream> {
    if streams.len() != spec.sources.len() {
        bail!(
            "pipeline '{}' expects {} stream(s), got {}",
            spec.name,
            spec.sources.len(),
            streams.len()
        );
    }
    config.validate(spec.sources.len())?;

    let mut seeder = config.seeder();

    let mut staged = Vec::with_capacity(streams.len());
    for (source, stream) in spec.sources.iter().zip(streams) {
        let stages = (spec.stages)(config, &mut seeder)?;
        let names: Vec<&str> = stages.iter().map(|stage| stage.name()).collect();
        debug!(pipeline = spec.name, source = source.name, stages = ?names, "stage chain");
        staged.push(compose(stream, stages));
    }

    let weights = effective_weights(spec, config);
    info!(pipeline = spec.name, sources = staged.len(), ?weights, "pipeline ready");
    if staged.len() == 1 {
        return Ok(staged.remove(0));
    }
    let mixer = Mixer::with_rng(staged, weights, seeder.next_rng())?;
    Ok(Box::new(mixer))
}
