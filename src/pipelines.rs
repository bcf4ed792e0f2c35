//! Built-in pipeline recipes.
//!
//! Recipes live in a static table ([`REGISTRY`]) keyed by name. Each one
//! declares its sources with their default weights and a factory that
//! builds a fresh stage chain for one source; the composer in
//! [`pipeline`](crate::pipeline) calls the factory once per source.

use crate::config::{PipelineConfig, RngSeeder};
use crate::stages::{DocumentTruncator, FieldProjector, FieldSampler, PlaceholderInjector, UrlDomain};
use crate::stream::Stage;
use anyhow::{Result, bail};

/// A named input of a pipeline.
#[derive(Clone, Copy, Debug)]
pub struct SourceSpec {
    pub name: &'static str,
    pub help: &'static str,
}

/// Builds the per-source stage chain from the configuration.
pub type StageFactory = fn(&PipelineConfig, &mut RngSeeder) -> Result<Vec<Box<dyn Stage>>>;

/// One registered pipeline.
#[derive(Clone, Copy)]
pub struct PipelineSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub sources: &'static [SourceSpec],
    /// Relative weights, one per source, in source order.
    pub default_weights: &'static [f64],
    pub stages: StageFactory,
}

impl std::fmt::Debug for PipelineSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSpec")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("default_weights", &self.default_weights)
            .finish_non_exhaustive()
    }
}

const PARALLEL_DATA: SourceSpec = SourceSpec {
    name: "parallel_data",
    help: "Parallel data: a TSV shard, a directory of (compressed) shards, or a glob",
};

/// Every pipeline known to the binary and to [`lookup`].
pub static REGISTRY: &[PipelineSpec] = &[
    PipelineSpec {
        name: "sample_comma_separated",
        description: "Pick one element of the comma-separated list in the third field",
        sources: &[PARALLEL_DATA],
        default_weights: &[1.0],
        stages: sample_comma_separated,
    },
    PipelineSpec {
        name: "sample_from_fields",
        description: "Sample list fields, reduce URLs to domains, truncate documents, \
                      inject placeholders, and project fields",
        sources: &[PARALLEL_DATA],
        default_weights: &[1.0],
        stages: sample_from_fields,
    },
    PipelineSpec {
        name: "mixed_sample_from_fields",
        description: "sample_from_fields over document-level and sentence-level data, mixed by weight",
        sources: &[
            SourceSpec {
                name: "document_data",
                help: "Document-level data (segments joined by the document separator)",
            },
            SourceSpec {
                name: "sentence_data",
                help: "Sentence-level data",
            },
        ],
        default_weights: &[1.0, 1.0],
        stages: sample_from_fields,
    },
];

/// Find a pipeline by name.
///
/// # Errors
/// Fails for unknown names, listing the registered ones.
pub fn lookup(name: &str) -> Result<&'static PipelineSpec> {
    match REGISTRY.iter().find(|spec| spec.name == name) {
        Some(spec) => Ok(spec),
        None => {
            let known: Vec<&str> = REGISTRY.iter().map(|spec| spec.name).collect();
            bail!("unknown pipeline '{name}' (known: {})", known.join(", "))
        }
    }
}

fn sample_comma_separated(
    _config: &PipelineConfig,
    seeder: &mut RngSeeder,
) -> Result<Vec<Box<dyn Stage>>> {
    Ok(vec![Box::new(FieldSampler::new(vec![2], ",", seeder.next_rng())?)])
}

fn sample_from_fields(
    config: &PipelineConfig,
    seeder: &mut RngSeeder,
) -> Result<Vec<Box<dyn Stage>>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(FieldSampler::new(
            config.sample_fields.clone(),
            config.delimiter.as_str(),
            seeder.next_rng(),
        )?),
        Box::new(UrlDomain::new(config.url_domain_index())),
    ];
    if !config.truncate_fields.is_empty() {
        stages.push(Box::new(DocumentTruncator::new(
            config.truncate_fields.clone(),
            config.max_n,
            config.doc_separator.as_str(),
            seeder.next_rng(),
        )?));
    }
    if !config.placeholder_fields.is_empty() {
        stages.push(Box::new(PlaceholderInjector::new(
            config.placeholder.as_str(),
            config.placeholder_fields.clone(),
        )));
    }
    stages.push(Box::new(FieldProjector::new(config.keep_fields.clone())));
    Ok(stages)
}
