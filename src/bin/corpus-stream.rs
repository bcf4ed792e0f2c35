//! Run a registered pipeline and write its records as TSV.
//!
//! Usage:
//!   corpus-stream sample_from_fields corpus/ --sample-fields 1 2 --url-domains 3
//!   corpus-stream mixed_sample_from_fields docs/ sents/ --weights 1 3 --limit 1000
//!   corpus-stream --list

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use corpus_stream::io::compression::{ShardWrite, auto_detect_writer};
use corpus_stream::record::format_record;
use corpus_stream::{Pipeline, PipelineConfig, REGISTRY};
use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::{filter::LevelFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "corpus-stream",
    version,
    about = "Stream, augment, and mix tab-delimited training corpora"
)]
struct Cli {
    /// Pipeline to run (see --list).
    #[arg(required_unless_present = "list")]
    pipeline: Option<String>,

    /// One location per pipeline source: a TSV file, a directory of shards, or a glob.
    paths: Vec<PathBuf>,

    /// Print the registered pipelines and exit.
    #[arg(long)]
    list: bool,

    /// JSON config file; command-line options override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write here instead of stdout (compressed by extension, e.g. .gz).
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Stop after this many records.
    #[arg(long)]
    limit: Option<usize>,

    /// Delimiter to split list fields on.
    #[arg(long)]
    delimiter: Option<String>,

    /// Which field(s) to sample from (0-indexed).
    #[arg(long, num_args = 1..)]
    sample_fields: Option<Vec<usize>>,

    /// Reduce URLs in this field (0-indexed) to their domain; -1 disables.
    #[arg(long = "url-domains", allow_negative_numbers = true)]
    url_domains: Option<i64>,

    /// Fields to keep, in output order (0-indexed); all when omitted.
    #[arg(long, num_args = 0..)]
    keep_fields: Option<Vec<usize>>,

    /// Fields to truncate to a random trailing context (0-indexed).
    #[arg(long, num_args = 0..)]
    truncate_fields: Option<Vec<usize>>,

    /// Upper bound of the sampled token budget for truncation.
    #[arg(long)]
    max_n: Option<usize>,

    /// Segment separator inside document fields (" " truncates plain tokens).
    #[arg(long)]
    doc_separator: Option<String>,

    /// Placeholder value to inject.
    #[arg(long)]
    placeholder: Option<String>,

    /// Positions (0-indexed) at which to inject the placeholder.
    #[arg(long, num_args = 0..)]
    placeholder_fields: Option<Vec<usize>>,

    /// Relative source weights, one per source.
    #[arg(long, num_args = 1..)]
    weights: Option<Vec<f64>>,

    /// Seed for all random draws.
    #[arg(long)]
    seed: Option<u64>,

    /// Shuffle shard order on every pass.
    #[arg(long)]
    shuffle_shards: bool,

    /// Cycle over the shards forever.
    #[arg(long)]
    repeat: bool,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(v) = &self.delimiter {
            cfg.delimiter.clone_from(v);
        }
        if let Some(v) = &self.sample_fields {
            cfg.sample_fields.clone_from(v);
        }
        if let Some(v) = self.url_domains {
            cfg.url_domain_field = v;
        }
        if let Some(v) = &self.keep_fields {
            cfg.keep_fields.clone_from(v);
        }
        if let Some(v) = &self.truncate_fields {
            cfg.truncate_fields.clone_from(v);
        }
        if let Some(v) = self.max_n {
            cfg.max_n = v;
        }
        if let Some(v) = &self.doc_separator {
            cfg.doc_separator.clone_from(v);
        }
        if let Some(v) = &self.placeholder {
            cfg.placeholder.clone_from(v);
        }
        if let Some(v) = &self.placeholder_fields {
            cfg.placeholder_fields.clone_from(v);
        }
        if let Some(v) = &self.weights {
            cfg.weights = Some(v.clone());
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        cfg.shuffle_shards |= self.shuffle_shards;
        cfg.repeat |= self.repeat;
        Ok(cfg)
    }
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_tracing(level: LevelFilter) {
    let subscriber = fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}

fn print_registry() {
    for spec in REGISTRY {
        println!("{}\n    {}", spec.name, spec.description);
        for (source, weight) in spec.sources.iter().zip(spec.default_weights) {
            println!("    - {} (weight {weight}): {}", source.name, source.help);
        }
    }
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn ShardWrite>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("mkdir -p {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            auto_detect_writer(file, path)
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == ErrorKind::BrokenPipe)
}

fn run(cli: Cli) -> Result<u64> {
    if cli.list {
        print_registry();
        return Ok(0);
    }
    let name = cli.pipeline.clone().unwrap_or_default();
    let config = cli.pipeline_config()?;
    debug!(?config, "effective configuration");

    let stream = Pipeline::build(&name, cli.paths.clone(), config)?.into_stream()?;
    let mut out = open_output(cli.output.as_ref())?;

    let mut written = 0u64;
    for record in stream.take(cli.limit.unwrap_or(usize::MAX)) {
        let record = record?;
        writeln!(out, "{}", format_record(&record))?;
        written += 1;
    }
    out.close().context("finish output")?;
    Ok(written)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(log_level(cli.verbose));

    match run(cli) {
        Ok(written) => info!(records = written, "done"),
        Err(err) if is_broken_pipe(&err) => {}
        Err(err) => {
            error!("{err:#}");
            process::exit(1);
        }
    }
}
