//! Registered pipelines, end to end.

use anyhow::Result;
use corpus_stream::testing::*;
use corpus_stream::{Pipeline, PipelineConfig, Record, compose_streams, lookup};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn seeded() -> PipelineConfig {
    PipelineConfig {
        seed: Some(1234),
        ..Default::default()
    }
}

#[test]
fn sample_comma_separated_samples_the_third_field() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_shard(
        dir.path(),
        "data.tsv",
        &[&["src", "tgt", "a,b,c"], &["short", "row"]],
    )?;
    let out = collect_records(
        Pipeline::build("sample_comma_separated", vec![path], seeded())?.into_stream()?,
    )?;
    assert_eq!(out.len(), 2);
    assert!(["a", "b", "c"].contains(&out[0][2].as_str()));
    assert_eq!(out[1], vec!["short", "row"]);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn sample_from_fields_runs_the_full_chain() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_shard(
        dir.path(),
        "data.tsv.gz",
        &[&[
            "source text",
            "t1|t2",
            "www.example.com/some/page",
            "old ctx <docline> mid ctx <docline> current",
        ]],
    )?;
    let config = PipelineConfig {
        sample_fields: vec![1],
        delimiter: "|".into(),
        url_domain_field: 2,
        truncate_fields: vec![3],
        max_n: 1,
        doc_separator: "<docline>".into(),
        placeholder: "<none>".into(),
        placeholder_fields: vec![4],
        keep_fields: vec![2, 1, 3, 4],
        ..seeded()
    };
    let out = collect_records(Pipeline::build("sample_from_fields", vec![path], config)?.into_stream()?)?;
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(r[0], "www.example.com");
    assert!(r[1] == "t1" || r[1] == "t2");
    assert_eq!(r[2], "current");
    assert_eq!(r[3], "<none>");
    Ok(())
}

#[test]
fn mixed_pipeline_exhausts_both_sources() -> Result<()> {
    let dir = TempDir::new()?;
    let docs = write_shard(dir.path(), "docs.tsv", &[&["d1", "x"], &["d2", "x"], &["d3", "x"]])?;
    let sents: Vec<String> = (0..7).map(|i| format!("s{i}")).collect();
    let sent_rows: Vec<[&str; 2]> = sents.iter().map(|s| [s.as_str(), "y"]).collect();
    let sent_refs: Vec<&[&str]> = sent_rows.iter().map(|r| r.as_slice()).collect();
    let sent_path = write_shard(dir.path(), "sents.tsv", &sent_refs)?;

    let config = PipelineConfig {
        keep_fields: vec![0],
        weights: Some(vec![1.0, 1.0]),
        ..seeded()
    };
    let stream = Pipeline::build("mixed_sample_from_fields", vec![docs, sent_path], config)?
        .into_stream()?;
    let out: Vec<Record> = collect_records(stream)?;
    assert_eq!(out.len(), 10);
    let firsts: BTreeSet<&str> = out.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(firsts.len(), 10);
    Ok(())
}

#[test]
fn seeded_pipelines_replay() -> Result<()> {
    let spec = lookup("mixed_sample_from_fields")?;
    let run = || -> Result<Vec<Record>> {
        let streams = vec![
            stream_of(&[&["a", "1,2,3"], &["b", "4,5,6"], &["c", "7,8"]]),
            stream_of(&[&["d", "x,y"], &["e", "p,q"]]),
        ];
        collect_records(compose_streams(spec, &seeded(), streams)?)
    };
    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn config_file_defaults_fill_in() -> Result<()> {
    let dir = TempDir::new()?;
    let cfg_path = dir.path().join("cfg.json");
    std::fs::write(&cfg_path, r#"{ "keep_fields": [1], "seed": 7 }"#)?;
    let cfg = PipelineConfig::from_json_file(&cfg_path)?;
    assert_eq!(cfg.keep_fields, vec![1]);
    assert_eq!(cfg.sample_fields, vec![1]);
    assert_eq!(cfg.max_n, 512);

    let data = write_shard(dir.path(), "d.tsv", &[&["a", "b"]])?;
    let out = collect_records(Pipeline::build("sample_from_fields", vec![data], cfg)?.into_stream()?)?;
    assert_records_equal(&out, &records(&[&["b"]]));
    Ok(())
}

#[test]
fn bad_inputs_are_rejected_before_streaming() {
    assert!(Pipeline::build("no_such_pipeline", vec![], PipelineConfig::default()).is_err());
    let weights = PipelineConfig {
        weights: Some(vec![1.0]),
        ..Default::default()
    };
    assert!(
        Pipeline::build("mixed_sample_from_fields", vec!["a".into(), "b".into()], weights).is_err()
    );
    let overflowing = PipelineConfig {
        weights: Some(vec![f64::MAX, f64::MAX]),
        ..Default::default()
    };
    assert!(
        Pipeline::build("mixed_sample_from_fields", vec!["a".into(), "b".into()], overflowing.clone())
            .is_err()
    );
    let spec = lookup("mixed_sample_from_fields").expect("registered");
    let two = vec![stream_of(&[&["a"]]), stream_of(&[&["b"]])];
    assert!(compose_streams(spec, &overflowing, two).is_err());

    let missing = Pipeline::build(
        "sample_from_fields",
        vec!["/no/such/corpus".into()],
        PipelineConfig::default(),
    )
    .and_then(Pipeline::into_stream);
    assert!(missing.is_err());
}

#[test]
fn source_errors_reach_the_consumer_through_the_mix() -> Result<()> {
    let spec = lookup("mixed_sample_from_fields")?;
    let streams = vec![failing_stream(&[], "bad shard"), failing_stream(&[], "bad shard")];
    let mut out = compose_streams(spec, &seeded(), streams)?;
    let err = out.next().expect("an item").unwrap_err();
    assert_eq!(err.to_string(), "bad shard");
    assert!(out.next().is_none());
    Ok(())
}
