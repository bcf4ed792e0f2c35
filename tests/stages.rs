//! Behavioural properties of the augmentation stages.

use corpus_stream::stages::*;
use corpus_stream::testing::*;
use corpus_stream::{Record, RecordStreamExt, Stage, record_from};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[test]
fn sampled_value_is_always_one_of_the_split_pieces() {
    let inputs = ["a,b,c", "single", "", ",", "x,,y"];
    let mut sampler = FieldSampler::new(vec![0], ",", rng(5)).unwrap();
    for input in inputs {
        let pieces: Vec<&str> = input.split(',').collect();
        for _ in 0..20 {
            let out = sampler.apply(record_from([input]));
            assert!(pieces.contains(&out[0].as_str()), "{input:?} -> {out:?}");
        }
    }
}

#[test]
fn out_of_bounds_indices_never_change_a_record() {
    let r = record_from(["a,b", "http://x.y/z", "p q <docline> r"]);
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(FieldSampler::new(vec![3, 10], ",", rng(1)).unwrap()),
        Box::new(UrlDomain::new(Some(3))),
        Box::new(DocumentTruncator::new(vec![7], 4, "<docline>", rng(2)).unwrap()),
        Box::new(PlaceholderInjector::new("X", vec![4])),
    ];
    for stage in &mut stages {
        assert_eq!(stage.apply(r.clone()), r, "{}", stage.name());
    }
}

#[test]
fn url_shapes_canonicalize_to_the_same_domain() {
    let out = collect_records(
        stream_of(&[&["http://a.b/p"], &["//a.b/p"], &["a.b/p"]]).through(UrlDomain::new(Some(0))),
    )
    .unwrap();
    assert_records_equal(&out, &records(&[&["a.b"], &["a.b"], &["a.b"]]));
}

#[test]
fn space_separator_keeps_min_of_n_and_total_tokens() {
    let text = "t1 t2 t3 t4 t5 t6";
    for n in 1..=10 {
        let kept = keep_last_tokens(text, n);
        assert_eq!(kept.split_whitespace().count(), n.min(6), "n = {n}");
    }
}

#[test]
fn docline_truncation_keeps_a_suffix_of_whole_segments() {
    let sep = "<docline>";
    let doc = "first line here <docline> second <docline> third one <docline> last";
    let original: Vec<&str> = doc.split(sep).map(str::trim).collect();

    for n in 1..=20 {
        let kept = keep_trailing_segments(doc, sep, n);
        let segments: Vec<&str> = kept.split(sep).map(str::trim).collect();
        assert!(original.ends_with(&segments), "n = {n}: {kept:?}");

        // minimal: dropping the first kept segment would fall below n
        if segments.len() > 1 {
            let shorter = segments[1..].join(&format!(" {sep} "));
            assert!(shorter.split_whitespace().count() < n, "n = {n}: {kept:?}");
        }
    }
}

#[test]
fn truncator_draws_budgets_within_range() {
    let mut t = DocumentTruncator::new(vec![1], 2, " ", rng(9)).unwrap();
    let mut lengths = std::collections::BTreeSet::new();
    for _ in 0..100 {
        let out = t.apply(record_from(["keep", "a b c d"]));
        assert_eq!(out[0], "keep");
        lengths.insert(out[1].split_whitespace().count());
    }
    assert_eq!(lengths.into_iter().collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn projection_identity_and_reorder() {
    let r = record_from(["a", "b", "c"]);
    assert_eq!(FieldProjector::new(vec![]).apply(r.clone()), r);
    assert_eq!(FieldProjector::new(vec![1, 0]).apply(r), record_from(["b", "a"]));
}

#[test]
fn placeholder_insert_append_and_skip() {
    let cases: [(usize, Record); 3] = [
        (1, record_from(["a", "X", "b"])),
        (2, record_from(["a", "b", "X"])),
        (3, record_from(["a", "b"])),
    ];
    for (idx, expected) in cases {
        let out = PlaceholderInjector::new("X", vec![idx]).apply(record_from(["a", "b"]));
        assert_eq!(out, expected, "index {idx}");
    }
}

#[test]
fn stage_chain_propagates_source_errors() {
    let mut s = failing_stream(&[&["a,b", "x"]], "shard corrupt")
        .through(FieldSampler::new(vec![0], ",", rng(0)).unwrap())
        .through(FieldProjector::new(vec![1]));
    assert_eq!(s.next().unwrap().unwrap(), record_from(["x"]));
    let err = s.next().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "shard corrupt");
    assert!(s.next().is_none());
}
