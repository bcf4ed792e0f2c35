//! Weighted interleaving of several record streams.
//!
//! Each pull picks one live input with probability proportional to its
//! weight among the inputs that are still live. An input that reports
//! end-of-stream is dropped for good and the draw is repeated among the rest,
//! so the combined stream yields every record of every input exactly once and
//! ends only after all inputs have ended.

use crate::record::Record;
use crate::stream::RecordStream;
use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

struct MixerInput {
    index: usize,
    weight: f64,
    stream: RecordStream,
}

/// Combines weighted streams into one.
///
/// A source error is yielded once and then the mixer ends; the remaining
/// inputs are dropped without being pulled again.
pub struct Mixer {
    inputs: Vec<MixerInput>,
    rng: StdRng,
}

impl Mixer {
    /// Mix `streams` with relative `weights`, drawing from OS entropy.
    ///
    /// # Errors
    /// See [`Mixer::with_rng`].
    pub fn new(streams: Vec<RecordStream>, weights: Vec<f64>) -> Result<Self> {
        Self::with_rng(streams, weights, StdRng::from_os_rng())
    }

    /// Mix `streams` with relative `weights` using the given generator.
    ///
    /// # Errors
    /// Fails when there are no streams, when the counts differ, when a
    /// weight is not a finite positive number, or when the weights sum to
    /// infinity.
    pub fn with_rng(streams: Vec<RecordStream>, weights: Vec<f64>, rng: StdRng) -> Result<Self> {
        if streams.is_empty() {
            bail!("mixer needs at least one stream");
        }
        if streams.len() != weights.len() {
            bail!(
                "mixer got {} streams but {} weights",
                streams.len(),
                weights.len()
            );
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w <= 0.0) {
            bail!("mixer weights must be finite and positive, got {bad}");
        }
        if !weights.iter().sum::<f64>().is_finite() {
            bail!("mixer weights overflow when summed");
        }

        let inputs = streams
            .into_iter()
            .zip(weights)
            .enumerate()
            .map(|(index, (stream, weight))| MixerInput {
                index,
                weight,
                stream,
            })
            .collect();
        Ok(Self { inputs, rng })
    }

    /// Number of inputs that have not ended yet.
    #[must_use]
    pub fn live(&self) -> usize {
        self.inputs.len()
    }

    /// Current selection probability of each live input, keyed by its
    /// position in the original input list.
    #[must_use]
    pub fn probabilities(&self) -> Vec<(usize, f64)> {
        let total = self.total_weight();
        self.inputs
            .iter()
            .map(|input| (input.index, input.weight / total))
            .collect()
    }

    fn total_weight(&self) -> f64 {
        self.inputs.iter().map(|input| input.weight).sum()
    }

    fn pick(&mut self) -> usize {
        let mut target = self.rng.random_range(0.0..self.total_weight());
        for (slot, input) in self.inputs.iter().enumerate() {
            if target < input.weight {
                return slot;
            }
            target -= input.weight;
        }
        // float rounding can leave a sliver past the last bucket
        self.inputs.len() - 1
    }
}

impl Iterator for Mixer {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.inputs.is_empty() {
            let slot = self.pick();
            match self.inputs[slot].stream.next() {
                Some(Ok(record)) => return Some(Ok(record)),
                Some(Err(err)) => {
                    debug!(input = self.inputs[slot].index, "mixer input failed; stopping");
                    self.inputs.clear();
                    return Some(Err(err));
                }
                None => {
                    let done = self.inputs.remove(slot);
                    debug!(input = done.index, remaining = self.inputs.len(), "mixer input exhausted");
                }
            }
        }
        None
    }
}
