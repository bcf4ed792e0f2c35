//! Tab-separated shard source.
//!
//! [`TsvSource`] turns a source location into a lazy record stream. Shards
//! are opened one at a time, only when the previous one is used up, and each
//! line becomes one [`Record`]. Read and decode failures are yielded as
//! stream errors carrying the shard path and line number; after an error the
//! source ends.

use crate::io::compression::auto_detect_reader;
use crate::io::glob::resolve_shards;
use crate::record::{Record, parse_line};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How a source walks its shards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceOptions {
    /// Shuffle shard order at the start of every pass.
    pub shuffle_shards: bool,
    /// Start over after the last shard instead of ending.
    pub repeat: bool,
}

struct OpenShard {
    path: PathBuf,
    lines: Lines<BufReader<Box<dyn Read>>>,
    line_no: usize,
}

impl OpenShard {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open shard {}", path.display()))?;
        let reader = auto_detect_reader(file, path)?;
        debug!(shard = %path.display(), "opened shard");
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(reader).lines(),
            line_no: 0,
        })
    }
}

/// Lazy record stream over one or more shard files.
pub struct TsvSource {
    shards: Vec<PathBuf>,
    options: SourceOptions,
    rng: StdRng,
    cursor: usize,
    current: Option<OpenShard>,
    records_this_pass: u64,
    finished: bool,
}

impl TsvSource {
    /// Resolve `location` (file, directory, or glob) and prepare to stream
    /// it. No shard is opened until the first pull.
    ///
    /// # Errors
    /// Fails if the location resolves to no shard files.
    pub fn open(location: impl AsRef<Path>, options: SourceOptions, rng: StdRng) -> Result<Self> {
        let location = location.as_ref();
        let shards = resolve_shards(location)?;
        info!(
            location = %location.display(),
            shards = shards.len(),
            repeat = options.repeat,
            "resolved source"
        );
        Ok(Self::from_shards(shards, options, rng))
    }

    /// Stream an explicit list of shard files in the given order.
    #[must_use]
    pub fn from_shards(shards: Vec<PathBuf>, options: SourceOptions, rng: StdRng) -> Self {
        let mut source = Self {
            shards,
            options,
            rng,
            cursor: 0,
            current: None,
            records_this_pass: 0,
            finished: false,
        };
        source.start_pass();
        source
    }

    /// Shards in their current pass order.
    #[must_use]
    pub fn shards(&self) -> &[PathBuf] {
        &self.shards
    }

    fn start_pass(&mut self) {
        if self.options.shuffle_shards {
            self.shards.shuffle(&mut self.rng);
        }
        self.cursor = 0;
        self.records_this_pass = 0;
    }

    fn fail(&mut self, err: anyhow::Error) -> Option<Result<Record>> {
        self.current = None;
        self.finished = true;
        Some(Err(err))
    }
}

impl Iterator for TsvSource {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(shard) = self.current.as_mut() {
                match shard.lines.next() {
                    Some(Ok(line)) => {
                        shard.line_no += 1;
                        self.records_this_pass += 1;
                        return Some(Ok(parse_line(&line)));
                    }
                    Some(Err(err)) => {
                        let err = anyhow::Error::new(err).context(format!(
                            "read line {} of {}",
                            shard.line_no + 1,
                            shard.path.display()
                        ));
                        return self.fail(err);
                    }
                    None => {
                        debug!(shard = %shard.path.display(), lines = shard.line_no, "shard exhausted");
                        self.current = None;
                    }
                }
            }

            if self.cursor == self.shards.len() {
                // an empty pass would spin forever when repeating
                if !self.options.repeat || self.records_this_pass == 0 {
                    self.finished = true;
                    return None;
                }
                debug!(records = self.records_this_pass, "restarting source");
                self.start_pass();
            }

            let path = self.shards[self.cursor].clone();
            self.cursor += 1;
            match OpenShard::open(&path) {
                Ok(shard) => self.current = Some(shard),
                Err(err) => return self.fail(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::io::Write;

    fn shard(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_lines_across_shards() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = shard(dir.path(), "a.tsv", "1\tx\n2\ty\n");
        let b = shard(dir.path(), "b.tsv", "3\tz\r\n");
        let out: Vec<Record> =
            TsvSource::from_shards(vec![a, b], SourceOptions::default(), StdRng::seed_from_u64(0))
                .collect::<Result<_>>()?;
        assert_eq!(out.len(), 3);
        assert_eq!(out[2], vec!["3", "z"]);
        Ok(())
    }

    #[test]
    fn shard_order_is_kept_unless_shuffled() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let paths: Vec<PathBuf> = (0..6)
            .map(|i| shard(dir.path(), &format!("{i}.tsv"), "x\n"))
            .collect();

        let plain = TsvSource::from_shards(paths.clone(), SourceOptions::default(), StdRng::seed_from_u64(0));
        assert_eq!(plain.shards(), paths.as_slice());

        let opts = SourceOptions { shuffle_shards: true, ..Default::default() };
        let shuffled = TsvSource::from_shards(paths.clone(), opts, StdRng::seed_from_u64(3));
        let mut order = shuffled.shards().to_vec();
        order.sort();
        assert_eq!(order, paths);
        Ok(())
    }

    #[test]
    fn repeat_cycles_and_empty_repeat_ends() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = shard(dir.path(), "a.tsv", "only\n");
        let opts = SourceOptions { repeat: true, ..Default::default() };
        let taken: Vec<Record> = TsvSource::from_shards(vec![a], opts, StdRng::seed_from_u64(0))
            .take(5)
            .collect::<Result<_>>()?;
        assert_eq!(taken.len(), 5);

        let empty = shard(dir.path(), "empty.tsv", "");
        let mut src = TsvSource::from_shards(vec![empty], opts, StdRng::seed_from_u64(0));
        assert!(src.next().is_none());
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_reported_with_location() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.tsv");
        File::create(&path)?.write_all(b"ok\n\xff\xfe\n")?;
        let mut src =
            TsvSource::from_shards(vec![path], SourceOptions::default(), StdRng::seed_from_u64(0));
        assert!(src.next().unwrap().is_ok());
        let err = src.next().unwrap().unwrap_err();
        assert!(format!("{err:#}").contains("read line 2"), "{err:#}");
        assert!(src.next().is_none());
        Ok(())
    }
}
