//! Shard discovery.
//!
//! A source location is a single shard file, a directory of shards, or a
//! glob pattern such as `corpus/*.tsv.gz`. Whatever the form, the result is
//! a sorted list of regular files so every run reads shards in the same
//! order unless shuffling is requested.

use anyhow::{Context, Result, bail};
use glob::{Pattern, glob};
use std::path::{Path, PathBuf};

/// Expand `pattern` into the sorted list of matching regular files.
///
/// Zero matches is not an error here; see [`expand_glob_required`].
///
/// # Errors
/// Fails on an invalid pattern or an unreadable directory entry.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.with_context(|| format!("read glob entry for {pattern}"))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Like [`expand_glob`], but zero matches is an error.
///
/// # Errors
/// Fails on an invalid pattern, unreadable entries, or no matches.
pub fn expand_glob_required(pattern: &str) -> Result<Vec<PathBuf>> {
    let files = expand_glob(pattern)?;
    if files.is_empty() {
        bail!("no files found matching pattern: {pattern}");
    }
    Ok(files)
}

fn looks_like_pattern(location: &str) -> bool {
    location.contains(['*', '?', '['])
}

/// Resolve a source location to its shard files.
///
/// # Errors
/// Fails if the location does not exist, a directory holds no files, or a
/// pattern matches nothing.
pub fn resolve_shards(location: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let location = location.as_ref();
    if location.is_file() {
        return Ok(vec![location.to_path_buf()]);
    }
    if location.is_dir() {
        let dir = location.to_string_lossy();
        let pattern = format!("{}/*", Pattern::escape(&dir));
        let shards = expand_glob(&pattern)?;
        if shards.is_empty() {
            bail!("no shard files in directory {}", location.display());
        }
        return Ok(shards);
    }

    let text = location.to_string_lossy();
    if looks_like_pattern(&text) {
        return expand_glob_required(&text);
    }
    bail!("path not found: {}", location.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_an_error() {
        let err = resolve_shards("/definitely/not/here.tsv").unwrap_err();
        assert!(err.to_string().contains("path not found"));
    }

    #[test]
    fn pattern_detection() {
        assert!(looks_like_pattern("data/*.gz"));
        assert!(looks_like_pattern("data/part-[0-9].gz"));
        assert!(!looks_like_pattern("data/part-0.gz"));
    }
}
