//! Transparent (de)compression of corpus shards.
//!
//! Shards are usually stored compressed. [`auto_detect_reader`] picks a
//! codec from the file name and falls back to sniffing magic bytes, so a
//! source can open `part-0001.tsv.gz` and `part-0002` (zstd, no extension)
//! the same way. Built-in codecs are compiled in through cargo features:
//!
//! - `compression-gzip` (`.gz`, `.gzip`) via `flate2`
//! - `compression-zstd` (`.zst`, `.zstd`) via `zstd`
//! - `compression-bzip2` (`.bz2`, `.bzip2`) via `bzip2`
//! - `compression-xz` (`.xz`) via `xz2`
//!
//! Additional formats can be plugged in with [`register_codec`].

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::trace;

/// A compression format that can wrap readers and writers.
pub trait ShardCodec: Send + Sync {
    /// Codec name used in logs and error messages.
    fn name(&self) -> &str;

    /// Lowercase file suffixes, including the leading dot.
    fn extensions(&self) -> &[&str];

    /// Leading bytes that identify the format, if it has any.
    fn magic_bytes(&self) -> Option<&[u8]>;

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn ShardWrite>>;
}

/// A shard writer that must be closed explicitly.
///
/// Encoders write their trailer on [`close`](ShardWrite::close); dropping one
/// instead swallows any error raised while finishing the stream.
pub trait ShardWrite: Write {
    /// Finish the stream and flush everything underneath it.
    fn close(self: Box<Self>) -> std::io::Result<()>;
}

impl<W: Write> ShardWrite for BufWriter<W> {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        let mut inner = (*self).into_inner().map_err(std::io::IntoInnerError::into_error)?;
        inner.flush()
    }
}

#[cfg(feature = "compression-gzip")]
impl<W: Write> ShardWrite for flate2::write::GzEncoder<W> {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        (*self).finish()?.flush()
    }
}

#[cfg(feature = "compression-zstd")]
impl<W: Write> ShardWrite for zstd::stream::write::Encoder<'static, W> {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        (*self).finish()?.flush()
    }
}

#[cfg(feature = "compression-bzip2")]
impl<W: Write> ShardWrite for bzip2::write::BzEncoder<W> {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        (*self).finish()?.flush()
    }
}

#[cfg(feature = "compression-xz")]
impl<W: Write> ShardWrite for xz2::write::XzEncoder<W> {
    fn close(self: Box<Self>) -> std::io::Result<()> {
        (*self).finish()?.flush()
    }
}

type Registry = RwLock<Vec<Arc<dyn ShardCodec>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(builtin_codecs()))
}

fn builtin_codecs() -> Vec<Arc<dyn ShardCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(Gzip),
        #[cfg(feature = "compression-zstd")]
        Arc::new(Zstd),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2),
        #[cfg(feature = "compression-xz")]
        Arc::new(Xz),
    ]
}

fn codecs() -> Vec<Arc<dyn ShardCodec>> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Add a codec; it is consulted after the built-in ones.
pub fn register_codec(codec: Arc<dyn ShardCodec>) {
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(codec);
}

/// Codec whose extension matches `path` (case-insensitive).
#[must_use]
pub fn codec_for_path(path: impl AsRef<Path>) -> Option<Arc<dyn ShardCodec>> {
    let name = path.as_ref().to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| name.ends_with(ext)))
}

fn codec_for_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn ShardCodec>> {
    let head = reader.fill_buf().ok()?;
    if head.is_empty() {
        return None;
    }
    codecs().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| head.starts_with(magic))
    })
}

/// Wrap `reader` with the decompressor that `path_hint` or the stream's
/// leading bytes call for; plain data comes back buffered but unchanged.
///
/// # Errors
/// Fails if the selected codec cannot initialise on this stream.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    let path_hint = path_hint.as_ref();
    if let Some(codec) = codec_for_path(path_hint) {
        trace!(codec = codec.name(), path = %path_hint.display(), "codec from extension");
        return codec
            .wrap_reader(Box::new(reader))
            .with_context(|| format!("open {} stream for {}", codec.name(), path_hint.display()));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = codec_for_magic(&mut buffered) {
        trace!(codec = codec.name(), path = %path_hint.display(), "codec from magic bytes");
        return codec
            .wrap_reader(Box::new(buffered))
            .with_context(|| format!("open {} stream for {}", codec.name(), path_hint.display()));
    }
    Ok(Box::new(buffered))
}

/// Wrap `writer` with the compressor matching `path_hint`'s extension, or a
/// plain buffered writer. Call [`ShardWrite::close`] when done.
///
/// # Errors
/// Fails if the selected codec cannot initialise.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn ShardWrite>> {
    let path_hint = path_hint.as_ref();
    match codec_for_path(path_hint) {
        Some(codec) => codec
            .wrap_writer(Box::new(writer))
            .with_context(|| format!("open {} writer for {}", codec.name(), path_hint.display())),
        None => Ok(Box::new(BufWriter::new(writer))),
    }
}

#[cfg(feature = "compression-gzip")]
struct Gzip;

#[cfg(feature = "compression-gzip")]
impl ShardCodec for Gzip {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        // concatenated members are common in sharded corpora
        Ok(Box::new(flate2::read::MultiGzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn ShardWrite>> {
        Ok(Box::new(flate2::write::GzEncoder::new(
            writer,
            flate2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-zstd")]
struct Zstd;

#[cfg(feature = "compression-zstd")]
impl ShardCodec for Zstd {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        let decoder = zstd::stream::read::Decoder::new(reader)?;
        Ok(Box::new(decoder))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn ShardWrite>> {
        Ok(Box::new(zstd::stream::write::Encoder::new(writer, 3)?))
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2;

#[cfg(feature = "compression-bzip2")]
impl ShardCodec for Bzip2 {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(b"BZh")
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(bzip2::read::MultiBzDecoder::new(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn ShardWrite>> {
        Ok(Box::new(bzip2::write::BzEncoder::new(
            writer,
            bzip2::Compression::default(),
        )))
    }
}

#[cfg(feature = "compression-xz")]
struct Xz;

#[cfg(feature = "compression-xz")]
impl ShardCodec for Xz {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)))
    }

    fn wrap_writer(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn ShardWrite>> {
        Ok(Box::new(xz2::write::XzEncoder::new(writer, 6)))
    }
}
