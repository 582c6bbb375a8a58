//! Input-boundary helpers: turn a path or raw byte source into the plain
//! `AsyncRead` the [`crate::Reader`] consumes, with transparent gzip/zstd
//! decompression. The parser core never sees any of this.

use std::path::Path;

use async_compression::tokio::bufread::{GzipDecoder, ZstdDecoder};
use tokio::fs::File;
use tokio::io::{AsyncRead, BufReader};

use crate::CsvResult;

/// Compression applied to a byte source before the dialect layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zstd,
}

impl Compression {
    /// Best-effort detection from a file name or key.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".gz") || name.ends_with(".gzip") {
            Self::Gzip
        } else if name.ends_with(".zst") || name.ends_with(".zstd") {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// What we know about a byte source, for logging and sanity checks.
#[derive(Debug, Clone, Default)]
pub struct SourceMeta {
    /// File name or object key the source came from, when known.
    pub name: String,
    pub compression: Compression,
}

/// Wrap a raw source with the decompressor the metadata calls for.
/// The 1 MiB buffer keeps syscall counts down on large inputs.
pub fn decompressed_reader<R>(
    raw: R,
    compression: Compression,
) -> Box<dyn AsyncRead + Unpin + Send>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = BufReader::with_capacity(1 << 20, raw);
    match compression {
        Compression::Gzip => Box::new(GzipDecoder::new(buf)),
        Compression::Zstd => Box::new(ZstdDecoder::new(buf)),
        Compression::None => Box::new(buf),
    }
}

/// Open a local file, sniffing compression from its extension.
pub async fn reader_from_path(
    path: &Path,
) -> CsvResult<(Box<dyn AsyncRead + Unpin + Send>, SourceMeta)> {
    let file = File::open(path).await?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let meta = SourceMeta {
        compression: Compression::from_name(&name),
        name,
    };
    Ok((decompressed_reader(file, meta.compression), meta))
}
