//! Streaming tokenizer and record reader for CSV and CSV-like dialects.
//!
//! - Core: a hand-built, resumable lexer ([`Tokenizer`]) that turns a
//!   character stream into fields tagged with quoting and record-boundary
//!   metadata.
//! - [`Reader`] pulls bytes from any `tokio::io::AsyncRead`, decodes them
//!   incrementally (BOM-aware, any `encoding_rs` charset), and assembles
//!   header-mapped [`Record`]s one at a time.
//! - [`Writer`] emits records under the same dialect rules, so parse/print
//!   round-trips are lossless.
//!
//! Data shape:
//! - `Record` rows: access with `get(idx) -> CsvResult<&str>` or, with a
//!   header, `get_named("col") -> CsvResult<&str>`.
#![cfg_attr(docsrs, feature(doc_cfg))]
//
mod format;
mod header;
mod io;
mod read;
mod record;
mod tokenize;
mod write;

pub use crate::format::{Format, HeaderMode, QuoteMode, Separator};
pub use crate::header::Headers;
pub use crate::io::{decompressed_reader, reader_from_path, Compression, SourceMeta};
pub use crate::read::Reader;
pub use crate::record::{Field, Record};
pub use crate::tokenize::{Input, Token, Tokenizer};
pub use crate::write::Writer;

use thiserror::Error;

/// Error type returned by this crate when not using `anyhow`.
///
/// Every variant is reported synchronously by the call that triggered it;
/// malformed input always terminates the current parse, there is no retry
/// or skip-ahead.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("malformed input at char {offset}: {msg}")]
    MalformedInput { offset: u64, msg: String },
    #[error("index {index} out of range for record with {len} fields")]
    OutOfRange { index: usize, len: usize },
    #[error("no header mapping available for name-based access")]
    NoHeader,
    #[error("header does not contain a column named {0:?}")]
    UnmappedName(String),
    #[error("column {name:?} maps to index {index}, but the record has only {len} fields")]
    InconsistentRecord {
        name: String,
        index: usize,
        len: usize,
    },
    #[error("duplicate header name {0:?}")]
    DuplicateHeader(String),
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type CsvResult<T> = std::result::Result<T, CsvError>;
