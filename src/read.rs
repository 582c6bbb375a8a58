//! Pull-based record reader: bytes in, one [`Record`] per call out.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use encoding_rs::{Decoder, Encoding, UTF_8};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::format::{Format, HeaderMode};
use crate::header::Headers;
use crate::record::{Field, Record};
use crate::tokenize::{Input, Token, Tokenizer};
use crate::{CsvError, CsvResult};

const READ_CHUNK: usize = 8 * 1024;

/// A header-construction failure, kept so every later call re-reports it.
/// The would-be header row is already consumed by the time it surfaces, so
/// letting a retry through would hand out data rows as headerless records.
#[derive(Debug, Clone)]
enum HeaderFault {
    Duplicate(String),
    Invalid(String),
}

impl HeaderFault {
    fn from_error(err: &CsvError) -> Option<Self> {
        match err {
            CsvError::DuplicateHeader(name) => Some(Self::Duplicate(name.clone())),
            CsvError::InvalidHeader(msg) => Some(Self::Invalid(msg.clone())),
            _ => None,
        }
    }

    fn to_error(&self) -> CsvError {
        match self {
            Self::Duplicate(name) => CsvError::DuplicateHeader(name.clone()),
            Self::Invalid(msg) => CsvError::InvalidHeader(msg.clone()),
        }
    }
}

/// Streaming record reader over any `AsyncRead`.
///
/// The reader owns the byte source for the whole session; it decodes chunks
/// incrementally (BOM-aware, defaulting to UTF-8), feeds the tokenizer, and
/// suspends between records. The consumer drives progress one
/// `read_record().await` at a time; dropping the reader releases the source.
/// Single-session, single-task: there is no internal locking.
pub struct Reader<R> {
    rdr: R,
    decoder: Decoder,
    pending: BytesMut,
    input: Input,
    tokenizer: Tokenizer,
    format: Format,
    headers: Option<Arc<Headers>>,
    headers_resolved: bool,
    header_fault: Option<HeaderFault>,
    records: u64,
    source_eof: bool,
}

impl<R: AsyncRead + Unpin> Reader<R> {
    /// Reader for UTF-8 input (a leading BOM, UTF-8 or UTF-16, is honored
    /// and stripped). The format is validated here, before any I/O.
    pub fn new(rdr: R, format: Format) -> CsvResult<Self> {
        Self::with_charset(rdr, format, UTF_8)
    }

    /// Reader for input in any `encoding_rs` charset.
    pub fn with_charset(rdr: R, format: Format, charset: &'static Encoding) -> CsvResult<Self> {
        format.validate()?;
        Ok(Self {
            rdr,
            decoder: charset.new_decoder(),
            pending: BytesMut::new(),
            input: Input::new(),
            tokenizer: Tokenizer::new(format.clone()),
            format,
            headers: None,
            headers_resolved: false,
            header_fault: None,
            records: 0,
            source_eof: false,
        })
    }

    /// The header mapping, resolving it first if necessary. With
    /// `HeaderMode::FirstRecord` this consumes the first record from the
    /// stream; it is never delivered as data.
    pub async fn headers(&mut self) -> CsvResult<Option<&Headers>> {
        self.resolve_headers().await?;
        Ok(self.headers.as_deref())
    }

    /// Next record, or `None` on clean end of stream. Record numbers are
    /// 1-based and count delivered records only.
    pub async fn read_record(&mut self) -> CsvResult<Option<Record>> {
        self.resolve_headers().await?;
        let Some((fields, offset)) = self.next_raw().await? else {
            return Ok(None);
        };
        self.records += 1;
        Ok(Some(Record::new(
            fields,
            self.records,
            offset,
            self.headers.clone(),
        )))
    }

    /// Records delivered so far.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.rdr
    }

    async fn resolve_headers(&mut self) -> CsvResult<()> {
        if let Some(fault) = &self.header_fault {
            return Err(fault.to_error());
        }
        if self.headers_resolved {
            return Ok(());
        }
        self.headers_resolved = true;
        match self.format.header.clone() {
            HeaderMode::None => {}
            HeaderMode::Names(names) => {
                self.headers = Some(Arc::new(self.build_headers(names)?));
            }
            HeaderMode::FirstRecord => {
                if let Some((fields, _offset)) = self.next_raw().await? {
                    let names: Vec<String> = fields.into_iter().map(Field::into_value).collect();
                    self.headers = Some(Arc::new(self.build_headers(names)?));
                }
            }
        }
        Ok(())
    }

    fn build_headers(&mut self, names: Vec<String>) -> CsvResult<Headers> {
        Headers::from_names(names, &self.format).map_err(|err| {
            self.header_fault = HeaderFault::from_error(&err);
            err
        })
    }

    /// Group the tokenizer's fields up to the next end-of-record flag,
    /// filling the input from the source whenever the tokenizer runs short.
    async fn next_raw(&mut self) -> CsvResult<Option<(Vec<Field>, u64)>> {
        let mut fields: Vec<Field> = Vec::new();
        let mut offset = 0;
        loop {
            match self.tokenizer.next_token(&mut self.input)? {
                Token::Field {
                    value,
                    quoted,
                    last_in_record,
                } => {
                    if fields.is_empty() {
                        offset = self.tokenizer.record_start();
                    }
                    fields.push(Field::new(value, quoted));
                    if last_in_record {
                        return Ok(Some((fields, offset)));
                    }
                }
                Token::Incomplete => self.fill().await?,
                Token::End => return Ok(None),
            }
        }
    }

    async fn fill(&mut self) -> CsvResult<()> {
        debug_assert!(!self.source_eof, "tokenizer asked for input past EOF");
        let mut chunk = [0u8; READ_CHUNK];
        let n = self.rdr.read(&mut chunk).await?;
        if n == 0 {
            self.source_eof = true;
        } else {
            self.pending.extend_from_slice(&chunk[..n]);
        }
        self.decode_pending(self.source_eof);
        if self.source_eof {
            self.input.finish();
        }
        Ok(())
    }

    /// Decode whatever is decodable; bytes of a split code point stay
    /// buffered in the decoder until the next chunk (or the final flush).
    fn decode_pending(&mut self, last: bool) {
        if self.pending.is_empty() && !last {
            return;
        }
        let capacity = self
            .decoder
            .max_utf8_buffer_length(self.pending.len())
            .unwrap_or(self.pending.len() * 2 + 16);
        let mut out = String::with_capacity(capacity);
        let (_result, read, _replaced) = self.decoder.decode_to_string(&self.pending, &mut out, last);
        self.pending.advance(read);
        if !out.is_empty() {
            self.input.push_str(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &'static str, format: Format) -> Reader<&'static [u8]> {
        Reader::new(text.as_bytes(), format).unwrap()
    }

    #[tokio::test]
    async fn record_numbers_are_one_based_and_skip_nothing_delivered() -> CsvResult<()> {
        let fmt = Format::default().comment(Some('#'))?;
        let mut rdr = reader("#c\na,b\n\nc,d\n", fmt);
        let first = rdr.read_record().await?.unwrap();
        assert_eq!(first.number(), 1);
        let second = rdr.read_record().await?.unwrap();
        assert_eq!(second.number(), 2);
        assert_eq!(second.get(0)?, "c");
        assert!(rdr.read_record().await?.is_none());
        assert_eq!(rdr.record_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn header_record_is_consumed_and_takes_no_number() -> CsvResult<()> {
        let fmt = Format::default().header(HeaderMode::FirstRecord);
        let mut rdr = reader("name,age\nada,36\n", fmt);
        let names: Vec<String> = rdr.headers().await?.unwrap().names().to_vec();
        assert_eq!(names, ["name", "age"]);
        let rec = rdr.read_record().await?.unwrap();
        assert_eq!(rec.number(), 1);
        assert_eq!(rec.get_named("name")?, "ada");
        assert!(rdr.read_record().await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn explicit_names_leave_all_records_as_data() -> CsvResult<()> {
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let fmt = Format::default().header(HeaderMode::Names(names));
        let mut rdr = reader("a,b\n", fmt);
        let rec = rdr.read_record().await?.unwrap();
        assert_eq!(rec.get_named("A")?, "a");
        assert!(!rec.is_consistent());
        let map = rec.to_map();
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key("C"));
        Ok(())
    }

    #[tokio::test]
    async fn offsets_point_at_record_starts() -> CsvResult<()> {
        let mut rdr = reader("ab,c\nde,f\n", Format::default());
        assert_eq!(rdr.read_record().await?.unwrap().offset(), 0);
        assert_eq!(rdr.read_record().await?.unwrap().offset(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn headers_are_shared_not_copied() -> CsvResult<()> {
        let fmt = Format::default().header(HeaderMode::FirstRecord);
        let mut rdr = reader("h\na\nb\n", fmt);
        let first = rdr.read_record().await?.unwrap();
        let second = rdr.read_record().await?.unwrap();
        assert!(std::ptr::eq(
            first.headers().unwrap(),
            second.headers().unwrap()
        ));
        Ok(())
    }

    #[tokio::test]
    async fn utf8_bom_is_stripped() -> CsvResult<()> {
        let bytes: &[u8] = b"\xef\xbb\xbfx,y\n";
        let mut rdr = Reader::new(bytes, Format::default())?;
        let rec = rdr.read_record().await?.unwrap();
        assert_eq!(rec.get(0)?, "x");
        Ok(())
    }

    #[tokio::test]
    async fn non_utf8_charset_is_decoded() -> CsvResult<()> {
        // "café,1" in windows-1252: 0xe9 for é.
        let bytes: &[u8] = b"caf\xe9,1\n";
        let mut rdr = Reader::with_charset(bytes, Format::default(), encoding_rs::WINDOWS_1252)?;
        let rec = rdr.read_record().await?.unwrap();
        assert_eq!(rec.get(0)?, "café");
        Ok(())
    }

    #[tokio::test]
    async fn header_failure_repeats_instead_of_leaking_data_rows() {
        let fmt = Format::default().header(HeaderMode::FirstRecord);
        let mut rdr = reader("a,b,a\n1,2,3\n", fmt);
        let err = rdr.read_record().await.unwrap_err();
        assert!(matches!(err, crate::CsvError::DuplicateHeader(ref n) if n == "a"));
        // The rows after the bad header must not come back as headerless
        // data on retry; the failure is latched.
        let err = rdr.read_record().await.unwrap_err();
        assert!(matches!(err, crate::CsvError::DuplicateHeader(ref n) if n == "a"));
        let err = rdr.headers().await.unwrap_err();
        assert!(matches!(err, crate::CsvError::DuplicateHeader(_)));
    }

    #[tokio::test]
    async fn invalid_header_failure_is_latched_too() {
        let fmt = Format::default().header(HeaderMode::FirstRecord);
        let mut rdr = reader("a,,c\n1,2,3\n", fmt);
        assert!(matches!(
            rdr.read_record().await.unwrap_err(),
            crate::CsvError::InvalidHeader(_)
        ));
        assert!(matches!(
            rdr.read_record().await.unwrap_err(),
            crate::CsvError::InvalidHeader(_)
        ));
    }

    #[tokio::test]
    async fn unterminated_quote_surfaces_as_malformed_input() {
        let mut rdr = reader("\"abc", Format::default());
        let err = rdr.read_record().await.unwrap_err();
        assert!(matches!(err, crate::CsvError::MalformedInput { .. }));
    }

    #[tokio::test]
    async fn empty_source_yields_no_records_and_no_headers() -> CsvResult<()> {
        let fmt = Format::default().header(HeaderMode::FirstRecord);
        let mut rdr = reader("", fmt);
        assert!(rdr.headers().await?.is_none());
        assert!(rdr.read_record().await?.is_none());
        Ok(())
    }
}
