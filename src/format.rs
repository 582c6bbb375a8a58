use crate::{CsvError, CsvResult};

/// Record-separator policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Separator {
    /// Accept `CRLF`, `LF`, or `CR` interchangeably; `CR` immediately
    /// followed by `LF` counts as one separator, never two. The writer emits
    /// `LF` under this policy.
    Any,
    /// Exactly this character sequence, nothing else.
    Sequence(String),
}

/// When the writer wraps a field in quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteMode {
    /// Quote every field.
    All,
    /// Quote only fields that need it: embedded delimiter, quote character,
    /// record-separator character, or a leading comment marker.
    #[default]
    Minimal,
    /// Like `Minimal`, plus every field that does not parse as a number.
    NonNumeric,
    /// Never quote. Specials are escaped when an escape character is
    /// configured; otherwise a field containing them cannot be represented.
    None,
}

/// Where the header mapping comes from, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// No header; records support index access only.
    #[default]
    None,
    /// Derive names from the first record, which is consumed and not
    /// delivered as data.
    FirstRecord,
    /// Explicit names; every record in the stream is data.
    Names(Vec<String>),
}

/// Immutable dialect descriptor consumed by [`crate::Reader`],
/// [`crate::Writer`], and [`crate::Tokenizer`].
///
/// Conflicting settings are rejected by the setter that introduces them,
/// never discovered mid-parse. The default matches the common permissive
/// dialect: comma delimiter, double-quote quoting, any line-ending style,
/// empty lines skipped, no escape or comment character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub(crate) delimiter: String,
    pub(crate) quote: Option<char>,
    pub(crate) escape: Option<char>,
    pub(crate) comment: Option<char>,
    pub(crate) separator: Separator,
    pub(crate) trim: bool,
    pub(crate) ignore_empty_lines: bool,
    pub(crate) allow_missing_column_names: bool,
    pub(crate) allow_duplicate_headers: bool,
    pub(crate) quote_mode: QuoteMode,
    pub(crate) header: HeaderMode,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            quote: Some('"'),
            escape: None,
            comment: None,
            separator: Separator::Any,
            trim: false,
            ignore_empty_lines: true,
            allow_missing_column_names: false,
            allow_duplicate_headers: false,
            quote_mode: QuoteMode::default(),
            header: HeaderMode::default(),
        }
    }
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field delimiter, one or more characters.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> CsvResult<Self> {
        self.delimiter = delimiter.into();
        self.validate()?;
        Ok(self)
    }

    /// Quote character; `None` disables quoting entirely.
    pub fn quote(mut self, quote: Option<char>) -> CsvResult<Self> {
        self.quote = quote;
        self.validate()?;
        Ok(self)
    }

    /// Escape character for unquoted fields; `None` disables escaping.
    pub fn escape(mut self, escape: Option<char>) -> CsvResult<Self> {
        self.escape = escape;
        self.validate()?;
        Ok(self)
    }

    /// Comment marker, recognized only at the start of a record. The rest of
    /// the line is discarded and yields no record.
    pub fn comment(mut self, comment: Option<char>) -> CsvResult<Self> {
        self.comment = comment;
        self.validate()?;
        Ok(self)
    }

    pub fn record_separator(mut self, separator: Separator) -> CsvResult<Self> {
        self.separator = separator;
        self.validate()?;
        Ok(self)
    }

    /// Trim surrounding whitespace from unquoted fields at field-boundary
    /// time. Quoted content is never trimmed.
    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// When enabled, a line holding nothing but a record separator is
    /// discarded without consuming a record number.
    pub fn ignore_empty_lines(mut self, ignore: bool) -> Self {
        self.ignore_empty_lines = ignore;
        self
    }

    /// Permit blank header names; blank names occupy a column position but
    /// are not name-addressable.
    pub fn allow_missing_column_names(mut self, allow: bool) -> Self {
        self.allow_missing_column_names = allow;
        self
    }

    /// Permit repeated header names; the last occurrence wins in the
    /// name-to-index map.
    pub fn allow_duplicate_headers(mut self, allow: bool) -> Self {
        self.allow_duplicate_headers = allow;
        self
    }

    pub fn quote_mode(mut self, mode: QuoteMode) -> Self {
        self.quote_mode = mode;
        self
    }

    pub fn header(mut self, header: HeaderMode) -> Self {
        self.header = header;
        self
    }

    /// Check the pairwise-distinctness invariants. Every setter that can
    /// introduce a conflict runs this, as do `Reader::new` and `Writer::new`.
    pub(crate) fn validate(&self) -> CsvResult<()> {
        if self.delimiter.is_empty() {
            return Err(CsvError::InvalidConfiguration(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.delimiter.chars().any(|c| c == '\r' || c == '\n') {
            return Err(CsvError::InvalidConfiguration(
                "delimiter must not contain line-ending characters".to_string(),
            ));
        }
        let special = [("quote", self.quote), ("escape", self.escape), ("comment", self.comment)];
        for (what, c) in special {
            if let Some(c) = c {
                if self.delimiter.contains(c) {
                    return Err(CsvError::InvalidConfiguration(format!(
                        "the {what} character {c:?} collides with the delimiter {:?}",
                        self.delimiter
                    )));
                }
            }
        }
        for i in 0..special.len() {
            for j in i + 1..special.len() {
                let (a_name, a) = special[i];
                let (b_name, b) = special[j];
                if let (Some(c), true) = (a, a == b) {
                    return Err(CsvError::InvalidConfiguration(format!(
                        "the {a_name} and {b_name} characters are both {c:?}"
                    )));
                }
            }
        }
        if let Separator::Sequence(seq) = &self.separator {
            if seq.is_empty() {
                return Err(CsvError::InvalidConfiguration(
                    "record separator must not be empty".to_string(),
                ));
            }
            if seq.chars().any(|c| self.delimiter.contains(c)) {
                return Err(CsvError::InvalidConfiguration(
                    "record separator shares characters with the delimiter".to_string(),
                ));
            }
            for (what, c) in special {
                if let Some(c) = c {
                    if seq.contains(c) {
                        return Err(CsvError::InvalidConfiguration(format!(
                            "record separator contains the {what} character {c:?}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
