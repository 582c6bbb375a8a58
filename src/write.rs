//! Emit direction: field sequences out, dialect rules mirrored from the
//! tokenizer so parse/print round-trips are lossless.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::format::{Format, QuoteMode, Separator};
use crate::{CsvError, CsvResult};

/// Field-sequence writer over any `AsyncWrite`.
///
/// Each `write_record` call encodes one record and terminates it with the
/// configured separator (`Separator::Any` emits `LF`). Embedded quote
/// characters are doubled inside quoted output, matching what the tokenizer
/// collapses on the way back in.
pub struct Writer<W> {
    out: W,
    format: Format,
    separator: String,
    records: u64,
}

impl<W: AsyncWrite + Unpin> Writer<W> {
    /// The format is validated here, before anything is written.
    pub fn new(out: W, format: Format) -> CsvResult<Self> {
        format.validate()?;
        let separator = match &format.separator {
            Separator::Any => "\n".to_string(),
            Separator::Sequence(seq) => seq.clone(),
        };
        Ok(Self {
            out,
            format,
            separator,
            records: 0,
        })
    }

    pub async fn write_record<I>(&mut self, fields: I) -> CsvResult<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut line = String::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                line.push_str(&self.format.delimiter);
            }
            self.encode_field(field.as_ref(), &mut line)?;
        }
        line.push_str(&self.separator);
        self.out.write_all(line.as_bytes()).await?;
        self.records += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub async fn flush(&mut self) -> CsvResult<()> {
        self.out.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn encode_field(&self, value: &str, line: &mut String) -> CsvResult<()> {
        match self.format.quote {
            Some(quote) if self.quote_wanted(value) => {
                line.push(quote);
                for c in value.chars() {
                    if c == quote {
                        line.push(quote);
                    }
                    line.push(c);
                }
                line.push(quote);
                Ok(())
            }
            _ => self.encode_bare(value, line),
        }
    }

    /// Quote-mode policy, mirroring the tokenizer: a value needs quotes when
    /// it contains the delimiter, the quote character, a record-separator
    /// character, or starts with the comment marker.
    fn quote_wanted(&self, value: &str) -> bool {
        match self.format.quote_mode {
            QuoteMode::All => true,
            QuoteMode::Minimal => self.has_special(value),
            QuoteMode::NonNumeric => self.has_special(value) || value.parse::<f64>().is_err(),
            QuoteMode::None => false,
        }
    }

    fn has_special(&self, value: &str) -> bool {
        if value.contains(&self.format.delimiter) {
            return true;
        }
        if self.format.quote.is_some_and(|q| value.contains(q)) {
            return true;
        }
        if self
            .format
            .comment
            .is_some_and(|c| value.starts_with(c))
        {
            return true;
        }
        match &self.format.separator {
            Separator::Any => value.contains(['\r', '\n']),
            Separator::Sequence(seq) => seq.chars().any(|c| value.contains(c)),
        }
    }

    /// Unquoted output. With an escape character configured, specials are
    /// escaped; without one, a value containing them has no faithful
    /// representation and is refused.
    fn encode_bare(&self, value: &str, line: &mut String) -> CsvResult<()> {
        if let Some(escape) = self.format.escape {
            for c in value.chars() {
                if self.is_special_char(c) || c == escape {
                    line.push(escape);
                }
                line.push(c);
            }
            return Ok(());
        }
        if self.has_special(value) {
            return Err(CsvError::InvalidConfiguration(format!(
                "value {value:?} contains dialect characters and the format has no quote or escape to represent them"
            )));
        }
        line.push_str(value);
        Ok(())
    }

    fn is_special_char(&self, c: char) -> bool {
        if self.format.delimiter.contains(c) {
            return true;
        }
        if self.format.quote == Some(c) || self.format.comment == Some(c) {
            return true;
        }
        match &self.format.separator {
            Separator::Any => c == '\r' || c == '\n',
            Separator::Sequence(seq) => seq.contains(c),
        }
    }
}
