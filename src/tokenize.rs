//! The dialect lexer: a resumable, character-at-a-time state machine.
//!
//! The tokenizer owns no I/O. Callers decode their source into an [`Input`]
//! buffer (any amount at a time) and pull [`Token`]s; when the lookahead
//! window cannot be satisfied and the input is not finished, the tokenizer
//! answers [`Token::Incomplete`] and resumes exactly where it stopped on the
//! next call. This is what lets the async reader suspend between chunks
//! without materializing the stream.

use std::collections::VecDeque;

use crate::format::{Format, Separator};
use crate::{CsvError, CsvResult};

/// Character feed for the tokenizer. The tokenizer is the single consumer;
/// the cursor position (`position`) counts every character it has taken,
/// which is what record offsets are measured in.
#[derive(Debug, Default)]
pub struct Input {
    buf: VecDeque<char>,
    eof: bool,
    consumed: u64,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text. Panics in debug builds if called after
    /// [`Input::finish`].
    pub fn push_str(&mut self, s: &str) {
        debug_assert!(!self.eof, "push_str after finish");
        self.buf.extend(s.chars());
    }

    /// Signal end-of-stream. No further pushes are expected.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    pub fn is_finished(&self) -> bool {
        self.eof
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Characters consumed so far.
    pub fn position(&self) -> u64 {
        self.consumed
    }

    fn peek(&self, i: usize) -> Option<char> {
        self.buf.get(i).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.buf.pop_front();
        if c.is_some() {
            self.consumed += 1;
        }
        c
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }
}

/// One tokenizer step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A complete field value, with the raw quotes already stripped and
    /// doubled quotes collapsed.
    Field {
        value: String,
        /// The field was enclosed in quote characters in the source.
        quoted: bool,
        /// This field closes its record (separator seen, or end of input
        /// with buffered content).
        last_in_record: bool,
    },
    /// Not enough lookahead; push more input (or call
    /// [`Input::finish`]) and retry.
    Incomplete,
    /// Clean end of stream. Repeated calls keep answering `End`.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    InUnquoted,
    InQuoted,
    QuoteInQuoted,
    Escape,
    SkipLine,
}

/// The state machine. One instance per parse session; it is the sole
/// mutator of the [`Input`] cursor, so `record_start` offsets are exact.
#[derive(Debug)]
pub struct Tokenizer {
    format: Format,
    state: State,
    value: String,
    quoted: bool,
    /// True between records: at stream start, after each record separator,
    /// and after skipped comment/empty lines. Comments are only recognized
    /// here.
    at_record_start: bool,
    record_start: u64,
    /// Lookahead needed to classify any position without guessing.
    need: usize,
}

impl Tokenizer {
    pub fn new(format: Format) -> Self {
        let sep_need = match &format.separator {
            Separator::Any => 2,
            Separator::Sequence(s) => s.chars().count(),
        };
        let need = format.delimiter.chars().count().max(sep_need).max(2);
        Self {
            format,
            state: State::FieldStart,
            value: String::new(),
            quoted: false,
            at_record_start: true,
            record_start: 0,
            need,
        }
    }

    /// Character offset at which the record currently being tokenized began.
    pub fn record_start(&self) -> u64 {
        self.record_start
    }

    /// Produce the next token. `Ok(Token::Incomplete)` means the lookahead
    /// window is short and the input is not finished yet; everything
    /// consumed so far stays buffered in the tokenizer.
    pub fn next_token(&mut self, input: &mut Input) -> CsvResult<Token> {
        loop {
            if input.len() < self.need && !input.eof {
                return Ok(Token::Incomplete);
            }
            match self.state {
                State::FieldStart => {
                    if self.at_record_start {
                        self.record_start = input.position();
                    }
                    let Some(c) = input.peek(0) else {
                        if self.at_record_start {
                            return Ok(Token::End);
                        }
                        // Trailing delimiter: one final empty field.
                        return Ok(self.emit(true));
                    };
                    if self.at_record_start && self.format.comment == Some(c) {
                        input.bump();
                        self.state = State::SkipLine;
                        continue;
                    }
                    if let Some(n) = self.separator_len(input) {
                        input.advance(n);
                        if self.at_record_start && self.format.ignore_empty_lines {
                            // Empty line: no record, no record number.
                            continue;
                        }
                        return Ok(self.emit(true));
                    }
                    if let Some(n) = self.delimiter_len(input) {
                        input.advance(n);
                        self.at_record_start = false;
                        return Ok(self.emit(false));
                    }
                    self.at_record_start = false;
                    if self.format.quote == Some(c) {
                        input.bump();
                        self.quoted = true;
                        self.state = State::InQuoted;
                    } else if self.format.escape == Some(c) {
                        input.bump();
                        self.state = State::Escape;
                    } else {
                        input.bump();
                        self.value.push(c);
                        self.state = State::InUnquoted;
                    }
                }
                State::InUnquoted => {
                    let Some(c) = input.peek(0) else {
                        // Trailing content with no final separator.
                        return Ok(self.emit(true));
                    };
                    if let Some(n) = self.separator_len(input) {
                        input.advance(n);
                        return Ok(self.emit(true));
                    }
                    if let Some(n) = self.delimiter_len(input) {
                        input.advance(n);
                        return Ok(self.emit(false));
                    }
                    if self.format.escape == Some(c) {
                        input.bump();
                        self.state = State::Escape;
                        continue;
                    }
                    input.bump();
                    self.value.push(c);
                }
                State::Escape => {
                    let Some(c) = input.bump() else {
                        return Err(CsvError::MalformedInput {
                            offset: input.position(),
                            msg: "escape character at end of input".to_string(),
                        });
                    };
                    self.value.push(c);
                    self.state = State::InUnquoted;
                }
                State::InQuoted => {
                    // Separators and delimiters are plain data in here.
                    let Some(c) = input.bump() else {
                        return Err(CsvError::MalformedInput {
                            offset: input.position(),
                            msg: "unterminated quoted field at end of input".to_string(),
                        });
                    };
                    if self.format.quote == Some(c) {
                        self.state = State::QuoteInQuoted;
                    } else {
                        self.value.push(c);
                    }
                }
                State::QuoteInQuoted => {
                    let Some(c) = input.peek(0) else {
                        // Closing quote, then end of input.
                        return Ok(self.emit(true));
                    };
                    if self.format.quote == Some(c) {
                        // Doubled quote: one literal quote character.
                        input.bump();
                        self.value.push(c);
                        self.state = State::InQuoted;
                        continue;
                    }
                    if let Some(n) = self.separator_len(input) {
                        input.advance(n);
                        return Ok(self.emit(true));
                    }
                    if let Some(n) = self.delimiter_len(input) {
                        input.advance(n);
                        return Ok(self.emit(false));
                    }
                    // Trailing characters after a closing quote: appended
                    // permissively, keeping the was-quoted flag.
                    input.bump();
                    self.value.push(c);
                    self.state = State::InUnquoted;
                }
                State::SkipLine => {
                    if input.peek(0).is_none() {
                        self.state = State::FieldStart;
                        continue;
                    }
                    if let Some(n) = self.separator_len(input) {
                        input.advance(n);
                        self.state = State::FieldStart;
                        continue;
                    }
                    input.bump();
                }
            }
        }
    }

    fn emit(&mut self, last_in_record: bool) -> Token {
        let mut value = std::mem::take(&mut self.value);
        if self.format.trim && !self.quoted {
            let trimmed = value.trim();
            if trimmed.len() != value.len() {
                value = trimmed.to_string();
            }
        }
        let quoted = std::mem::replace(&mut self.quoted, false);
        self.state = State::FieldStart;
        if last_in_record {
            self.at_record_start = true;
        }
        Token::Field {
            value,
            quoted,
            last_in_record,
        }
    }

    /// Length in chars of a record separator at the cursor, if one starts
    /// there. A partial match truncated by end of input is not a separator.
    fn separator_len(&self, input: &Input) -> Option<usize> {
        match &self.format.separator {
            Separator::Any => match input.peek(0)? {
                '\n' => Some(1),
                '\r' => Some(if input.peek(1) == Some('\n') { 2 } else { 1 }),
                _ => None,
            },
            Separator::Sequence(seq) => {
                let mut n = 0;
                for (i, sc) in seq.chars().enumerate() {
                    if input.peek(i)? != sc {
                        return None;
                    }
                    n += 1;
                }
                Some(n)
            }
        }
    }

    fn delimiter_len(&self, input: &Input) -> Option<usize> {
        let mut n = 0;
        for (i, dc) in self.format.delimiter.chars().enumerate() {
            if input.peek(i)? != dc {
                return None;
            }
            n += 1;
        }
        Some(n)
    }
}
