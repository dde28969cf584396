//! A byte level pass in front of the csv reader.
//!
//! The csv parser is lenient about quotes, knows nothing about trimming
//! before quote processing and treats comments as part of its own grammar.
//! `Normalizer` applies those input dialect rules on the raw stream so the
//! parser only ever sees well formed data.
use std::fmt;
use std::io::{self, Read};

use crate::dialect::InputDialect;

const QUOTE: u8 = b'"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteErrorKind {
    /// a quote inside a field that didn't start with one
    BareQuote,

    /// something other than a delimiter or a line end after a closing quote
    ExtraneousQuote,

    /// the input ended inside a quoted field
    Unterminated,
}

/// A strict quoting violation and where it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteError {
    pub line: u64,
    pub column: u64,
    pub kind: QuoteErrorKind,
}

impl std::error::Error for QuoteError {}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            QuoteErrorKind::BareQuote => "bare \" in non-quoted field",
            QuoteErrorKind::ExtraneousQuote => "extraneous \" in quoted field",
            QuoteErrorKind::Unterminated => "missing closing \" in quoted field",
        };

        write!(f, "line {}, column {}: {}", self.line, self.column, what)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    RecordStart,
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
    Comment,
}

enum Step {
    Keep,
    Drop,
    Fail(QuoteErrorKind),
}

fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\x0b' | b'\x0c')
}

fn is_line_end(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

pub struct Normalizer<R> {
    inner: R,
    delimiter: u8,
    comment: Option<u8>,
    lazy_quotes: bool,
    trim_leading_space: bool,
    state: State,
    line: u64,
    column: u64,
    failed: Option<QuoteError>,
}

impl<R: Read> Normalizer<R> {
    pub fn new(inner: R, dialect: &InputDialect) -> Normalizer<R> {
        Normalizer {
            inner,
            delimiter: dialect.delimiter,
            comment: dialect.comment,
            lazy_quotes: dialect.lazy_quotes,
            trim_leading_space: dialect.trim_leading_space,
            state: State::RecordStart,
            line: 1,
            column: 0,
            failed: None,
        }
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            State::Comment => {
                if byte == b'\n' {
                    self.state = State::RecordStart;
                    return Step::Keep;
                }

                Step::Drop
            }
            State::RecordStart if Some(byte) == self.comment => {
                self.state = State::Comment;
                Step::Drop
            }
            State::RecordStart if is_line_end(byte) => Step::Keep,
            State::RecordStart | State::FieldStart => {
                if self.trim_leading_space && is_blank(byte) {
                    self.state = State::FieldStart;
                    return Step::Drop;
                }

                self.state = match byte {
                    QUOTE => State::Quoted,
                    b if b == self.delimiter => State::FieldStart,
                    b if is_line_end(b) => State::RecordStart,
                    _ => State::Unquoted,
                };

                Step::Keep
            }
            State::Unquoted => match byte {
                QUOTE if !self.lazy_quotes => Step::Fail(QuoteErrorKind::BareQuote),
                b if b == self.delimiter => {
                    self.state = State::FieldStart;
                    Step::Keep
                }
                b if is_line_end(b) => {
                    self.state = State::RecordStart;
                    Step::Keep
                }
                _ => Step::Keep,
            },
            State::Quoted => {
                if byte == QUOTE {
                    self.state = State::QuoteInQuoted;
                }

                Step::Keep
            }
            State::QuoteInQuoted => {
                self.state = match byte {
                    QUOTE => State::Quoted,
                    b if b == self.delimiter => State::FieldStart,
                    b if is_line_end(b) => State::RecordStart,
                    // the csv parser goes on with an unquoted field
                    _ if self.lazy_quotes => State::Unquoted,
                    _ => return Step::Fail(QuoteErrorKind::ExtraneousQuote),
                };

                Step::Keep
            }
        }
    }

    /// Runs the state machine over `buf`, compacting the kept bytes to its
    /// front. Returns how many bytes were kept and the violation that stopped
    /// the scan, if any.
    fn scan(&mut self, buf: &mut [u8]) -> (usize, Option<QuoteError>) {
        let mut kept = 0;

        for i in 0..buf.len() {
            let byte = buf[i];

            match self.step(byte) {
                Step::Keep => {
                    buf[kept] = byte;
                    kept += 1;
                }
                Step::Drop => {}
                Step::Fail(kind) => {
                    let error = QuoteError {
                        line: self.line,
                        column: self.column + 1,
                        kind,
                    };

                    return (kept, Some(error));
                }
            }

            if byte == b'\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }

        (kept, None)
    }

    fn fail(&mut self, error: QuoteError) -> io::Error {
        self.failed = Some(error.clone());

        io::Error::new(io::ErrorKind::InvalidData, error)
    }
}

impl<R: Read> Read for Normalizer<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(ref error) = self.failed {
            return Err(io::Error::new(io::ErrorKind::InvalidData, error.clone()));
        }

        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let read = self.inner.read(buf)?;

            if read == 0 {
                if self.state == State::Quoted && !self.lazy_quotes {
                    let error = QuoteError {
                        line: self.line,
                        column: self.column + 1,
                        kind: QuoteErrorKind::Unterminated,
                    };

                    return Err(self.fail(error));
                }

                return Ok(0);
            }

            match self.scan(&mut buf[..read]) {
                // nothing usable before the violation, report it now
                (0, Some(error)) => return Err(self.fail(error)),
                // hand over what precedes it, the next read fails
                (kept, Some(error)) => {
                    self.failed = Some(error);
                    return Ok(kept);
                }
                // everything was trimmed away, 0 would mean end of input
                (0, None) => continue,
                (kept, None) => return Ok(kept),
            }
        }
    }
}
