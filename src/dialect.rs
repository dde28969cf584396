//! Formatting options of the input and output streams
use std::fmt;

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use encoding::label::encoding_from_whatwg_label;
use encoding::EncodingRef;

use crate::error::ConfigError;

/// How many fields each input record must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldsPerRecord {
    /// whatever the first record has, every other record must match it
    FirstRecord,

    /// no check at all
    Unchecked,

    Exactly(usize),
}

impl From<i64> for FieldsPerRecord {
    fn from(n: i64) -> FieldsPerRecord {
        if n == 0 {
            FieldsPerRecord::FirstRecord
        } else if n < 0 {
            FieldsPerRecord::Unchecked
        } else {
            FieldsPerRecord::Exactly(n as usize)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    Newline,
    CrLf,
}

impl LineTerminator {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineTerminator::Newline => b"\n",
            LineTerminator::CrLf => b"\r\n",
        }
    }

    fn terminator(self) -> Terminator {
        match self {
            LineTerminator::Newline => Terminator::Any(b'\n'),
            LineTerminator::CrLf => Terminator::CRLF,
        }
    }
}

fn valid_delimiter(b: u8) -> bool {
    b.is_ascii() && !matches!(b, b'"' | b'\r' | b'\n')
}

fn valid_comment(b: u8) -> bool {
    b.is_ascii() && !matches!(b, b'\r' | b'\n')
}

/// Parses a delimiter given in the command line. It must be exactly one ASCII
/// character and cannot be a quote or a line end.
pub fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    match *value.as_bytes() {
        [b] if valid_delimiter(b) => Ok(b),
        _ => Err(ConfigError::InvalidDelimiter(value.to_string())),
    }
}

/// Parses the comment character. An empty value disables comments.
pub fn parse_comment(value: &str) -> Result<Option<u8>, ConfigError> {
    match *value.as_bytes() {
        [] => Ok(None),
        [b] if valid_comment(b) => Ok(Some(b)),
        _ => Err(ConfigError::InvalidComment(value.to_string())),
    }
}

/// Looks up a text encoding by its WHATWG label, such as `utf-8` or `latin1`.
pub fn parse_encoding(label: &str) -> Result<EncodingRef, ConfigError> {
    let encoding = encoding_from_whatwg_label(label)
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))?;

    // quotes, delimiters and line ends are located byte by byte
    match encoding.name() {
        "utf-16le" | "utf-16be" => Err(ConfigError::UnsupportedEncoding(
            encoding.name().to_string(),
        )),
        _ => Ok(encoding),
    }
}

/// Options governing how the input stream is parsed
#[derive(Clone, Copy)]
pub struct InputDialect {
    pub delimiter: u8,
    pub comment: Option<u8>,
    pub fields_per_record: FieldsPerRecord,
    pub lazy_quotes: bool,
    pub trim_leading_space: bool,
    pub encoding: EncodingRef,
}

impl Default for InputDialect {
    fn default() -> InputDialect {
        InputDialect {
            delimiter: b',',
            comment: Some(b'"'),
            fields_per_record: FieldsPerRecord::FirstRecord,
            lazy_quotes: false,
            trim_leading_space: true,
            encoding: encoding::all::UTF_8,
        }
    }
}

impl fmt::Debug for InputDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDialect")
            .field("delimiter", &(self.delimiter as char))
            .field("comment", &self.comment.map(char::from))
            .field("fields_per_record", &self.fields_per_record)
            .field("lazy_quotes", &self.lazy_quotes)
            .field("trim_leading_space", &self.trim_leading_space)
            .field("encoding", &self.encoding.name())
            .finish()
    }
}

impl InputDialect {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_delimiter(self.delimiter) {
            return Err(ConfigError::InvalidDelimiter(char::from(self.delimiter).to_string()));
        }

        if let Some(comment) = self.comment {
            if !valid_comment(comment) {
                return Err(ConfigError::InvalidComment(char::from(comment).to_string()));
            }

            if comment == self.delimiter {
                return Err(ConfigError::CommentIsDelimiter(comment as char));
            }
        }

        Ok(())
    }

    /// The csv reader configuration. Comments, trimming and quote checks are
    /// done by the `Normalizer`, field counts by the input stream, so the
    /// reader is left lenient.
    pub fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();

        builder
            .delimiter(self.delimiter)
            .comment(None)
            .has_headers(false)
            .flexible(true)
            .quoting(true)
            .double_quote(true);

        builder
    }
}

/// Options governing how the output stream is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDialect {
    pub delimiter: u8,
    pub line_terminator: LineTerminator,
}

impl Default for OutputDialect {
    fn default() -> OutputDialect {
        OutputDialect {
            delimiter: b',',
            line_terminator: LineTerminator::Newline,
        }
    }
}

impl OutputDialect {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !valid_delimiter(self.delimiter) {
            return Err(ConfigError::InvalidDelimiter(char::from(self.delimiter).to_string()));
        }

        Ok(())
    }

    /// Rows lose a varying number of fields, so the writer is flexible.
    pub fn writer_builder(&self) -> WriterBuilder {
        let mut builder = WriterBuilder::new();

        builder
            .delimiter(self.delimiter)
            .terminator(self.line_terminator.terminator())
            .has_headers(false)
            .flexible(true);

        builder
    }
}
