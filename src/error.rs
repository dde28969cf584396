use std::fmt;
use std::io;
use std::result;

use crate::normalize::QuoteError;
use crate::Row;

/// Problems found while turning the command line into a configuration. None
/// of them lets the pipeline start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// a token of a column list is not a non-negative integer
    InvalidColumn(String),

    /// both an inclusion and an exclusion list were given
    BothColumnLists,

    /// a delimiter is not a single ASCII character or is reserved
    InvalidDelimiter(String),

    /// the comment marker is not a single ASCII character or is reserved
    InvalidComment(String),

    /// comment marker and input delimiter are the same character
    CommentIsDelimiter(char),

    InvalidFieldsPerRecord(String),

    /// no encoding answers to this label
    UnknownEncoding(String),

    /// the encoding exists but cannot be scanned byte by byte
    UnsupportedEncoding(String),
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::InvalidColumn(ref t) => {
                write!(f, "invalid column index {:?} in column list", t)
            }
            ConfigError::BothColumnLists => {
                write!(f, "inclusion (-k) and exclusion (-d) columns cannot be given together")
            }
            ConfigError::InvalidDelimiter(ref d) => write!(f, "invalid delimiter {:?}", d),
            ConfigError::InvalidComment(ref c) => write!(f, "invalid comment character {:?}", c),
            ConfigError::CommentIsDelimiter(c) => {
                write!(f, "comment character {:?} is also the input delimiter", c)
            }
            ConfigError::InvalidFieldsPerRecord(ref v) => {
                write!(f, "invalid number of fields per record {:?}", v)
            }
            ConfigError::UnknownEncoding(ref e) => write!(f, "unknown encoding {:?}", e),
            ConfigError::UnsupportedEncoding(ref e) => {
                write!(f, "encoding {} is not ASCII compatible", e)
            }
        }
    }
}

/// An error found somewhere in the filtering chain. Every one of them is
/// fatal.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),

    /// the csv reader failed
    Csv(csv::Error),

    Quote(QuoteError),

    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    Decode(String),

    /// the csv writer refused a row
    Write(csv::Error),

    Flush(io::Error),

    ConsumerPanicked,
}

pub type Result<T> = result::Result<T, Error>;

/// What flows out of the input stream. Either a row or an error.
pub type RowResult = Result<Row>;

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Error {
        Error::Config(error)
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Error {
        // strict quoting violations travel through the csv reader as I/O
        // errors, bring them back to their own variant
        if let csv::ErrorKind::Io(ref e) = *error.kind() {
            if let Some(quote) = e.get_ref().and_then(|inner| inner.downcast_ref::<QuoteError>()) {
                return Error::Quote(quote.clone());
            }
        }

        Error::Csv(error)
    }
}

impl From<QuoteError> for Error {
    fn from(error: QuoteError) -> Error {
        Error::Quote(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Config(ref e) => Some(e),
            Error::Csv(ref e) | Error::Write(ref e) => Some(e),
            Error::Quote(ref e) => Some(e),
            Error::Flush(ref e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Config(ref e) => write!(f, "configuration error: {}", e),
            Error::Csv(ref e) => write!(f, "read error: {}", e),
            Error::Quote(ref e) => write!(f, "parse error: {}", e),
            Error::FieldCount {
                line,
                expected,
                found,
            } => write!(
                f,
                "parse error: record on line {} has {} fields, expected {}",
                line, found, expected
            ),
            Error::Decode(ref e) => write!(f, "could not decode field: {}", e),
            Error::Write(ref e) => write!(f, "write error: {}", e),
            Error::Flush(ref e) => write!(f, "flush error: {}", e),
            Error::ConsumerPanicked => write!(f, "the output stage stopped unexpectedly"),
        }
    }
}
