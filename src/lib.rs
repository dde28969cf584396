//! Keeps or drops columns of a CSV stream.
//!
//! Rows are parsed under an input dialect, projected through a
//! [`ColumnSelection`] and written under an output dialect. Parsing and
//! writing happen on two threads joined by a small bounded queue.
pub mod columns;
pub mod config;
pub mod dialect;
mod error;
mod input;
mod normalize;
mod output;
pub mod pipeline;

pub use columns::{ColumnSelection, WIDTH};
pub use config::Config;
pub use dialect::{FieldsPerRecord, InputDialect, LineTerminator, OutputDialect};
pub use error::{ConfigError, Error, Result, RowResult};
pub use input::InputStream;
pub use normalize::{Normalizer, QuoteError, QuoteErrorKind};
pub use output::OutputSink;
pub use pipeline::{Pipeline, Report, State};

/// One parsed record, its fields in column order.
pub type Row = Vec<String>;
