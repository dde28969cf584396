use csv::{ByteRecord, Reader};
use encoding::{DecoderTrap, EncodingRef};
use log::debug;
use std::io::Read;

use crate::dialect::{FieldsPerRecord, InputDialect};
use crate::error::{Error, Result, RowResult};
use crate::normalize::Normalizer;
use crate::Row;

fn decode(data: &ByteRecord, encoding: EncodingRef) -> Result<Row> {
    let mut row = Row::with_capacity(data.len());

    for item in data.iter() {
        let field = encoding
            .decode(item, DecoderTrap::Replace)
            .map_err(|e| Error::Decode(e.into_owned()))?;

        row.push(field);
    }

    Ok(row)
}

/// The source of rows. Reads records under the input dialect and checks how
/// many fields each one has.
pub struct InputStream<R> {
    reader: Reader<Normalizer<R>>,
    record: ByteRecord,
    encoding: EncodingRef,
    fields_per_record: FieldsPerRecord,
    rows: u64,
    failed: bool,
}

impl<R: Read> InputStream<R> {
    pub fn new(source: R, dialect: &InputDialect) -> InputStream<R> {
        let reader = dialect
            .reader_builder()
            .from_reader(Normalizer::new(source, dialect));

        InputStream {
            reader,
            record: ByteRecord::new(),
            encoding: dialect.encoding,
            fields_per_record: dialect.fields_per_record,
            rows: 0,
            failed: false,
        }
    }

    /// Number of rows read so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    fn check_fields(&mut self) -> Result<()> {
        let found = self.record.len();
        let line = self.record.position().map(|p| p.line()).unwrap_or(0);

        match self.fields_per_record {
            FieldsPerRecord::Unchecked => Ok(()),
            FieldsPerRecord::FirstRecord => {
                debug!("records must have {} fields", found);
                self.fields_per_record = FieldsPerRecord::Exactly(found);
                Ok(())
            }
            FieldsPerRecord::Exactly(expected) if expected == found => Ok(()),
            FieldsPerRecord::Exactly(expected) => Err(Error::FieldCount {
                line,
                expected,
                found,
            }),
        }
    }

    /// Reads the next row. `Ok(None)` means the input is exhausted.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        if !self.reader.read_byte_record(&mut self.record)? {
            return Ok(None);
        }

        self.check_fields()?;
        self.rows += 1;

        decode(&self.record, self.encoding).map(Some)
    }
}

impl<R: Read> Iterator for InputStream<R> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.read_row() {
            Ok(row) => row.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputStream, Row};
    use crate::dialect::{FieldsPerRecord, InputDialect};
    use crate::error::Error;
    use crate::normalize::QuoteErrorKind;
    use encoding::all::WINDOWS_1252;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_read_rows() {
        let mut input = InputStream::new("a,b,c\n1,2,3\n".as_bytes(), &InputDialect::default());

        assert_eq!(input.next().unwrap().unwrap(), row(&["a", "b", "c"]));
        assert_eq!(input.next().unwrap().unwrap(), row(&["1", "2", "3"]));
        assert!(input.next().is_none());
        assert_eq!(input.rows(), 2);
    }

    #[test]
    fn test_default_dialect() {
        // leading spaces go away, lines starting with a quote are comments
        let input = InputStream::new(
            "a, b\n\"commented,out\n c,  \"d,e\"\n".as_bytes(),
            &InputDialect::default(),
        );
        let rows: Vec<Row> = input.map(|r| r.unwrap()).collect();

        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d,e"])]);
    }

    #[test]
    fn test_other_delimiter() {
        let dialect = InputDialect {
            delimiter: b';',
            comment: None,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new("\"x;y\";z\n".as_bytes(), &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["x;y", "z"])]);
    }

    #[test]
    fn test_first_record_sets_the_count() {
        let mut input = InputStream::new("a,b\n1,2\n3\n".as_bytes(), &InputDialect::default());

        assert!(input.next().unwrap().is_ok());
        assert!(input.next().unwrap().is_ok());

        match input.next().unwrap() {
            Err(Error::FieldCount {
                line,
                expected,
                found,
            }) => {
                assert_eq!(line, 3);
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(input.next().is_none());
    }

    #[test]
    fn test_exact_count() {
        let dialect = InputDialect {
            fields_per_record: FieldsPerRecord::Exactly(3),
            ..InputDialect::default()
        };
        let mut input = InputStream::new("a,b\n".as_bytes(), &dialect);

        assert!(matches!(
            input.next(),
            Some(Err(Error::FieldCount { expected: 3, found: 2, .. }))
        ));
    }

    #[test]
    fn test_unchecked_count() {
        let dialect = InputDialect {
            fields_per_record: FieldsPerRecord::Unchecked,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new("a,b\n1\n1,2,3\n".as_bytes(), &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], row(&["1", "2", "3"]));
    }

    #[test]
    fn test_malformed_quotes() {
        let dialect = InputDialect {
            comment: None,
            ..InputDialect::default()
        };
        let mut input = InputStream::new("a,b\nc,d\"\n".as_bytes(), &dialect);

        assert_eq!(input.next().unwrap().unwrap(), row(&["a", "b"]));

        match input.next().unwrap() {
            Err(Error::Quote(e)) => {
                assert_eq!(e.kind, QuoteErrorKind::BareQuote);
                assert_eq!(e.line, 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lazy_quotes() {
        let dialect = InputDialect {
            comment: None,
            lazy_quotes: true,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new("a,b\"c\n".as_bytes(), &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["a", "b\"c"])]);
    }

    #[test]
    fn test_lazy_quotes_with_comments_and_trimming() {
        let dialect = InputDialect {
            comment: Some(b'#'),
            lazy_quotes: true,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new("\"a\"b, c\n# note\nd,  e\n".as_bytes(), &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["ab", "c"]), row(&["d", "e"])]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let rows: Vec<Row> = InputStream::new("a\n  \nb\n".as_bytes(), &InputDialect::default())
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["a"]), row(&["b"])]);
    }

    #[test]
    fn test_tab_delimiter_collapses_when_trimming() {
        let dialect = InputDialect {
            delimiter: b'\t',
            fields_per_record: FieldsPerRecord::Unchecked,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new("a\t\tb\n".as_bytes(), &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["a", "b"])]);
    }

    #[test]
    fn different_encoding() {
        let dialect = InputDialect {
            encoding: WINDOWS_1252,
            ..InputDialect::default()
        };
        let rows: Vec<Row> = InputStream::new(&b"\xe1rbol,x\n"[..], &dialect)
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows, vec![row(&["árbol", "x"])]);
    }
}
