use csv::Writer;
use std::cell::RefCell;
use std::io::{self, BufWriter, Write};

use crate::dialect::OutputDialect;
use crate::error::{Error, Result};
use crate::Row;

/// Where the csv writer serializes each row before it is copied to the
/// target. The writer only hands it back by shared reference, hence the cell.
struct RowBuffer(RefCell<Vec<u8>>);

impl Write for RowBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes rows under the output dialect.
pub struct OutputSink<W: Write> {
    writer: Writer<RowBuffer>,
    target: BufWriter<W>,
    terminator: &'static [u8],
    rows: u64,
}

impl<W: Write> OutputSink<W> {
    pub fn new(target: W, dialect: &OutputDialect) -> OutputSink<W> {
        OutputSink {
            writer: dialect
                .writer_builder()
                .from_writer(RowBuffer(RefCell::new(Vec::new()))),
            target: BufWriter::new(target),
            terminator: dialect.line_terminator.as_bytes(),
            rows: 0,
        }
    }

    /// Writes one row. A row without fields, or with a single empty one,
    /// becomes an empty line; the csv writer would quote it as `""`.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        if row.is_empty() || (row.len() == 1 && row[0].is_empty()) {
            self.target
                .write_all(self.terminator)
                .map_err(|e| Error::Write(e.into()))?;
        } else {
            self.writer.write_record(row).map_err(Error::Write)?;
            self.writer.flush().map_err(|e| Error::Write(e.into()))?;

            let mut buffer = self.writer.get_ref().0.borrow_mut();

            self.target
                .write_all(&buffer)
                .map_err(|e| Error::Write(e.into()))?;
            buffer.clear();
        }

        self.rows += 1;

        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Pushes whatever is buffered to the target.
    pub fn flush(&mut self) -> Result<()> {
        self.target.flush().map_err(Error::Flush)
    }
}
