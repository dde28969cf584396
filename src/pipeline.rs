//! Moves rows from the input to the output through two stages.
//!
//! The producer runs on the calling thread and parses rows, the consumer runs
//! on its own thread, projects each row and writes it. They only share a
//! bounded queue, so a slow output holds the parser back.
use log::{debug, warn};
use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use crate::columns::ColumnSelection;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::InputStream;
use crate::output::OutputSink;
use crate::Row;

/// Rows that can wait between the two stages.
pub const QUEUE_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// both stages are active
    Running,

    /// the input is exhausted, the consumer finishes the queued rows
    Draining,

    /// everything was written and flushed
    Terminated,
}

/// Row counts of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub rows_read: u64,
    pub rows_written: u64,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    state: State,
}

/// Reads every row and queues it. A failed send means the consumer is gone,
/// its own error tells why.
fn produce<R: Read>(rows: &mut InputStream<R>, queue: SyncSender<Row>) -> Result<u64> {
    while let Some(row) = rows.read_row()? {
        if queue.send(row).is_err() {
            debug!("output stage is gone, stop reading");
            break;
        }
    }

    Ok(rows.rows())
}

fn consume<W: Write>(
    queue: Receiver<Row>,
    selection: &ColumnSelection,
    mut sink: OutputSink<W>,
) -> Result<u64> {
    for mut row in queue {
        selection.project(&mut row);
        sink.write_row(&row)?;
    }

    sink.flush()?;

    Ok(sink.rows())
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Pipeline<'a> {
        Pipeline {
            config,
            state: State::Running,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn transition(&mut self, to: State) {
        debug!("pipeline {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// Runs both stages until the input is exhausted and the output flushed.
    /// Doesn't return before the consumer is done, whatever happens.
    ///
    /// A read error closes the queue but the consumer still writes and
    /// flushes the rows queued before it, so the output may hold a prefix of
    /// the result. The row that failed and everything after it never reach
    /// the output. If both stages fail the read error is returned.
    pub fn run<R, W>(&mut self, input: R, output: W) -> Result<Report>
    where
        R: Read,
        W: Write + Send,
    {
        let config = self.config;
        let mut rows = InputStream::new(input, &config.input);
        let sink = OutputSink::new(output, &config.output);
        let selection = &config.selection;
        let (sender, receiver) = mpsc::sync_channel(QUEUE_CAPACITY);

        let (produced, consumed) = thread::scope(|scope| {
            let consumer = scope.spawn(move || consume(receiver, selection, sink));

            // the sender is dropped on return, closing the queue
            let produced = produce(&mut rows, sender);
            self.transition(State::Draining);

            let consumed = consumer.join().map_err(|_| Error::ConsumerPanicked);

            (produced, consumed.and_then(|written| written))
        });

        let report = match (produced, consumed) {
            (Err(read_error), Err(write_error)) => {
                warn!("the output failed too: {}", write_error);
                return Err(read_error);
            }
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => return Err(e),
            (Ok(rows_read), Ok(rows_written)) => Report {
                rows_read,
                rows_written,
            },
        };

        self.transition(State::Terminated);
        debug!(
            "{} rows read, {} rows written",
            report.rows_read, report.rows_written
        );

        Ok(report)
    }
}
