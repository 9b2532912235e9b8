// ABOUTME: Record sinks: where the crawler hands each complete JobRecord.
// ABOUTME: Closures act as sinks; JsonLinesSink writes one JSON object per line.

use std::io::{self, Write};

use crate::record::JobRecord;

/// Receives every record the crawler accepts.
pub trait RecordSink {
    fn emit(&mut self, record: JobRecord) -> io::Result<()>;
}

impl<F> RecordSink for F
where
    F: FnMut(JobRecord),
{
    fn emit(&mut self, record: JobRecord) -> io::Result<()> {
        self(record);
        Ok(())
    }
}

/// Writes records as JSON Lines.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: JobRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}
