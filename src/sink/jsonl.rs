//! JSON-lines sink

use super::types::{RecordSink, SinkTarget};
use crate::error::{Error, Result};
use crate::types::{JsonValue, WriteMode};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Clone)]
enum Destination {
    Stdout,
    File(PathBuf),
}

/// Writes one JSON record per line to stdout or a file.
///
/// A file is appended to in `append` mode and truncated otherwise.
pub struct JsonLinesSink {
    destination: Destination,
    writer: Option<Box<dyn Write + Send>>,
    written: u64,
}

impl JsonLinesSink {
    /// Sink writing to standard output
    pub fn stdout() -> Self {
        Self {
            destination: Destination::Stdout,
            writer: None,
            written: 0,
        }
    }

    /// Sink writing to `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            destination: Destination::File(path.into()),
            writer: None,
            written: 0,
        }
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn open(&mut self, target: &SinkTarget) -> Result<()> {
        let writer: Box<dyn Write + Send> = match &self.destination {
            Destination::Stdout => Box::new(BufWriter::new(io::stdout())),
            Destination::File(path) => {
                let append = target.write_mode == WriteMode::Append;
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(append)
                    .truncate(!append)
                    .open(path)?;
                Box::new(BufWriter::new(file))
            }
        };
        self.writer = Some(writer);
        self.written = 0;
        Ok(())
    }

    async fn write(&mut self, records: &[JsonValue]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::sink("JSON-lines sink written before open"))?;
        for record in records {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n")?;
        }
        self.written += records.len() as u64;
        Ok(())
    }

    async fn close(&mut self) -> Result<u64> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.written)
    }
}

impl std::fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("destination", &self.destination)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}
