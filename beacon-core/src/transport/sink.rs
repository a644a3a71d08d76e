//! Batch destinations for [`super::BufferedTransport`]

use super::Event;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Receives batches from the transport worker thread
///
/// Errors are logged by the worker and the batch is dropped.
pub trait EventSink: Send + 'static {
    fn deliver(&mut self, batch: &[Event]) -> Result<()>;

    /// Called once when the worker stops
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Logs each batch through `tracing`
#[derive(Debug, Default)]
pub struct LogSink {
    delivered: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for LogSink {
    fn deliver(&mut self, batch: &[Event]) -> Result<()> {
        self.delivered += batch.len() as u64;
        info!(
            "Telemetry batch: {} events ({} total)",
            batch.len(),
            self.delivered
        );
        for event in batch {
            debug!(
                kind = event.kind.as_str(),
                name = %event.name,
                "{}",
                event.to_json()?
            );
        }
        Ok(())
    }
}

/// Appends every event as one JSON line to a file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open event journal {:?}", path))?;

        info!("Writing telemetry events to {:?}", path);

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonLinesSink {
    fn deliver(&mut self, batch: &[Event]) -> Result<()> {
        for event in batch {
            writeln!(self.writer, "{}", event.to_json()?)
                .context("Failed to write event to journal")?;
        }
        self.writer.flush().context("Failed to flush event journal")
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush event journal")
    }
}
