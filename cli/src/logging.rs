//! Logging initialization.
//!
//! Reads `RUST_LOG` (level, default `info`) and `LOG_FILE` (path). With `LOG_FILE` set, logs
//! are appended there as plain text. Otherwise `run` and `ops` drop logs so stdout holds only
//! the result, and `serve` logs to stderr.

use std::io::Write;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Where logs go when `LOG_FILE` is unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    Drop,
    Stderr,
}

pub fn init(fallback: Fallback) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let writer = std::sync::Mutex::new(StripAnsiWriter::new(file));
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(crate::log_format::SpanIdFormat::default())
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).init();
        tracing::info!(path = %path, "seolens logging to file");
        return Ok(());
    }
    match fallback {
        Fallback::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
        Fallback::Drop => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::sink)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).init();
        }
    }
    Ok(())
}

/// Strips ANSI CSI sequences (`ESC [ ... final`) so file logs are plain text.
///
/// A sequence split across writes is held in `pending` until its final byte arrives.
struct StripAnsiWriter<W> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> StripAnsiWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut plain = Vec::with_capacity(buf.len());
        for &b in buf {
            match self.pending.len() {
                0 if b == 0x1b => self.pending.push(b),
                0 => plain.push(b),
                1 if b == b'[' => self.pending.push(b),
                1 => {
                    plain.append(&mut self.pending);
                    plain.push(b);
                }
                _ if (0x40..=0x7e).contains(&b) => self.pending.clear(),
                _ if self.pending.len() > 64 => {
                    plain.append(&mut self.pending);
                    plain.push(b);
                }
                _ => self.pending.push(b),
            }
        }
        self.inner.write_all(&plain)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.pending.is_empty() {
            self.inner.write_all(&self.pending)?;
            self.pending.clear();
        }
        self.inner.flush()
    }
}
