//! Sending planned chunks to a batch consumer.
//!
//! The consumer itself (a chat backend, a queue, a directory) sits behind
//! [`BatchTransmitter`]. [`transmit_chunks`] only decides order, pacing, and
//! how a failure is reported.

use crate::chunker::Chunk;
use crate::error::TransmissionError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default pause between two sends
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_millis(1500);

/// Default first words of every message
pub const DEFAULT_MESSAGE_PREFIX: &str = "IFC Model Chunk";

/// One message handed to a transmitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingBatch {
    /// 1-based position in the full chunk sequence
    pub sequence: usize,
    pub label: String,
    pub message: String,
    /// Payload digest, usable as an idempotency key
    pub digest: String,
}

/// Destination for chunk messages
#[async_trait::async_trait]
pub trait BatchTransmitter: Send + Sync {
    /// Deliver one message to `destination`
    async fn send(&self, destination: &str, batch: &OutgoingBatch) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct TransmitOptions {
    /// 0-based index of the first chunk to send
    pub start_at: usize,
    pub delay: Duration,
    pub message_prefix: String,
}

impl Default for TransmitOptions {
    fn default() -> Self {
        Self {
            start_at: 0,
            delay: DEFAULT_SEND_DELAY,
            message_prefix: DEFAULT_MESSAGE_PREFIX.to_string(),
        }
    }
}

/// Outcome of a completed transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionReport {
    pub destination: String,
    pub first_index: usize,
    pub sent: usize,
}

/// Send `chunks[start_at..]` in order, pausing `delay` between sends.
///
/// Stops at the first failure. The error carries the failing index, so the
/// same plan can be resent from that point with `start_at = index`.
pub async fn transmit_chunks<T: BatchTransmitter + ?Sized>(
    transmitter: &T,
    destination: &str,
    chunks: &[Chunk],
    options: &TransmitOptions,
) -> std::result::Result<TransmissionReport, TransmissionError> {
    if options.start_at > chunks.len() {
        return Err(TransmissionError {
            index: options.start_at,
            label: String::new(),
            reason: format!("start index is beyond the {} planned chunks", chunks.len()),
        });
    }

    let mut sent = 0;
    for (index, chunk) in chunks.iter().enumerate().skip(options.start_at) {
        if sent > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }

        let batch = OutgoingBatch {
            sequence: index + 1,
            label: chunk.label(),
            message: chunk.message(&options.message_prefix, index + 1),
            digest: chunk.digest(),
        };
        tracing::debug!("Sending {} to {}", batch.label, destination);

        if let Err(e) = transmitter.send(destination, &batch).await {
            tracing::warn!("Sending {} failed: {:#}", batch.label, e);
            return Err(TransmissionError {
                index,
                label: batch.label,
                reason: format!("{:#}", e),
            });
        }
        sent += 1;
    }

    tracing::info!("Sent {} chunks to {}", sent, destination);
    Ok(TransmissionReport {
        destination: destination.to_string(),
        first_index: options.start_at,
        sent,
    })
}

/// Writes every message as a text file under `<root>/<destination>/`
#[derive(Debug, Clone)]
pub struct DirectoryTransmitter {
    root: PathBuf,
}

impl DirectoryTransmitter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a batch is written to
    pub fn path_for(&self, destination: &str, batch: &OutgoingBatch) -> PathBuf {
        self.root
            .join(slug(destination))
            .join(format!("{:04}_{}.txt", batch.sequence, slug(&batch.label)))
    }
}

#[async_trait::async_trait]
impl BatchTransmitter for DirectoryTransmitter {
    async fn send(&self, destination: &str, batch: &OutgoingBatch) -> Result<()> {
        let path = self.path_for(destination, batch);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(&path, &batch.message)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Lowercase, filesystem-safe form of a label
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}
