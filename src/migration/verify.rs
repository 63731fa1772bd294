// ABOUTME: Content verification by re-dumping both sides and comparing streams
// ABOUTME: Also computes a streaming SHA-256 fingerprint of the target dump

use crate::engine::Dumper;
use crate::error::MigrateError;
use crate::migration::compare::{Comparison, StreamComparator};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

/// Proves a finished migration is faithful by dumping source and target
/// again and comparing the two streams chunk by chunk after dialect
/// normalization. The dumps never touch disk; each flows through its own
/// bounded pipe into the comparator.
pub struct Verifier {
    source: Box<dyn Dumper>,
    target: Box<dyn Dumper>,
    chunk_size: usize,
    buffer_size: usize,
}

impl Verifier {
    /// Both dumpers must report the same dialect; checked here, before any
    /// task starts.
    pub fn new(
        source: Box<dyn Dumper>,
        target: Box<dyn Dumper>,
        chunk_size: usize,
        buffer_size: usize,
    ) -> Result<Self, MigrateError> {
        if source.kind() != target.kind() {
            return Err(MigrateError::Config(format!(
                "source and target databases must be of the same type (got source: {}, target: {})",
                source.kind(),
                target.kind()
            )));
        }
        if chunk_size == 0 || buffer_size == 0 {
            return Err(MigrateError::Config(
                "chunk size and buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            source,
            target,
            chunk_size,
            buffer_size,
        })
    }

    /// Compare the two databases' dump streams within a deadline.
    ///
    /// Three legs run concurrently: source dump, target dump, and the
    /// comparator. All three are awaited to a terminal state before a
    /// verdict: a failed dump does not mean the comparator has stopped
    /// draining, and abandoning it mid-read would leak the leg. On
    /// cancellation or deadline the joined future is dropped as a whole,
    /// which tears down all three legs together.
    pub async fn verify_content(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), MigrateError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(MigrateError::Canceled),
            res = tokio::time::timeout(timeout, self.run_verification(cancel)) => match res {
                Err(_) => Err(MigrateError::TimedOut(timeout)),
                Ok(outcome) => outcome,
            },
        }
    }

    async fn run_verification(&self, cancel: &CancellationToken) -> Result<(), MigrateError> {
        let (source_reader, source_writer) = tokio::io::duplex(self.buffer_size);
        let (target_reader, target_writer) = tokio::io::duplex(self.buffer_size);

        let source_dump = async {
            tracing::debug!("Starting source dump for verification");
            let mut writer = source_writer;
            let res = self.source.dump(&mut writer).await;
            // Closing the write half lets the comparator reach end-of-stream
            drop(writer);
            res
        };

        let target_dump = async {
            tracing::debug!("Starting target dump for verification");
            let mut writer = target_writer;
            let res = self.target.dump(&mut writer).await;
            drop(writer);
            res
        };

        let comparator = StreamComparator::new(self.source.kind(), self.chunk_size);
        let compare = comparator.compare(source_reader, target_reader, cancel);

        let (source_res, target_res, compare_res) =
            tokio::join!(source_dump, target_dump, compare);

        // Fixed resolution priority: a dump failure explains a negative
        // comparison, so it outranks the comparator's verdict.
        source_res.map_err(MigrateError::SourceDumpFailed)?;
        target_res.map_err(MigrateError::TargetDumpFailed)?;
        match compare_res? {
            Comparison::Equal => Ok(()),
            Comparison::Mismatch => Err(MigrateError::ContentMismatch),
        }
    }

    /// Stream the target dump through SHA-256 and return the hex digest.
    ///
    /// The raw, non-normalized bytes are hashed: this is an operator
    /// fingerprint of what was actually stored, not a substitute for the
    /// normalized comparison.
    pub async fn checksum(&self, cancel: &CancellationToken) -> Result<String, MigrateError> {
        let compute = async {
            let (mut reader, writer) = tokio::io::duplex(self.buffer_size);

            let dump = async {
                let mut writer = writer;
                let res = self.target.dump(&mut writer).await;
                drop(writer);
                res
            };

            let hash = async {
                let mut hasher = Sha256::new();
                let mut buf = vec![0u8; 64 * 1024];
                loop {
                    let n = reader
                        .read(&mut buf)
                        .await
                        .map_err(|e| MigrateError::Transport(e.into()))?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                Ok::<_, MigrateError>(hasher.finalize())
            };

            let (dump_res, hash_res) = tokio::join!(dump, hash);
            dump_res.map_err(MigrateError::TargetDumpFailed)?;
            Ok(hex::encode(hash_res?))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(MigrateError::Canceled),
            res = compute => res,
        }
    }
}
