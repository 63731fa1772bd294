// ABOUTME: Streaming transfer pipeline from a dumper into a restorer
// ABOUTME: Runs both legs concurrently over one bounded in-memory pipe

use crate::engine::{Dumper, Restorer};
use crate::error::MigrateError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Wires one dumper's output directly into one restorer's input through a
/// bounded in-memory pipe, so the full dataset is never staged on disk or
/// in memory. The pipe's backpressure keeps the dumper at the restorer's
/// pace, which bounds memory for arbitrarily large databases.
pub struct TransferPipeline {
    dumper: Box<dyn Dumper>,
    restorer: Box<dyn Restorer>,
    buffer_size: usize,
}

impl TransferPipeline {
    /// Dialect pairing is checked here, never mid-stream.
    pub fn new(
        dumper: Box<dyn Dumper>,
        restorer: Box<dyn Restorer>,
        buffer_size: usize,
    ) -> Result<Self, MigrateError> {
        if dumper.kind() != restorer.kind() {
            return Err(MigrateError::Config(format!(
                "source and target databases must be of the same type (got source: {}, target: {})",
                dumper.kind(),
                restorer.kind()
            )));
        }
        if buffer_size == 0 {
            return Err(MigrateError::Config(
                "pipe buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            dumper,
            restorer,
            buffer_size,
        })
    }

    /// Run the transfer to completion, a deadline, or cancellation.
    ///
    /// Success requires BOTH legs to finish cleanly: a restorer that
    /// reports completion while the dumper is still writing is a partial
    /// transfer, not a success. The first failing leg aborts the other,
    /// tagged with which side failed.
    pub async fn run(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), MigrateError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(MigrateError::Canceled),
            res = tokio::time::timeout(timeout, self.transfer()) => match res {
                Err(_) => Err(MigrateError::TimedOut(timeout)),
                Ok(outcome) => outcome,
            },
        }
    }

    async fn transfer(&self) -> Result<(), MigrateError> {
        let (mut reader, writer) = tokio::io::duplex(self.buffer_size);

        let dump = async {
            tracing::info!("Starting database dump...");
            let mut writer = writer;
            let res = self.dumper.dump(&mut writer).await;
            // Drop the write half whether the dump succeeded or not, so
            // the restorer observes end-of-stream instead of blocking on
            // a pipe that will never produce more data.
            drop(writer);
            match res {
                Ok(()) => {
                    tracing::info!("Database dump completed");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Dump error: {e:#}");
                    Err(MigrateError::DumpFailed(e))
                }
            }
        };

        let restore = async {
            tracing::info!("Starting database restore...");
            let res = self.restorer.restore(&mut reader).await;
            match res {
                Ok(()) => {
                    tracing::info!("Database restore completed");
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("Restore error: {e:#}");
                    Err(MigrateError::RestoreFailed(e))
                }
            }
        };

        tokio::try_join!(dump, restore)?;
        Ok(())
    }
}
