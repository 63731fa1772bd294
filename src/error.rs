// ABOUTME: Error taxonomy for migration and verification outcomes
// ABOUTME: Distinguishes dump/restore/transport failures, mismatches, and cancellation

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the transfer and verification pipelines.
///
/// Operators need to tell "the copy failed" from "the copy is wrong" from
/// "we could not finish checking", so mismatches, transport errors, and
/// cancellation are separate variants rather than opaque strings.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The source engine's dump process failed during a transfer.
    #[error("dump failed: {0:#}")]
    DumpFailed(#[source] anyhow::Error),

    /// The target engine's load process failed during a transfer.
    #[error("restore failed: {0:#}")]
    RestoreFailed(#[source] anyhow::Error),

    /// The source-side dump leg of a verification failed.
    #[error("failed to dump source database: {0:#}")]
    SourceDumpFailed(#[source] anyhow::Error),

    /// The target-side dump leg of a verification failed.
    #[error("failed to dump target database: {0:#}")]
    TargetDumpFailed(#[source] anyhow::Error),

    /// A read or write on an internal pipe failed for a reason other than
    /// end-of-stream. This means the verdict is unknown, not negative.
    #[error("stream transport error: {0:#}")]
    Transport(#[source] anyhow::Error),

    /// Both streams completed but their normalized content differs.
    #[error("content verification failed: source and target databases do not match")]
    ContentMismatch,

    /// The operation deadline elapsed before all tasks finished.
    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),

    /// The operation was canceled, typically by ctrl-c.
    #[error("operation canceled")]
    Canceled,

    /// Invalid pairing or parameters, detected before any task starts.
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_message_names_both_sides() {
        let msg = MigrateError::ContentMismatch.to_string();
        assert!(msg.contains("source and target"));
    }

    #[test]
    fn test_timeout_message_includes_duration() {
        let msg = MigrateError::TimedOut(Duration::from_secs(30)).to_string();
        assert!(msg.contains("30s"));
    }

    #[test]
    fn test_transfer_failures_are_tagged_by_side() {
        let dump = MigrateError::DumpFailed(anyhow::anyhow!("boom"));
        let restore = MigrateError::RestoreFailed(anyhow::anyhow!("boom"));
        assert!(dump.to_string().starts_with("dump failed"));
        assert!(restore.to_string().starts_with("restore failed"));
    }
}
