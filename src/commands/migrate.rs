// ABOUTME: Migrate command - streams a database into a target and verifies it
// ABOUTME: Orchestrates pre-flight, transfer, verification, and checksum phases

use crate::config::Config;
use crate::connect;
use crate::engine::{create_dumper, create_restorer};
use crate::error::MigrateError;
use crate::migration::{TransferPipeline, Verifier};
use crate::utils;
use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

/// Run a full migration: pre-flight checks, streaming transfer, and
/// (unless skipped) content verification with a checksum fingerprint.
///
/// With `stdout_mode` the dump streams to stdout instead of a target
/// database; all logging goes to stderr so the dump stays clean.
pub async fn migrate(config: &Config, cancel: &CancellationToken) -> Result<()> {
    config.validate()?;
    let kind = utils::validate_connections(&config.source, &config.target, config.stdout_mode)?;
    utils::check_required_tools(kind)?;

    if config.stdout_mode {
        tracing::info!("Running in stdout mode - all logs will be written to stderr");
        tracing::info!("Streaming database dump to stdout...");
        // Plain format: the sink is human-readable output, not a restorer
        let dumper = create_dumper(kind, &config.source, true, &config.dump_args);
        let mut stdout = tokio::io::stdout();
        return tokio::select! {
            _ = cancel.cancelled() => Err(anyhow!("migration canceled by user")),
            res = dumper.dump(&mut stdout) => {
                res?;
                stdout.flush().await.context("failed to flush stdout")?;
                Ok(())
            }
        };
    }

    tracing::info!("Testing source connection...");
    connect::test_connection(kind, &config.source, config.skip_tls_verify)
        .await
        .with_context(|| {
            format!(
                "source connection ({}) test failed",
                utils::mask_connection_string(&config.source)
            )
        })?;
    tracing::info!("Source connection test successful!");

    tracing::info!("Testing target connection...");
    connect::test_connection(kind, &config.target, config.skip_tls_verify)
        .await
        .with_context(|| {
            format!(
                "target connection ({}) test failed",
                utils::mask_connection_string(&config.target)
            )
        })?;
    tracing::info!("Target connection test successful!");

    tracing::info!("Starting migration - Database type: {kind}");

    let dumper = create_dumper(kind, &config.source, false, &config.dump_args);
    let restorer = create_restorer(kind, &config.target, &config.restore_args);
    let pipeline = TransferPipeline::new(dumper, restorer, config.buffer_size)?;

    if let Err(e) = pipeline.run(config.timeout, cancel).await {
        return Err(match e {
            MigrateError::TimedOut(d) => anyhow!("migration timed out after {d:?}"),
            MigrateError::Canceled => anyhow!("migration canceled by user"),
            other => anyhow::Error::new(other).context("migration failed"),
        });
    }

    tracing::info!("Migration completed successfully!");

    if config.skip_verify {
        tracing::info!("Skipping verification as requested");
        return Ok(());
    }

    tracing::info!("Starting verification...");

    // Plain format on both sides: verification compares line-oriented
    // dumps, which is what the normalizers understand
    let source_dumper = create_dumper(kind, &config.source, true, &config.dump_args);
    let target_dumper = create_dumper(kind, &config.target, true, &config.dump_args);
    let verifier = Verifier::new(
        source_dumper,
        target_dumper,
        config.verify_chunk_size,
        config.buffer_size,
    )?;

    if let Err(e) = verifier.verify_content(config.timeout, cancel).await {
        return Err(match e {
            MigrateError::TimedOut(d) => anyhow!("verification timed out after {d:?}"),
            MigrateError::Canceled => anyhow!("verification canceled by user"),
            other => anyhow::Error::new(other).context("verification failed"),
        });
    }

    match verifier.checksum(cancel).await {
        Ok(checksum) => tracing::info!("Database checksum: {checksum}"),
        Err(e) => tracing::warn!("Failed to calculate checksum: {e:#}"),
    }

    tracing::info!("Verification completed successfully!");
    Ok(())
}
