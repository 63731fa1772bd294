// ABOUTME: Validate command - checks configuration and connectivity only
// ABOUTME: Runs the migration pre-flight without moving any data

use crate::config::Config;
use crate::connect;
use crate::utils;
use anyhow::{Context, Result};

/// Run the migration pre-flight checks without transferring anything:
/// configuration sanity, engine pairing, client tools, and connectivity
/// to both databases.
pub async fn validate(config: &Config) -> Result<()> {
    config.validate()?;
    let kind = utils::validate_connections(&config.source, &config.target, config.stdout_mode)?;
    tracing::info!("✓ Configuration is valid - Database type: {kind}");

    utils::check_required_tools(kind)?;
    tracing::info!("✓ Required {kind} client tools found");

    tracing::info!(
        "Testing source connection to {}...",
        utils::mask_connection_string(&config.source)
    );
    connect::test_connection(kind, &config.source, config.skip_tls_verify)
        .await
        .context("source connection test failed")?;
    tracing::info!("✓ Source connection successful");

    if !config.stdout_mode {
        tracing::info!(
            "Testing target connection to {}...",
            utils::mask_connection_string(&config.target)
        );
        connect::test_connection(kind, &config.target, config.skip_tls_verify)
            .await
            .context("target connection test failed")?;
        tracing::info!("✓ Target connection successful");
    }

    tracing::info!("✓ All checks passed - ready to migrate");
    Ok(())
}
