// ABOUTME: CLI entry point for migratedb
// ABOUTME: Parses commands, wires cancellation, and routes to handlers

use clap::{Args, Parser, Subcommand};
use migratedb::commands;
use migratedb::config::{Config, DEFAULT_CHUNK_SIZE};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "migratedb")]
#[command(about = "Streaming database migration with content verification", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct MigrationArgs {
    /// Source database connection string
    #[arg(long)]
    source: String,
    /// Target database connection string (omit with --stdout)
    #[arg(long, default_value = "")]
    target: String,
    /// Stream the dump to stdout instead of restoring into a target
    #[arg(long)]
    stdout: bool,
    /// In-memory pipe buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    buffer_size: usize,
    /// Deadline for migration (and verification) in seconds (default: 24 hours)
    #[arg(long, default_value_t = 86400)]
    timeout_secs: u64,
    /// Skip content verification after migration
    #[arg(long)]
    skip_verify: bool,
    /// Verification comparison chunk size in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    verify_chunk_size: usize,
    /// Skip TLS certificate verification in connection tests
    #[arg(long)]
    skip_tls_verify: bool,
    /// Extra argument for the dump tool (repeatable)
    #[arg(long = "dump-arg")]
    dump_args: Vec<String>,
    /// Extra argument for the restore tool (repeatable)
    #[arg(long = "restore-arg")]
    restore_args: Vec<String>,
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides this
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl MigrationArgs {
    fn into_config(self) -> Config {
        Config {
            source: self.source,
            target: self.target,
            stdout_mode: self.stdout,
            buffer_size: self.buffer_size,
            timeout: Duration::from_secs(self.timeout_secs),
            skip_verify: self.skip_verify,
            verify_chunk_size: self.verify_chunk_size,
            skip_tls_verify: self.skip_tls_verify,
            dump_args: self.dump_args,
            restore_args: self.restore_args,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a database from source to target (or stdout) and verify it
    Migrate {
        #[command(flatten)]
        args: MigrationArgs,
    },
    /// Check configuration, client tools, and connectivity without migrating
    Validate {
        #[command(flatten)]
        args: MigrationArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match &cli.command {
        Commands::Migrate { args } | Commands::Validate { args } => args.log_level.clone(),
    };

    // Logs go to stderr so stdout-mode dumps stay clean; RUST_LOG wins
    // over --log-level when both are set
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, shutting down...");
            signal_token.cancel();
        }
    });

    match cli.command {
        Commands::Migrate { args } => {
            let config = args.into_config();
            commands::migrate(&config, &cancel).await
        }
        Commands::Validate { args } => {
            let config = args.into_config();
            commands::validate(&config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flag_is_accepted() {
        let cli = Cli::try_parse_from([
            "migratedb",
            "migrate",
            "--source",
            "postgresql://u:p@src:5432/db",
            "--target",
            "postgresql://u:p@dst:5432/db",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let Commands::Migrate { args } = cli.command else {
            panic!("expected migrate subcommand");
        };
        assert_eq!(args.log_level, "debug");
    }

    #[test]
    fn test_log_level_defaults_to_info() {
        let cli = Cli::try_parse_from([
            "migratedb",
            "validate",
            "--source",
            "mysql://u:p@src:3306/db",
            "--target",
            "mysql://u:p@dst:3306/db",
        ])
        .unwrap();

        let Commands::Validate { args } = cli.command else {
            panic!("expected validate subcommand");
        };
        assert_eq!(args.log_level, "info");
    }
}
