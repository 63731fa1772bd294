// ABOUTME: MongoDB dump/restore capability via mongodump and mongorestore
// ABOUTME: Uses archive mode so the whole database moves as one byte stream

use super::process::{run_dump, run_restore};
use super::{DatabaseKind, Dumper, Restorer};
use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;

/// Dumps a MongoDB database with mongodump in archive mode.
pub struct MongoDumper {
    connection_string: String,
    extra_args: Vec<String>,
}

impl MongoDumper {
    pub fn new(connection_string: &str, extra_args: &[String]) -> Self {
        Self {
            connection_string: connection_string.to_string(),
            extra_args: extra_args.to_vec(),
        }
    }
}

#[async_trait]
impl Dumper for MongoDumper {
    async fn dump(&self, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<()> {
        let mut cmd = Command::new("mongodump");
        cmd.arg(format!("--uri={}", self.connection_string))
            .arg("--archive");
        cmd.args(&self.extra_args);

        run_dump(cmd, "mongodump", sink).await
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MongoDb
    }
}

/// Restores a MongoDB database with mongorestore from an archive stream.
pub struct MongoRestorer {
    connection_string: String,
    extra_args: Vec<String>,
}

impl MongoRestorer {
    pub fn new(connection_string: &str, extra_args: &[String]) -> Self {
        Self {
            connection_string: connection_string.to_string(),
            extra_args: extra_args.to_vec(),
        }
    }
}

#[async_trait]
impl Restorer for MongoRestorer {
    async fn restore(&self, source: &mut (dyn AsyncRead + Send + Unpin)) -> Result<()> {
        let mut cmd = Command::new("mongorestore");
        cmd.arg(format!("--uri={}", self.connection_string))
            .arg("--archive");
        cmd.args(&self.extra_args);

        run_restore(cmd, "mongorestore", source).await
    }

    fn kind(&self) -> DatabaseKind {
        DatabaseKind::MongoDb
    }
}
