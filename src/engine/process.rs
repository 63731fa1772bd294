// ABOUTME: Shared subprocess plumbing for engine dump/restore tools
// ABOUTME: Streams child stdout/stdin against pipe ends and captures stderr

use anyhow::{anyhow, bail, Context, Result};
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

/// Run a dump tool, streaming its stdout into `sink`.
///
/// stderr is collected for the error message. The child is killed if the
/// returned future is dropped, so a canceled operation cannot leak the
/// subprocess.
pub(crate) async fn run_dump(
    mut cmd: Command,
    tool: &str,
    sink: &mut (dyn AsyncWrite + Send + Unpin),
) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to execute {tool}. Is it installed and in PATH?"))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("{tool} stdout was not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("{tool} stderr was not captured"))?;

    let mut err_buf = Vec::new();
    let (copied, _) = tokio::join!(
        tokio::io::copy(&mut stdout, sink),
        stderr.read_to_end(&mut err_buf)
    );

    let status = child
        .wait()
        .await
        .with_context(|| format!("failed to wait for {tool}"))?;

    if !status.success() {
        bail!(
            "{tool} failed: {}, stderr: {}",
            status,
            String::from_utf8_lossy(&err_buf).trim()
        );
    }

    copied.with_context(|| format!("failed to stream {tool} output"))?;
    Ok(())
}

/// Run a restore tool, feeding `source` into its stdin.
///
/// stdin is shut down after the stream ends so the tool observes
/// end-of-input and can commit its work.
pub(crate) async fn run_restore(
    mut cmd: Command,
    tool: &str,
    source: &mut (dyn AsyncRead + Send + Unpin),
) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to execute {tool}. Is it installed and in PATH?"))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("{tool} stdin was not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("{tool} stderr was not captured"))?;

    let feed = async {
        let res = tokio::io::copy(source, &mut stdin).await;
        let _ = stdin.shutdown().await;
        drop(stdin);
        res
    };

    let mut err_buf = Vec::new();
    let (fed, _) = tokio::join!(feed, stderr.read_to_end(&mut err_buf));

    let status = child
        .wait()
        .await
        .with_context(|| format!("failed to wait for {tool}"))?;

    // A failed tool usually also breaks the stdin pipe; report the tool's
    // own stderr rather than the secondary broken-pipe error.
    if !status.success() {
        bail!(
            "{tool} failed: {}, stderr: {}",
            status,
            String::from_utf8_lossy(&err_buf).trim()
        );
    }

    fed.with_context(|| format!("failed to stream input into {tool}"))?;
    Ok(())
}
