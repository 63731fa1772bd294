// ABOUTME: Lock-step chunked comparison of two dump byte streams
// ABOUTME: Normalizes per dialect and short-circuits on the first difference

use crate::engine::DatabaseKind;
use crate::error::MigrateError;
use crate::migration::normalize::normalize_chunk;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

/// Verdict of a completed stream comparison. Transport failures are
/// reported as errors instead: "we don't know" is not "they differ".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Mismatch,
}

/// Compares two byte streams chunk by chunk after dialect normalization.
///
/// Reads run in lock-step: chunk N is pulled from both sides and compared
/// before chunk N+1 is read, so memory stays bounded by roughly one chunk
/// per side regardless of stream length.
///
/// Each side holds back its trailing partial line until the next chunk
/// arrives, so a noise line straddling a chunk boundary is still recognized
/// by the normalizer. Because normalization may remove different byte
/// counts from the two sides, comparison consumes the common prefix of the
/// normalized streams rather than requiring chunk outputs to align.
pub struct StreamComparator {
    kind: DatabaseKind,
    chunk_size: usize,
}

impl StreamComparator {
    pub fn new(kind: DatabaseKind, chunk_size: usize) -> Self {
        Self {
            kind,
            chunk_size: chunk_size.max(1),
        }
    }

    pub async fn compare<S, T>(
        &self,
        source: S,
        target: T,
        cancel: &CancellationToken,
    ) -> Result<Comparison, MigrateError>
    where
        S: AsyncRead + Unpin + Send,
        T: AsyncRead + Unpin + Send,
    {
        let mut src = Side::new(source, self.chunk_size);
        let mut tgt = Side::new(target, self.chunk_size);

        loop {
            if cancel.is_cancelled() {
                return Err(MigrateError::Canceled);
            }

            if !src.eof {
                src.pull(self.kind).await?;
            }
            if !tgt.eof {
                tgt.pull(self.kind).await?;
            }

            let common = src.pending.len().min(tgt.pending.len());
            if src.pending[..common] != tgt.pending[..common] {
                return Ok(Comparison::Mismatch);
            }
            src.pending.drain(..common);
            tgt.pending.drain(..common);

            // After draining, at most one side still has unmatched bytes.
            match (src.eof, tgt.eof) {
                (true, true) => {
                    let equal = src.pending.is_empty() && tgt.pending.is_empty();
                    return Ok(if equal {
                        Comparison::Equal
                    } else {
                        Comparison::Mismatch
                    });
                }
                // A finished side can never match bytes the other side has
                // already produced beyond it.
                (true, false) if !tgt.pending.is_empty() => return Ok(Comparison::Mismatch),
                (false, true) if !src.pending.is_empty() => return Ok(Comparison::Mismatch),
                _ => {}
            }
        }
    }
}

/// Per-stream read state: the reusable chunk buffer, the held-back partial
/// trailing line, and normalized bytes not yet compared.
struct Side<R> {
    reader: R,
    chunk: Vec<u8>,
    held: Vec<u8>,
    pending: Vec<u8>,
    eof: bool,
}

impl<R: AsyncRead + Unpin> Side<R> {
    fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk: vec![0u8; chunk_size],
            held: Vec::new(),
            pending: Vec::new(),
            eof: false,
        }
    }

    /// Read one chunk (filled to capacity unless the stream ends), carve
    /// off complete lines, and append their normalized form to `pending`.
    async fn pull(&mut self, kind: DatabaseKind) -> Result<(), MigrateError> {
        let mut filled = 0;
        while filled < self.chunk.len() {
            let n = self
                .reader
                .read(&mut self.chunk[filled..])
                .await
                .map_err(|e| MigrateError::Transport(e.into()))?;
            if n == 0 {
                self.eof = true;
                break;
            }
            filled += n;
        }

        self.held.extend_from_slice(&self.chunk[..filled]);

        // Hold back the partial trailing line until the next chunk; at
        // end-of-stream everything is flushed.
        let boundary = if self.eof {
            self.held.len()
        } else {
            match self.held.iter().rposition(|&b| b == b'\n') {
                Some(i) => i + 1,
                // Newline-free content (binary archive formats) would grow
                // the carry buffer forever; flush whole chunks instead.
                None if self.held.len() >= self.chunk.len() => self.held.len(),
                None => 0,
            }
        };

        if boundary > 0 {
            let remainder = self.held.split_off(boundary);
            let complete = std::mem::replace(&mut self.held, remainder);
            self.pending.extend(normalize_chunk(kind, &complete));
        }

        Ok(())
    }
}
