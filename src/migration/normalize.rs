// ABOUTME: Per-dialect dump normalization for content comparison
// ABOUTME: Whitelist-drops known non-deterministic metadata lines, never data rows

use crate::engine::DatabaseKind;

/// pg_dump header and annotation comments that differ between otherwise
/// identical dumps.
const POSTGRES_NOISE_PREFIXES: &[&[u8]] = &[
    b"-- Dumped from database version",
    b"-- Dumped by pg_dump",
    b"-- Dumped on",
    b"-- Started on",
    b"-- Completed on",
    b"-- Name:",
];

const MYSQL_NOISE_PREFIXES: &[&[u8]] = &[
    b"-- Dump completed on",
    b"-- MySQL dump",
    b"-- Server version",
];

const MONGODB_NOISE_MARKERS: &[&[u8]] = &[b"\"$timestamp\"", b"\"$date\""];

/// Strip non-deterministic metadata from a dump chunk before comparison.
///
/// Two dumps of logically identical data regenerated at different times
/// differ only in these metadata lines, so removal is conservative: known
/// noise is dropped, everything else passes through byte-for-byte.
/// Normalization is a projection, so applying it twice gives the same bytes.
pub fn normalize_chunk(kind: DatabaseKind, chunk: &[u8]) -> Vec<u8> {
    match kind {
        DatabaseKind::Postgres => normalize_postgres(chunk),
        DatabaseKind::MySql => drop_prefixed_lines(chunk, MYSQL_NOISE_PREFIXES),
        DatabaseKind::MongoDb => normalize_mongodb(chunk),
    }
}

/// Postgres dumps additionally carry blank lines and bare `--` separators
/// around the noise comments, and lines whose trailing whitespace varies
/// between server versions. Retained lines are trimmed on the right.
///
/// Every kept line is emitted newline-terminated, so the normalized forms
/// of consecutive chunks concatenate to the normalized form of the whole
/// stream even when the two sides flush at different line boundaries.
fn normalize_postgres(chunk: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk.len());
    for line in chunk.split(|&b| b == b'\n') {
        let line = trim_trailing_whitespace(line);
        if line.is_empty()
            || line == b"--"
            || POSTGRES_NOISE_PREFIXES.iter().any(|p| line.starts_with(p))
        {
            continue;
        }
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out
}

fn drop_prefixed_lines(chunk: &[u8], prefixes: &[&[u8]]) -> Vec<u8> {
    let kept: Vec<&[u8]> = chunk
        .split(|&b| b == b'\n')
        .filter(|line| !prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    kept.join(&b'\n')
}

fn normalize_mongodb(chunk: &[u8]) -> Vec<u8> {
    let kept: Vec<&[u8]> = chunk
        .split(|&b| b == b'\n')
        .filter(|line| !MONGODB_NOISE_MARKERS.iter().any(|m| contains(line, m)))
        .collect();

    kept.join(&b'\n')
}

fn trim_trailing_whitespace(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b' ' && b != b'\t' && b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
