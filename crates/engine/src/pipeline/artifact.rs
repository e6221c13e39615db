// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compressed artifacts.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

pub(super) const GZIP_SUFFIX: &str = ".gz";

pub(super) fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Read a freshly built binary and gzip it.
pub(super) async fn read_compressed(raw: &Path) -> io::Result<Vec<u8>> {
    let bytes = tokio::fs::read(raw).await?;
    tokio::task::spawn_blocking(move || gzip(&bytes)).await.map_err(io::Error::other)?
}

/// Replace the raw binary with its compressed form, returning the new path.
pub(super) async fn swap(raw: &Path, compressed: &[u8]) -> io::Result<PathBuf> {
    tokio::fs::remove_file(raw).await?;
    let mut gz = raw.as_os_str().to_owned();
    gz.push(GZIP_SUFFIX);
    let gz = PathBuf::from(gz);
    tokio::fs::write(&gz, compressed).await?;
    Ok(gz)
}
