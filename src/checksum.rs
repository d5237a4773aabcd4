//! SHA-1 verification of downloaded mod archives.
//!
//! The mod portal publishes a lowercase hex SHA-1 digest for every release.
//! Archives can be large, so files are hashed in fixed-size chunks instead of
//! being read into memory.

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::io::{self, Read};
use std::path::Path;

use crate::runtime::Runtime;

/// Size of each block fed to the hasher.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Computes the lowercase hex SHA-1 digest of everything `reader` yields.
pub fn sha1_hex<Rd: Read + ?Sized>(reader: &mut Rd) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks whether the file at `path` has the SHA-1 digest `expected`.
///
/// A digest mismatch is `Ok(false)`. Only failing to open or read the file is
/// an error.
#[tracing::instrument(skip(runtime))]
pub fn validate<R: Runtime>(runtime: &R, expected: &str, path: &Path) -> Result<bool> {
    let mut reader = runtime
        .open(path)
        .with_context(|| format!("Failed to open '{}' for validation", path.display()))?;

    let actual = sha1_hex(&mut reader)
        .with_context(|| format!("Failed to read '{}' for validation", path.display()))?;

    log::debug!("{}: sha1 {} (expected {})", path.display(), actual, expected);
    Ok(actual.eq_ignore_ascii_case(expected))
}
