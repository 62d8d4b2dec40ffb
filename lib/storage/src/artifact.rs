// Model artifact files on disk
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Hex-encoded SHA-256 of the artifact bytes
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Read an artifact and return its bytes with their checksum
pub fn read_artifact(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
    let sum = checksum(&bytes);
    Ok((bytes, sum))
}

/// Replace the artifact at `path` so readers see either the old or the new
/// file, never a partial write
pub fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| anyhow!("Failed to write model artifact {}: {}", path.display(), e))
}
