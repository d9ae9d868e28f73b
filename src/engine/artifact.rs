//! On-disk correlation artifact.
//!
//! Layout (little-endian):
//!
//! ```text
//! b"COCH" | version: u32 | bincode(ArtifactHeader) | bincode(registry) bincode(table)
//! ```
//!
//! The header records the entry counts and a BLAKE3 digest of everything
//! after it. The registry and the table are written back to back and must be
//! read in that order.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::locator::RepoRoot;
use crate::error::LearnError;
use crate::models::correlation::{CorrelationTable, FileRegistry};

pub const MAGIC: &[u8; 4] = b"COCH";
pub const FORMAT_VERSION: u32 = 1;

const PREAMBLE_LEN: usize = MAGIC.len() + 4;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    file_count: u64,
    /// Ordered entries, both `(a, b)` and `(b, a)`.
    pair_count: u64,
    /// BLAKE3 hex digest of the payload.
    checksum: String,
}

/// Registry and table as read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub registry: FileRegistry,
    pub table: CorrelationTable,
}

/// Where the artifact is staged and where it ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub temp: PathBuf,
    pub target: PathBuf,
}

impl ArtifactPaths {
    pub fn resolve(root: &RepoRoot, config: &Config) -> Self {
        Self {
            temp: root.join(&config.temp_artifact),
            target: root.join(&config.final_artifact),
        }
    }
}

/// Serialize `registry` and `table` into the container format.
pub fn encode(registry: &FileRegistry, table: &CorrelationTable) -> Result<Vec<u8>> {
    let mut payload = bincode::serialize(registry).context("Failed to serialize file registry")?;
    payload.extend(bincode::serialize(table).context("Failed to serialize correlation table")?);

    let header = ArtifactHeader {
        file_count: registry.len() as u64,
        pair_count: table.len() as u64,
        checksum: blake3::hash(&payload).to_hex().to_string(),
    };
    let header = bincode::serialize(&header).context("Failed to serialize artifact header")?;

    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + header.len() + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Parse and validate a container produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Artifact> {
    if bytes.len() < PREAMBLE_LEN || &bytes[..MAGIC.len()] != MAGIC {
        bail!(LearnError::invalid_artifact("Not a coach-learn artifact"));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        bail!(LearnError::invalid_artifact(format!(
            "Unsupported artifact version: {version} (expected {FORMAT_VERSION})"
        )));
    }

    let mut cursor = &bytes[PREAMBLE_LEN..];
    let header: ArtifactHeader = bincode::deserialize_from(&mut cursor).map_err(|e| {
        LearnError::invalid_artifact(format!("Failed to read artifact header: {e}"))
    })?;

    let payload = cursor;
    if blake3::hash(payload).to_hex().as_str() != header.checksum {
        bail!(LearnError::invalid_artifact("Artifact checksum mismatch"));
    }

    let mut cursor = payload;
    let registry: FileRegistry = bincode::deserialize_from(&mut cursor).map_err(|e| {
        LearnError::invalid_artifact(format!("Failed to read file registry: {e}"))
    })?;
    let table: CorrelationTable = bincode::deserialize_from(&mut cursor).map_err(|e| {
        LearnError::invalid_artifact(format!("Failed to read correlation table: {e}"))
    })?;

    if !cursor.is_empty() {
        bail!(LearnError::invalid_artifact(format!(
            "{} trailing bytes after correlation table",
            cursor.len()
        )));
    }
    if registry.len() as u64 != header.file_count || table.len() as u64 != header.pair_count {
        bail!(LearnError::invalid_artifact(format!(
            "Header counts ({} files, {} pairs) disagree with contents ({} files, {} pairs)",
            header.file_count,
            header.pair_count,
            registry.len(),
            table.len()
        )));
    }

    Ok(Artifact { registry, table })
}

/// Read a persisted artifact.
pub fn read_artifact(path: &Path) -> Result<Artifact> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read artifact: {}", path.display()))?;
    decode(&bytes)
}

/// A temporary artifact this run has exclusively created.
pub struct PendingArtifact {
    paths: ArtifactPaths,
    file: File,
}

impl PendingArtifact {
    /// Create the temporary artifact. Fails if it already exists; a leftover
    /// from an earlier run is never overwritten.
    pub fn claim(paths: ArtifactPaths) -> Result<Self> {
        if let Some(parent) = paths.temp.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&paths.temp)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!(LearnError::persistence_conflict(format!(
                    "Output file {} already exists, and I can't overwrite it.\n\
                     This shouldn't happen; you'll have to delete it and re-run coach-learn.",
                    paths.temp.display()
                )));
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create temporary artifact: {}", paths.temp.display())
                });
            }
        };

        debug!(path = %paths.temp.display(), "claimed temporary artifact");
        Ok(Self { paths, file })
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Write the registry, then the table.
    pub fn write(&mut self, registry: &FileRegistry, table: &CorrelationTable) -> Result<()> {
        let bytes = encode(registry, table)?;
        self.file
            .write_all(&bytes)
            .and_then(|()| self.file.sync_all())
            .with_context(|| format!("Failed to write {}", self.paths.temp.display()))?;
        debug!(bytes = bytes.len(), "wrote temporary artifact");
        Ok(())
    }

    /// Close the temporary artifact and move it over the final one.
    pub fn promote(self) -> Result<PathBuf> {
        let Self { paths, file } = self;
        drop(file);

        let moved = match paths.target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|()| fs::rename(&paths.temp, &paths.target)),
            None => fs::rename(&paths.temp, &paths.target),
        };
        if let Err(e) = moved {
            bail!(LearnError::persistence_conflict(format!(
                "It looks like we can't overwrite the existing {} file ({e}).\n\
                 This shouldn't happen; you'll have to delete it manually, then either copy\n\
                 {} to {} or re-run coach-learn.",
                paths.target.display(),
                paths.temp.display(),
                paths.target.display()
            )));
        }

        info!(path = %paths.target.display(), "saved correlation table");
        Ok(paths.target)
    }
}
