use repomesh_canonical::{canonical_bytes_without, ContentHash};
use repomesh_core::{ErrorKind, TrustError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::partition::PartitionId;

/// Manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Merkle construction identifier recorded in every manifest.
pub const MANIFEST_ALGO: &str = "sha256-merkle-v1";

/// Committed, immutable description of a partition and its Merkle root.
///
/// The stored file is pretty-printed with keys in this declaration order;
/// `manifestHash` is computed over the canonical sorted-key form of the
/// other fields, never over the file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionManifest {
    /// Schema version.
    pub v: u32,
    /// Merkle construction identifier.
    pub algo: String,
    /// Partition selector string.
    #[serde(rename = "partitionId")]
    pub partition_id: String,
    /// External-ledger network name.
    pub network: String,
    /// Merkle root of the previous partition; `null` for genesis.
    pub prev: Option<ContentHash>,
    /// First and last leaf of the partition.
    pub range: [ContentHash; 2],
    /// Leaf count.
    pub count: u64,
    /// Merkle root.
    pub root: ContentHash,
    /// Self-binding hash over the preceding fields.
    #[serde(rename = "manifestHash", skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<ContentHash>,
}

impl PartitionManifest {
    /// Hash of the manifest base (every field except `manifestHash`).
    pub fn compute_hash(&self) -> Result<ContentHash, TrustError> {
        let value = serde_json::to_value(self)
            .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))?;
        let bytes = canonical_bytes_without(&value, &["manifestHash"])?;
        Ok(ContentHash::of_bytes(&bytes))
    }

    /// Fills in `manifestHash`, completing the manifest.
    pub fn seal(mut self) -> Result<Self, TrustError> {
        self.manifest_hash = Some(self.compute_hash()?);
        Ok(self)
    }

    /// Checks the self-binding invariant.
    pub fn verify_self(&self) -> Result<(), TrustError> {
        let stored = self.manifest_hash.as_ref().ok_or_else(|| {
            TrustError::new(ErrorKind::ManifestTampered, "manifest carries no manifestHash")
        })?;
        let computed = self.compute_hash()?;
        if stored != &computed {
            return Err(TrustError::new(
                ErrorKind::ManifestTampered,
                format!("stored manifestHash {stored} disagrees with recomputed {computed}"),
            ));
        }
        Ok(())
    }
}

/// On-disk directory of partition manifests.
///
/// Writes are idempotent: rematerializing a partition must reproduce the
/// existing file byte-for-byte or the write is rejected.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Opens a manifest directory handle.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File path for a partition's manifest.
    pub fn path_for(&self, partition: &PartitionId) -> PathBuf {
        self.dir.join(format!("{}.json", partition.file_stem()))
    }

    /// Persists a sealed manifest.
    ///
    /// An existing file must match byte-for-byte; any difference is a
    /// `ManifestConflict`.
    pub fn write(
        &self,
        partition: &PartitionId,
        manifest: &PartitionManifest,
    ) -> Result<PathBuf, TrustError> {
        let path = self.path_for(partition);
        let mut rendered = serde_json::to_string_pretty(manifest)
            .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))?;
        rendered.push('\n');

        match std::fs::read(&path) {
            Ok(existing) => {
                if existing != rendered.as_bytes() {
                    return Err(TrustError::new(
                        ErrorKind::ManifestConflict,
                        format!(
                            "manifest for partition '{partition}' already exists with different bytes"
                        ),
                    ));
                }
                return Ok(path);
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(TrustError::new(
                    ErrorKind::ManifestUnavailable,
                    format!("cannot read {}: {}", path.display(), err),
                ))
            }
        }

        std::fs::create_dir_all(&self.dir).map_err(|err| {
            TrustError::new(
                ErrorKind::ManifestUnavailable,
                format!("cannot create {}: {}", self.dir.display(), err),
            )
        })?;
        std::fs::write(&path, rendered.as_bytes()).map_err(|err| {
            TrustError::new(
                ErrorKind::ManifestUnavailable,
                format!("cannot write {}: {}", path.display(), err),
            )
        })?;
        info!(partition = %partition, path = %path.display(), "materialized partition manifest");
        Ok(path)
    }

    /// Loads a partition's manifest.
    pub fn load(&self, partition: &PartitionId) -> Result<PartitionManifest, TrustError> {
        let path = self.path_for(partition);
        let bytes = std::fs::read(&path).map_err(|err| {
            TrustError::new(
                ErrorKind::ManifestUnavailable,
                format!("cannot read {}: {}", path.display(), err),
            )
        })?;
        serde_json::from_slice(&bytes).map_err(|err| {
            TrustError::new(
                ErrorKind::ManifestUnavailable,
                format!("cannot parse {}: {}", path.display(), err),
            )
        })
    }
}
