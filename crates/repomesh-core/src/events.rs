use repomesh_canonical::{
    canonical_bytes_without, ContentHash, KeyId, RepoId, Timestamp, Version,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorKind, TrustError};

/// Event type discriminator for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A repository published a release of itself.
    ReleasePublished,
    /// A verifier published a verdict about a release.
    AttestationPublished,
    /// A policy engine flagged a release.
    PolicyViolation,
    /// A breaking interface change was detected.
    BreakingChangeDetected,
    /// A repository health probe failed.
    HealthCheckFailed,
    /// A dependency vulnerability was found.
    DependencyVulnFound,
    /// A public interface description changed.
    InterfaceUpdated,
}

/// A released artifact digest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// File name of the artifact.
    pub name: String,
    /// Lowercase 64-hex SHA-256 of the artifact bytes.
    pub sha256: String,
    /// Where the artifact can be fetched.
    pub uri: String,
}

/// An attestation reference attached to an event.
///
/// For `AttestationPublished` events, `kind` carries the check name and
/// `uri` carries the `repomesh:attestor:<kind>:<verdict>` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRef {
    /// Check kind, or an evidence class for release events.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attestation URI.
    pub uri: String,
}

/// Signature block embedded in every admitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Signature algorithm; always `"ed25519"`.
    pub alg: String,
    /// Key identifier registered in some participant manifest.
    #[serde(rename = "keyId")]
    pub key_id: KeyId,
    /// Base64 Ed25519 signature over the raw content-hash bytes.
    pub value: String,
    /// Content hash of the event with this block removed.
    #[serde(rename = "canonicalHash")]
    pub canonical_hash: ContentHash,
}

/// The fundamental log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type discriminator.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Target identity.
    pub repo: RepoId,
    /// Target version.
    pub version: Version,
    /// Opaque hex commit identifier.
    pub commit: String,
    /// UTC instant with millisecond precision.
    pub timestamp: Timestamp,
    /// Ordered artifact digests.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    /// Ordered attestation references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attestations: Vec<AttestationRef>,
    /// Free-form text; a structured JSON tail after a final newline is
    /// permitted and used by anchor events to carry metadata.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Signature block; present on every admitted event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureBlock>,
}

impl Event {
    /// JSON value of this event as serialized to the log.
    pub fn to_value(&self) -> Result<Value, TrustError> {
        serde_json::to_value(self)
            .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))
    }

    /// Content hash of this event with the signature block stripped.
    pub fn content_hash(&self) -> Result<ContentHash, TrustError> {
        let value = self.to_value()?;
        let bytes = canonical_bytes_without(&value, &["signature"])?;
        Ok(ContentHash::of_bytes(&bytes))
    }

    /// Structured JSON tail of `notes`, when present.
    ///
    /// The tail is the text after the final newline, parsed as a JSON
    /// object; anything else yields `None`.
    pub fn notes_json_tail(&self) -> Option<Value> {
        let tail = self.notes.rsplit('\n').next()?;
        let value: Value = serde_json::from_str(tail.trim()).ok()?;
        value.is_object().then_some(value)
    }

    /// Whether any attestation reference carries the given kind.
    pub fn has_attestation_kind(&self, kind: &str) -> bool {
        self.attestations.iter().any(|a| a.kind == kind)
    }

    /// Whether this event targets the given release.
    pub fn targets(&self, repo: &RepoId, version: &Version) -> bool {
        &self.repo == repo && &self.version == version
    }
}
