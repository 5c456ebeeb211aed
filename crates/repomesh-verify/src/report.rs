use repomesh_canonical::{CheckKind, ContentHash, KeyId, RepoId, Timestamp, Version};
use repomesh_core::{ErrorKind, TrustError, Verdict};
use serde::Serialize;
use serde_json::{json, Value};

/// Summary of the verified release event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSummary {
    /// Target repository.
    pub repo: RepoId,
    /// Target version.
    pub version: Version,
    /// Commit identifier of the release.
    pub commit: String,
    /// Publication instant.
    pub timestamp: Timestamp,
    /// Canonical hash of the release event.
    #[serde(rename = "canonicalHash")]
    pub canonical_hash: ContentHash,
    /// Number of artifacts carried by the release.
    #[serde(rename = "artifactCount")]
    pub artifact_count: usize,
}

/// One attestation event's verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttestationCheck {
    /// Signing key of the attestation.
    #[serde(rename = "signerKey")]
    pub signer_key: KeyId,
    /// Check kinds and verdicts the event carries.
    pub verdicts: Vec<(CheckKind, Verdict)>,
    /// Whether the event's hash and signature verified.
    pub valid: bool,
    /// Failure kind when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

/// Anchoring status of a verified release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorStatus {
    /// Whether the release hash was found in an anchored partition.
    pub anchored: bool,
    /// Partition containing the release, when anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,
    /// Root of that partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<ContentHash>,
    /// Ledger transaction of the covering anchor.
    #[serde(rename = "txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl AnchorStatus {
    /// Status for a release not yet covered by any partition.
    pub fn not_anchored() -> Self {
        Self {
            anchored: false,
            partition: None,
            root: None,
            tx_hash: None,
        }
    }
}

/// Result of `verify_release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Whether every requested check held.
    pub ok: bool,
    /// The verified release.
    pub release: ReleaseSummary,
    /// Per-attestation verification outcomes.
    pub attestations: Vec<AttestationCheck>,
    /// Anchoring status; present only when anchoring was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<AnchorStatus>,
}

/// One failed event in a full-log sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFailure {
    /// Zero-based log line index.
    pub index: usize,
    /// Failure kind.
    pub kind: ErrorKind,
    /// Failure message.
    pub message: String,
}

/// Result of `verify_log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogReport {
    /// Whether every event verified.
    pub ok: bool,
    /// Number of events swept.
    pub total: usize,
    /// Events that failed verification.
    pub failures: Vec<LogFailure>,
}

/// Serializes a failure as the machine-consumer JSON shape.
pub fn failure_json(error: &TrustError) -> Value {
    json!({
        "ok": false,
        "error": error.kind,
        "message": error.message,
    })
}
