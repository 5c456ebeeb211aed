use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable failure kinds.
///
/// Every operation in the workspace reports failures through one of these
/// kinds; the spelling is part of the external contract and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Embedded `canonicalHash` disagrees with the recomputed content hash.
    CanonicalHashMismatch,
    /// Ed25519 verification failed over the content-hash bytes.
    SignatureInvalid,
    /// Signing `keyId` is not registered, or lacks authority for the event.
    UnknownKey,
    /// A log line is not valid JSON.
    MalformedEvent,
    /// A parsed event does not conform to the event schema.
    SchemaViolation,
    /// The event's identity key already exists in the log.
    DuplicateEvent,
    /// The event timestamp falls outside the admission window.
    TimestampOutOfRange,
    /// A proposed log does not extend the baseline byte-for-byte.
    LogRewrite,
    /// No `ReleasePublished` event exists for the requested target.
    ReleaseNotFound,
    /// A partition manifest already exists with different bytes.
    ManifestConflict,
    /// A partition manifest could not be loaded.
    ManifestUnavailable,
    /// A manifest's stored hash disagrees with its recomputed hash.
    ManifestTampered,
    /// A ledger memo was missing, truncated, or of the wrong version.
    MemoDecodeFailed,
    /// The encoded memo exceeds the transport bound.
    MemoTooLarge,
    /// Replayed leaf count disagrees with the memo.
    PartitionLeafCountMismatch,
    /// Replayed Merkle root disagrees with the memo.
    RootMismatch,
    /// The external ledger could not be reached within the retry budget.
    ExternalLedgerUnavailable,
    /// An evidence URI could not be fetched within the retry budget.
    EvidenceUnavailable,
    /// A trusted-set policy left no surviving sources.
    PolicyNoTrustedSources,
}

impl ErrorKind {
    /// Warn-class kinds degrade the enclosing operation instead of
    /// terminating it.
    pub fn is_warn(self) -> bool {
        matches!(
            self,
            ErrorKind::ExternalLedgerUnavailable
                | ErrorKind::EvidenceUnavailable
                | ErrorKind::PolicyNoTrustedSources
        )
    }
}

/// A failure carrying a stable kind and a human-readable message.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct TrustError {
    /// Stable machine-readable kind.
    pub kind: ErrorKind,
    /// Human-readable description; never parsed by machines.
    pub message: String,
}

impl TrustError {
    /// Creates a failure of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether this failure is warn-class.
    pub fn is_warn(&self) -> bool {
        self.kind.is_warn()
    }
}

impl From<repomesh_canonical::CanonicalizationError> for TrustError {
    fn from(err: repomesh_canonical::CanonicalizationError) -> Self {
        TrustError::new(ErrorKind::MalformedEvent, err.to_string())
    }
}

impl From<repomesh_canonical::ValidationError> for TrustError {
    fn from(err: repomesh_canonical::ValidationError) -> Self {
        TrustError::new(ErrorKind::SchemaViolation, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warn_class_partition() {
        assert!(ErrorKind::ExternalLedgerUnavailable.is_warn());
        assert!(ErrorKind::EvidenceUnavailable.is_warn());
        assert!(!ErrorKind::SignatureInvalid.is_warn());
        assert!(!ErrorKind::LogRewrite.is_warn());
    }

    #[test]
    fn kind_serializes_to_stable_spelling() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::CanonicalHashMismatch).unwrap(),
            "\"CanonicalHashMismatch\""
        );
    }
}
