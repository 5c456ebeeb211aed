//! Core data model and trust rules for the RepoMesh federation.
//!
//! This crate provides:
//! - The `Event` record and its companion types
//! - Participant manifests and the key registry with signer-authority rules
//! - Profiles, per-target overrides, and verifier consensus policies
//! - The stable `ErrorKind` taxonomy shared by every operation
//! - Event signing and verification over canonical content hashes
//!
//! Core invariants:
//! - Events are immutable, append-only records identified by content hash
//! - Signatures cover the raw 32 bytes of the content hash
//! - Release events are self-signed by the target repo's maintainers;
//!   third-party events may be signed by any registered participant
//!
#![deny(missing_docs)]

/// Stable error kinds and the shared failure type.
pub mod errors;
/// Event record and companion types.
pub mod events;
/// Participant manifests.
pub mod manifest;
/// Per-check verifier consensus policies.
pub mod policy;
/// Named requirement profiles and per-target overrides.
pub mod profile;
/// Key registry built from participant manifests.
pub mod registry;
/// Event signing and verification.
pub mod signing;
/// Verdict values and the attestor URI grammar.
pub mod verdict;

pub use errors::{ErrorKind, TrustError};
pub use events::{Artifact, AttestationRef, Event, EventType, SignatureBlock};
pub use manifest::{Maintainer, ParticipantKind, ParticipantManifest};
pub use policy::{CheckPolicy, ConflictPolicy, PolicyMode, PolicySet};
pub use profile::{
    base_weights, effective_weights, CheckWeights, Evidence, IgnoredVuln, LicenseOverrides,
    Overrides, Profile, RequiredChecks, ScoringConfig, SecurityOverrides, UnknownLicenseGrade,
    DEFAULT_WEIGHTS,
};
pub use registry::{KeyRegistry, RegisteredKey};
pub use signing::{resolve_signer, sign_event, verify_event};
pub use verdict::{AttestorUri, Verdict};
