//! Canonical data primitives for RepoMesh events.
//!
//! Every byte that participates in hashing or signature verification is
//! produced by this crate: the canonical JSON encoding, SHA-256 content
//! hashes, and Ed25519 signatures over the raw hash bytes. Higher layers
//! must never serialize hash input themselves.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Content-hash primitive (lowercase 64-hex SHA-256).
pub mod digest;
/// Validated identifier newtypes shared across the workspace.
pub mod identifiers;
/// Ed25519 key material: PEM-registered public keys and signing keypairs.
pub mod keys;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{canonical_bytes, canonical_bytes_without, CanonicalizationError};
pub use digest::ContentHash;
pub use identifiers::{CheckKind, KeyId, RepoId, Timestamp, Version};
pub use keys::{KeyError, Keypair, PublicKey};
pub use validation::ValidationError;
