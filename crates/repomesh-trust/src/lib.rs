//! Attestation aggregation and scoring for the RepoMesh trust core.
//!
//! This crate provides:
//! - Grouping of attestations by `(target, version, check kind)` with
//!   per-signer deduplication
//! - Consensus resolution under per-check verifier policies
//! - Dispute surfacing alongside aggregates
//! - Profile-parameterized integrity and assurance scoring with coverage
//!   projection
//!
#![deny(missing_docs)]

/// Attestation observation collection and grouping.
pub mod aggregate;
/// Consensus resolution under policy.
pub mod consensus;
/// Integrity and assurance scoring.
pub mod scoring;

pub use aggregate::{
    aggregate, AttestationView, CheckAggregate, Dispute, Observation, DISPUTE_KIND,
};
pub use consensus::{resolve, Consensus};
pub use scoring::{compute_scores, ScoreComponent, ScoreReport};
