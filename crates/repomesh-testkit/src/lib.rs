//! Test fixtures and helpers for the RepoMesh workspace.
//!
//! Common setup code for integration tests: seeded keypairs, canned
//! participant manifests, signed-event builders, and scratch logs. Every
//! fixture is deterministic so test failures reproduce byte-for-byte.

#![deny(missing_docs)]

/// Deterministic fixture network.
pub mod fixtures;

pub use fixtures::{FixtureNet, Participant};
