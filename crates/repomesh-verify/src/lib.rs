//! End-to-end verification predicates for the RepoMesh trust core.
//!
//! This crate is the outermost library surface consumed by CLIs,
//! dashboards, and static-site generators. Every predicate returns a
//! structured result with typed error kinds; nothing here formats for
//! humans or exits the process.
//!
//! Predicates: `verify_release`, `verify_anchor`, `verify_log`,
//! `aggregate_attestations`, `compute_scores`, `append_batch`,
//! `emit_anchor`.
//!
#![deny(missing_docs)]

/// Release verification and the predicate facade.
pub mod release;
/// Anchor-proof replay from a ledger transaction.
pub mod replay;
/// Structured report types.
pub mod report;

pub use release::Orchestrator;
pub use replay::AnchorReplayReport;
pub use report::{
    failure_json, AnchorStatus, AttestationCheck, LogFailure, LogReport, ReleaseReport,
    ReleaseSummary,
};
