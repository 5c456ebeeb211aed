//! Anchoring engine: pins Merkle roots over log partitions to an external
//! public ledger.
//!
//! This crate provides:
//! - Partition selectors (`all`, `genesis`, day, `since:<ts>`)
//! - Binary Merkle-tree construction over canonical-hash leaves
//! - Immutable partition-manifest materialization
//! - The compact ledger memo codec with its transport bound
//! - The external-ledger client contract with bounded retry
//! - Anchor-event production, chained through `prev` roots
//!
//! An anchor event is always a leaf of a *later* partition, never of the
//! one it anchors.
//!
#![deny(missing_docs)]

/// Anchor engine driving materialization and submission.
pub mod engine;
/// External-ledger client contract and retry policy.
pub mod ledger;
/// Partition manifest types and on-disk store.
pub mod manifest;
/// Compact ledger memo codec.
pub mod memo;
/// Merkle-tree construction.
pub mod merkle;
/// Partition selectors.
pub mod partition;

pub use engine::{
    is_anchor_event, last_anchor, partition_leaves, AnchorEngine, AnchorNote, AnchorOutcome,
    ANCHOR_CHECK_KIND,
};
pub use ledger::{with_retries, LedgerClient, LedgerError, MemoEntry, RetryPolicy, TxReceipt};
pub use manifest::{ManifestStore, PartitionManifest, MANIFEST_ALGO, MANIFEST_SCHEMA_VERSION};
pub use memo::{AnchorMemo, MEMO_FORMAT, MEMO_MAX_BYTES, MEMO_TYPE};
pub use merkle::merkle_root;
pub use partition::PartitionId;
