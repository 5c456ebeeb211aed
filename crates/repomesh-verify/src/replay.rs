use repomesh_anchor::{
    merkle_root, partition_leaves, with_retries, AnchorMemo, LedgerClient, PartitionId,
    RetryPolicy, MEMO_TYPE,
};
use repomesh_core::{ErrorKind, Event, TrustError};
use serde::Serialize;
use tracing::info;

use crate::release::Orchestrator;

/// Result of replaying an anchor proof from a ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorReplayReport {
    /// Whether the local log reproduces the memo exactly.
    pub ok: bool,
    /// Replayed partition selector.
    pub partition: String,
    /// Recomputed Merkle root.
    pub root: String,
    /// Recomputed leaf count.
    pub count: u64,
    /// Ledger transaction the memo came from.
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    /// Ledger network named by the memo.
    pub network: String,
}

impl<'a> Orchestrator<'a> {
    /// Replays an anchor proof from a ledger transaction hash.
    ///
    /// Fetches the transaction, decodes the memo, rebuilds the named
    /// partition from the local log, and asserts that root, count, and
    /// manifest hash all match. Transport failures degrade to the
    /// warn-class `ExternalLedgerUnavailable`, which distinguishes
    /// "anchored but unverifiable right now" from "not anchored".
    pub fn verify_anchor<C: LedgerClient>(
        &self,
        events: &[Event],
        client: &C,
        retry: &RetryPolicy,
        tx_hash: &str,
    ) -> Result<AnchorReplayReport, TrustError> {
        let memos = with_retries(retry, "anchor transaction fetch", || {
            client.fetch_memos(tx_hash)
        })?;

        let memo_type_hex = hex::encode(MEMO_TYPE.as_bytes());
        let entry = memos
            .iter()
            .find(|entry| entry.memo_type_hex.to_lowercase() == memo_type_hex)
            .ok_or_else(|| {
                TrustError::new(
                    ErrorKind::MemoDecodeFailed,
                    format!("transaction {tx_hash} carries no {MEMO_TYPE} memo"),
                )
            })?;
        let memo = AnchorMemo::from_hex(&entry.memo_data_hex)?;

        let partition = PartitionId::parse(&memo.p)?;
        let manifest = self.manifests().load(&partition)?;

        let leaves = partition_leaves(events, &partition)?;
        if leaves.len() as u64 != memo.c {
            return Err(TrustError::new(
                ErrorKind::PartitionLeafCountMismatch,
                format!(
                    "partition '{partition}' replays {} leaves, memo says {}",
                    leaves.len(),
                    memo.c
                ),
            ));
        }

        let root = merkle_root(&leaves).ok_or_else(|| {
            TrustError::new(
                ErrorKind::PartitionLeafCountMismatch,
                format!("partition '{partition}' contains no leaves"),
            )
        })?;
        if root != memo.r {
            return Err(TrustError::new(
                ErrorKind::RootMismatch,
                format!("replayed root {root} disagrees with memo root {}", memo.r),
            ));
        }

        let manifest_hash = manifest.compute_hash()?;
        if manifest_hash != memo.h {
            return Err(TrustError::new(
                ErrorKind::ManifestTampered,
                format!(
                    "recomputed manifestHash {manifest_hash} disagrees with memo {}",
                    memo.h
                ),
            ));
        }

        info!(%partition, %tx_hash, "anchor proof replayed");
        Ok(AnchorReplayReport {
            ok: true,
            partition: memo.p,
            root: root.as_str().to_owned(),
            count: memo.c,
            tx_hash: tx_hash.to_owned(),
            network: memo.n,
        })
    }
}
