use repomesh_canonical::{ContentHash, RepoId, Timestamp, Version};
use repomesh_core::{
    AttestationRef, AttestorUri, ErrorKind, Event, EventType, TrustError, Verdict,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::ledger::{with_retries, LedgerClient, RetryPolicy, TxReceipt};
use crate::manifest::{ManifestStore, PartitionManifest, MANIFEST_ALGO, MANIFEST_SCHEMA_VERSION};
use crate::memo::{AnchorMemo, MEMO_FORMAT, MEMO_TYPE};
use crate::merkle::merkle_root;
use crate::partition::PartitionId;

/// Check kind carried by anchor events.
pub const ANCHOR_CHECK_KIND: &str = "ledger.anchor";

/// Whether an event is an anchor-publishing event.
pub fn is_anchor_event(event: &Event) -> bool {
    event.event_type == EventType::AttestationPublished
        && event.has_attestation_kind(ANCHOR_CHECK_KIND)
}

/// Metadata carried in an anchor event's notes tail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorNote {
    /// Transaction hash on the external ledger.
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    /// Ledger network name.
    pub network: String,
    /// Wallet address the self-payment was sent from.
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    /// Partition selector string.
    #[serde(rename = "partitionId")]
    pub partition_id: String,
    /// Merkle root of the anchored partition.
    #[serde(rename = "merkleRoot")]
    pub merkle_root: ContentHash,
    /// Merkle construction identifier.
    pub algo: String,
    /// Previous anchor root, absent for genesis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<ContentHash>,
    /// First and last leaf of the partition.
    pub range: [ContentHash; 2],
    /// Where the manifest file was materialized.
    #[serde(rename = "manifestPath")]
    pub manifest_path: String,
}

impl AnchorNote {
    /// Parses the notes tail of an anchor event.
    pub fn from_event(event: &Event) -> Option<Self> {
        let tail = event.notes_json_tail()?;
        serde_json::from_value(tail).ok()
    }
}

/// The canonical-hash leaves of a partition, in log order.
///
/// Leaves are the embedded `canonicalHash` of each event, filtered to
/// exact 64-hex strings; every admitted event satisfies the filter.
pub fn partition_leaves(
    events: &[Event],
    partition: &PartitionId,
) -> Result<Vec<ContentHash>, TrustError> {
    Ok(partition
        .select(events)?
        .into_iter()
        .filter_map(|event| event.signature.as_ref())
        .filter(|sig| ContentHash::is_hex64(sig.canonical_hash.as_str()))
        .map(|sig| sig.canonical_hash.clone())
        .collect())
}

/// Result of a completed anchoring run.
#[derive(Debug)]
pub struct AnchorOutcome {
    /// The unsigned anchor event, ready for signing and admission.
    pub event: Event,
    /// The sealed manifest that was materialized.
    pub manifest: PartitionManifest,
    /// Path of the manifest file.
    pub manifest_path: PathBuf,
    /// Ledger submission receipt.
    pub receipt: TxReceipt,
}

/// Drives partition materialization and ledger anchoring.
///
/// Anchor production is serial per partition: materialization is
/// idempotent, and a transient ledger failure leaves no anchor event
/// behind.
pub struct AnchorEngine<'a, C: LedgerClient> {
    store: &'a ManifestStore,
    client: &'a C,
    retry: RetryPolicy,
}

impl<'a, C: LedgerClient> AnchorEngine<'a, C> {
    /// Creates an engine over a manifest store and ledger client.
    pub fn new(store: &'a ManifestStore, client: &'a C, retry: RetryPolicy) -> Self {
        Self {
            store,
            client,
            retry,
        }
    }

    /// The partition that should be anchored next.
    ///
    /// `since:<ts-of-last-anchor>` when any anchor exists, else `genesis`.
    pub fn next_partition(&self, events: &[Event]) -> PartitionId {
        match last_anchor(events) {
            Some((_, event)) => PartitionId::Since(event.timestamp.clone()),
            None => PartitionId::Genesis,
        }
    }

    /// Builds and persists the sealed manifest for `partition`.
    pub fn materialize(
        &self,
        events: &[Event],
        partition: &PartitionId,
    ) -> Result<(PartitionManifest, PathBuf), TrustError> {
        let leaves = partition_leaves(events, partition)?;
        let root = merkle_root(&leaves).ok_or_else(|| {
            TrustError::new(
                ErrorKind::PartitionLeafCountMismatch,
                format!("partition '{partition}' contains no leaves"),
            )
        })?;
        debug!(partition = %partition, count = leaves.len(), root = %root, "built partition tree");

        let prev = last_anchor(events)
            .and_then(|(_, event)| AnchorNote::from_event(event))
            .map(|note| note.merkle_root);

        let manifest = PartitionManifest {
            v: MANIFEST_SCHEMA_VERSION,
            algo: MANIFEST_ALGO.into(),
            partition_id: partition.to_string(),
            network: self.client.network(),
            prev,
            range: [leaves[0].clone(), leaves[leaves.len() - 1].clone()],
            count: leaves.len() as u64,
            root,
            manifest_hash: None,
        }
        .seal()?;

        let path = self.store.write(partition, &manifest)?;
        Ok((manifest, path))
    }

    /// Materializes `partition`, submits its memo, and produces the anchor
    /// event.
    ///
    /// The returned event is unsigned; the caller signs it and feeds it
    /// back through admission, where it becomes a leaf of a later
    /// partition.
    pub fn anchor(
        &self,
        events: &[Event],
        partition: &PartitionId,
        anchor_repo: &RepoId,
        now: Timestamp,
    ) -> Result<AnchorOutcome, TrustError> {
        let (manifest, manifest_path) = self.materialize(events, partition)?;
        let memo = AnchorMemo::from_manifest(&manifest)?;
        let data_hex = memo.to_hex()?;

        let receipt = with_retries(&self.retry, "anchor submission", || {
            self.client.submit_anchor(
                &hex::encode(MEMO_TYPE.as_bytes()),
                &hex::encode(MEMO_FORMAT.as_bytes()),
                &data_hex,
            )
        })?;
        info!(partition = %partition, tx = %receipt.tx_hash, "anchor submitted to ledger");

        let note = AnchorNote {
            tx_hash: receipt.tx_hash.clone(),
            network: self.client.network(),
            wallet_address: self.client.wallet_address(),
            partition_id: manifest.partition_id.clone(),
            merkle_root: manifest.root.clone(),
            algo: manifest.algo.clone(),
            prev: manifest.prev.clone(),
            range: manifest.range.clone(),
            manifest_path: manifest_path.display().to_string(),
        };
        let note_json = serde_json::to_string(&note)
            .map_err(|err| TrustError::new(ErrorKind::MalformedEvent, err.to_string()))?;

        let event = Event {
            event_type: EventType::AttestationPublished,
            repo: anchor_repo.clone(),
            version: Version::new(format!("1.0.0+{}", partition.file_stem())),
            commit: manifest.root.as_str().to_owned(),
            timestamp: now,
            artifacts: vec![],
            attestations: vec![AttestationRef {
                kind: ANCHOR_CHECK_KIND.into(),
                uri: AttestorUri::format(
                    &repomesh_canonical::CheckKind::new(ANCHOR_CHECK_KIND.into()),
                    Verdict::Pass,
                ),
            }],
            notes: format!(
                "anchored partition {} to {}\n{}",
                manifest.partition_id,
                manifest.network,
                note_json
            ),
            signature: None,
        };

        Ok(AnchorOutcome {
            event,
            manifest,
            manifest_path,
            receipt,
        })
    }
}

/// The newest anchor event in the log, with its index.
pub fn last_anchor(events: &[Event]) -> Option<(usize, &Event)> {
    events
        .iter()
        .enumerate()
        .rev()
        .find(|(_, event)| is_anchor_event(event))
}
