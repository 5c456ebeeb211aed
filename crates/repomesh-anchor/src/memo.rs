use repomesh_canonical::ContentHash;
use repomesh_core::{ErrorKind, TrustError};
use serde::{Deserialize, Serialize};

use crate::manifest::PartitionManifest;

/// Memo type tag attached to anchor transactions, hex-encoded in transport.
pub const MEMO_TYPE: &str = "repomesh-anchor-v1";

/// Memo payload content type.
pub const MEMO_FORMAT: &str = "application/json";

/// Upper bound on the encoded memo payload in bytes.
pub const MEMO_MAX_BYTES: usize = 700;

const ABSENT: &str = "0";

/// Compact anchor summary carried in the ledger memo.
///
/// Single-letter keys keep the payload inside the transport bound:
/// `{v, p, n, r, h, c, pv, rg}` map to schema version, partition id,
/// network, root, manifest hash, count, previous root, and leaf range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorMemo {
    /// Schema version.
    pub v: u32,
    /// Partition selector string.
    pub p: String,
    /// External-ledger network name.
    pub n: String,
    /// Merkle root.
    pub r: ContentHash,
    /// Manifest hash.
    pub h: ContentHash,
    /// Leaf count.
    pub c: u64,
    /// Previous anchor root, or `"0"` for genesis.
    pub pv: String,
    /// Leaf range as `"first..last"`, or `"0"` when absent.
    pub rg: String,
}

impl AnchorMemo {
    /// Builds the memo for a sealed manifest.
    pub fn from_manifest(manifest: &PartitionManifest) -> Result<Self, TrustError> {
        let h = manifest.manifest_hash.clone().ok_or_else(|| {
            TrustError::new(ErrorKind::ManifestTampered, "manifest is not sealed")
        })?;
        Ok(Self {
            v: manifest.v,
            p: manifest.partition_id.clone(),
            n: manifest.network.clone(),
            r: manifest.root.clone(),
            h,
            c: manifest.count,
            pv: manifest
                .prev
                .as_ref()
                .map(|p| p.as_str().to_owned())
                .unwrap_or_else(|| ABSENT.into()),
            rg: format!("{}..{}", manifest.range[0], manifest.range[1]),
        })
    }

    /// Previous anchor root, when not genesis.
    pub fn prev(&self) -> Result<Option<ContentHash>, TrustError> {
        if self.pv == ABSENT {
            return Ok(None);
        }
        ContentHash::parse(self.pv.clone())
            .map(Some)
            .map_err(|_| TrustError::new(ErrorKind::MemoDecodeFailed, "memo pv is not a root hash"))
    }

    /// Leaf range endpoints, when present.
    pub fn range(&self) -> Result<Option<(ContentHash, ContentHash)>, TrustError> {
        if self.rg == ABSENT {
            return Ok(None);
        }
        let (first, last) = self.rg.split_once("..").ok_or_else(|| {
            TrustError::new(ErrorKind::MemoDecodeFailed, "memo rg is not 'first..last'")
        })?;
        let first = ContentHash::parse(first)
            .map_err(|_| TrustError::new(ErrorKind::MemoDecodeFailed, "memo rg first leaf"))?;
        let last = ContentHash::parse(last)
            .map_err(|_| TrustError::new(ErrorKind::MemoDecodeFailed, "memo rg last leaf"))?;
        Ok(Some((first, last)))
    }

    /// Hex transport encoding of the compact JSON payload.
    ///
    /// Fails with `MemoTooLarge` when the JSON exceeds the transport bound.
    pub fn to_hex(&self) -> Result<String, TrustError> {
        let json = serde_json::to_string(self)
            .map_err(|err| TrustError::new(ErrorKind::MemoDecodeFailed, err.to_string()))?;
        if json.len() > MEMO_MAX_BYTES {
            return Err(TrustError::new(
                ErrorKind::MemoTooLarge,
                format!("memo is {} bytes, bound is {}", json.len(), MEMO_MAX_BYTES),
            ));
        }
        Ok(hex::encode(json.as_bytes()))
    }

    /// Decodes a memo from its hex transport encoding.
    ///
    /// Every failure path (bad hex, bad UTF-8, bad JSON, missing fields,
    /// wrong schema version) is `MemoDecodeFailed`.
    pub fn from_hex(data_hex: &str) -> Result<Self, TrustError> {
        let bytes = hex::decode(data_hex.trim())
            .map_err(|err| TrustError::new(ErrorKind::MemoDecodeFailed, format!("memo hex: {err}")))?;
        let json = String::from_utf8(bytes).map_err(|err| {
            TrustError::new(ErrorKind::MemoDecodeFailed, format!("memo utf-8: {err}"))
        })?;
        let memo: AnchorMemo = serde_json::from_str(&json).map_err(|err| {
            TrustError::new(ErrorKind::MemoDecodeFailed, format!("memo json: {err}"))
        })?;
        if memo.v != 1 {
            return Err(TrustError::new(
                ErrorKind::MemoDecodeFailed,
                format!("unsupported memo schema version {}", memo.v),
            ));
        }
        Ok(memo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{MANIFEST_ALGO, MANIFEST_SCHEMA_VERSION};

    fn sealed_manifest() -> PartitionManifest {
        let first = ContentHash::parse("11".repeat(32)).unwrap();
        let last = ContentHash::parse("22".repeat(32)).unwrap();
        PartitionManifest {
            v: MANIFEST_SCHEMA_VERSION,
            algo: MANIFEST_ALGO.into(),
            partition_id: "2026-02-28".into(),
            network: "testnet".into(),
            prev: None,
            range: [first, last.clone()],
            count: 2,
            root: last,
            manifest_hash: None,
        }
        .seal()
        .unwrap()
    }

    #[test]
    fn memo_round_trips_through_hex() {
        let memo = AnchorMemo::from_manifest(&sealed_manifest()).unwrap();
        let decoded = AnchorMemo::from_hex(&memo.to_hex().unwrap()).unwrap();
        assert_eq!(decoded, memo);
        assert_eq!(decoded.prev().unwrap(), None);
        let (first, last) = decoded.range().unwrap().unwrap();
        assert_eq!(first.as_str(), &"11".repeat(32));
        assert_eq!(last.as_str(), &"22".repeat(32));
    }

    #[test]
    fn realistic_memos_fit_the_transport_bound() {
        let mut manifest = sealed_manifest();
        manifest.partition_id = "since:2026-02-28T10:00:00.000Z".into();
        manifest.prev = Some(ContentHash::parse("33".repeat(32)).unwrap());
        manifest.manifest_hash = None;
        let memo = AnchorMemo::from_manifest(&manifest.seal().unwrap()).unwrap();
        assert!(memo.to_hex().is_ok());
    }

    #[test]
    fn oversized_partition_ids_are_rejected() {
        let memo = AnchorMemo {
            p: "x".repeat(MEMO_MAX_BYTES),
            ..AnchorMemo::from_manifest(&sealed_manifest()).unwrap()
        };
        assert_eq!(memo.to_hex().unwrap_err().kind, ErrorKind::MemoTooLarge);
    }

    #[test]
    fn decode_failures_carry_one_kind() {
        assert_eq!(
            AnchorMemo::from_hex("zz").unwrap_err().kind,
            ErrorKind::MemoDecodeFailed
        );
        assert_eq!(
            AnchorMemo::from_hex(&hex::encode(b"{\"v\":1}")).unwrap_err().kind,
            ErrorKind::MemoDecodeFailed
        );

        let memo = AnchorMemo::from_manifest(&sealed_manifest()).unwrap();
        let future = AnchorMemo { v: 2, ..memo };
        let json = serde_json::to_string(&future).unwrap();
        assert_eq!(
            AnchorMemo::from_hex(&hex::encode(json.as_bytes()))
                .unwrap_err()
                .kind,
            ErrorKind::MemoDecodeFailed
        );
    }
}
