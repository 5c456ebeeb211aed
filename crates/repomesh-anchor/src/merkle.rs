use repomesh_canonical::ContentHash;
use sha2::{Digest, Sha256};

fn parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Computes the Merkle root over canonical-hash leaves.
///
/// The tree is binary and built bottom-up over the raw 32-byte decodings.
/// A level of odd length duplicates its final node; the root of a
/// single-leaf list is that leaf. Returns `None` for an empty list.
pub fn merkle_root(leaves: &[ContentHash]) -> Option<ContentHash> {
    if leaves.is_empty() {
        return None;
    }
    let mut level: Vec<[u8; 32]> = leaves.iter().map(ContentHash::to_raw).collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let right = pair.get(1).unwrap_or(&pair[0]);
            next.push(parent(&pair[0], right));
        }
        level = next;
    }
    Some(ContentHash::from_raw(level[0]))
}
