use repomesh_canonical::{KeyId, Keypair};

use crate::errors::{ErrorKind, TrustError};
use crate::events::{Event, EventType, SignatureBlock};
use crate::registry::{KeyRegistry, RegisteredKey};

const SIGNATURE_ALG: &str = "ed25519";

/// Signs `event` in place with `keypair` under `key_id`.
///
/// The content hash is computed over the event with any existing signature
/// block stripped, then the raw 32 hash bytes are signed.
pub fn sign_event(event: &mut Event, keypair: &Keypair, key_id: KeyId) -> Result<(), TrustError> {
    let hash = event.content_hash()?;
    let value = keypair.sign_hash(&hash);
    event.signature = Some(SignatureBlock {
        alg: SIGNATURE_ALG.into(),
        key_id,
        value,
        canonical_hash: hash,
    });
    Ok(())
}

/// Verifies an event's content hash and signature against the registry.
///
/// Checks run in order: hash agreement (`CanonicalHashMismatch`), key
/// resolution under the authority rule (`UnknownKey`), Ed25519 verification
/// over the raw hash bytes (`SignatureInvalid`). `ReleasePublished` events
/// must be signed by a maintainer of the target repo; every other type may
/// be signed by any registered participant.
pub fn verify_event(event: &Event, registry: &KeyRegistry) -> Result<(), TrustError> {
    let signature = event.signature.as_ref().ok_or_else(|| {
        TrustError::new(ErrorKind::SchemaViolation, "event carries no signature block")
    })?;
    if signature.alg != SIGNATURE_ALG {
        return Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("unsupported signature algorithm '{}'", signature.alg),
        ));
    }

    let computed = event.content_hash()?;
    if computed != signature.canonical_hash {
        return Err(TrustError::new(
            ErrorKind::CanonicalHashMismatch,
            format!(
                "embedded hash {} disagrees with recomputed {}",
                signature.canonical_hash, computed
            ),
        ));
    }

    let candidates: Vec<&RegisteredKey> = match event.event_type {
        EventType::ReleasePublished => registry
            .resolve_for(&event.repo, &signature.key_id)
            .into_iter()
            .collect(),
        _ => registry.resolve(&signature.key_id).iter().collect(),
    };
    if candidates.is_empty() {
        return Err(TrustError::new(
            ErrorKind::UnknownKey,
            format!(
                "key '{}' holds no authority for {} {}@{}",
                signature.key_id,
                match event.event_type {
                    EventType::ReleasePublished => "release of",
                    _ => "events about",
                },
                event.repo,
                event.version
            ),
        ));
    }

    // Several participants may have registered the same key id; the
    // signature decides which candidate, if any, signed.
    if candidates
        .iter()
        .any(|candidate| candidate.key.verify_hash(&computed, &signature.value).is_ok())
    {
        Ok(())
    } else {
        Err(TrustError::new(
            ErrorKind::SignatureInvalid,
            format!("signature by '{}' does not verify", signature.key_id),
        ))
    }
}

/// Identifies which registered participant actually produced an event's
/// signature.
///
/// Key ids are only unique within one manifest, so the key id alone does
/// not name a participant; the candidate whose public key verifies the
/// embedded hash is the signer. Returns `None` when no candidate matches.
pub fn resolve_signer<'a>(
    event: &Event,
    registry: &'a KeyRegistry,
) -> Option<&'a RegisteredKey> {
    let signature = event.signature.as_ref()?;
    registry
        .resolve(&signature.key_id)
        .iter()
        .find(|candidate| {
            candidate
                .key
                .verify_hash(&signature.canonical_hash, &signature.value)
                .is_ok()
        })
}
