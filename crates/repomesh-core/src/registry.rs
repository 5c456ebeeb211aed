use repomesh_canonical::{KeyId, PublicKey, RepoId};
use std::collections::BTreeMap;

use crate::errors::{ErrorKind, TrustError};
use crate::manifest::ParticipantManifest;

/// A resolved signing key together with the participant that registered it.
#[derive(Debug, Clone)]
pub struct RegisteredKey {
    /// Participant whose manifest carries the key.
    pub owner: RepoId,
    /// Parsed public half.
    pub key: PublicKey,
}

/// In-memory registry of every participant manifest in the network.
///
/// The registry is the key-resolution authority: the *current* manifest set
/// decides which keys exist. Rotated-out keys keep verifying because
/// maintainer entries are never removed, only added.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    participants: BTreeMap<RepoId, ParticipantManifest>,
    keys: BTreeMap<KeyId, Vec<RegisteredKey>>,
}

impl KeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a participant manifest, parsing its PEM keys eagerly.
    ///
    /// Rejects duplicate participant ids and duplicate key ids within a
    /// single manifest.
    pub fn register(&mut self, manifest: ParticipantManifest) -> Result<(), TrustError> {
        if self.participants.contains_key(&manifest.id) {
            return Err(TrustError::new(
                ErrorKind::SchemaViolation,
                format!("participant '{}' is already registered", manifest.id),
            ));
        }
        let mut parsed = Vec::with_capacity(manifest.maintainers.len());
        for maintainer in &manifest.maintainers {
            if manifest
                .maintainers
                .iter()
                .filter(|m| m.key_id == maintainer.key_id)
                .count()
                > 1
            {
                return Err(TrustError::new(
                    ErrorKind::SchemaViolation,
                    format!(
                        "key '{}' appears more than once in manifest '{}'",
                        maintainer.key_id, manifest.id
                    ),
                ));
            }
            let key = PublicKey::from_pem(&maintainer.public_key).map_err(|err| {
                TrustError::new(
                    ErrorKind::SchemaViolation,
                    format!("manifest '{}' key '{}': {}", manifest.id, maintainer.key_id, err),
                )
            })?;
            parsed.push((maintainer.key_id.clone(), key));
        }
        for (key_id, key) in parsed {
            self.keys.entry(key_id).or_default().push(RegisteredKey {
                owner: manifest.id.clone(),
                key,
            });
        }
        self.participants.insert(manifest.id.clone(), manifest);
        Ok(())
    }

    /// Resolves a key id against every registered manifest.
    ///
    /// This is the authority rule for third-party events: any registered
    /// participant may sign. Key ids are only unique *within* one
    /// manifest, so two participants may independently register the same
    /// id; every match is returned and callers decide between candidates
    /// by trying the actual signature.
    pub fn resolve(&self, key_id: &KeyId) -> &[RegisteredKey] {
        self.keys
            .get(key_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Resolves a key id against one participant's own maintainers.
    ///
    /// This is the authority rule for `ReleasePublished`: the signer must
    /// be a maintainer of the target repo itself.
    pub fn resolve_for(&self, repo: &RepoId, key_id: &KeyId) -> Option<&RegisteredKey> {
        self.keys
            .get(key_id)
            .and_then(|entries| entries.iter().find(|entry| &entry.owner == repo))
    }

    /// Whether the given participant id is registered.
    pub fn is_registered(&self, id: &RepoId) -> bool {
        self.participants.contains_key(id)
    }

    /// The manifest registered for a participant, if any.
    pub fn manifest(&self, id: &RepoId) -> Option<&ParticipantManifest> {
        self.participants.get(id)
    }

    /// Iterates over registered participant ids.
    pub fn participant_ids(&self) -> impl Iterator<Item = &RepoId> {
        self.participants.keys()
    }
}
