use repomesh_canonical::{KeyId, RepoId};
use serde::{Deserialize, Serialize};

/// Role a participant plays in the federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantKind {
    /// Hosts repositories and release metadata.
    Registry,
    /// Publishes signed verdicts about releases.
    Attestor,
    /// Evaluates policy over the log.
    Policy,
    /// Bridges external data sources.
    Oracle,
    /// Provides compute for verifier workloads.
    Compute,
    /// Settles anchoring payments.
    Settlement,
    /// Coordinates network-level decisions.
    Governance,
    /// Manages participant identity material.
    Identity,
}

/// A maintainer entry binding a signing key to a participant.
///
/// Entries are append-only by convention: rotating a key means adding a new
/// entry, never removing the old one, so historical signatures keep
/// verifying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    /// Display name.
    pub name: String,
    /// Key identifier, unique within this manifest.
    #[serde(rename = "keyId")]
    pub key_id: KeyId,
    /// SPKI PEM public key.
    #[serde(rename = "publicKey")]
    pub public_key: String,
    /// Contact address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A network participant's self-description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantManifest {
    /// Participant identity, unique in the network.
    pub id: RepoId,
    /// Participant role.
    pub kind: ParticipantKind,
    /// Capability strings this participant offers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    /// Capability strings this participant depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    /// Signing keys held by this participant.
    pub maintainers: Vec<Maintainer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_spelling_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ParticipantKind::Attestor).unwrap(),
            "\"attestor\""
        );
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = ParticipantManifest {
            id: RepoId::parse("meshtrust/attestor-license").unwrap(),
            kind: ParticipantKind::Attestor,
            provides: vec!["license.audit".into()],
            consumes: vec![],
            maintainers: vec![Maintainer {
                name: "bot".into(),
                key_id: KeyId::parse("lic-1").unwrap(),
                public_key: "-----BEGIN PUBLIC KEY-----\n...\n-----END PUBLIC KEY-----\n".into(),
                contact: None,
            }],
        };
        let json = serde_json::to_string(&manifest).unwrap();
        let back: ParticipantManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
