use repomesh_canonical::{KeyId, Keypair, RepoId, Timestamp, Version};
use repomesh_core::{
    sign_event, verify_event, Artifact, AttestationRef, ErrorKind, Event, EventType, KeyRegistry,
    Maintainer, ParticipantKind, ParticipantManifest,
};

fn register(registry: &mut KeyRegistry, id: &str, kind: ParticipantKind, key_id: &str, keypair: &Keypair) {
    registry
        .register(ParticipantManifest {
            id: RepoId::parse(id).unwrap(),
            kind,
            provides: vec![],
            consumes: vec![],
            maintainers: vec![Maintainer {
                name: "maintainer".into(),
                key_id: KeyId::parse(key_id).unwrap(),
                public_key: keypair.public_pem().unwrap(),
                contact: None,
            }],
        })
        .unwrap();
}

fn release(repo: &str, version: &str) -> Event {
    Event {
        event_type: EventType::ReleasePublished,
        repo: RepoId::parse(repo).unwrap(),
        version: Version::parse(version).unwrap(),
        commit: "0f1e2d3c4b5a".into(),
        timestamp: Timestamp::parse("2026-02-28T10:00:00.000Z").unwrap(),
        artifacts: vec![Artifact {
            name: "x.tgz".into(),
            sha256: "00".repeat(32),
            uri: "https://dist.example/x.tgz".into(),
        }],
        attestations: vec![AttestationRef {
            kind: "sbom".into(),
            uri: "https://dist.example/x.sbom.json".into(),
        }],
        notes: String::new(),
        signature: None,
    }
}

#[test]
fn single_signed_release_is_verifiable() {
    let keypair = Keypair::from_seed(&[11u8; 32]);
    let mut registry = KeyRegistry::new();
    register(&mut registry, "acme/widgets", ParticipantKind::Registry, "acme-k1", &keypair);

    let mut event = release("acme/widgets", "1.2.3");
    sign_event(&mut event, &keypair, KeyId::parse("acme-k1").unwrap()).unwrap();

    verify_event(&event, &registry).unwrap();
    let embedded = event.signature.as_ref().unwrap().canonical_hash.clone();
    assert_eq!(event.content_hash().unwrap(), embedded);
}

#[test]
fn any_single_field_flip_invalidates_the_event() {
    let keypair = Keypair::from_seed(&[11u8; 32]);
    let mut registry = KeyRegistry::new();
    register(&mut registry, "acme/widgets", ParticipantKind::Registry, "acme-k1", &keypair);

    let mut signed = release("acme/widgets", "1.2.3");
    sign_event(&mut signed, &keypair, KeyId::parse("acme-k1").unwrap()).unwrap();

    let mut tampered_commit = signed.clone();
    tampered_commit.commit = "0f1e2d3c4b5b".into();
    assert_eq!(
        verify_event(&tampered_commit, &registry).unwrap_err().kind,
        ErrorKind::CanonicalHashMismatch
    );

    let mut tampered_artifact = signed.clone();
    tampered_artifact.artifacts[0].sha256 = format!("{}01", "00".repeat(31));
    assert_eq!(
        verify_event(&tampered_artifact, &registry).unwrap_err().kind,
        ErrorKind::CanonicalHashMismatch
    );

    let mut tampered_notes = signed;
    tampered_notes.notes = "x".into();
    assert_eq!(
        verify_event(&tampered_notes, &registry).unwrap_err().kind,
        ErrorKind::CanonicalHashMismatch
    );
}

#[test]
fn unregistered_signer_is_unknown_key() {
    let keypair = Keypair::from_seed(&[11u8; 32]);
    let registry = KeyRegistry::new();

    let mut event = release("acme/widgets", "1.2.3");
    event.event_type = EventType::AttestationPublished;
    sign_event(&mut event, &keypair, KeyId::parse("ghost").unwrap()).unwrap();
    assert_eq!(
        verify_event(&event, &registry).unwrap_err().kind,
        ErrorKind::UnknownKey
    );
}

#[test]
fn rotated_in_keys_verify_alongside_old_ones() {
    let old_key = Keypair::from_seed(&[1u8; 32]);
    let new_key = Keypair::from_seed(&[2u8; 32]);
    let mut registry = KeyRegistry::new();
    registry
        .register(ParticipantManifest {
            id: RepoId::parse("acme/widgets").unwrap(),
            kind: ParticipantKind::Registry,
            provides: vec![],
            consumes: vec![],
            maintainers: vec![
                Maintainer {
                    name: "old".into(),
                    key_id: KeyId::parse("acme-k1").unwrap(),
                    public_key: old_key.public_pem().unwrap(),
                    contact: None,
                },
                Maintainer {
                    name: "new".into(),
                    key_id: KeyId::parse("acme-k2").unwrap(),
                    public_key: new_key.public_pem().unwrap(),
                    contact: None,
                },
            ],
        })
        .unwrap();

    let mut old_event = release("acme/widgets", "1.0.0");
    sign_event(&mut old_event, &old_key, KeyId::parse("acme-k1").unwrap()).unwrap();
    verify_event(&old_event, &registry).unwrap();

    let mut new_event = release("acme/widgets", "1.1.0");
    sign_event(&mut new_event, &new_key, KeyId::parse("acme-k2").unwrap()).unwrap();
    verify_event(&new_event, &registry).unwrap();
}
