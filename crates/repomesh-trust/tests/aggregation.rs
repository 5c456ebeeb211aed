use repomesh_canonical::{CheckKind, Version};
use repomesh_core::{
    AttestationRef, CheckPolicy, ConflictPolicy, PolicySet, Verdict,
};
use repomesh_testkit::FixtureNet;
use repomesh_trust::{aggregate, Consensus, DISPUTE_KIND};

fn kind(name: &str) -> CheckKind {
    CheckKind::new(name.into())
}

#[test]
fn two_verifier_disagreement_resolves_under_each_policy() {
    let net = FixtureNet::new();
    let log = net.log();
    let batch = vec![
        net.release("1.0.0"),
        net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Pass),
        net.attestation(&net.security_verifier, "1.0.0", "license.audit", Verdict::Fail),
    ];
    net.admission().append(&log, &batch).unwrap();
    let events = log.load_events().unwrap();
    let version = Version::new("1.0.0".into());

    let with_conflict = |conflict: ConflictPolicy, quorum: u32| {
        let mut policies = PolicySet::default();
        policies.checks.insert(
            kind("license.audit"),
            CheckPolicy {
                conflict_policy: conflict,
                quorum,
                ..CheckPolicy::default()
            },
        );
        let view = aggregate(&events, &net.registry, &policies, &net.repo.id, &version);
        view.consensus(&kind("license.audit")).unwrap()
    };

    assert_eq!(with_conflict(ConflictPolicy::FailWins, 1), Consensus::Fail);
    assert_eq!(with_conflict(ConflictPolicy::Majority, 1), Consensus::Fail);
    assert_eq!(with_conflict(ConflictPolicy::QuorumPass, 2), Consensus::Fail);
}

#[test]
fn earliest_observation_wins_within_a_signer() {
    let net = FixtureNet::new();
    let log = net.log();
    // The same verifier flips its opinion in a later event with a distinct
    // attestation kind set, admitted because attestation uniqueness is
    // keyed by signer and the second event differs in content. Dedup keeps
    // the earliest.
    let first = net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Pass);
    let mut second =
        net.attestation(&net.license_verifier, "1.0.0", "security.vulnscan", Verdict::Pass);
    second.attestations.push(AttestationRef {
        kind: "license.audit".into(),
        uri: "repomesh:attestor:license.audit:fail".into(),
    });
    net.sign_as(&mut second, &net.license_verifier);

    net.admission()
        .append(&log, &[net.release("1.0.0"), first])
        .unwrap();
    // Admission key for AttestationPublished includes the signer, so a
    // second event by the same key collides; merge it directly instead.
    let mut events = log.load_events().unwrap();
    events.push(second);

    let version = Version::new("1.0.0".into());
    let view = aggregate(
        &events,
        &net.registry,
        &PolicySet::default(),
        &net.repo.id,
        &version,
    );
    let check = view.checks.get(&kind("license.audit")).unwrap();
    assert_eq!(check.sources.len(), 1);
    assert_eq!(check.sources[0].verdict, Verdict::Pass);
    assert_eq!(check.consensus, Consensus::Pass);
    assert_eq!(
        view.consensus(&kind("security.vulnscan")),
        Some(Consensus::Pass)
    );
}

#[test]
fn unregistered_signers_are_ignored() {
    let net = FixtureNet::new();
    let log = net.log();
    net.admission()
        .append(
            &log,
            &[
                net.release("1.0.0"),
                net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Fail),
            ],
        )
        .unwrap();
    let mut events = log.load_events().unwrap();

    // An event signed by a key no manifest registers never becomes a source.
    let stranger = repomesh_canonical::Keypair::from_seed(&[99u8; 32]);
    let mut rogue =
        net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Pass);
    repomesh_core::sign_event(
        &mut rogue,
        &stranger,
        repomesh_canonical::KeyId::new("rogue-1".into()),
    )
    .unwrap();
    events.push(rogue);

    let version = Version::new("1.0.0".into());
    let view = aggregate(
        &events,
        &net.registry,
        &PolicySet::default(),
        &net.repo.id,
        &version,
    );
    let check = view.checks.get(&kind("license.audit")).unwrap();
    assert_eq!(check.sources.len(), 1);
    assert_eq!(check.consensus, Consensus::Fail);
}

#[test]
fn colliding_key_ids_attribute_to_the_key_that_signed() {
    let mut net = FixtureNet::new();

    // A second attestor registers the same key id string as the license
    // verifier, backed by a different key.
    let shadow_key = repomesh_canonical::Keypair::from_seed(&[77u8; 32]);
    net.registry
        .register(repomesh_core::ParticipantManifest {
            id: repomesh_canonical::RepoId::parse("meshtrust/attestor-shadow").unwrap(),
            kind: repomesh_core::ParticipantKind::Attestor,
            provides: vec![],
            consumes: vec![],
            maintainers: vec![repomesh_core::Maintainer {
                name: "shadow".into(),
                key_id: net.license_verifier.key_id.clone(),
                public_key: shadow_key.public_pem().unwrap(),
                contact: None,
            }],
        })
        .unwrap();
    let net = net;
    let log = net.log();

    net.admission()
        .append(
            &log,
            &[
                net.release("1.0.0"),
                net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Pass),
            ],
        )
        .unwrap();
    let mut events = log.load_events().unwrap();

    // The shadow attestor signs under the shared id.
    let mut shadow =
        net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Fail);
    repomesh_core::sign_event(&mut shadow, &shadow_key, net.license_verifier.key_id.clone())
        .unwrap();
    events.push(shadow);

    let version = Version::new("1.0.0".into());
    let view = aggregate(
        &events,
        &net.registry,
        &PolicySet::default(),
        &net.repo.id,
        &version,
    );
    let check = view.checks.get(&kind("license.audit")).unwrap();

    // Two distinct signers, each attributed to the owner of the key that
    // actually verifies.
    assert_eq!(check.sources.len(), 2);
    let by_signer: std::collections::BTreeMap<_, _> = check
        .sources
        .iter()
        .map(|s| (s.signer.as_ref().to_owned(), s.verdict))
        .collect();
    assert_eq!(
        by_signer.get("meshtrust/attestor-license"),
        Some(&Verdict::Pass)
    );
    assert_eq!(
        by_signer.get("meshtrust/attestor-shadow"),
        Some(&Verdict::Fail)
    );
    assert_eq!(check.consensus, Consensus::Fail);
}

#[test]
fn disputes_surface_without_touching_consensus() {
    let net = FixtureNet::new();
    let log = net.log();
    let attestation =
        net.attestation(&net.license_verifier, "1.0.0", "license.audit", Verdict::Pass);
    let disputed_hash = attestation
        .signature
        .as_ref()
        .unwrap()
        .canonical_hash
        .clone();

    let mut dispute = net.attestation(
        &net.security_verifier,
        "1.0.0",
        DISPUTE_KIND,
        Verdict::Fail,
    );
    dispute.attestations = vec![AttestationRef {
        kind: DISPUTE_KIND.into(),
        uri: "https://meshtrust.example/disputes/1".into(),
    }];
    dispute.notes = format!(
        "stale scanner data\n{{\"disputedHash\":\"{disputed_hash}\"}}"
    );
    net.sign_as(&mut dispute, &net.security_verifier);

    net.admission()
        .append(&log, &[net.release("1.0.0"), attestation, dispute])
        .unwrap();
    let events = log.load_events().unwrap();
    let version = Version::new("1.0.0".into());
    let view = aggregate(
        &events,
        &net.registry,
        &PolicySet::default(),
        &net.repo.id,
        &version,
    );

    assert_eq!(view.disputes.len(), 1);
    assert_eq!(view.disputes[0].disputed_hash, disputed_hash);
    // The disputed attestation still resolves normally.
    assert_eq!(
        view.consensus(&kind("license.audit")),
        Some(Consensus::Pass)
    );
}
