//! Deterministic fixture network: one repository and three verifiers.

use chrono::{TimeZone, Utc};
use repomesh_canonical::{KeyId, Keypair, RepoId, Timestamp, Version};
use repomesh_core::{
    sign_event, Artifact, AttestationRef, Event, EventType, KeyRegistry, Maintainer,
    ParticipantKind, ParticipantManifest, Verdict,
};
use repomesh_log::{Admission, AdmissionOptions, LogFile};
use tempfile::TempDir;

/// A fixture participant: its identity, signing key, and key id.
pub struct Participant {
    /// Participant identity.
    pub id: RepoId,
    /// Signing keypair, derived from a fixed seed.
    pub keypair: Keypair,
    /// Key id registered in the participant's manifest.
    pub key_id: KeyId,
}

impl Participant {
    fn new(id: &str, key_id: &str, seed: u8) -> Self {
        Self {
            id: RepoId::new(id.into()),
            keypair: Keypair::from_seed(&[seed; 32]),
            key_id: KeyId::new(key_id.into()),
        }
    }

    fn manifest(&self, kind: ParticipantKind) -> ParticipantManifest {
        ParticipantManifest {
            id: self.id.clone(),
            kind,
            provides: vec![],
            consumes: vec![],
            maintainers: vec![Maintainer {
                name: "fixture".into(),
                key_id: self.key_id.clone(),
                public_key: self
                    .keypair
                    .public_pem()
                    .expect("fixture key exports as PEM"),
                contact: None,
            }],
        }
    }
}

/// A deterministic test network with a registry, scratch log, and scratch
/// manifest directory.
pub struct FixtureNet {
    /// Registry holding every fixture manifest.
    pub registry: KeyRegistry,
    /// The target repository participant.
    pub repo: Participant,
    /// License verifier.
    pub license_verifier: Participant,
    /// Security verifier.
    pub security_verifier: Participant,
    /// Build verifier, also used as the anchoring participant.
    pub build_verifier: Participant,
    /// Scratch directory backing the log and manifests.
    pub dir: TempDir,
    ts_counter: std::cell::Cell<u32>,
}

impl FixtureNet {
    /// Builds the fixture network.
    pub fn new() -> Self {
        let repo = Participant::new("acme/widgets", "acme-k1", 1);
        let license_verifier = Participant::new("meshtrust/attestor-license", "lic-1", 2);
        let security_verifier = Participant::new("meshtrust/attestor-security", "sec-1", 3);
        let build_verifier = Participant::new("meshtrust/attestor-build", "bld-1", 4);

        let mut registry = KeyRegistry::new();
        registry
            .register(repo.manifest(ParticipantKind::Registry))
            .expect("fixture manifest registers");
        for verifier in [&license_verifier, &security_verifier, &build_verifier] {
            registry
                .register(verifier.manifest(ParticipantKind::Attestor))
                .expect("fixture manifest registers");
        }

        Self {
            registry,
            repo,
            license_verifier,
            security_verifier,
            build_verifier,
            dir: TempDir::new().expect("scratch dir"),
            ts_counter: std::cell::Cell::new(0),
        }
    }

    /// A scratch log under the fixture directory.
    pub fn log(&self) -> LogFile {
        LogFile::open(self.dir.path().join("events.log"))
    }

    /// Path of the scratch manifest directory.
    pub fn manifest_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("anchors")
    }

    /// Admission options pinned shortly after the fixture timestamps.
    pub fn admission_options(&self) -> AdmissionOptions {
        AdmissionOptions {
            now: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("fixed instant"),
            ..AdmissionOptions::default()
        }
    }

    /// An admission gate over the fixture registry.
    pub fn admission(&self) -> Admission<'_> {
        Admission::new(&self.registry, self.admission_options())
    }

    /// The next fixture timestamp; each call steps one minute.
    pub fn next_timestamp(&self) -> Timestamp {
        let step = self.ts_counter.get();
        self.ts_counter.set(step + 1);
        Timestamp::new(format!(
            "2026-02-28T10:{:02}:00.000Z",
            step.min(59)
        ))
    }

    /// A signed release of the fixture repository.
    pub fn release(&self, version: &str) -> Event {
        let mut event = Event {
            event_type: EventType::ReleasePublished,
            repo: self.repo.id.clone(),
            version: Version::new(version.into()),
            commit: "0f1e2d3c4b5a6978".into(),
            timestamp: self.next_timestamp(),
            artifacts: vec![Artifact {
                name: format!("widgets-{version}.tgz"),
                sha256: "00".repeat(32),
                uri: format!("https://dist.example/widgets-{version}.tgz"),
            }],
            attestations: vec![AttestationRef {
                kind: "sbom".into(),
                uri: format!("https://dist.example/widgets-{version}.sbom.json"),
            }],
            notes: String::new(),
            signature: None,
        };
        sign_event(&mut event, &self.repo.keypair, self.repo.key_id.clone())
            .expect("fixture release signs");
        event
    }

    /// A signed attestation by `verifier` about a release.
    pub fn attestation(
        &self,
        verifier: &Participant,
        version: &str,
        kind: &str,
        verdict: Verdict,
    ) -> Event {
        let mut event = Event {
            event_type: EventType::AttestationPublished,
            repo: self.repo.id.clone(),
            version: Version::new(version.into()),
            commit: "0f1e2d3c4b5a6978".into(),
            timestamp: self.next_timestamp(),
            artifacts: vec![],
            attestations: vec![AttestationRef {
                kind: kind.into(),
                uri: format!("repomesh:attestor:{kind}:{verdict}"),
            }],
            notes: format!("{kind}: {verdict} recorded by fixture"),
            signature: None,
        };
        sign_event(&mut event, &verifier.keypair, verifier.key_id.clone())
            .expect("fixture attestation signs");
        event
    }

    /// A signed policy violation targeting a release.
    pub fn policy_violation(&self, version: &str, reason: &str) -> Event {
        let mut event = Event {
            event_type: EventType::PolicyViolation,
            repo: self.repo.id.clone(),
            version: Version::new(version.into()),
            commit: "0f1e2d3c4b5a6978".into(),
            timestamp: self.next_timestamp(),
            artifacts: vec![],
            attestations: vec![],
            notes: reason.into(),
            signature: None,
        };
        sign_event(
            &mut event,
            &self.security_verifier.keypair,
            self.security_verifier.key_id.clone(),
        )
        .expect("fixture violation signs");
        event
    }

    /// Signs an arbitrary event with a participant's key.
    pub fn sign_as(&self, event: &mut Event, participant: &Participant) {
        sign_event(event, &participant.keypair, participant.key_id.clone())
            .expect("fixture event signs");
    }
}

impl Default for FixtureNet {
    fn default() -> Self {
        Self::new()
    }
}
