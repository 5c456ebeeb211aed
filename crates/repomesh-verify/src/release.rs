use repomesh_anchor::{
    is_anchor_event, partition_leaves, AnchorEngine, AnchorNote, AnchorOutcome, LedgerClient,
    ManifestStore, PartitionId, RetryPolicy,
};
use repomesh_canonical::{Keypair, RepoId, Timestamp, Version};
use repomesh_core::{
    sign_event, verify_event, ErrorKind, Event, EventType, KeyRegistry, Overrides, PolicySet,
    Profile, TrustError,
};
use repomesh_log::{Admission, AdmissionOptions, LogFile};
use repomesh_trust::{aggregate, compute_scores, AttestationView, ScoreReport};
use tracing::{debug, info, warn};

use crate::report::{
    AnchorStatus, AttestationCheck, LogFailure, LogReport, ReleaseReport, ReleaseSummary,
};

/// End-to-end verification surface over a log, registry, manifest store,
/// and policy set.
pub struct Orchestrator<'a> {
    registry: &'a KeyRegistry,
    policies: &'a PolicySet,
    manifests: &'a ManifestStore,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator over shared state.
    pub fn new(
        registry: &'a KeyRegistry,
        policies: &'a PolicySet,
        manifests: &'a ManifestStore,
    ) -> Self {
        Self {
            registry,
            policies,
            manifests,
        }
    }

    /// The registry this orchestrator resolves keys against.
    pub fn registry(&self) -> &KeyRegistry {
        self.registry
    }

    /// The manifest store this orchestrator reads partitions from.
    pub fn manifests(&self) -> &ManifestStore {
        self.manifests
    }

    /// Verifies that a release is authentic, attested, and (optionally)
    /// anchored.
    pub fn verify_release(
        &self,
        events: &[Event],
        repo: &RepoId,
        version: &Version,
        anchored: bool,
    ) -> Result<ReleaseReport, TrustError> {
        let release = events
            .iter()
            .find(|event| {
                event.event_type == EventType::ReleasePublished && event.targets(repo, version)
            })
            .ok_or_else(|| {
                TrustError::new(
                    ErrorKind::ReleaseNotFound,
                    format!("no ReleasePublished event for {repo}@{version}"),
                )
            })?;

        verify_event(release, self.registry)?;
        let release_hash = release.content_hash()?;
        debug!(%repo, %version, hash = %release_hash, "release verified");

        let mut attestations = Vec::new();
        let mut all_valid = true;
        for event in events.iter().filter(|event| {
            event.event_type == EventType::AttestationPublished && event.targets(repo, version)
        }) {
            let Some(signature) = event.signature.as_ref() else {
                continue;
            };
            let verdicts = event
                .attestations
                .iter()
                .filter_map(|a| repomesh_core::AttestorUri::parse(&a.uri))
                .map(|parsed| (parsed.kind, parsed.verdict))
                .collect();
            let check = match verify_event(event, self.registry) {
                Ok(()) => AttestationCheck {
                    signer_key: signature.key_id.clone(),
                    verdicts,
                    valid: true,
                    error: None,
                },
                Err(err) => {
                    all_valid = false;
                    AttestationCheck {
                        signer_key: signature.key_id.clone(),
                        verdicts,
                        valid: false,
                        error: Some(err.kind),
                    }
                }
            };
            attestations.push(check);
        }

        let anchor = if anchored {
            Some(self.locate_anchor(events, release)?)
        } else {
            None
        };

        // "Not anchored yet" is reported in the anchor field without
        // failing the verification itself.
        let ok = all_valid;
        Ok(ReleaseReport {
            ok,
            release: ReleaseSummary {
                repo: release.repo.clone(),
                version: release.version.clone(),
                commit: release.commit.clone(),
                timestamp: release.timestamp.clone(),
                canonical_hash: release_hash,
                artifact_count: release.artifacts.len(),
            },
            attestations,
            anchor,
        })
    }

    /// Walks anchor events newest-first looking for a partition that
    /// contains the release hash.
    ///
    /// "Not anchored yet" is a successful status, not an error; a covering
    /// partition whose manifest fails its self-binding is
    /// `ManifestTampered`.
    fn locate_anchor(
        &self,
        events: &[Event],
        release: &Event,
    ) -> Result<AnchorStatus, TrustError> {
        let release_hash = release.content_hash()?;
        for event in events.iter().rev().filter(|e| is_anchor_event(e)) {
            let Some(note) = AnchorNote::from_event(event) else {
                warn!("anchor event without a readable notes tail; skipping");
                continue;
            };
            let partition = PartitionId::parse(&note.partition_id)?;
            let manifest = self.manifests.load(&partition)?;
            let leaves = partition_leaves(events, &partition)?;
            if !leaves.contains(&release_hash) {
                continue;
            }
            manifest.verify_self()?;
            info!(partition = %partition, "release found in anchored partition");
            return Ok(AnchorStatus {
                anchored: true,
                partition: Some(note.partition_id),
                root: Some(manifest.root),
                tx_hash: Some(note.tx_hash),
            });
        }
        Ok(AnchorStatus::not_anchored())
    }

    /// Sweeps the whole log, verifying every event.
    pub fn verify_log(&self, events: &[Event]) -> LogReport {
        let mut failures = Vec::new();
        for (index, event) in events.iter().enumerate() {
            if let Err(err) = verify_event(event, self.registry) {
                failures.push(LogFailure {
                    index,
                    kind: err.kind,
                    message: err.message,
                });
            }
        }
        LogReport {
            ok: failures.is_empty(),
            total: events.len(),
            failures,
        }
    }

    /// Aggregates attestations for a release under the policy set.
    pub fn aggregate_attestations(
        &self,
        events: &[Event],
        repo: &RepoId,
        version: &Version,
    ) -> AttestationView {
        aggregate(events, self.registry, self.policies, repo, version)
    }

    /// Computes integrity and assurance scores for a release.
    pub fn compute_scores(
        &self,
        events: &[Event],
        repo: &RepoId,
        version: &Version,
        profile: &Profile,
        overrides: Option<&Overrides>,
    ) -> Result<ScoreReport, TrustError> {
        let release = events
            .iter()
            .find(|event| {
                event.event_type == EventType::ReleasePublished && event.targets(repo, version)
            })
            .ok_or_else(|| {
                TrustError::new(
                    ErrorKind::ReleaseNotFound,
                    format!("no ReleasePublished event for {repo}@{version}"),
                )
            })?;
        let view = self.aggregate_attestations(events, repo, version);
        Ok(compute_scores(release, events, &view, profile, overrides))
    }

    /// Admits a batch of events to the log.
    pub fn append_batch(
        &self,
        log: &LogFile,
        batch: &[Event],
        options: AdmissionOptions,
    ) -> Result<usize, TrustError> {
        Admission::new(self.registry, options).append(log, batch)
    }

    /// Anchors the next partition, signs the anchor event, and admits it.
    ///
    /// Rerunning after a post-submission crash reproduces the same
    /// manifest bytes and re-emits the event up to the admission
    /// uniqueness constraint.
    #[allow(clippy::too_many_arguments)]
    pub fn emit_anchor<C: LedgerClient>(
        &self,
        log: &LogFile,
        client: &C,
        retry: RetryPolicy,
        anchor_repo: &RepoId,
        signer: &Keypair,
        signer_key: repomesh_canonical::KeyId,
        now: Timestamp,
        options: AdmissionOptions,
    ) -> Result<AnchorOutcome, TrustError> {
        let events = log.load_events()?;
        let engine = AnchorEngine::new(self.manifests, client, retry);
        let partition = engine.next_partition(&events);
        let mut outcome = engine.anchor(&events, &partition, anchor_repo, now)?;
        sign_event(&mut outcome.event, signer, signer_key)?;
        Admission::new(self.registry, options).append(log, std::slice::from_ref(&outcome.event))?;
        Ok(outcome)
    }
}
