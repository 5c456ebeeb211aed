use repomesh_canonical::{CheckKind, ContentHash, KeyId, RepoId, Timestamp, Version};
use repomesh_core::{
    resolve_signer, AttestorUri, Event, EventType, KeyRegistry, PolicySet, Verdict,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::consensus::{resolve, Consensus};

/// Check kind marking an observational dispute event.
pub const DISPUTE_KIND: &str = "attestation.dispute";

/// One verifier's earliest recorded opinion about a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    /// Check the opinion is about.
    pub kind: CheckKind,
    /// Participant whose key signed the attestation.
    pub signer: RepoId,
    /// The signing key itself.
    #[serde(rename = "signerKey")]
    pub signer_key: KeyId,
    /// Observed verdict.
    pub verdict: Verdict,
    /// When the opinion was published.
    pub at: Timestamp,
    /// Position of the carrying event in the log.
    #[serde(skip)]
    pub log_index: usize,
}

/// A dispute raised against another attestation, surfaced but never
/// consensus-altering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispute {
    /// Participant raising the dispute.
    #[serde(rename = "raisedBy")]
    pub raised_by: RepoId,
    /// Canonical hash of the disputed attestation event.
    #[serde(rename = "disputedHash")]
    pub disputed_hash: ContentHash,
    /// When the dispute was published.
    pub at: Timestamp,
}

/// Aggregate for one check across all its surviving sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckAggregate {
    /// Deduplicated sources, in log order.
    pub sources: Vec<Observation>,
    /// Resolved consensus under the check's policy.
    pub consensus: Consensus,
}

/// Aggregated attestation view for one `(repo, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttestationView {
    /// Target repository.
    pub repo: RepoId,
    /// Target version.
    pub version: Version,
    /// Per-check aggregates.
    pub checks: BTreeMap<CheckKind, CheckAggregate>,
    /// Observational disputes referencing attestations of this release.
    pub disputes: Vec<Dispute>,
}

impl AttestationView {
    /// Consensus for a check, when any source attested it.
    pub fn consensus(&self, kind: &CheckKind) -> Option<Consensus> {
        self.checks.get(kind).map(|aggregate| aggregate.consensus)
    }
}

/// Extracts per-check verdicts from one attestation event.
///
/// The attestor URI form is authoritative; the structured notes prefix
/// `"<kind>: <verdict> ..."` covers sources that only publish prose.
fn event_verdicts(event: &Event) -> Vec<(CheckKind, Verdict)> {
    let mut verdicts = Vec::new();
    for attestation in &event.attestations {
        if attestation.kind == DISPUTE_KIND {
            continue;
        }
        if let Some(parsed) = AttestorUri::parse(&attestation.uri) {
            verdicts.push((parsed.kind, parsed.verdict));
        } else if let Ok(kind) = CheckKind::parse(attestation.kind.as_str()) {
            if let Some(verdict) = notes_prefix_verdict(&event.notes, attestation.kind.as_str()) {
                verdicts.push((kind, verdict));
            }
        }
    }
    verdicts
}

/// Parses `"<kind>: <verdict> ..."` from the first matching notes line.
fn notes_prefix_verdict(notes: &str, kind: &str) -> Option<Verdict> {
    for line in notes.lines() {
        if let Some(rest) = line.strip_prefix(kind) {
            let rest = rest.strip_prefix(':')?.trim_start();
            let word: String = rest
                .chars()
                .take_while(|c| c.is_ascii_alphabetic())
                .collect();
            return Verdict::parse(&word);
        }
    }
    None
}

/// First 64-hex token in a notes field, used by dispute events to point at
/// the attestation they contest.
fn notes_hash_reference(event: &Event) -> Option<ContentHash> {
    if let Some(tail) = event.notes_json_tail() {
        for key in ["disputedHash", "canonicalHash", "target"] {
            if let Some(value) = tail.get(key).and_then(|v| v.as_str()) {
                if let Ok(hash) = ContentHash::parse(value) {
                    return Some(hash);
                }
            }
        }
    }
    event
        .notes
        .split(|c: char| !c.is_ascii_hexdigit())
        .find(|token| ContentHash::is_hex64(token))
        .and_then(|token| ContentHash::parse(token).ok())
}

/// Aggregates every attestation about `(repo, version)` into a per-check
/// consensus view.
///
/// Sources are restricted to signers that resolve to a registered
/// participant, deduplicated by `(kind, signer)` with the earliest
/// observation winning.
pub fn aggregate(
    events: &[Event],
    registry: &KeyRegistry,
    policies: &PolicySet,
    repo: &RepoId,
    version: &Version,
) -> AttestationView {
    let mut observations: BTreeMap<(CheckKind, RepoId), Observation> = BTreeMap::new();
    let mut disputes = Vec::new();

    for (log_index, event) in events.iter().enumerate() {
        if event.event_type != EventType::AttestationPublished || !event.targets(repo, version) {
            continue;
        }
        let Some(signature) = event.signature.as_ref() else {
            continue;
        };
        // Key ids can collide across manifests, so the signer is the
        // registrant whose key actually verifies the signature.
        let Some(registered) = resolve_signer(event, registry) else {
            debug!(key = %signature.key_id, "skipping attestation from unregistered signer");
            continue;
        };
        let signer = registered.owner.clone();

        if event.has_attestation_kind(DISPUTE_KIND) {
            if let Some(disputed_hash) = notes_hash_reference(event) {
                disputes.push(Dispute {
                    raised_by: signer.clone(),
                    disputed_hash,
                    at: event.timestamp.clone(),
                });
            }
        }

        for (kind, verdict) in event_verdicts(event) {
            let key = (kind.clone(), signer.clone());
            let observation = Observation {
                kind,
                signer: signer.clone(),
                signer_key: signature.key_id.clone(),
                verdict,
                at: event.timestamp.clone(),
                log_index,
            };
            // Earliest observation wins within a single signer.
            observations.entry(key).or_insert(observation);
        }
    }

    let mut checks: BTreeMap<CheckKind, Vec<Observation>> = BTreeMap::new();
    for ((kind, _), observation) in observations {
        checks.entry(kind).or_default().push(observation);
    }

    let checks = checks
        .into_iter()
        .map(|(kind, mut sources)| {
            sources.sort_by_key(|source| source.log_index);
            let consensus = resolve(policies.for_check(&kind), &sources);
            (kind, CheckAggregate { sources, consensus })
        })
        .collect();

    AttestationView {
        repo: repo.clone(),
        version: version.clone(),
        checks,
        disputes,
    }
}
