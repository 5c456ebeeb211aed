use repomesh_canonical::CheckKind;
use repomesh_core::{effective_weights, Event, EventType, Overrides, Profile, DEFAULT_WEIGHTS};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::AttestationView;
use crate::consensus::Consensus;

const MAX_SCORE: u32 = 100;

/// One awarded-or-withheld component of the integrity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    /// Component name.
    pub name: String,
    /// Points the component is worth.
    pub points: u32,
    /// Whether the points were awarded.
    pub awarded: bool,
}

/// Integrity and assurance projection for one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// Integrity score in [0, 100].
    pub integrity: u32,
    /// Assurance score in [0, 100].
    pub assurance: u32,
    /// Per-component integrity breakdown.
    #[serde(rename = "integrityBreakdown")]
    pub integrity_breakdown: Vec<ScoreComponent>,
    /// Checks the effective profile expects.
    #[serde(rename = "expectedChecks")]
    pub expected_checks: Vec<CheckKind>,
    /// Expected checks with a recorded consensus.
    #[serde(rename = "completedChecks")]
    pub completed_checks: Vec<CheckKind>,
    /// Expected checks with no attestation at all.
    #[serde(rename = "missingChecks")]
    pub missing_checks: Vec<CheckKind>,
}

fn consensus_is_pass(view: &AttestationView, kind: &str) -> bool {
    CheckKind::parse(kind)
        .ok()
        .and_then(|kind| view.consensus(&kind))
        == Some(Consensus::Pass)
}

/// Whether a release inlines its own evidence attestation for a check.
///
/// A release listing `sbom` (or `sbom.present`) in its attestations counts
/// as carrying the evidence even before a verifier confirms it.
fn release_inlines(release: &Event, short: &str, full: &str) -> bool {
    release.has_attestation_kind(short) || release.has_attestation_kind(full)
}

/// Computes the two-dimensional score for a release.
///
/// `events` is the full log (used for policy-violation lookups); `view` is
/// the aggregated attestation state for the same `(repo, version)`.
pub fn compute_scores(
    release: &Event,
    events: &[Event],
    view: &AttestationView,
    profile: &Profile,
    overrides: Option<&Overrides>,
) -> ScoreReport {
    let no_violations = !events.iter().any(|event| {
        event.event_type == EventType::PolicyViolation
            && event.targets(&release.repo, &release.version)
    });

    let components = vec![
        // Admission already proved authorship, so signing points are
        // unconditional for any release that reached the log.
        ScoreComponent {
            name: "signed".into(),
            points: 15,
            awarded: true,
        },
        ScoreComponent {
            name: "hasArtifacts".into(),
            points: 15,
            awarded: !release.artifacts.is_empty(),
        },
        ScoreComponent {
            name: "noPolicyViolations".into(),
            points: 15,
            awarded: no_violations,
        },
        ScoreComponent {
            name: "sbom.present".into(),
            points: 20,
            awarded: consensus_is_pass(view, "sbom.present")
                || release_inlines(release, "sbom", "sbom.present"),
        },
        ScoreComponent {
            name: "provenance.present".into(),
            points: 20,
            awarded: consensus_is_pass(view, "provenance.present")
                || release_inlines(release, "provenance", "provenance.present"),
        },
        ScoreComponent {
            name: "signature.chain".into(),
            points: 15,
            awarded: consensus_is_pass(view, "signature.chain"),
        },
    ];
    let integrity = components
        .iter()
        .filter(|c| c.awarded)
        .map(|c| c.points)
        .sum::<u32>()
        .min(MAX_SCORE);

    let weights = effective_weights(profile, overrides);
    let required = &profile.required_checks.assurance;
    let mut raw = 0u32;
    let mut denominator = 0u32;
    for kind in required {
        let table = weights.get(kind).copied().unwrap_or(DEFAULT_WEIGHTS);
        denominator += table.pass;
        if let Some(verdict) = view.consensus(kind).and_then(Consensus::verdict) {
            raw += table.award(verdict);
        }
    }
    let assurance = if denominator == 0 {
        0
    } else if denominator == MAX_SCORE {
        raw.min(MAX_SCORE)
    } else {
        ((raw * MAX_SCORE) / denominator).min(MAX_SCORE)
    };
    debug!(raw, denominator, assurance, "assurance normalized");

    let mut expected: Vec<CheckKind> = profile
        .required_checks
        .integrity
        .iter()
        .chain(required.iter())
        .cloned()
        .collect();
    expected.sort();
    expected.dedup();
    let (completed, missing): (Vec<CheckKind>, Vec<CheckKind>) = expected
        .iter()
        .cloned()
        .partition(|kind| view.checks.contains_key(kind));

    ScoreReport {
        integrity,
        assurance,
        integrity_breakdown: components,
        expected_checks: expected,
        completed_checks: completed,
        missing_checks: missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CheckAggregate;
    use repomesh_canonical::{RepoId, Timestamp, Version};
    use std::collections::BTreeMap;

    fn release(artifacts: bool) -> Event {
        Event {
            event_type: EventType::ReleasePublished,
            repo: RepoId::new("acme/widgets".into()),
            version: Version::new("1.0.0".into()),
            commit: "ab12".into(),
            timestamp: Timestamp::new("2026-02-28T10:00:00.000Z".into()),
            artifacts: if artifacts {
                vec![repomesh_core::Artifact {
                    name: "x.tgz".into(),
                    sha256: "00".repeat(32),
                    uri: "https://dist/x.tgz".into(),
                }]
            } else {
                vec![]
            },
            attestations: vec![],
            notes: String::new(),
            signature: None,
        }
    }

    fn view_with(consensus: &[(&str, Consensus)]) -> AttestationView {
        let checks: BTreeMap<CheckKind, CheckAggregate> = consensus
            .iter()
            .map(|(kind, consensus)| {
                (
                    CheckKind::new((*kind).into()),
                    CheckAggregate {
                        sources: vec![],
                        consensus: *consensus,
                    },
                )
            })
            .collect();
        AttestationView {
            repo: RepoId::new("acme/widgets".into()),
            version: Version::new("1.0.0".into()),
            checks,
            disputes: vec![],
        }
    }

    #[test]
    fn scores_stay_in_bounds() {
        let release = release(true);
        let view = view_with(&[
            ("sbom.present", Consensus::Pass),
            ("provenance.present", Consensus::Pass),
            ("signature.chain", Consensus::Pass),
            ("license.audit", Consensus::Pass),
            ("security.vulnscan", Consensus::Pass),
            ("build.reproducible", Consensus::Pass),
        ]);
        let report = compute_scores(&release, &[], &view, &Profile::open_source(), None);
        assert_eq!(report.integrity, 100);
        assert_eq!(report.assurance, 100);
        assert!(report.missing_checks.is_empty());
    }

    #[test]
    fn empty_view_scores_floor_components_only() {
        let release = release(true);
        let view = view_with(&[]);
        let report = compute_scores(&release, &[], &view, &Profile::baseline(), None);
        // signed + hasArtifacts + noPolicyViolations
        assert_eq!(report.integrity, 45);
        assert_eq!(report.assurance, 0);
        assert_eq!(report.completed_checks, vec![]);
        assert_eq!(report.missing_checks.len(), report.expected_checks.len());
    }

    #[test]
    fn policy_violation_withholds_points() {
        let release_event = release(true);
        let mut violation = release(false);
        violation.event_type = EventType::PolicyViolation;
        let events = vec![release_event.clone(), violation];
        let report = compute_scores(
            &release_event,
            &events,
            &view_with(&[]),
            &Profile::baseline(),
            None,
        );
        assert_eq!(report.integrity, 30);
    }

    #[test]
    fn inline_sbom_attestation_counts_without_consensus() {
        let mut release_event = release(true);
        release_event.attestations.push(repomesh_core::AttestationRef {
            kind: "sbom".into(),
            uri: "https://dist/x.sbom.json".into(),
        });
        let report = compute_scores(
            &release_event,
            &[],
            &view_with(&[]),
            &Profile::baseline(),
            None,
        );
        assert_eq!(report.integrity, 65);
    }

    #[test]
    fn assurance_normalizes_when_pass_weights_exceed_one_hundred() {
        let mut profile = Profile::baseline();
        profile.required_checks.assurance.insert(CheckKind::new("custom.check".into()));
        // license 40 + vulnscan 40 + custom default 25 = 105 denominator.
        let view = view_with(&[
            ("license.audit", Consensus::Pass),
            ("security.vulnscan", Consensus::Pass),
            ("custom.check", Consensus::Pass),
        ]);
        let report = compute_scores(&release(true), &[], &view, &profile, None);
        assert_eq!(report.assurance, 100);

        let partial = view_with(&[
            ("license.audit", Consensus::Pass),
            ("security.vulnscan", Consensus::Warn),
        ]);
        let report = compute_scores(&release(true), &[], &partial, &profile, None);
        // raw 40 + 15 = 55 of 105.
        assert_eq!(report.assurance, 55 * 100 / 105);
    }

    #[test]
    fn mixed_and_untrusted_award_nothing() {
        let view = view_with(&[
            ("license.audit", Consensus::Mixed),
            ("security.vulnscan", Consensus::Untrusted),
        ]);
        let report = compute_scores(&release(true), &[], &view, &Profile::baseline(), None);
        assert_eq!(report.assurance, 0);
        // Attested-but-unsettled checks still count as completed coverage.
        assert_eq!(report.completed_checks.len(), 2);
    }

    #[test]
    fn target_override_weights_change_the_award() {
        let profile = Profile::baseline();
        let mut overrides = Overrides::default();
        overrides.scoring.assurance_weights.insert(
            CheckKind::new("license.audit".into()),
            repomesh_core::CheckWeights {
                pass: 60,
                warn: 0,
                fail: 0,
            },
        );
        let view = view_with(&[("license.audit", Consensus::Pass)]);
        let report = compute_scores(&release(true), &[], &view, &profile, Some(&overrides));
        // Denominator becomes 60 + 40 = 100; raw 60.
        assert_eq!(report.assurance, 60);
    }
}
