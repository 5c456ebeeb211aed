use repomesh_core::{CheckPolicy, ConflictPolicy, PolicyMode, Verdict};
use serde::{Deserialize, Serialize};

use crate::aggregate::Observation;

/// Resolved multi-source outcome for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consensus {
    /// Surviving sources resolve to `pass`.
    Pass,
    /// Surviving sources resolve to `warn`.
    Warn,
    /// Surviving sources resolve to `fail`.
    Fail,
    /// Sources disagree and no rule produced a verdict.
    Mixed,
    /// A trusted-set policy left no surviving sources.
    Untrusted,
}

impl Consensus {
    /// The verdict this consensus settles on, when it settles.
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Consensus::Pass => Some(Verdict::Pass),
            Consensus::Warn => Some(Verdict::Warn),
            Consensus::Fail => Some(Verdict::Fail),
            Consensus::Mixed | Consensus::Untrusted => None,
        }
    }

    fn from_verdict(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => Consensus::Pass,
            Verdict::Warn => Consensus::Warn,
            Verdict::Fail => Consensus::Fail,
        }
    }
}

/// Resolves the consensus for one check's deduplicated sources.
pub fn resolve(policy: &CheckPolicy, sources: &[Observation]) -> Consensus {
    let surviving: Vec<&Observation> = match policy.mode {
        PolicyMode::Open => sources.iter().collect(),
        PolicyMode::TrustedSet => sources
            .iter()
            .filter(|source| policy.trusted_nodes.contains(&source.signer))
            .collect(),
    };
    if surviving.is_empty() {
        return Consensus::Untrusted;
    }

    let first = surviving[0].verdict;
    if surviving.iter().all(|source| source.verdict == first) {
        return Consensus::from_verdict(first);
    }

    match policy.conflict_policy {
        ConflictPolicy::FailWins => {
            if surviving.iter().any(|s| s.verdict == Verdict::Fail) {
                Consensus::Fail
            } else if surviving.iter().any(|s| s.verdict == Verdict::Warn) {
                Consensus::Warn
            } else {
                Consensus::Mixed
            }
        }
        ConflictPolicy::Majority => {
            let count =
                |v: Verdict| surviving.iter().filter(|s| s.verdict == v).count();
            let tallies = [
                (Verdict::Fail, count(Verdict::Fail)),
                (Verdict::Warn, count(Verdict::Warn)),
                (Verdict::Pass, count(Verdict::Pass)),
            ];
            let top = tallies.iter().map(|(_, n)| *n).max().unwrap_or(0);
            // Tallies are ordered by safety, so the first at the top count
            // is the tiebreak winner.
            let winner = tallies
                .iter()
                .find(|(_, n)| *n == top)
                .map(|(v, _)| *v)
                .unwrap_or(Verdict::Fail);
            Consensus::from_verdict(winner)
        }
        ConflictPolicy::QuorumPass => {
            let passes = surviving
                .iter()
                .filter(|s| s.verdict == Verdict::Pass)
                .count();
            if passes as u32 >= policy.quorum {
                Consensus::Pass
            } else {
                Consensus::Fail
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repomesh_canonical::{CheckKind, KeyId, RepoId, Timestamp};
    use std::collections::BTreeSet;

    fn observation(signer: &str, verdict: Verdict) -> Observation {
        Observation {
            kind: CheckKind::new("license.audit".into()),
            signer: RepoId::new(signer.into()),
            signer_key: KeyId::new(format!("{}-key", signer.replace('/', "-"))),
            verdict,
            at: Timestamp::new("2026-02-28T10:00:00.000Z".into()),
            log_index: 0,
        }
    }

    fn policy(conflict: ConflictPolicy) -> CheckPolicy {
        CheckPolicy {
            conflict_policy: conflict,
            ..CheckPolicy::default()
        }
    }

    #[test]
    fn unanimity_wins_under_any_policy() {
        let sources = vec![
            observation("a/one", Verdict::Warn),
            observation("b/two", Verdict::Warn),
        ];
        for conflict in [
            ConflictPolicy::FailWins,
            ConflictPolicy::Majority,
            ConflictPolicy::QuorumPass,
        ] {
            assert_eq!(resolve(&policy(conflict), &sources), Consensus::Warn);
        }
    }

    #[test]
    fn disagreement_resolves_per_policy() {
        // Two verifiers, one pass and one fail.
        let sources = vec![
            observation("a/one", Verdict::Pass),
            observation("b/two", Verdict::Fail),
        ];
        assert_eq!(
            resolve(&policy(ConflictPolicy::FailWins), &sources),
            Consensus::Fail
        );
        assert_eq!(
            resolve(&policy(ConflictPolicy::Majority), &sources),
            Consensus::Fail
        );
        let quorum_two = CheckPolicy {
            conflict_policy: ConflictPolicy::QuorumPass,
            quorum: 2,
            ..CheckPolicy::default()
        };
        assert_eq!(resolve(&quorum_two, &sources), Consensus::Fail);
    }

    #[test]
    fn fail_wins_degrades_to_warn_without_fails() {
        let sources = vec![
            observation("a/one", Verdict::Pass),
            observation("b/two", Verdict::Warn),
        ];
        assert_eq!(
            resolve(&policy(ConflictPolicy::FailWins), &sources),
            Consensus::Warn
        );
    }

    #[test]
    fn adding_a_fail_source_never_shifts_consensus_away_from_fail() {
        let mut sources = vec![
            observation("a/one", Verdict::Fail),
            observation("b/two", Verdict::Pass),
        ];
        assert_eq!(
            resolve(&policy(ConflictPolicy::FailWins), &sources),
            Consensus::Fail
        );
        sources.push(observation("c/three", Verdict::Fail));
        assert_eq!(
            resolve(&policy(ConflictPolicy::FailWins), &sources),
            Consensus::Fail
        );
        sources.push(observation("d/four", Verdict::Pass));
        assert_eq!(
            resolve(&policy(ConflictPolicy::FailWins), &sources),
            Consensus::Fail
        );
    }

    #[test]
    fn majority_plurality_and_safety_tiebreak() {
        let sources = vec![
            observation("a/one", Verdict::Pass),
            observation("b/two", Verdict::Pass),
            observation("c/three", Verdict::Fail),
        ];
        assert_eq!(
            resolve(&policy(ConflictPolicy::Majority), &sources),
            Consensus::Pass
        );

        let tied = vec![
            observation("a/one", Verdict::Pass),
            observation("b/two", Verdict::Warn),
        ];
        assert_eq!(
            resolve(&policy(ConflictPolicy::Majority), &tied),
            Consensus::Warn
        );
    }

    #[test]
    fn quorum_pass_counts_passes() {
        let sources = vec![
            observation("a/one", Verdict::Pass),
            observation("b/two", Verdict::Pass),
            observation("c/three", Verdict::Fail),
        ];
        let mut policy = policy(ConflictPolicy::QuorumPass);
        policy.quorum = 2;
        assert_eq!(resolve(&policy, &sources), Consensus::Pass);
        policy.quorum = 3;
        assert_eq!(resolve(&policy, &sources), Consensus::Fail);
    }

    #[test]
    fn trusted_set_restricts_sources() {
        let sources = vec![
            observation("a/one", Verdict::Fail),
            observation("b/two", Verdict::Pass),
        ];
        let trusted: BTreeSet<RepoId> = [RepoId::new("b/two".into())].into();
        let policy = CheckPolicy {
            mode: PolicyMode::TrustedSet,
            trusted_nodes: trusted,
            ..CheckPolicy::default()
        };
        // Only the trusted source survives, and it says pass.
        assert_eq!(resolve(&policy, &sources), Consensus::Pass);

        let nobody = CheckPolicy {
            mode: PolicyMode::TrustedSet,
            ..CheckPolicy::default()
        };
        assert_eq!(resolve(&nobody, &sources), Consensus::Untrusted);
    }
}
