use repomesh_canonical::{CheckKind, RepoId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Source admission mode for a check's verifier set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyMode {
    /// Any registered participant's opinion counts.
    Open,
    /// Only opinions from `trustedNodes` count.
    TrustedSet,
}

/// Tie-breaking rule when surviving verifiers disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// `fail` beats `warn` beats `pass`.
    FailWins,
    /// Plurality vote; ties break by safety order.
    Majority,
    /// `pass` only with at least `quorum` passing sources.
    QuorumPass,
}

/// Per-check consensus policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckPolicy {
    /// Source admission mode.
    pub mode: PolicyMode,
    /// Participants trusted under `trusted-set` mode.
    #[serde(rename = "trustedNodes", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub trusted_nodes: BTreeSet<RepoId>,
    /// Disagreement resolution rule.
    #[serde(rename = "conflictPolicy")]
    pub conflict_policy: ConflictPolicy,
    /// Minimum passing sources under `quorum-pass`.
    #[serde(default = "default_quorum")]
    pub quorum: u32,
}

fn default_quorum() -> u32 {
    1
}

impl Default for CheckPolicy {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Open,
            trusted_nodes: BTreeSet::new(),
            conflict_policy: ConflictPolicy::FailWins,
            quorum: default_quorum(),
        }
    }
}

/// Named per-check policies with a shared fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicySet {
    /// Policies keyed by check kind.
    #[serde(default)]
    pub checks: BTreeMap<CheckKind, CheckPolicy>,
    /// Fallback policy for unlisted checks.
    #[serde(default)]
    pub fallback: CheckPolicy,
}

impl PolicySet {
    /// The policy governing a check.
    pub fn for_check(&self, kind: &CheckKind) -> &CheckPolicy {
        self.checks.get(kind).unwrap_or(&self.fallback)
    }
}
