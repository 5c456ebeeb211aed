use repomesh_canonical::CheckKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{ErrorKind, TrustError};
use crate::verdict::Verdict;

/// Per-check award weights for the three verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckWeights {
    /// Points awarded for a `pass` consensus.
    pub pass: u32,
    /// Points awarded for a `warn` consensus.
    pub warn: u32,
    /// Points awarded for a `fail` consensus.
    pub fail: u32,
}

impl CheckWeights {
    /// Points for a given verdict.
    pub fn award(&self, verdict: Verdict) -> u32 {
        match verdict {
            Verdict::Pass => self.pass,
            Verdict::Warn => self.warn,
            Verdict::Fail => self.fail,
        }
    }
}

/// Fallback weights for checks without an explicit entry anywhere in the
/// layering.
pub const DEFAULT_WEIGHTS: CheckWeights = CheckWeights {
    pass: 25,
    warn: 10,
    fail: 0,
};

/// Evidence classes a profile may require on releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evidence {
    /// Software bill of materials.
    Sbom,
    /// Build provenance statement.
    Provenance,
}

/// Required check names split by scoring dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequiredChecks {
    /// Checks feeding the integrity score.
    #[serde(default)]
    pub integrity: BTreeSet<CheckKind>,
    /// Checks feeding the assurance score.
    #[serde(default)]
    pub assurance: BTreeSet<CheckKind>,
}

/// Scoring configuration carried by profiles and overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Per-check weight overrides.
    #[serde(rename = "assuranceWeights", default)]
    pub assurance_weights: BTreeMap<CheckKind, CheckWeights>,
}

/// A named requirements bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name (`baseline`, `open-source`, `regulated`).
    pub name: String,
    /// Evidence classes every release must carry.
    #[serde(rename = "requiredEvidence", default)]
    pub required_evidence: BTreeSet<Evidence>,
    /// Required checks by dimension.
    #[serde(rename = "requiredChecks", default)]
    pub required_checks: RequiredChecks,
    /// Scoring configuration.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn checks(names: &[&str]) -> BTreeSet<CheckKind> {
    names.iter().map(|n| CheckKind::new((*n).into())).collect()
}

fn weights(entries: &[(&str, u32, u32, u32)]) -> BTreeMap<CheckKind, CheckWeights> {
    entries
        .iter()
        .map(|(name, pass, warn, fail)| {
            (
                CheckKind::new((*name).into()),
                CheckWeights {
                    pass: *pass,
                    warn: *warn,
                    fail: *fail,
                },
            )
        })
        .collect()
}

/// Base weight table layered beneath profile and target overrides.
pub fn base_weights() -> BTreeMap<CheckKind, CheckWeights> {
    weights(&[
        ("license.audit", 40, 20, 0),
        ("security.vulnscan", 40, 15, 0),
        ("build.reproducible", 20, 10, 0),
    ])
}

impl Profile {
    /// The minimal profile: self-signed releases with basic checks.
    pub fn baseline() -> Self {
        Self {
            name: "baseline".into(),
            required_evidence: [Evidence::Sbom].into(),
            required_checks: RequiredChecks {
                integrity: checks(&["signature.chain"]),
                assurance: checks(&["license.audit", "security.vulnscan"]),
            },
            scoring: ScoringConfig::default(),
        }
    }

    /// Community profile: full evidence plus reproducible builds.
    pub fn open_source() -> Self {
        Self {
            name: "open-source".into(),
            required_evidence: [Evidence::Sbom, Evidence::Provenance].into(),
            required_checks: RequiredChecks {
                integrity: checks(&["signature.chain", "sbom.present", "provenance.present"]),
                assurance: checks(&["license.audit", "security.vulnscan", "build.reproducible"]),
            },
            scoring: ScoringConfig::default(),
        }
    }

    /// Compliance profile: open-source requirements with harsher warns.
    pub fn regulated() -> Self {
        Self {
            name: "regulated".into(),
            required_evidence: [Evidence::Sbom, Evidence::Provenance].into(),
            required_checks: RequiredChecks {
                integrity: checks(&["signature.chain", "sbom.present", "provenance.present"]),
                assurance: checks(&["license.audit", "security.vulnscan", "build.reproducible"]),
            },
            scoring: ScoringConfig {
                assurance_weights: weights(&[
                    ("license.audit", 40, 10, 0),
                    ("security.vulnscan", 40, 5, 0),
                    ("build.reproducible", 20, 5, 0),
                ]),
            },
        }
    }

    /// Looks up a built-in profile by name.
    pub fn by_name(name: &str) -> Result<Self, TrustError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "open-source" => Ok(Self::open_source()),
            "regulated" => Ok(Self::regulated()),
            other => Err(TrustError::new(
                ErrorKind::SchemaViolation,
                format!("unknown profile '{other}'"),
            )),
        }
    }
}

/// License tuning recognized in per-target overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LicenseOverrides {
    /// Licenses added to the allowlist for this target.
    #[serde(rename = "allowlistAdd", default)]
    pub allowlist_add: Vec<String>,
    /// Licenses removed from the allowlist for this target.
    #[serde(rename = "allowlistRemove", default)]
    pub allowlist_remove: Vec<String>,
    /// How unknown licenses are graded.
    #[serde(rename = "treatUnknownAs", skip_serializing_if = "Option::is_none")]
    pub treat_unknown_as: Option<UnknownLicenseGrade>,
}

/// Grade applied to licenses the audit cannot classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownLicenseGrade {
    /// Unknown licenses degrade to a warning.
    Warn,
    /// Unknown licenses fail the check.
    Fail,
}

/// A vulnerability suppressed for this target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredVuln {
    /// Advisory identifier.
    pub id: String,
    /// Required rationale for the suppression.
    pub justification: String,
}

/// Security tuning recognized in per-target overrides.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityOverrides {
    /// Suppressed advisories, each with a justification.
    #[serde(rename = "ignoreVulns", default)]
    pub ignore_vulns: Vec<IgnoredVuln>,
    /// Severities that force a `fail` verdict.
    #[serde(rename = "failOnSeverities", default)]
    pub fail_on_severities: Vec<String>,
}

/// Per-target leaf document layered atop the profile; the target wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Overrides {
    /// License tuning consumed by the license verifier.
    #[serde(default)]
    pub license: LicenseOverrides,
    /// Security tuning consumed by the vulnerability verifier.
    #[serde(default)]
    pub security: SecurityOverrides,
    /// Scoring weight overrides applied by the scoring engine.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Overrides {
    /// Validates override-specific rules.
    ///
    /// Every suppressed vulnerability must carry a non-empty justification.
    pub fn validate(&self) -> Result<(), TrustError> {
        for vuln in &self.security.ignore_vulns {
            if vuln.justification.trim().is_empty() {
                return Err(TrustError::new(
                    ErrorKind::SchemaViolation,
                    format!("ignored vulnerability '{}' lacks a justification", vuln.id),
                ));
            }
        }
        Ok(())
    }
}

/// Effective weight table for a target's release.
///
/// Layering order: base table, then the profile's `assuranceWeights`, then
/// the target override's; later layers win per check.
pub fn effective_weights(
    profile: &Profile,
    overrides: Option<&Overrides>,
) -> BTreeMap<CheckKind, CheckWeights> {
    let mut layered = base_weights();
    layered.extend(
        profile
            .scoring
            .assurance_weights
            .iter()
            .map(|(k, w)| (k.clone(), *w)),
    );
    if let Some(overrides) = overrides {
        layered.extend(
            overrides
                .scoring
                .assurance_weights
                .iter()
                .map(|(k, w)| (k.clone(), *w)),
        );
    }
    layered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_profiles_resolve_by_name() {
        assert_eq!(Profile::by_name("baseline").unwrap(), Profile::baseline());
        assert_eq!(
            Profile::by_name("open-source").unwrap(),
            Profile::open_source()
        );
        assert_eq!(Profile::by_name("regulated").unwrap(), Profile::regulated());
        assert!(Profile::by_name("bespoke").is_err());
    }

    #[test]
    fn default_pass_weights_total_one_hundred() {
        let total: u32 = base_weights().values().map(|w| w.pass).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn target_weights_win_over_profile_weights() {
        let profile = Profile::regulated();
        let kind = CheckKind::new("license.audit".into());
        let mut overrides = Overrides::default();
        overrides.scoring.assurance_weights.insert(
            kind.clone(),
            CheckWeights {
                pass: 50,
                warn: 0,
                fail: 0,
            },
        );
        let layered = effective_weights(&profile, Some(&overrides));
        assert_eq!(layered[&kind].pass, 50);
        assert_eq!(layered[&kind].warn, 0);
        // Untouched checks keep the profile layer.
        let vulnscan = CheckKind::new("security.vulnscan".into());
        assert_eq!(layered[&vulnscan].warn, 5);
    }

    #[test]
    fn ignored_vulns_require_justification() {
        let mut overrides = Overrides::default();
        overrides.security.ignore_vulns.push(IgnoredVuln {
            id: "CVE-2026-0001".into(),
            justification: "  ".into(),
        });
        assert!(overrides.validate().is_err());

        overrides.security.ignore_vulns[0].justification = "not reachable from our code".into();
        overrides.validate().unwrap();
    }
}
