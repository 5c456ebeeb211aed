use repomesh_canonical::CheckKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The observable outcome of one check by one verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The check passed.
    Pass,
    /// The check passed with reservations.
    Warn,
    /// The check failed.
    Fail,
}

impl Verdict {
    /// Parses the lowercase wire spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(Verdict::Pass),
            "warn" => Some(Verdict::Warn),
            "fail" => Some(Verdict::Fail),
            _ => None,
        }
    }

    /// Safety ordering: `fail` outranks `warn` outranks `pass`.
    pub fn severity(self) -> u8 {
        match self {
            Verdict::Pass => 0,
            Verdict::Warn => 1,
            Verdict::Fail => 2,
        }
    }

    /// Lowercase wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Warn => "warn",
            Verdict::Fail => "fail",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const URI_SCHEME: &str = "repomesh";
const URI_AUTHORITY: &str = "attestor";

/// Parsed `repomesh:attestor:<kind>:<verdict>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestorUri {
    /// Check kind named by the URI.
    pub kind: CheckKind,
    /// Verdict carried by the URI.
    pub verdict: Verdict,
}

impl AttestorUri {
    /// Parses an attestor URI; returns `None` for any other URI shape.
    pub fn parse(uri: &str) -> Option<Self> {
        let mut parts = uri.splitn(4, ':');
        if parts.next()? != URI_SCHEME || parts.next()? != URI_AUTHORITY {
            return None;
        }
        let kind = CheckKind::parse(parts.next()?).ok()?;
        let verdict = Verdict::parse(parts.next()?)?;
        Some(Self { kind, verdict })
    }

    /// Formats the URI for embedding in an attestation reference.
    pub fn format(kind: &CheckKind, verdict: Verdict) -> String {
        format!("{URI_SCHEME}:{URI_AUTHORITY}:{kind}:{verdict}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_round_trip() {
        let kind = CheckKind::parse("license.audit").unwrap();
        let uri = AttestorUri::format(&kind, Verdict::Warn);
        assert_eq!(uri, "repomesh:attestor:license.audit:warn");
        let parsed = AttestorUri::parse(&uri).unwrap();
        assert_eq!(parsed.kind, kind);
        assert_eq!(parsed.verdict, Verdict::Warn);
    }

    #[test]
    fn rejects_foreign_schemes_and_bad_verdicts() {
        assert!(AttestorUri::parse("https://example.com").is_none());
        assert!(AttestorUri::parse("repomesh:attestor:license.audit:maybe").is_none());
        assert!(AttestorUri::parse("repomesh:attestor:License:pass").is_none());
    }

    #[test]
    fn severity_orders_fail_first() {
        assert!(Verdict::Fail.severity() > Verdict::Warn.severity());
        assert!(Verdict::Warn.severity() > Verdict::Pass.severity());
    }
}
