use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::ValidationError;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: String) -> Self {
                Self(value)
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Whether a string conforms to this identifier's pattern.
            pub fn is_valid(value: &str) -> bool {
                Regex::new($pattern).expect("invalid regex").is_match(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    RepoId,
    "Target identity of form `<org>/<name>`, unique in the network.",
    r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*$"
);
newtype!(
    Version,
    "Semantic version string, optionally with pre-release and build tags.",
    r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$"
);
newtype!(
    KeyId,
    "Stable identifier for a maintainer signing key, unique within a manifest.",
    r"^[A-Za-z0-9][A-Za-z0-9_:.-]{0,127}$"
);
newtype!(
    CheckKind,
    "Canonical check name like `license.audit` or `sbom.present`.",
    r"^[a-z][a-z0-9.]*$"
);
newtype!(
    Timestamp,
    "UTC ISO-8601 timestamp with `Z` suffix and millisecond precision.",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?Z$"
);

impl Timestamp {
    /// Day prefix (`YYYY-MM-DD`) of this instant, used by day partitions.
    pub fn day(&self) -> &str {
        &self.0[..10.min(self.0.len())]
    }
}
