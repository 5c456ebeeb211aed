use chrono::{DateTime, Duration, Utc};
use repomesh_core::{verify_event, ErrorKind, Event, EventType, KeyRegistry, TrustError};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::log_file::LogFile;
use crate::schema::{encode_line, parse_line, validate_event};

/// Options governing batch admission.
#[derive(Debug, Clone)]
pub struct AdmissionOptions {
    /// Reference instant for the timestamp window.
    pub now: DateTime<Utc>,
    /// How far in the past an event may be dated.
    pub max_age: Duration,
    /// How far in the future an event may be dated.
    pub max_skew: Duration,
}

impl Default for AdmissionOptions {
    fn default() -> Self {
        Self {
            now: Utc::now(),
            max_age: Duration::days(365),
            max_skew: Duration::hours(1),
        }
    }
}

/// The admission identity key of an event.
///
/// `(repo, version, type)` for every type except `AttestationPublished`,
/// which is additionally keyed by the signing key so that several verifiers
/// can publish opinions about the same release.
pub fn identity_key(event: &Event) -> (String, String, String, Option<String>) {
    let signer = match event.event_type {
        EventType::AttestationPublished => event
            .signature
            .as_ref()
            .map(|s| s.key_id.as_ref().to_owned()),
        _ => None,
    };
    (
        event.repo.as_ref().to_owned(),
        event.version.as_ref().to_owned(),
        format!("{:?}", event.event_type),
        signer,
    )
}

/// Serial gatekeeper for extending a log with new events.
///
/// All checks are total: the whole batch is rejected if any event fails,
/// and the validator never mutates events.
pub struct Admission<'a> {
    registry: &'a KeyRegistry,
    options: AdmissionOptions,
}

impl<'a> Admission<'a> {
    /// Creates an admission gate over the given registry.
    pub fn new(registry: &'a KeyRegistry, options: AdmissionOptions) -> Self {
        Self { registry, options }
    }

    /// Validates that `proposed` extends `baseline` and that every new line
    /// satisfies the admission rules. Returns the parsed new events.
    pub fn validate_extension(
        &self,
        baseline: &[u8],
        proposed: &[u8],
    ) -> Result<Vec<Event>, TrustError> {
        if proposed.len() < baseline.len() || &proposed[..baseline.len()] != baseline {
            return Err(TrustError::new(
                ErrorKind::LogRewrite,
                "proposed log does not extend the baseline byte-for-byte",
            ));
        }

        let existing: Vec<Event> = split_lines(baseline)
            .iter()
            .map(|l| parse_line(l))
            .collect::<Result<_, _>>()?;
        let batch: Vec<Event> = split_lines(&proposed[baseline.len()..])
            .iter()
            .map(|l| parse_line(l))
            .collect::<Result<_, _>>()?;

        self.validate_batch(&existing, &batch)?;
        Ok(batch)
    }

    /// Validates appending `batch` to the events already admitted.
    pub fn validate_batch(&self, existing: &[Event], batch: &[Event]) -> Result<(), TrustError> {
        debug!(existing = existing.len(), batch = batch.len(), "admitting batch");

        for event in batch {
            validate_event(&event.to_value()?)?;
            self.check_timestamp(event)?;
        }

        let mut seen: HashSet<_> = existing.iter().map(identity_key).collect();
        for event in batch {
            if !seen.insert(identity_key(event)) {
                return Err(TrustError::new(
                    ErrorKind::DuplicateEvent,
                    format!(
                        "{:?} for {}@{} already exists in the log",
                        event.event_type, event.repo, event.version
                    ),
                ));
            }
        }

        for event in batch {
            verify_event(event, self.registry)?;
        }

        info!(admitted = batch.len(), "batch admitted");
        Ok(())
    }

    /// Validates `batch` against the log on disk and appends it.
    ///
    /// This is the only write path; concurrent admissions are expected to
    /// be serialized by the caller, and a loser simply restarts against the
    /// new baseline.
    pub fn append(&self, log: &LogFile, batch: &[Event]) -> Result<usize, TrustError> {
        let existing = log.load_events()?;
        self.validate_batch(&existing, batch)?;
        let lines = batch
            .iter()
            .map(encode_line)
            .collect::<Result<Vec<_>, _>>()?;
        log.append_lines(&lines)?;
        Ok(batch.len())
    }

    fn check_timestamp(&self, event: &Event) -> Result<(), TrustError> {
        let instant = DateTime::parse_from_rfc3339(event.timestamp.as_ref())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|err| {
                TrustError::new(
                    ErrorKind::SchemaViolation,
                    format!("timestamp '{}': {}", event.timestamp, err),
                )
            })?;
        let earliest = self.options.now - self.options.max_age;
        let latest = self.options.now + self.options.max_skew;
        if instant < earliest || instant > latest {
            return Err(TrustError::new(
                ErrorKind::TimestampOutOfRange,
                format!(
                    "timestamp {} outside [{}, {}]",
                    event.timestamp, earliest, latest
                ),
            ));
        }
        Ok(())
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    lines.pop();
    lines
}
