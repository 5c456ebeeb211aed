use repomesh_canonical::Timestamp;
use repomesh_core::{ErrorKind, Event, TrustError};
use std::fmt;

use crate::engine::is_anchor_event;

/// Selector identifying a contiguous subset of log events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionId {
    /// Every event in the log.
    All,
    /// Synonym for `All` used when no prior anchor exists.
    Genesis,
    /// Events whose timestamp starts with this `YYYY-MM-DD` prefix.
    Day(String),
    /// Events strictly after the anchor event carrying this timestamp.
    Since(Timestamp),
}

impl PartitionId {
    /// Parses a partition selector string.
    pub fn parse(s: &str) -> Result<Self, TrustError> {
        if s == "all" {
            return Ok(PartitionId::All);
        }
        if s == "genesis" {
            return Ok(PartitionId::Genesis);
        }
        if let Some(ts) = s.strip_prefix("since:") {
            let ts = Timestamp::parse(ts).map_err(|_| {
                TrustError::new(
                    ErrorKind::SchemaViolation,
                    format!("'{s}' is not a valid since-partition selector"),
                )
            })?;
            return Ok(PartitionId::Since(ts));
        }
        if is_day(s) {
            return Ok(PartitionId::Day(s.to_owned()));
        }
        Err(TrustError::new(
            ErrorKind::SchemaViolation,
            format!("'{s}' is not a partition selector"),
        ))
    }

    /// File stem for the manifest of this partition.
    ///
    /// Every character outside `[A-Za-z0-9_-]` is replaced, so `since:`
    /// selectors with timestamps become stable file names.
    pub fn file_stem(&self) -> String {
        self.to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }

    /// Selects the events of this partition, in log order.
    ///
    /// Anchored partitions end just before the next anchor event after
    /// their start: the anchor that pins a partition lands after
    /// materialization, so bounding there makes replay reproduce the same
    /// leaves no matter how far the log has grown since.
    pub fn select<'a>(&self, events: &'a [Event]) -> Result<Vec<&'a Event>, TrustError> {
        match self {
            PartitionId::All => Ok(events.iter().collect()),
            PartitionId::Genesis => {
                let end = next_anchor_after(events, 0).unwrap_or(events.len());
                Ok(events[..end].iter().collect())
            }
            PartitionId::Day(day) => Ok(events
                .iter()
                .filter(|e| e.timestamp.as_ref().starts_with(day.as_str()))
                .collect()),
            PartitionId::Since(ts) => {
                let mut anchor_index = None;
                for (index, event) in events.iter().enumerate() {
                    if is_anchor_event(event) && &event.timestamp == ts {
                        if anchor_index.is_some() {
                            return Err(TrustError::new(
                                ErrorKind::SchemaViolation,
                                format!("anchor timestamp {ts} is not unique in the log"),
                            ));
                        }
                        anchor_index = Some(index);
                    }
                }
                let start = anchor_index.ok_or_else(|| {
                    TrustError::new(
                        ErrorKind::SchemaViolation,
                        format!("no anchor event with timestamp {ts} exists in the log"),
                    )
                })? + 1;
                let end = next_anchor_after(events, start).unwrap_or(events.len());
                Ok(events[start..end].iter().collect())
            }
        }
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionId::All => f.write_str("all"),
            PartitionId::Genesis => f.write_str("genesis"),
            PartitionId::Day(day) => f.write_str(day),
            PartitionId::Since(ts) => write!(f, "since:{ts}"),
        }
    }
}

fn next_anchor_after(events: &[Event], start: usize) -> Option<usize> {
    events[start..]
        .iter()
        .position(is_anchor_event)
        .map(|offset| start + offset)
}

fn is_day(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
