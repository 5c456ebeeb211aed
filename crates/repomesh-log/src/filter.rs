//! Typed event filters for selective iteration over a loaded log.

use repomesh_canonical::{RepoId, Timestamp};
use repomesh_core::{Event, EventType};

/// Trait for filtering events during iteration.
pub trait EventFilter {
    /// Returns true if the event matches the filter criteria.
    fn matches(&self, event: &Event) -> bool;
}

/// Filter by event type.
#[derive(Debug, Clone)]
pub struct EventTypeFilter {
    /// Event type to match.
    pub event_type: EventType,
}

impl EventFilter for EventTypeFilter {
    fn matches(&self, event: &Event) -> bool {
        event.event_type == self.event_type
    }
}

/// Filter by target repository.
#[derive(Debug, Clone)]
pub struct RepoFilter {
    /// Target identity to match.
    pub repo: RepoId,
}

impl EventFilter for RepoFilter {
    fn matches(&self, event: &Event) -> bool {
        event.repo == self.repo
    }
}

/// Filter by time range.
///
/// Bounds are inclusive; the fixed UTC format makes the lexicographic
/// comparison chronological.
#[derive(Debug, Clone)]
pub struct TimeRangeFilter {
    /// Include events at or after this instant.
    pub after: Option<Timestamp>,
    /// Include events at or before this instant.
    pub before: Option<Timestamp>,
}

impl EventFilter for TimeRangeFilter {
    fn matches(&self, event: &Event) -> bool {
        if let Some(after) = &self.after {
            if event.timestamp < *after {
                return false;
            }
        }
        if let Some(before) = &self.before {
            if event.timestamp > *before {
                return false;
            }
        }
        true
    }
}
