//! Append-only event log for the RepoMesh federation.
//!
//! This crate provides:
//! - The line-delimited UTF-8 log file format (one event per line)
//! - Batch admission with the full rule pipeline: append-only baseline,
//!   parse, schema, timestamp window, uniqueness, content hash, signature
//! - A cached reader that observes line-aligned prefixes
//! - Typed event filters for selective iteration
//!
//! Admission is serial per log file and total per batch: one failing event
//! rejects the whole batch and leaves the log byte-identical.
//!
#![deny(missing_docs)]

/// Typed event filters.
pub mod filter;
/// Log file reading and appending.
pub mod log_file;
/// Line codec and schema conformance.
pub mod schema;
/// Batch admission pipeline.
pub mod validator;

pub use filter::{EventFilter, EventTypeFilter, RepoFilter, TimeRangeFilter};
pub use log_file::{CachedLog, LogFile};
pub use schema::{encode_line, parse_line, validate_event};
pub use validator::{identity_key, Admission, AdmissionOptions};
