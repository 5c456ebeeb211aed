use repomesh_core::{ErrorKind, Event, TrustError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::schema::{encode_line, parse_line};

fn io_error(err: std::io::Error, path: &Path) -> TrustError {
    TrustError::new(
        ErrorKind::MalformedEvent,
        format!("log I/O failure on {}: {}", path.display(), err),
    )
}

/// An append-only, line-delimited event log on disk.
///
/// A missing file is an empty log; the first append creates it. The file is
/// only ever extended, never rewritten.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    /// Opens a handle to a log path; the file need not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entire log contents; empty when the file does not exist.
    pub fn read_bytes(&self) -> Result<Vec<u8>, TrustError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(io_error(err, &self.path)),
        }
    }

    /// Complete lines of the log, in insertion order.
    ///
    /// Only line-aligned prefixes are observed: a trailing fragment without
    /// its newline (a concurrent producer mid-append) is ignored rather
    /// than surfaced as a half-written event.
    pub fn read_lines(&self) -> Result<Vec<String>, TrustError> {
        let bytes = self.read_bytes()?;
        Ok(complete_lines(&bytes))
    }

    /// Parses every complete line into an event.
    pub fn load_events(&self) -> Result<Vec<Event>, TrustError> {
        self.read_lines()?.iter().map(|l| parse_line(l)).collect()
    }

    /// Appends pre-validated lines, each with a trailing newline.
    ///
    /// Callers must have run admission first; this is the only mutation the
    /// log supports.
    pub fn append_lines(&self, lines: &[String]) -> Result<(), TrustError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| io_error(err, &self.path))?;
        for line in lines {
            file.write_all(line.as_bytes())
                .and_then(|()| file.write_all(b"\n"))
                .map_err(|err| io_error(err, &self.path))?;
        }
        file.flush().map_err(|err| io_error(err, &self.path))?;
        debug!(count = lines.len(), path = %self.path.display(), "appended log lines");
        Ok(())
    }

    /// Appends events, encoding each as one line.
    pub fn append_events(&self, events: &[Event]) -> Result<(), TrustError> {
        let lines = events
            .iter()
            .map(encode_line)
            .collect::<Result<Vec<_>, _>>()?;
        self.append_lines(&lines)
    }
}

fn complete_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    // The split leaves either an empty tail (well-terminated log) or a
    // partial line still being appended; neither is a committed event.
    lines.pop();
    lines
}

/// A parsed-event cache over a log file.
///
/// The cache re-parses only appended lines on refresh. It invalidates
/// entirely when the line count decreases or when a previously-observed
/// tail line changed, both of which indicate the baseline was rewritten.
#[derive(Debug)]
pub struct CachedLog {
    log: LogFile,
    lines: Vec<String>,
    events: Vec<Event>,
}

impl CachedLog {
    /// Wraps a log handle with an empty cache.
    pub fn new(log: LogFile) -> Self {
        Self {
            log,
            lines: Vec::new(),
            events: Vec::new(),
        }
    }

    /// The underlying log handle.
    pub fn log(&self) -> &LogFile {
        &self.log
    }

    /// Refreshes the cache and returns the current events.
    pub fn events(&mut self) -> Result<&[Event], TrustError> {
        let current = self.log.read_lines()?;
        let unchanged_prefix = current.len() >= self.lines.len()
            && current[..self.lines.len()] == self.lines[..];

        if unchanged_prefix {
            for line in &current[self.lines.len()..] {
                self.events.push(parse_line(line)?);
            }
        } else {
            debug!(
                cached = self.lines.len(),
                observed = current.len(),
                "log prefix changed; discarding parsed-event cache"
            );
            self.events = current.iter().map(|l| parse_line(l)).collect::<Result<_, _>>()?;
        }
        self.lines = current;
        Ok(&self.events)
    }
}
