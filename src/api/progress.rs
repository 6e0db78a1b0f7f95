//! Import progress stream.
//!
//! `GET /outlook/loading?stream={project}` is a server-sent event stream whose
//! `data:` lines carry an integer percentage. `-1` marks the end of the import.

use std::collections::VecDeque;

use reqwest::Response;
use tracing::{debug, trace};

use super::error::Result;

/// One event of the import stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportEvent {
    /// Percentage done, 0 to 100.
    Progress(u8),
    /// The import finished.
    Complete,
}

impl ImportEvent {
    /// Interpret the data of one server-sent event.
    ///
    /// Returns `None` for payloads that are not integers.
    pub fn from_data(data: &str) -> Option<Self> {
        let value: i64 = data.trim().parse().ok()?;
        if value == -1 {
            Some(Self::Complete)
        } else if value < 0 {
            None
        } else {
            Some(Self::Progress(value.min(100) as u8))
        }
    }
}

/// Incremental parser for the `text/event-stream` framing.
///
/// Bytes arrive in arbitrary chunks. Lines are split on `\n` (a trailing
/// `\r` is dropped), `data:` lines accumulate, and a blank line dispatches
/// the event.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the data of every completed event.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data
                    .push(value.strip_prefix(' ').unwrap_or(value).to_string());
            } else {
                // Comments, `event:`, `id:` and `retry:` carry nothing we use.
                trace!(line = %line, "Ignoring event-stream line");
            }
        }

        events
    }
}

/// A live import progress stream.
#[derive(Debug)]
pub struct ImportProgressStream {
    response: Response,
    parser: SseParser,
    pending: VecDeque<ImportEvent>,
    finished: bool,
}

impl ImportProgressStream {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            response,
            parser: SseParser::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Wait for the next event. `None` once the connection closes or after
    /// `Complete` has been returned.
    pub async fn next_event(&mut self) -> Result<Option<ImportEvent>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                if event == ImportEvent::Complete {
                    self.finished = true;
                    self.pending.clear();
                }
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }

            match self.response.chunk().await? {
                Some(bytes) => {
                    for data in self.parser.feed(&bytes) {
                        match ImportEvent::from_data(&data) {
                            Some(event) => self.pending.push_back(event),
                            None => debug!(data = %data, "Ignoring non-numeric progress event"),
                        }
                    }
                }
                None => {
                    self.finished = true;
                    return Ok(None);
                }
            }
        }
    }
}
