//! Server-sent event framing
//!
//! Turns the raw `text/event-stream` body into discrete events. Lines are
//! accumulated until a blank line dispatches the event; partial lines stay in
//! the buffer until the next chunk arrives.
//!
//! A corrupt event (a line that is not UTF-8, or longer than the line limit)
//! is dropped whole at its blank line and framing carries on with the next.

use std::time::Duration;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::StreamError;

/// Longest line kept while waiting for its newline
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
    /// Reconnection delay requested by the server
    pub retry: Option<Duration>,
}

#[derive(Debug, Default)]
struct PendingEvent {
    event: Option<String>,
    data: Option<String>,
    id: Option<String>,
    retry: Option<Duration>,
    /// Set when one of the event's lines was unusable
    corrupt: bool,
}

impl PendingEvent {
    fn apply(&mut self, field: &str, value: &str) {
        match field {
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            "retry" => {
                if let Ok(millis) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(millis));
                }
            }
            _ => {}
        }
    }

    /// Finish the event at a blank line
    ///
    /// Corrupt events and events carrying neither data nor a retry hint are
    /// discarded.
    fn take(&mut self) -> Option<SseEvent> {
        let pending = std::mem::take(self);
        if pending.corrupt {
            tracing::warn!("dropping corrupt event from event stream");
            return None;
        }
        if pending.data.is_none() && pending.retry.is_none() {
            return None;
        }
        Some(SseEvent {
            event: pending.event,
            data: pending.data.unwrap_or_default(),
            id: pending.id,
            retry: pending.retry,
        })
    }
}

/// `tokio_util` decoder for `text/event-stream` bodies
///
/// Never fails: unusable input only costs the event it belongs to.
#[derive(Debug)]
pub struct EventStreamCodec {
    pending: PendingEvent,
    max_line_length: usize,
    /// Inside an over-long line whose start was already thrown away
    skipping_line: bool,
}

impl Default for EventStreamCodec {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl EventStreamCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            pending: PendingEvent::default(),
            max_line_length,
            skipping_line: false,
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn line_too_long(&mut self) {
        tracing::warn!(limit = self.max_line_length, "event stream line too long");
        self.pending.corrupt = true;
    }
}

impl Decoder for EventStreamCodec {
    type Item = SseEvent;
    type Error = StreamError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SseEvent>, StreamError> {
        loop {
            let Some(newline) = src.iter().position(|b| *b == b'\n') else {
                if self.skipping_line {
                    src.clear();
                } else if src.len() > self.max_line_length {
                    self.line_too_long();
                    self.skipping_line = true;
                    src.clear();
                }
                return Ok(None);
            };

            let raw = src.split_to(newline + 1);
            if self.skipping_line {
                // newline ending the line already discarded
                self.skipping_line = false;
                continue;
            }
            if newline > self.max_line_length {
                self.line_too_long();
                continue;
            }

            let mut line = &raw[..newline];
            if let Some((b'\r', rest)) = line.split_last() {
                line = rest;
            }
            let line = match std::str::from_utf8(line) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "invalid utf-8 in event stream");
                    self.pending.corrupt = true;
                    continue;
                }
            };

            if line.is_empty() {
                if let Some(event) = self.pending.take() {
                    return Ok(Some(event));
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            self.pending.apply(field, value);
        }
    }
}
