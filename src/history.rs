//! Exchange history for diagnosing timing problems against real hardware.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::types::{Command, PowerState};

/// What a history entry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A command was written to the projector.
    Sent(Command),
    /// A reply arrived. `state` is set when the reply answered `GET POWER`.
    Received {
        raw: String,
        state: Option<PowerState>,
    },
    /// The exchange failed.
    Failed(String),
}

/// A recorded event in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub event: Event,
    /// Seconds since history creation
    pub timestamp: f64,
}

/// Tracks the most recent exchanges with the projector.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    sent: usize,
    received: usize,
    last_error: Option<String>,
    start_time: Instant,
    max_entries: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            sent: 0,
            received: 0,
            last_error: None,
            start_time: Instant::now(),
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::new()
        }
    }

    pub fn record_sent(&mut self, command: Command) {
        self.sent += 1;
        self.push(Event::Sent(command));
    }

    pub fn record_received(&mut self, raw: &str, state: Option<PowerState>) {
        self.received += 1;
        self.push(Event::Received {
            raw: raw.to_string(),
            state,
        });
    }

    pub fn record_error(&mut self, error: &str) {
        self.last_error = Some(error.to_string());
        self.push(Event::Failed(error.to_string()));
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The most recent parsed power state, if any reply carried one.
    pub fn last_state(&self) -> Option<PowerState> {
        self.entries.iter().rev().find_map(|entry| match entry.event {
            Event::Received { state, .. } => state,
            _ => None,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sent = 0;
        self.received = 0;
        self.last_error = None;
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            send_count: self.sent,
            receive_count: self.received,
            total_entries: self.entries.len(),
            last_state: self.last_state(),
            last_error: self.last_error.clone(),
        }
    }

    fn push(&mut self, event: Event) {
        self.entries.push_back(HistoryEntry {
            event,
            timestamp: self.start_time.elapsed().as_secs_f64(),
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}

/// Summary of exchange history for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub send_count: usize,
    pub receive_count: usize,
    pub total_entries: usize,
    pub last_state: Option<PowerState>,
    pub last_error: Option<String>,
}
