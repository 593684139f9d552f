// Ghostrs Filter - Sliding Window
// Rolling span of recent candidate events for coincidence counting

use std::collections::{HashSet, VecDeque};

use crate::input::ButtonEvent;

/// Rolling window of recent candidate button events.
///
/// Holds the ordered sequence of events still inside the configured
/// span relative to the newest entry. Every insertion evicts entries
/// that have fallen out of the span, so the window never grows beyond
/// what one burst of simultaneous activity can produce.
#[derive(Debug, Clone)]
pub struct PressWindow {
    span_us: u64,
    events: VecDeque<ButtonEvent>,
}

impl PressWindow {
    /// Create an empty window covering `span_us` microseconds
    pub fn new(span_us: u64) -> Self {
        Self {
            span_us,
            events: VecDeque::new(),
        }
    }

    /// The configured span in microseconds
    pub fn span_us(&self) -> u64 {
        self.span_us
    }

    /// Insert an event and evict everything older than the span.
    ///
    /// Timestamps that run backwards are clamped to the newest entry so
    /// eviction arithmetic stays monotonic.
    pub fn push(&mut self, mut event: ButtonEvent) {
        if let Some(newest) = self.newest_us() {
            if event.timestamp_us < newest {
                event.timestamp_us = newest;
            }
        }
        let cutoff = event.timestamp_us.saturating_sub(self.span_us);
        self.events.push_back(event);
        self.evict_before(cutoff);
    }

    /// Evict entries that have aged out relative to `now_us`.
    ///
    /// Used by the owner's poll cadence so a window with no fresh events
    /// still drains.
    pub fn evict_expired(&mut self, now_us: u64) {
        self.evict_before(now_us.saturating_sub(self.span_us));
    }

    fn evict_before(&mut self, cutoff_us: u64) {
        while let Some(front) = self.events.front() {
            if front.timestamp_us >= cutoff_us {
                break;
            }
            self.events.pop_front();
        }
    }

    /// Count the distinct buttons with a state change inside the window
    pub fn distinct_buttons(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.button)
            .collect::<HashSet<u16>>()
            .len()
    }

    /// The distinct buttons currently in the window, sorted
    pub fn buttons(&self) -> Vec<u16> {
        let mut buttons: Vec<u16> = self
            .events
            .iter()
            .map(|e| e.button)
            .collect::<HashSet<u16>>()
            .into_iter()
            .collect();
        buttons.sort_unstable();
        buttons
    }

    /// Timestamp of the newest entry, if any
    pub fn newest_us(&self) -> Option<u64> {
        self.events.back().map(|e| e.timestamp_us)
    }

    /// Number of events in the window
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the window is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over the retained events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &ButtonEvent> {
        self.events.iter()
    }
}
