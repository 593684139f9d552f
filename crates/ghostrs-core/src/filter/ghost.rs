// Ghostrs Filter - Ghost Input Classification
// Deferred per-event verdicts over a sliding coincidence window

use std::collections::{HashSet, VecDeque};

use smallvec::SmallVec;

use super::window::PressWindow;
use crate::action::Action;
use crate::input::{button_label, ButtonEvent};

/// Default window length when the configured value is invalid
pub const DEFAULT_WINDOW_MS: u64 = 50;

/// Default distinct-button threshold when the configured value is invalid
pub const DEFAULT_THRESHOLD: usize = 2;

/// Sanitized per-device filter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    /// Window length in microseconds
    pub span_us: u64,
    /// Distinct simultaneous buttons that classify a batch as ghosting
    pub threshold: usize,
    /// False bypasses classification entirely
    pub enabled: bool,
}

impl FilterParams {
    /// Build params from raw configuration values.
    ///
    /// Window length and threshold must be positive; anything else falls
    /// back to the defaults (50ms, 2) with a logged warning rather than
    /// failing the whole configuration.
    pub fn sanitized(window_ms: i64, threshold: i64, enabled: bool) -> Self {
        let window_ms = if window_ms > 0 {
            window_ms as u64
        } else {
            log::warn!(
                "invalid filter window {}ms, using default {}ms",
                window_ms,
                DEFAULT_WINDOW_MS
            );
            DEFAULT_WINDOW_MS
        };

        let threshold = if threshold > 0 {
            threshold as usize
        } else {
            log::warn!(
                "invalid button threshold {}, using default {}",
                threshold,
                DEFAULT_THRESHOLD
            );
            DEFAULT_THRESHOLD
        };

        Self {
            span_us: window_ms * 1_000,
            threshold,
            enabled,
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            span_us: DEFAULT_WINDOW_MS * 1_000,
            threshold: DEFAULT_THRESHOLD,
            enabled: true,
        }
    }
}

/// A resolved verdict for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub event: ButtonEvent,
    pub action: Action,
}

/// Verdicts resolved by one call; small batches stay off the heap
pub type Decisions = SmallVec<[Decision; 4]>;

/// The ghost-input filter for one physical device.
///
/// Synchronous and non-blocking, but verdicts may be deferred: a press
/// is held until its window elapses unchallenged (then forwards) or the
/// distinct-button threshold is met inside the window (then the whole
/// pending batch suppresses). `process` returns the verdicts that became
/// final as a consequence of the incoming event; `poll_expired` resolves
/// matured ones on the owner's poll cadence.
///
/// Replaying the same event sequence through a fresh filter yields the
/// same classifications; all state is a function of the events seen.
#[derive(Debug)]
pub struct GhostFilter {
    params: FilterParams,
    window: PressWindow,
    /// Events awaiting a verdict, in arrival order
    pending: VecDeque<ButtonEvent>,
    /// Buttons whose press was suppressed; their release must be too
    suppressed_down: HashSet<u16>,
    /// Buttons whose press was forwarded; their release always forwards
    forwarded_down: HashSet<u16>,
}

impl GhostFilter {
    /// Create a filter with the given parameters
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            window: PressWindow::new(params.span_us),
            pending: VecDeque::new(),
            suppressed_down: HashSet::new(),
            forwarded_down: HashSet::new(),
        }
    }

    /// The active parameters
    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Number of events still awaiting a verdict
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one event through the filter.
    ///
    /// Returns every verdict that became final, oldest first. The
    /// incoming event's own verdict may still be pending.
    pub fn process(&mut self, event: ButtonEvent) -> Decisions {
        let mut out = Decisions::new();

        if !self.params.enabled {
            self.note_forwarded(event);
            out.push(Decision {
                event,
                action: Action::Forward,
            });
            return out;
        }

        // Anything older than a full window is already beyond challenge
        self.flush_matured(event.timestamp_us, &mut out);

        if event.pressed {
            self.handle_press(event, &mut out);
        } else {
            self.handle_release(event, &mut out);
        }

        out
    }

    /// Resolve pending events whose window has elapsed.
    ///
    /// Call this on the poll cadence so deferred presses forward even
    /// when no further events arrive.
    pub fn poll_expired(&mut self, now_us: u64) -> Decisions {
        let mut out = Decisions::new();
        self.flush_matured(now_us, &mut out);
        self.window.evict_expired(now_us);
        out
    }

    fn handle_press(&mut self, event: ButtonEvent, out: &mut Decisions) {
        if self.suppressed_down.remove(&event.button) {
            // The release of the suppressed pulse never arrived; a new
            // physical press supersedes the stale mark.
            log::debug!(
                "{} pressed again before its suppressed release; treating as fresh",
                button_label(event.button)
            );
        }

        self.window.push(event);
        self.pending.push_back(event);

        if self.window.distinct_buttons() >= self.params.threshold {
            self.suppress_pending(out);
        }
    }

    fn handle_release(&mut self, event: ButtonEvent, out: &mut Decisions) {
        if self.suppressed_down.remove(&event.button) {
            // Completes a suppressed pulse; the virtual button was never
            // down, so the release must be swallowed as well.
            self.window.push(event);
            out.push(Decision {
                event,
                action: Action::Suppress,
            });
            return;
        }

        let press_pending = self
            .pending
            .iter()
            .any(|e| e.button == event.button && e.pressed);
        if press_pending {
            // Queue behind the press and share its fate.
            self.window.push(event);
            self.pending.push_back(event);
            return;
        }

        // The press already reached the virtual device (or predates this
        // process). Forward immediately; the release does not enter the
        // window, since it completes an interaction already committed.
        if !self.forwarded_down.remove(&event.button) {
            log::debug!(
                "release for {} with no tracked press",
                button_label(event.button)
            );
        }
        out.push(Decision {
            event,
            action: Action::Forward,
        });
    }

    /// The window met the threshold: the whole pending batch is ghost
    /// input, except releases whose press already forwarded.
    fn suppress_pending(&mut self, out: &mut Decisions) {
        while let Some(event) = self.pending.pop_front() {
            if event.pressed {
                self.suppressed_down.insert(event.button);
                out.push(Decision {
                    event,
                    action: Action::Suppress,
                });
            } else if self.suppressed_down.remove(&event.button) {
                out.push(Decision {
                    event,
                    action: Action::Suppress,
                });
            } else {
                // Pending release whose press matured and forwarded
                // before the batch turned ghost; suppressing it would
                // leave the virtual button stuck down.
                self.forwarded_down.remove(&event.button);
                out.push(Decision {
                    event,
                    action: Action::Forward,
                });
            }
        }
    }

    /// Forward pending events whose window has fully elapsed.
    fn flush_matured(&mut self, now_us: u64, out: &mut Decisions) {
        while let Some(front) = self.pending.front().copied() {
            if now_us.saturating_sub(front.timestamp_us) <= self.params.span_us {
                break;
            }
            self.pending.pop_front();
            self.note_forwarded(front);
            out.push(Decision {
                event: front,
                action: Action::Forward,
            });
        }
    }

    fn note_forwarded(&mut self, event: ButtonEvent) {
        if event.pressed {
            self.forwarded_down.insert(event.button);
        } else {
            self.forwarded_down.remove(&event.button);
        }
    }
}
