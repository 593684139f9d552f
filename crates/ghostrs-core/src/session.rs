// Ghostrs Device Session
// Per-device pipeline: ghost filter -> diagnostics -> virtual sink

use std::collections::HashSet;
use std::io::{self, Write};

use crate::filter::{Decisions, FilterParams, GhostFilter};
use crate::input::{button_label, ButtonEvent};
use crate::output::VirtualJoystick;
use crate::stats::FilterStats;

/// Configuration for one physical->virtual device pairing
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Log label for the device (e.g. "Stick")
    pub name: String,
    /// Profile mode label carried into logs and summaries
    pub mode: String,
    /// 1-based virtual device number
    pub virtual_index: usize,
    /// Sanitized filter parameters
    pub params: FilterParams,
    /// Log every legitimate press, not just ghosts
    pub verbose: bool,
    /// Presses between periodic summaries (0 = off)
    pub summary_every: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "Joystick".to_string(),
            mode: "Default".to_string(),
            virtual_index: 1,
            params: FilterParams::default(),
            verbose: false,
            summary_every: 0,
        }
    }
}

/// Process-lifetime state for one filtered device.
///
/// Owns the ghost filter and diagnostics counters and applies resolved
/// verdicts to a `VirtualJoystick` sink. A session whose initialization
/// failed is disabled: its events are dropped, never forwarded, and the
/// failure was reported once at load time.
#[derive(Debug)]
pub struct DeviceSession {
    config: SessionConfig,
    filter: GhostFilter,
    stats: FilterStats,
    enabled: bool,
    /// Distinct buttons of the ghost burst currently accumulating
    ghost_burst: HashSet<u16>,
    /// Timestamp of the newest suppressed press in the burst
    burst_last_us: u64,
}

impl DeviceSession {
    /// Create an active session
    pub fn new(config: SessionConfig) -> Self {
        log::info!(
            "remapping \"{}\" to virtual joystick #{} on profile [{}]{}",
            config.name,
            config.virtual_index,
            config.mode,
            if config.params.enabled {
                " with button filtering"
            } else {
                ""
            }
        );

        Self {
            filter: GhostFilter::new(config.params),
            stats: FilterStats::new(),
            enabled: true,
            ghost_burst: HashSet::new(),
            burst_last_us: 0,
            config,
        }
    }

    /// Create a disabled session after an initialization failure.
    ///
    /// The reason is reported once here; events routed to the session
    /// afterwards are dropped quietly.
    pub fn disabled(config: SessionConfig, reason: &str) -> Self {
        log::error!(
            "\"{}\" (virtual #{}): {}; forwarding disabled for this device",
            config.name,
            config.virtual_index,
            reason
        );

        Self {
            filter: GhostFilter::new(config.params),
            stats: FilterStats::new(),
            enabled: false,
            ghost_burst: HashSet::new(),
            burst_last_us: 0,
            config,
        }
    }

    /// Whether the session forwards events
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The device's log label
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The profile mode label
    pub fn mode(&self) -> &str {
        &self.config.mode
    }

    /// The 1-based virtual device number
    pub fn virtual_index(&self) -> usize {
        self.config.virtual_index
    }

    /// Diagnostics counters
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Feed one physical event through the filter and apply verdicts
    pub fn handle_event<V: VirtualJoystick>(&mut self, event: ButtonEvent, out: &mut V) {
        if !self.enabled {
            log::debug!("\"{}\" disabled, dropping {}", self.config.name, event);
            return;
        }

        let decisions = self.filter.process(event);
        self.apply(decisions, out);
    }

    /// Resolve and apply verdicts whose window has elapsed.
    ///
    /// Call on the poll cadence so deferred presses forward even when
    /// the device goes quiet.
    pub fn flush<V: VirtualJoystick>(&mut self, now_us: u64, out: &mut V) {
        if !self.enabled {
            return;
        }

        let decisions = self.filter.poll_expired(now_us);
        self.apply(decisions, out);

        // A burst is over once a full window has passed without another
        // suppressed press.
        if !self.ghost_burst.is_empty()
            && now_us.saturating_sub(self.burst_last_us) > self.filter.params().span_us
        {
            self.finish_burst();
        }
    }

    /// Render the summary report, closing any accumulating burst first
    pub fn write_summary(&mut self, writer: &mut impl Write) -> io::Result<()> {
        self.finish_burst();
        self.stats
            .write_summary(&self.config.name, &self.config.mode, writer)
    }

    fn apply<V: VirtualJoystick>(&mut self, decisions: Decisions, out: &mut V) {
        for decision in decisions {
            let event = decision.event;

            if decision.action.is_suppress() {
                log::debug!("[{}] {} suppressed {}", self.config.mode, self.config.name, event);
                if event.pressed {
                    self.note_suppressed_press(event);
                }
                continue;
            }

            if let Err(e) = out.set_button(event.button, event.pressed) {
                log::error!(
                    "\"{}\" failed to update virtual button {}: {}",
                    self.config.name,
                    button_label(event.button),
                    e
                );
                continue;
            }

            if event.pressed {
                self.stats.record_allowed();
                if self.config.verbose {
                    log::info!(
                        "USER pressed: {} {}",
                        self.config.name,
                        button_label(event.button)
                    );
                }
                self.maybe_periodic_summary();
            }
        }
    }

    fn note_suppressed_press(&mut self, event: ButtonEvent) {
        // A gap of more than one window separates two bursts
        if !self.ghost_burst.is_empty()
            && event.timestamp_us.saturating_sub(self.burst_last_us) > self.filter.params().span_us
        {
            self.finish_burst();
        }

        self.ghost_burst.insert(event.button);
        self.burst_last_us = event.timestamp_us;
    }

    /// Record the accumulated burst as one ghost batch and log it
    fn finish_burst(&mut self) {
        if self.ghost_burst.is_empty() {
            return;
        }

        let mut buttons: Vec<u16> = self.ghost_burst.drain().collect();
        buttons.sort_unstable();

        let labels: Vec<String> = buttons.iter().map(|b| button_label(*b)).collect();
        log::info!(
            "GHOST INPUT blocked! [{}] {} pressed {} buttons at once [{}]",
            self.config.mode,
            self.config.name,
            buttons.len(),
            labels.join(", ")
        );

        self.stats.record_blocked_batch(&buttons);
        self.maybe_periodic_summary();
    }

    fn maybe_periodic_summary(&mut self) {
        let every = self.config.summary_every;
        if every == 0 {
            return;
        }

        let total = self.stats.total();
        if total > 0 && total % every == 0 {
            for line in self
                .stats
                .summary_string(&self.config.name, &self.config.mode)
                .lines()
            {
                log::info!("{}", line);
            }
        }
    }
}
