// Ghostrs Diagnostics
// Allowed/blocked counters and the ghost-input summary report

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Instant;

use crate::input::button_label;

/// Per-device counters for forwarded and suppressed presses.
///
/// Tracks the same breakdowns the summary report renders: per button,
/// per batch size ("simultaneity") and per button combination. Releases
/// are consequences of their presses and are not counted separately.
#[derive(Debug)]
pub struct FilterStats {
    started: Instant,
    total_allowed: u64,
    total_blocked: u64,
    by_button: HashMap<u16, u64>,
    by_simultaneity: HashMap<usize, u64>,
    by_combination: HashMap<Vec<u16>, u64>,
}

impl Default for FilterStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterStats {
    /// Create empty counters; elapsed time runs from here
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total_allowed: 0,
            total_blocked: 0,
            by_button: HashMap::new(),
            by_simultaneity: HashMap::new(),
            by_combination: HashMap::new(),
        }
    }

    /// Record one forwarded press
    pub fn record_allowed(&mut self) {
        self.total_allowed += 1;
    }

    /// Record one suppressed batch of ghost presses.
    ///
    /// `buttons` is the distinct set in the batch; it is sorted for the
    /// combination breakdown.
    pub fn record_blocked_batch(&mut self, buttons: &[u16]) {
        if buttons.is_empty() {
            return;
        }

        let mut combination: Vec<u16> = buttons.to_vec();
        combination.sort_unstable();
        combination.dedup();

        self.total_blocked += combination.len() as u64;
        for button in &combination {
            *self.by_button.entry(*button).or_insert(0) += 1;
        }
        *self.by_simultaneity.entry(combination.len()).or_insert(0) += 1;
        *self.by_combination.entry(combination).or_insert(0) += 1;
    }

    /// Forwarded presses so far
    pub fn total_allowed(&self) -> u64 {
        self.total_allowed
    }

    /// Suppressed presses so far
    pub fn total_blocked(&self) -> u64 {
        self.total_blocked
    }

    /// All presses that received a verdict
    pub fn total(&self) -> u64 {
        self.total_allowed + self.total_blocked
    }

    /// Share of presses classified as ghosts, in percent
    pub fn blocked_percentage(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.total_blocked as f64 / self.total() as f64) * 100.0
    }

    /// Render the summary report to the given writer.
    ///
    /// `name` and `mode` identify the device instance the way the log
    /// header does.
    pub fn write_summary(&self, name: &str, mode: &str, writer: &mut impl Write) -> io::Result<()> {
        let elapsed = self.started.elapsed().as_secs_f64();
        let per_minute = if elapsed > 0.0 {
            self.total_blocked as f64 / elapsed * 60.0
        } else {
            0.0
        };

        writeln!(writer, "--- ghost input summary: \"{}\" [{}] ---", name, mode)?;
        writeln!(writer, "inputs allowed:        {}", self.total_allowed)?;
        writeln!(writer, "ghost inputs blocked:  {}", self.total_blocked)?;
        writeln!(
            writer,
            "elapsed:               {:.0}s ({:.1} min)",
            elapsed,
            elapsed / 60.0
        )?;
        writeln!(
            writer,
            "ghost input share:     {:.3}%",
            self.blocked_percentage()
        )?;
        writeln!(
            writer,
            "ghost input rate:      {:.3}/min ({:.0}/hr)",
            per_minute,
            per_minute * 60.0
        )?;

        if self.total_blocked > 0 {
            writeln!(writer, "by button:")?;
            let mut by_button: Vec<_> = self.by_button.iter().collect();
            by_button.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (button, count) in by_button {
                writeln!(writer, "  {:<12} {}", button_label(*button), count)?;
            }

            writeln!(writer, "by simultaneity:")?;
            let mut by_simul: Vec<_> = self.by_simultaneity.iter().collect();
            by_simul.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (size, count) in by_simul {
                writeln!(writer, "  {:<12} {}", format!("{} at once", size), count)?;
            }

            writeln!(writer, "by combination:")?;
            let mut by_combo: Vec<_> = self.by_combination.iter().collect();
            by_combo.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (combination, count) in by_combo {
                let labels: Vec<String> =
                    combination.iter().map(|b| button_label(*b)).collect();
                writeln!(writer, "  [{}] {}", labels.join(", "), count)?;
            }
        }

        writeln!(writer, "-------------------------------------------")?;
        Ok(())
    }

    /// Render the summary into a string, for logging line by line
    pub fn summary_string(&self, name: &str, mode: &str) -> String {
        let mut buffer = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_summary(name, mode, &mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
