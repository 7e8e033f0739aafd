//! Timer utilities
//!
//! Phase timing for a run.

use std::time::{Duration, Instant};

/// Stopwatch that records one lap per execution phase
#[derive(Debug)]
pub struct PhaseTimer {
    start: Instant,
    laps: Vec<(String, Duration)>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: Vec::new(),
        }
    }

    /// Close the current phase under `label`
    pub fn lap(&mut self, label: impl Into<String>) {
        let elapsed = self.start.elapsed();
        tracing::debug!("Phase lap at {}ms", elapsed.as_millis());
        self.laps.push((label.into(), elapsed));
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// Cumulative lap marks
    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    /// Duration of each phase, not cumulative
    pub fn lap_times(&self) -> Vec<(String, Duration)> {
        let mut result = Vec::new();
        let mut prev = Duration::ZERO;

        for (label, cumulative) in &self.laps {
            result.push((label.clone(), cumulative.saturating_sub(prev)));
            prev = *cumulative;
        }

        result
    }

    /// Length of the phase recorded as `label`, zero if it never ran
    pub fn phase(&self, label: &str) -> Duration {
        self.lap_times()
            .into_iter()
            .find(|(l, _)| l == label)
            .map(|(_, d)| d)
            .unwrap_or_default()
    }

    pub fn format(&self) -> String {
        let mut output = String::new();
        for (label, duration) in self.lap_times() {
            output.push_str(&format!("{}: {}ms\n", label, duration.as_millis()));
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_phases() {
        let mut timer = PhaseTimer::new();
        sleep(Duration::from_millis(10));
        timer.lap("parallel");
        sleep(Duration::from_millis(10));
        timer.lap("serial");

        assert_eq!(timer.laps().len(), 2);
        assert!(timer.phase("parallel") >= Duration::from_millis(10));
        assert!(timer.phase("serial") >= Duration::from_millis(10));
        assert_eq!(timer.phase("priming"), Duration::ZERO);
        assert!(timer.format().contains("serial: "));
    }
}
