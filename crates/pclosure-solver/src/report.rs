//! Per-call results returned to the host.

use pclosure_core::Phase;
use std::time::Duration;

/// Wall-clock time spent in each stage of one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Magnetic averaging and isotropization precompute.
    pub precompute: Duration,
    /// Sub-cycled integration of every interior cell.
    pub subcycle: Duration,
    /// Pressure write-back, synchronisation and optional smoothing.
    pub write_back: Duration,
    /// Transport term and driver combination.
    pub driver: Duration,
}

impl PhaseTimings {
    /// Sum of all stages.
    pub fn total(&self) -> Duration {
        self.precompute + self.subcycle + self.write_back + self.driver
    }
}

/// Outcome of one predictor or corrector call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Phase that ran.
    pub phase: Phase,
    /// Host step index, `None` during initialisation.
    pub step: Option<u64>,
    /// Sub-steps taken per cell.
    pub sub_steps: usize,
    /// Whether the pressure field was smoothed.
    pub smoothed: bool,
    /// Tensors flagged by the numeric guard under `Strictness::Warn`.
    pub violations: usize,
    /// Stage timings.
    pub timings: PhaseTimings,
}
