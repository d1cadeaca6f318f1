//! Predictor/corrector alternation contract.

use pclosure_core::{ClosureError, Phase};

/// Enforces strict `Predictor, Corrector, Predictor, ...` ordering of
/// external calls. A rejected or failed call leaves the expectation
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseSequencer {
    expected: Phase,
    completed: u64,
}

impl PhaseSequencer {
    /// A sequencer waiting for the first predictor.
    pub fn new() -> Self {
        Self {
            expected: Phase::Predictor,
            completed: 0,
        }
    }

    /// Phase the next call must carry.
    pub fn expected(&self) -> Phase {
        self.expected
    }

    /// Number of phases completed through this sequencer.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Reject `phase` unless it is the expected one.
    pub fn check(&self, phase: Phase) -> Result<(), ClosureError> {
        if phase != self.expected {
            return Err(ClosureError::PhaseOrder {
                expected: self.expected,
                got: phase,
            });
        }
        Ok(())
    }

    /// Record a completed phase.
    pub fn advance(&mut self) {
        self.expected = self.expected.next();
        self.completed += 1;
    }
}

impl Default for PhaseSequencer {
    fn default() -> Self {
        Self::new()
    }
}
