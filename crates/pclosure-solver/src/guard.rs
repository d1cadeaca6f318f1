//! Numerical sanity checking for tensors produced by the solver.
//!
//! [`NumericGuard`] is the single validation routine run on every
//! integrated pressure tensor and every freshly computed driver term.
//! Its response is chosen by [`Strictness`].

use pclosure_core::{ClosureError, SymTensor};

/// How the guard responds to a non-finite or oversized component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Skip all checks.
    Off,
    /// Log each offending tensor with `log::warn!` and keep going.
    #[default]
    Warn,
    /// Fail with [`ClosureError::NumericalInstability`].
    Abort,
}

/// Validation hook for tensor values.
#[derive(Clone, Debug)]
pub struct NumericGuard {
    strictness: Strictness,
    limit: f64,
    violations: usize,
}

impl NumericGuard {
    /// Default magnitude above which a component is considered unstable.
    pub const DEFAULT_LIMIT: f64 = 1e30;

    /// Create a guard.
    pub fn new(strictness: Strictness, limit: f64) -> Self {
        Self {
            strictness,
            limit,
            violations: 0,
        }
    }

    /// The configured response.
    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Check one tensor at flat cell index `cell`.
    ///
    /// Under [`Strictness::Warn`] at most one warning is emitted per tensor,
    /// naming the first bad component.
    pub fn check(
        &mut self,
        stage: &'static str,
        cell: usize,
        tensor: &SymTensor,
    ) -> Result<(), ClosureError> {
        self.inspect(stage, cell, None, tensor)
    }

    /// [`check`](Self::check) for a sub-cycled tensor, recording the
    /// sub-step `sub_step` that produced it.
    pub fn check_sub_step(
        &mut self,
        cell: usize,
        sub_step: usize,
        tensor: &SymTensor,
    ) -> Result<(), ClosureError> {
        self.inspect("sub-cycle", cell, Some(sub_step), tensor)
    }

    /// Whether `tensor` passes without a violation.
    pub fn accepts(&self, tensor: &SymTensor) -> bool {
        self.strictness == Strictness::Off || self.first_bad(tensor).is_none()
    }

    fn first_bad(&self, tensor: &SymTensor) -> Option<(usize, f64)> {
        tensor
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || v.abs() > self.limit)
            .map(|(component, &value)| (component, value))
    }

    fn inspect(
        &mut self,
        stage: &'static str,
        cell: usize,
        sub_step: Option<usize>,
        tensor: &SymTensor,
    ) -> Result<(), ClosureError> {
        if self.strictness == Strictness::Off {
            return Ok(());
        }
        let Some((component, value)) = self.first_bad(tensor) else {
            return Ok(());
        };
        match self.strictness {
            Strictness::Abort => Err(ClosureError::NumericalInstability {
                stage,
                cell,
                component,
                value,
                sub_step,
            }),
            _ => {
                self.violations += 1;
                log::warn!(
                    "{stage}: cell {cell} component {component} is {value} at sub-step {sub_step:?} (limit {})",
                    self.limit
                );
                Ok(())
            }
        }
    }

    /// Violations counted since the last [`reset`](Self::reset).
    pub fn violations(&self) -> usize {
        self.violations
    }

    /// Clear the violation counter.
    pub fn reset(&mut self) {
        self.violations = 0;
    }
}

impl Default for NumericGuard {
    fn default() -> Self {
        Self::new(Strictness::default(), Self::DEFAULT_LIMIT)
    }
}
