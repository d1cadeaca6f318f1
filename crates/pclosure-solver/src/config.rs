//! Solver configuration, the pressure-profile seam, and validation.
//!
//! [`ClosureConfig`] is assembled through [`ClosureConfig::builder`] and
//! checked by [`validate()`](ClosureConfig::validate) before any grid
//! memory is touched.

use crate::guard::{NumericGuard, Strictness};
use pclosure_core::{ClosureError, Resolution};
use std::fmt;
use std::sync::Arc;

/// Scalar electron pressure as a function of physical position.
///
/// Implemented for every `Fn(f64, f64, f64) -> f64 + Send + Sync`.
pub trait PressureProfile: Send + Sync {
    /// Pressure at `(x, y, z)`.
    fn pressure(&self, x: f64, y: f64, z: f64) -> f64;
}

impl<F> PressureProfile for F
where
    F: Fn(f64, f64, f64) -> f64 + Send + Sync,
{
    fn pressure(&self, x: f64, y: f64, z: f64) -> f64 {
        self(x, y, z)
    }
}

/// What the driver field holds before the first predictor pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverSeed {
    /// Diagonal seeded with the sampled profile, like the pressure fields.
    #[default]
    Profile,
    /// All components zero.
    Zero,
}

/// Parameters of the pressure-closure solver.
#[derive(Clone)]
pub struct ClosureConfig {
    /// Physical cells per axis of the local subdomain.
    pub resolution: Resolution,
    /// Grid spacing per axis.
    pub spacing: [f64; 3],
    /// Physical coordinate of the subdomain's lower corner.
    pub origin: [f64; 3],
    /// Electron-to-ion mass ratio, `0 < emass <= 1`.
    pub emass: f64,
    /// Isotropization (pitch-angle scattering) rate.
    pub relax_rate: f64,
    /// Macro time step.
    pub dt: f64,
    /// Smooth the pressure every `smooth_stride`-th step.
    pub smooth_stride: u64,
    /// Initial electron pressure.
    pub profile: Arc<dyn PressureProfile>,
    /// Initial content of the driver field.
    pub driver_seed: DriverSeed,
    /// Response to non-finite or oversized tensor components.
    pub strictness: Strictness,
    /// Largest magnitude accepted by the numeric guard.
    pub magnitude_limit: f64,
}

impl fmt::Debug for ClosureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureConfig")
            .field("resolution", &self.resolution)
            .field("spacing", &self.spacing)
            .field("origin", &self.origin)
            .field("emass", &self.emass)
            .field("relax_rate", &self.relax_rate)
            .field("dt", &self.dt)
            .field("smooth_stride", &self.smooth_stride)
            .field("driver_seed", &self.driver_seed)
            .field("strictness", &self.strictness)
            .field("magnitude_limit", &self.magnitude_limit)
            .finish_non_exhaustive()
    }
}

impl ClosureConfig {
    /// Largest sub-step count [`validate`](Self::validate) accepts, which
    /// bounds `emass` from below at roughly `1 / MAX_SUB_STEPS`.
    pub const MAX_SUB_STEPS: usize = 1_000_000;

    /// Create a builder.
    pub fn builder() -> ClosureConfigBuilder {
        ClosureConfigBuilder {
            resolution: None,
            spacing: None,
            origin: [0.0; 3],
            emass: None,
            relax_rate: 0.0,
            dt: None,
            smooth_stride: 1,
            profile: None,
            driver_seed: DriverSeed::default(),
            strictness: Strictness::default(),
            magnitude_limit: NumericGuard::DEFAULT_LIMIT,
        }
    }

    /// Number of gyration sub-steps per call: `round(1 / emass)`, at least 1.
    pub fn sub_steps(&self) -> usize {
        ((1.0 / self.emass).round() as usize).max(1)
    }

    /// Sub-step size: `dt * emass`.
    pub fn sub_dt(&self) -> f64 {
        self.dt * self.emass
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ClosureError> {
        let invalid = |reason: String| Err(ClosureError::InvalidConfig { reason });

        if !self.emass.is_finite() || self.emass <= 0.0 || self.emass > 1.0 {
            return invalid(format!("emass must lie in (0, 1], got {}", self.emass));
        }
        let steps = (1.0 / self.emass).round();
        if steps > Self::MAX_SUB_STEPS as f64 {
            return invalid(format!(
                "emass {} needs {steps:e} sub-steps, more than the {} allowed",
                self.emass,
                Self::MAX_SUB_STEPS
            ));
        }
        for (axis, &h) in self.spacing.iter().enumerate() {
            if !h.is_finite() || h <= 0.0 {
                return invalid(format!("spacing[{axis}] must be finite and positive, got {h}"));
            }
        }
        if let Some(axis) = self.origin.iter().position(|o| !o.is_finite()) {
            return invalid(format!("origin[{axis}] is not finite"));
        }
        if !self.relax_rate.is_finite() || self.relax_rate < 0.0 {
            return invalid(format!(
                "relax_rate must be finite and non-negative, got {}",
                self.relax_rate
            ));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return invalid(format!("dt must be finite and positive, got {}", self.dt));
        }
        if self.smooth_stride == 0 {
            return invalid("smooth_stride must be at least 1".to_string());
        }
        if self.magnitude_limit.is_nan() || self.magnitude_limit <= 0.0 {
            return invalid(format!(
                "magnitude_limit must be positive, got {}",
                self.magnitude_limit
            ));
        }
        Ok(())
    }
}

/// Builder for [`ClosureConfig`].
///
/// Required: `resolution`, `spacing`, `emass`, `dt`, `profile`. Defaults:
/// origin at zero, no isotropization, smoothing every step, driver seeded
/// from the profile, guard in [`Strictness::Warn`].
pub struct ClosureConfigBuilder {
    resolution: Option<Resolution>,
    spacing: Option<[f64; 3]>,
    origin: [f64; 3],
    emass: Option<f64>,
    relax_rate: f64,
    dt: Option<f64>,
    smooth_stride: u64,
    profile: Option<Arc<dyn PressureProfile>>,
    driver_seed: DriverSeed,
    strictness: Strictness,
    magnitude_limit: f64,
}

impl ClosureConfigBuilder {
    /// Set the local resolution.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Set the grid spacing.
    pub fn spacing(mut self, spacing: [f64; 3]) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// Set the subdomain origin.
    pub fn origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    /// Set the electron-to-ion mass ratio.
    pub fn emass(mut self, emass: f64) -> Self {
        self.emass = Some(emass);
        self
    }

    /// Set the isotropization rate.
    pub fn relax_rate(mut self, rate: f64) -> Self {
        self.relax_rate = rate;
        self
    }

    /// Set the macro time step.
    pub fn dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Set the smoothing stride.
    pub fn smooth_stride(mut self, stride: u64) -> Self {
        self.smooth_stride = stride;
        self
    }

    /// Set the initial pressure profile.
    pub fn profile(mut self, profile: impl PressureProfile + 'static) -> Self {
        self.profile = Some(Arc::new(profile));
        self
    }

    /// Set the driver seed.
    pub fn driver_seed(mut self, seed: DriverSeed) -> Self {
        self.driver_seed = seed;
        self
    }

    /// Set the numeric guard strictness.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Set the numeric guard magnitude limit.
    pub fn magnitude_limit(mut self, limit: f64) -> Self {
        self.magnitude_limit = limit;
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClosureError::InvalidConfig`] if a required parameter is
    /// missing or any value fails [`ClosureConfig::validate`].
    pub fn build(self) -> Result<ClosureConfig, ClosureError> {
        let missing = |name: &str| ClosureError::InvalidConfig {
            reason: format!("{name} is required"),
        };
        let config = ClosureConfig {
            resolution: self.resolution.ok_or_else(|| missing("resolution"))?,
            spacing: self.spacing.ok_or_else(|| missing("spacing"))?,
            origin: self.origin,
            emass: self.emass.ok_or_else(|| missing("emass"))?,
            relax_rate: self.relax_rate,
            dt: self.dt.ok_or_else(|| missing("dt"))?,
            smooth_stride: self.smooth_stride,
            profile: self.profile.ok_or_else(|| missing("profile"))?,
            driver_seed: self.driver_seed,
            strictness: self.strictness,
            magnitude_limit: self.magnitude_limit,
        };
        config.validate()?;
        Ok(config)
    }
}
