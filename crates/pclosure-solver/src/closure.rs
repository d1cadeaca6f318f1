//! The pressure-closure solver: initialisation and per-phase advance.

use crate::checkpoint::Checkpoint;
use crate::config::{ClosureConfig, DriverSeed};
use crate::fields::{read_checked, write_checked};
use crate::guard::NumericGuard;
use crate::integrator::SubcycledIntegrator;
use crate::report::AdvanceReport;
use crate::sequencer::PhaseSequencer;
use crate::state::ClosureState;
use crate::transport::TransportTermBuilder;
use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase, SymTensor};
use std::time::Instant;

const SEEDED: [FieldKey; 3] = [FieldKey::Pressure, FieldKey::PressureAux, FieldKey::Driver];

/// Anisotropic electron-pressure closure bound to one host subdomain.
///
/// Construct with [`PressureClosure::new`], which seeds the host fields
/// from the configured profile and runs one predictor and one corrector
/// pass. Afterwards the host calls [`advance`](Self::advance) once per
/// phase, strictly alternating predictor and corrector.
///
/// A phase that fails is rolled back: every host field it wrote and every
/// cache it refreshed is restored, and the sequencer still expects the
/// same phase, so the host may retry once it has fixed the cause.
///
/// # Examples
///
/// ```
/// use pclosure_core::{Phase, Resolution};
/// use pclosure_solver::{ClosureConfig, PressureClosure};
/// use pclosure_test_utils::{fixtures, MockGrid};
///
/// let mut grid = MockGrid::cubic(4);
/// fixtures::quiescent(&mut grid);
/// let config = ClosureConfig::builder()
///     .resolution(Resolution::new(4, 4, 4).unwrap())
///     .spacing([1.0; 3])
///     .emass(0.1)
///     .dt(0.01)
///     .profile(|_x: f64, _y: f64, _z: f64| 1.0)
///     .build()
///     .unwrap();
///
/// let mut closure = PressureClosure::new(config, &mut grid).unwrap();
/// let report = closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
/// assert_eq!(report.sub_steps, 10);
/// closure.advance(&mut grid, Phase::Corrector, 1).unwrap();
/// ```
#[derive(Debug)]
pub struct PressureClosure {
    config: ClosureConfig,
    state: ClosureState,
    integrator: SubcycledIntegrator,
    transport: TransportTermBuilder,
    guard: NumericGuard,
    sequencer: PhaseSequencer,
    halted: bool,
}

impl PressureClosure {
    /// Seed the host fields and bring the solver to a self-consistent
    /// start state.
    ///
    /// # Errors
    ///
    /// - [`ClosureError::InvalidConfig`] if `config` fails validation or
    ///   its resolution differs from the host's.
    /// - [`ClosureError::MissingField`] / [`ClosureError::FieldSizeMismatch`]
    ///   if the host lacks a field or sizes it wrongly.
    /// - [`ClosureError::InvalidProfile`] if the profile yields a
    ///   non-finite value.
    /// - Anything the first predictor/corrector pass returns.
    pub fn new(config: ClosureConfig, grid: &mut dyn GridExchange) -> Result<Self, ClosureError> {
        config.validate()?;
        check_host(&config, &*grid)?;

        let res = config.resolution;
        let cells = res.cell_lattice();
        let mut samples = Vec::with_capacity(res.interior_count());
        for idx in res.interior() {
            let x = res.cell_centre(idx, config.spacing, config.origin);
            let p = config.profile.pressure(x[0], x[1], x[2]);
            if !p.is_finite() {
                return Err(ClosureError::InvalidProfile {
                    position: x,
                    value: p,
                });
            }
            samples.push((cells.offset(idx[0], idx[1], idx[2])?, p));
        }

        for field in SEEDED {
            let zero_driver = field == FieldKey::Driver && config.driver_seed == DriverSeed::Zero;
            let buf = write_checked(grid, field, res)?;
            if zero_driver {
                buf.fill(0.0);
                continue;
            }
            for &(cell, p) in &samples {
                SymTensor::isotropic(p).write_to(&mut buf[cell * 6..]);
            }
        }
        for field in SEEDED {
            grid.exchange_halo(field)?;
        }
        for field in SEEDED {
            grid.apply_boundary(field)?;
        }
        grid.copy_field(FieldKey::Driver, FieldKey::DriverAux)?;

        let mut state = ClosureState::new(res);
        state.capture_pressure(&*grid)?;
        state.capture_driver(&*grid)?;
        state.capture_magnetic(&*grid, FieldKey::Magnetic)?;

        let mut closure = Self {
            integrator: SubcycledIntegrator::new(&config),
            transport: TransportTermBuilder::new(res, config.spacing),
            guard: NumericGuard::new(config.strictness, config.magnitude_limit),
            sequencer: PhaseSequencer::new(),
            halted: false,
            state,
            config,
        };
        let started = Instant::now();
        closure.run_phase(grid, Phase::Predictor, None)?;
        closure.run_phase(grid, Phase::Corrector, None)?;

        log::info!(
            "pressure closure ready: {:?} cells, {} sub-steps of {:e}, driver seed {:?}, init {:?}",
            res.cells(),
            closure.integrator.sub_steps(),
            closure.integrator.sub_dt(),
            closure.config.driver_seed,
            started.elapsed()
        );
        Ok(closure)
    }

    /// Advance through `phase` of host step `step`.
    ///
    /// # Errors
    ///
    /// - [`ClosureError::Halted`] if an earlier rollback failed.
    /// - [`ClosureError::PhaseOrder`] if `phase` breaks the
    ///   predictor/corrector alternation; in that case nothing is touched.
    /// - Otherwise any error from the integrator or transport stage, after
    ///   the phase has been rolled back.
    pub fn advance(
        &mut self,
        grid: &mut dyn GridExchange,
        phase: Phase,
        step: u64,
    ) -> Result<AdvanceReport, ClosureError> {
        if self.halted {
            return Err(ClosureError::Halted);
        }
        self.sequencer.check(phase)?;
        check_host(&self.config, &*grid)?;
        let report = self.run_phase(grid, phase, Some(step))?;
        self.sequencer.advance();
        Ok(report)
    }

    /// [`advance`](Self::advance) with a raw host phase code
    /// (`0` predictor, `1` corrector).
    pub fn advance_code(
        &mut self,
        grid: &mut dyn GridExchange,
        code: i32,
        step: u64,
    ) -> Result<AdvanceReport, ClosureError> {
        let phase = Phase::try_from(code)?;
        self.advance(grid, phase, step)
    }

    /// Phase the next [`advance`](Self::advance) must carry.
    pub fn next_phase(&self) -> Phase {
        self.sequencer.expected()
    }

    /// Persistent caches.
    pub fn state(&self) -> &ClosureState {
        &self.state
    }

    /// Whether a failed rollback has stopped the solver.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The configuration the solver was built with.
    pub fn config(&self) -> &ClosureConfig {
        &self.config
    }

    fn smoothing_due(&self, step: Option<u64>) -> bool {
        let stride = self.config.smooth_stride;
        match step {
            Some(s) => s % stride == 0,
            None => stride == 1,
        }
    }

    fn run_phase(
        &mut self,
        grid: &mut dyn GridExchange,
        phase: Phase,
        step: Option<u64>,
    ) -> Result<AdvanceReport, ClosureError> {
        let checkpoint = Checkpoint::take(&*grid, &self.state, phase)?;
        match self.execute_phase(grid, phase, step) {
            Ok(report) => Ok(report),
            Err(err) => {
                match checkpoint.restore(grid, &mut self.state) {
                    Ok(()) => log::warn!("{phase} step {step:?} rolled back: {err}"),
                    Err(restore) => {
                        log::error!(
                            "{phase} step {step:?} failed ({err}) and could not be rolled back: {restore}"
                        );
                        self.halted = true;
                    }
                }
                Err(err)
            }
        }
    }

    fn execute_phase(
        &mut self,
        grid: &mut dyn GridExchange,
        phase: Phase,
        step: Option<u64>,
    ) -> Result<AdvanceReport, ClosureError> {
        self.guard.reset();
        let smoothed = self.smoothing_due(step);

        let mut timings =
            self.integrator
                .run(grid, &mut self.state, phase, smoothed, &mut self.guard)?;

        let started = Instant::now();
        self.transport
            .build(grid, &mut self.state, phase, &mut self.guard)?;
        timings.driver = started.elapsed();

        log::debug!(
            "{phase} step {step:?}: {} sub-steps of {:e}, precompute {:?}, sub-cycle {:?}, write-back {:?}, driver {:?}",
            self.integrator.sub_steps(),
            self.integrator.sub_dt(),
            timings.precompute,
            timings.subcycle,
            timings.write_back,
            timings.driver
        );

        Ok(AdvanceReport {
            phase,
            step,
            sub_steps: self.integrator.sub_steps(),
            smoothed,
            violations: self.guard.violations(),
            timings,
        })
    }
}

fn check_host(config: &ClosureConfig, grid: &dyn GridExchange) -> Result<(), ClosureError> {
    let host = grid.resolution();
    if host != config.resolution {
        return Err(ClosureError::InvalidConfig {
            reason: format!(
                "host resolution {:?} differs from configured {:?}",
                host.cells(),
                config.resolution.cells()
            ),
        });
    }
    for field in FieldKey::ALL {
        read_checked(grid, field, host)?;
    }
    Ok(())
}
