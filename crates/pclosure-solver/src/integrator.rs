//! Sub-cycled integration of the pressure tensor through one phase.
//!
//! Electron gyration is stiff: its frequency scales as `|B| / emass`. Each
//! call therefore splits the macro step into `sub_steps = round(1/emass)`
//! forward-Euler steps of size `dt * emass`, per interior cell:
//!
//! ```text
//! B_m    = B_0 + m * ΔB,            ΔB = (B_target - B_0) / sub_steps
//! ω, b   = |B_m| / emass, B_m / |B_m|      (ω = 0 when |B_m| <= 1e-8)
//! P     += sub_dt * (driver + ω * rotation(P, b) + iso)
//! ```
//!
//! `driver` and `iso` are frozen for the call. `B_0` is the corner
//! average of the cached start-of-step field; `B_target` the corner
//! average of the phase's magnetic field.

use crate::config::ClosureConfig;
use crate::fields::{read_checked, sync, write_checked};
use crate::guard::NumericGuard;
use crate::isotropization::Isotropization;
use crate::report::PhaseTimings;
use crate::state::ClosureState;
use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase, Resolution, SymTensor};
use std::time::Instant;

/// Per-cell inputs, fixed for the duration of one call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellInputs {
    /// Pressure at the start of the call.
    pub pressure: SymTensor,
    /// Driver term.
    pub driver: SymTensor,
    /// Isotropization term evaluated at `pressure`.
    pub isotropization: SymTensor,
    /// Magnetic field at sub-step 0.
    pub b_start: [f64; 3],
    /// Magnetic increment per sub-step.
    pub b_step: [f64; 3],
}

/// Forward-Euler sub-cycler for the gyrotropic pressure equation.
#[derive(Clone, Copy, Debug)]
pub struct SubcycledIntegrator {
    emass: f64,
    sub_steps: usize,
    sub_dt: f64,
    iso: Isotropization,
    resolution: Resolution,
}

impl SubcycledIntegrator {
    /// Field magnitude at or below which gyration is switched off.
    pub const FIELD_FLOOR: f64 = 1e-8;

    /// Integrator for `config`.
    pub fn new(config: &ClosureConfig) -> Self {
        Self {
            emass: config.emass,
            sub_steps: config.sub_steps(),
            sub_dt: config.sub_dt(),
            iso: Isotropization::new(config.relax_rate),
            resolution: config.resolution,
        }
    }

    /// Sub-steps per call.
    pub fn sub_steps(&self) -> usize {
        self.sub_steps
    }

    /// Size of one sub-step.
    pub fn sub_dt(&self) -> f64 {
        self.sub_dt
    }

    /// The isotropization model.
    pub fn isotropization(&self) -> &Isotropization {
        &self.iso
    }

    /// Gyration frequency and unit field direction for `b`.
    pub fn gyration(&self, b: [f64; 3]) -> (f64, [f64; 3]) {
        let mag = (b[0] * b[0] + b[1] * b[1] + b[2] * b[2]).sqrt();
        if mag > Self::FIELD_FLOOR {
            (mag / self.emass, [b[0] / mag, b[1] / mag, b[2] / mag])
        } else {
            (0.0, [0.0; 3])
        }
    }

    /// Gyrotropic rotation of `p` about unit vector `b`.
    pub fn rotation(p: &SymTensor, b: [f64; 3]) -> SymTensor {
        let [xx, xy, xz, yy, yz, zz] = p.0;
        let [bx, by, bz] = b;
        SymTensor([
            -2.0 * (xy * bz - xz * by),
            -(xz * bx - xx * bz + yy * bz - yz * by),
            -(xx * by - xy * bx + yz * bz - zz * by),
            -2.0 * (yz * bx - xy * bz),
            -(xy * by - yy * bx + zz * bx - xz * bz),
            -2.0 * (xz * by - yz * bx),
        ])
    }

    /// Integrate one cell, calling `observe(m, &p)` after sub-step `m`.
    pub fn integrate_cell(
        &self,
        inputs: &CellInputs,
        mut observe: impl FnMut(usize, &SymTensor),
    ) -> SymTensor {
        let mut p = inputs.pressure;
        let mut b = inputs.b_start;
        for m in 0..self.sub_steps {
            let (omega, unit) = self.gyration(b);
            let rot = if omega == 0.0 {
                SymTensor::ZERO
            } else {
                Self::rotation(&p, unit)
            };
            for h in 0..6 {
                p.0[h] += self.sub_dt
                    * (inputs.driver[h] + omega * rot[h] + inputs.isotropization[h]);
            }
            for a in 0..3 {
                b[a] += inputs.b_step[a];
            }
            observe(m, &p);
        }
        p
    }

    fn corner_average(
        &self,
        grid: &dyn GridExchange,
        node: usize,
        field: &[f64],
    ) -> Result<[f64; 3], ClosureError> {
        let nodes = self.resolution.node_lattice();
        let corners = grid.node_neighbourhood(node)?;
        if corners.len() != 8 {
            return Err(ClosureError::NeighbourhoodSize {
                node,
                len: corners.len(),
            });
        }
        let mut avg = [0.0; 3];
        for &corner in &corners {
            nodes.coords(corner)?;
            for a in 0..3 {
                avg[a] += 0.125 * field[corner * 3 + a];
            }
        }
        Ok(avg)
    }

    /// Gather the frozen inputs of every interior cell for `phase`.
    pub fn precompute(
        &self,
        grid: &dyn GridExchange,
        state: &ClosureState,
        phase: Phase,
    ) -> Result<Vec<(usize, CellInputs)>, ClosureError> {
        let cells = self.resolution.cell_lattice();
        let nodes = self.resolution.node_lattice();
        let source = read_checked(grid, phase.pressure_source(), self.resolution)?;
        let driver = read_checked(grid, FieldKey::Driver, self.resolution)?;
        let target = read_checked(grid, phase.magnetic_target(), self.resolution)?;
        let steps = self.sub_steps as f64;

        let mut out = Vec::with_capacity(self.resolution.interior_count());
        for [i, j, k] in self.resolution.interior() {
            let cell = cells.offset(i, j, k)?;
            let node = nodes.offset(i, j, k)?;
            let b_start = self.corner_average(grid, node, state.magnetic())?;
            let b_end = self.corner_average(grid, node, target)?;
            let pressure = SymTensor::from_slice(&source[cell * 6..]);
            out.push((
                cell,
                CellInputs {
                    pressure,
                    driver: SymTensor::from_slice(&driver[cell * 6..]),
                    isotropization: self.iso.term(&pressure),
                    b_start,
                    b_step: [0, 1, 2].map(|a| (b_end[a] - b_start[a]) / steps),
                },
            ));
        }
        Ok(out)
    }

    /// Advance the pressure through `phase`.
    ///
    /// Every sub-step of every cell passes through `guard`; nothing is
    /// written to the grid until all cells are integrated. Writes the result into `Pressure`, synchronises it, smooths it when
    /// `smooth` is set, and refreshes the pressure cache. A predictor also
    /// mirrors the result into `PressureAux` and moves the magnetic cache
    /// to `MagneticAux`. The returned timings leave `driver` at zero.
    pub fn run(
        &self,
        grid: &mut dyn GridExchange,
        state: &mut ClosureState,
        phase: Phase,
        smooth: bool,
        guard: &mut NumericGuard,
    ) -> Result<PhaseTimings, ClosureError> {
        let mut timings = PhaseTimings::default();

        let started = Instant::now();
        let inputs = self.precompute(&*grid, state, phase)?;
        timings.precompute = started.elapsed();

        let started = Instant::now();
        let mut results = Vec::with_capacity(inputs.len());
        for (cell, input) in &inputs {
            let mut first_bad = None;
            let p = self.integrate_cell(input, |m, q| {
                if first_bad.is_none() && !guard.accepts(q) {
                    first_bad = Some((m, *q));
                }
            });
            if let Some((m, q)) = first_bad {
                guard.check_sub_step(*cell, m, &q)?;
            }
            results.push((*cell, p));
        }
        timings.subcycle = started.elapsed();

        let started = Instant::now();
        let buf = write_checked(grid, FieldKey::Pressure, self.resolution)?;
        for (cell, p) in &results {
            p.write_to(&mut buf[cell * 6..]);
        }
        sync(grid, FieldKey::Pressure)?;
        if smooth {
            grid.smooth(FieldKey::Pressure)?;
            grid.apply_boundary(FieldKey::Pressure)?;
        }
        state.capture_pressure(&*grid)?;

        if phase == Phase::Predictor {
            grid.copy_field(FieldKey::Pressure, FieldKey::PressureAux)?;
            grid.exchange_halo(FieldKey::PressureAux)?;
            state.capture_magnetic(&*grid, FieldKey::MagneticAux)?;
        }
        timings.write_back = started.elapsed();

        Ok(timings)
    }
}
