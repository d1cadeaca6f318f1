//! Driver-term construction from pressure and electron-flow gradients.
//!
//! The transport term is
//!
//! ```text
//! D_lm = -P_lm (∇·V) - Σ_n V_n ∂_n P_lm - Σ_n P_ln ∂_n V_m - Σ_n P_mn ∂_n V_l
//! ```
//!
//! evaluated for `l <= m` at every interior cell against the cached
//! pressure snapshot and the electron bulk velocity
//! `V = V_ion - J / n_e`. The fresh term is then combined with the
//! previous driver according to the phase:
//!
//! ```text
//! predictor: D_new = -D_prev + 2 D      (D also stored in DriverAux)
//! corrector: D_new = 0.5 (D + D_aux)
//! ```

use crate::fields::{read_checked, sync, write_checked};
use crate::guard::NumericGuard;
use crate::state::ClosureState;
use crate::stencil::{GradientStencil, LocalGradients};
use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase, Resolution, SymTensor};

/// Builds the next driver field for a phase.
#[derive(Clone, Copy, Debug)]
pub struct TransportTermBuilder {
    stencil: GradientStencil,
    resolution: Resolution,
}

impl TransportTermBuilder {
    /// Builder over `resolution` with grid spacing `spacing`.
    pub fn new(resolution: Resolution, spacing: [f64; 3]) -> Self {
        Self {
            stencil: GradientStencil::new(resolution, spacing),
            resolution,
        }
    }

    /// Electron bulk velocity at every cell-lattice point, ghosts included.
    ///
    /// Reads `IonVelocity`, `CurrentAux` and `ElectronDensity`.
    ///
    /// # Errors
    ///
    /// [`ClosureError::InvalidDensity`] at the first point whose density
    /// is non-positive or non-finite.
    pub fn electron_velocity(
        &self,
        grid: &dyn GridExchange,
        out: &mut [f64],
    ) -> Result<(), ClosureError> {
        let ion = read_checked(grid, FieldKey::IonVelocity, self.resolution)?;
        let current = read_checked(grid, FieldKey::CurrentAux, self.resolution)?;
        let density = read_checked(grid, FieldKey::ElectronDensity, self.resolution)?;

        for (cell, &ne) in density.iter().enumerate() {
            if !ne.is_finite() || ne <= 0.0 {
                return Err(ClosureError::InvalidDensity { cell, value: ne });
            }
            for c in 0..3 {
                let slot = cell * 3 + c;
                out[slot] = ion[slot] - current[slot] / ne;
            }
        }
        Ok(())
    }

    /// Transport term from local gradients and the cell's velocity `v`.
    pub fn transport_term(g: &LocalGradients, v: [f64; 3]) -> SymTensor {
        let p = &g.pressure;
        let div_v = g.grad_v[0][0] + g.grad_v[1][1] + g.grad_v[2][2];
        let mut d = SymTensor::ZERO;
        for l in 0..3 {
            for m in l..3 {
                let mut acc = -p.get(l, m) * div_v;
                for n in 0..3 {
                    acc -= v[n] * g.grad_p[n].get(l, m);
                    acc -= p.get(l, n) * g.grad_v[n][m];
                    acc -= p.get(m, n) * g.grad_v[n][l];
                }
                d.set(l, m, acc);
            }
        }
        d
    }

    /// Transport term at every interior cell; ghost cells hold zero.
    pub fn transport_field(
        &self,
        pressure: &[f64],
        velocity: &[f64],
        guard: &mut NumericGuard,
    ) -> Result<Vec<f64>, ClosureError> {
        let cells = self.stencil.cells();
        let mut out = vec![0.0; cells.len() * 6];
        for idx in self.resolution.interior() {
            let cell = cells.offset(idx[0], idx[1], idx[2])?;
            let g = self.stencil.evaluate(pressure, velocity, idx)?;
            let v = [velocity[cell * 3], velocity[cell * 3 + 1], velocity[cell * 3 + 2]];
            let d = Self::transport_term(&g, v);
            guard.check("transport", cell, &d)?;
            d.write_to(&mut out[cell * 6..]);
        }
        Ok(out)
    }

    /// Phase combination of the previous driver, the fresh transport term
    /// and (corrector only) the predictor's stored term.
    pub fn combine_driver(
        phase: Phase,
        previous: &SymTensor,
        fresh: &SymTensor,
        aux: &SymTensor,
    ) -> SymTensor {
        match phase {
            Phase::Predictor => -*previous + 2.0 * *fresh,
            Phase::Corrector => 0.5 * (*fresh + *aux),
        }
    }

    /// Run the full driver update for `phase`.
    ///
    /// Smooths the current into `CurrentAux`, refreshes the electron
    /// velocity cache, computes the transport term from the cached
    /// pressure, writes the combined driver into `Driver` (and, on a
    /// predictor, the fresh term into `DriverAux`), synchronises what it
    /// wrote and refreshes the driver cache.
    pub fn build(
        &self,
        grid: &mut dyn GridExchange,
        state: &mut ClosureState,
        phase: Phase,
        guard: &mut NumericGuard,
    ) -> Result<(), ClosureError> {
        grid.copy_field(FieldKey::Current, FieldKey::CurrentAux)?;
        grid.smooth(FieldKey::CurrentAux)?;
        grid.apply_boundary(FieldKey::CurrentAux)?;

        self.electron_velocity(&*grid, state.electron_velocity_mut())?;
        let fresh = self.transport_field(state.pressure(), state.electron_velocity(), guard)?;

        let cells = self.stencil.cells();
        let interior: Vec<usize> = self
            .resolution
            .interior()
            .map(|idx| cells.offset(idx[0], idx[1], idx[2]))
            .collect::<Result<_, _>>()?;

        let aux = match phase {
            Phase::Predictor => {
                let buf = write_checked(grid, FieldKey::DriverAux, self.resolution)?;
                for &cell in &interior {
                    buf[cell * 6..cell * 6 + 6].copy_from_slice(&fresh[cell * 6..cell * 6 + 6]);
                }
                sync(grid, FieldKey::DriverAux)?;
                None
            }
            Phase::Corrector => {
                Some(read_checked(&*grid, FieldKey::DriverAux, self.resolution)?.to_vec())
            }
        };

        let mut next = Vec::with_capacity(interior.len());
        for &cell in &interior {
            let previous = state.driver_at(cell);
            let d = SymTensor::from_slice(&fresh[cell * 6..]);
            let stored = aux
                .as_deref()
                .map_or(SymTensor::ZERO, |a| SymTensor::from_slice(&a[cell * 6..]));
            next.push(Self::combine_driver(phase, &previous, &d, &stored));
        }

        let buf = write_checked(grid, FieldKey::Driver, self.resolution)?;
        for (&cell, d) in interior.iter().zip(&next) {
            d.write_to(&mut buf[cell * 6..]);
        }
        sync(grid, FieldKey::Driver)?;
        state.capture_driver(&*grid)
    }
}
