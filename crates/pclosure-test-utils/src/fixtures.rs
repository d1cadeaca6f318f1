//! Reusable plasma states for solver tests.
//!
//! - [`quiescent`]: unit electron density, everything else at rest.
//! - [`uniform_magnetic`]: the same field in both magnetic buffers.
//! - [`linear_ion_flow`]: ion velocity growing linearly along one axis.

use crate::MockGrid;
use pclosure_core::FieldKey;

/// Unit electron density everywhere; velocities, currents and fields stay
/// at whatever the grid already holds (zero for a fresh [`MockGrid`]).
pub fn quiescent(grid: &mut MockGrid) {
    grid.fill_scalar(FieldKey::ElectronDensity, 1.0);
}

/// Fill both magnetic time levels with the uniform vector `b`.
pub fn uniform_magnetic(grid: &mut MockGrid, b: [f64; 3]) {
    grid.fill_vector(FieldKey::Magnetic, b);
    grid.fill_vector(FieldKey::MagneticAux, b);
}

/// Ion velocity whose `axis` component is `slope * spacing * coord[axis]`,
/// so its derivative along `axis` is exactly `slope`.
pub fn linear_ion_flow(grid: &mut MockGrid, axis: usize, slope: f64, spacing: f64) {
    grid.fill_vector_with(FieldKey::IonVelocity, |idx| {
        let mut v = [0.0; 3];
        v[axis] = slope * spacing * idx[axis] as f64;
        v
    });
}
