//! Benchmark profiles for the pclosure solver.
//!
//! - [`reference_config`]: solver parameters for an `n³` subdomain
//! - [`reference_grid`]: a seeded, non-trivial plasma state on a [`MockGrid`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use pclosure_core::{FieldKey, Resolution, SymTensor};
use pclosure_solver::{ClosureConfig, Strictness};
use pclosure_test_utils::{fixtures, MockGrid};

/// Solver configuration for an `n × n × n` benchmark subdomain.
///
/// `emass = 0.04` (25 sub-steps), isotropization on, smoothing every
/// fourth step, guard in warn mode.
pub fn reference_config(n: usize) -> ClosureConfig {
    ClosureConfig::builder()
        .resolution(Resolution::new(n, n, n).unwrap())
        .spacing([0.5; 3])
        .emass(0.04)
        .dt(0.01)
        .relax_rate(0.1)
        .smooth_stride(4)
        .strictness(Strictness::Warn)
        .profile(|x: f64, y: f64, z: f64| 1.0 + 0.1 * (x + 0.5 * y - 0.25 * z).sin())
        .build()
        .unwrap()
}

/// An `n³` grid with unit density, a tilted uniform field, sheared ion
/// flow and seeded noise on the current and pressure.
pub fn reference_grid(n: usize, seed: u64) -> MockGrid {
    let mut grid = MockGrid::cubic(n);
    fixtures::quiescent(&mut grid);
    fixtures::uniform_magnetic(&mut grid, [0.2, 0.1, 1.0]);
    grid.fill_vector_with(FieldKey::IonVelocity, |[i, j, _k]| {
        [0.01 * j as f64, -0.01 * i as f64, 0.0]
    });
    grid.perturb(FieldKey::Current, seed, 0.01);
    grid.fill_tensor(FieldKey::PressureAux, SymTensor::isotropic(1.0));
    grid
}
