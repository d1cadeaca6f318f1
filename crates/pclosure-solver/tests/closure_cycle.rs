//! Integration tests: full predictor/corrector cycles on a mock host grid.
//!
//! Covers initialisation, exact preservation of a quiescent state,
//! isotropization toward the trace, magnetic interpolation across the
//! phases, the exact driver combination rules, phase-order enforcement,
//! and the order of host synchronisation calls.

use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase, Resolution, SymTensor};
use pclosure_solver::{
    ClosureConfig, ClosureConfigBuilder, DriverSeed, NumericGuard, PressureClosure, Strictness,
    SubcycledIntegrator, TransportTermBuilder,
};
use pclosure_test_utils::{fixtures, GridOp, MockGrid};

// ── Helpers ─────────────────────────────────────────────────────────

fn base(n: usize) -> ClosureConfigBuilder {
    ClosureConfig::builder()
        .resolution(Resolution::new(n, n, n).unwrap())
        .spacing([1.0; 3])
        .emass(0.1)
        .dt(0.01)
        .strictness(Strictness::Abort)
}

fn ops(grid: &MockGrid) -> Vec<(GridOp, FieldKey)> {
    grid.calls().iter().map(|c| (c.op, c.field)).collect()
}

fn cycle(closure: &mut PressureClosure, grid: &mut MockGrid, step: u64) {
    closure.advance(grid, Phase::Predictor, step).unwrap();
    closure.advance(grid, Phase::Corrector, step).unwrap();
}

// ── Steady states ───────────────────────────────────────────────────

#[test]
fn quiescent_plasma_stays_exactly_isotropic() {
    let mut grid = MockGrid::cubic(4);
    fixtures::quiescent(&mut grid);
    let config = base(4)
        .driver_seed(DriverSeed::Zero)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    assert_eq!(config.sub_steps(), 10);

    let mut closure = PressureClosure::new(config, &mut grid).unwrap();
    cycle(&mut closure, &mut grid, 1);

    let unit = SymTensor::diagonal(1.0, 1.0, 1.0);
    for t in grid.interior_tensors(FieldKey::Pressure) {
        assert_eq!(t, unit);
    }
    for t in grid.interior_tensors(FieldKey::PressureAux) {
        assert_eq!(t, unit);
    }
    for t in grid.interior_tensors(FieldKey::Driver) {
        assert_eq!(t, SymTensor::ZERO);
    }
}

#[test]
fn profile_seeded_driver_is_spent_during_initialisation() {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    let config = base(2)
        .emass(0.5)
        .dt(0.1)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();

    // Predictor adds dt * diag(1); the combined driver -diag(1) takes it
    // back out in the corrector.
    let closure = PressureClosure::new(config, &mut grid).unwrap();
    for t in grid.interior_tensors(FieldKey::Pressure) {
        for h in [SymTensor::XX, SymTensor::YY, SymTensor::ZZ] {
            assert!((t[h] - 1.0).abs() < 1e-12, "{t:?}");
        }
    }
    for t in grid.interior_tensors(FieldKey::Driver) {
        assert_eq!(t, SymTensor::ZERO);
    }
    assert_eq!(closure.next_phase(), Phase::Predictor);
}

#[test]
fn uniform_field_isotropic_pressure_is_a_fixed_point() {
    let mut grid = MockGrid::cubic(3);
    fixtures::quiescent(&mut grid);
    fixtures::uniform_magnetic(&mut grid, [0.25, -0.5, 1.0]);
    let config = base(3)
        .relax_rate(0.5)
        .driver_seed(DriverSeed::Zero)
        .profile(|_x: f64, _y: f64, _z: f64| 1.5)
        .build()
        .unwrap();

    let mut closure = PressureClosure::new(config, &mut grid).unwrap();
    for step in 1..=3 {
        cycle(&mut closure, &mut grid, step);
    }
    for t in grid.interior_tensors(FieldKey::Pressure) {
        assert_eq!(t, SymTensor::isotropic(1.5));
    }
}

#[test]
fn inexact_pressure_level_stays_fixed_under_relaxation() {
    let mut grid = MockGrid::cubic(3);
    fixtures::quiescent(&mut grid);
    let config = base(3)
        .driver_seed(DriverSeed::Zero)
        .relax_rate(0.5)
        .smooth_stride(1000)
        .profile(|_x: f64, _y: f64, _z: f64| 0.1)
        .build()
        .unwrap();

    let mut closure = PressureClosure::new(config, &mut grid).unwrap();
    for step in 1..=5 {
        cycle(&mut closure, &mut grid, step);
    }
    for t in grid.interior_tensors(FieldKey::Pressure) {
        assert_eq!(t, SymTensor::isotropic(0.1));
    }
}

// ── Magnetic interpolation ──────────────────────────────────────────

#[test]
fn corrector_starts_from_predictor_target_field() {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    fixtures::uniform_magnetic(&mut grid, [0.0, 0.0, 1.0]);
    let config = base(2)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();

    grid.fill_vector_with(FieldKey::MagneticAux, |[i, j, k]| {
        [0.5 * i as f64, 0.25 * j as f64, 1.0 + k as f64]
    });
    grid.set_vector_at(FieldKey::Magnetic, [2, 2, 2], [4.0, 0.0, 0.0]);
    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert_eq!(
        closure.state().magnetic(),
        grid.read(FieldKey::MagneticAux).unwrap()
    );

    let integrator = SubcycledIntegrator::new(closure.config());
    let inputs = integrator
        .precompute(&grid, closure.state(), Phase::Corrector)
        .unwrap();
    let cell = grid.cells().offset(2, 2, 2).unwrap();
    let (_, at) = inputs.iter().find(|(c, _)| *c == cell).unwrap();
    // Corners (1..=2)^3: the predictor's field at the start, the current
    // field (seven z-hat corners and one 4 x-hat) as the target.
    let start = [0.75, 0.375, 2.5];
    let end = [0.5, 0.0, 0.875];
    assert_eq!(at.b_start, start);
    assert_eq!(at.b_step, [0, 1, 2].map(|a| (end[a] - start[a]) / 10.0));

    closure.advance(&mut grid, Phase::Corrector, 1).unwrap();
    assert_eq!(
        closure.state().magnetic(),
        grid.read(FieldKey::MagneticAux).unwrap()
    );
}

// ── Relaxation ──────────────────────────────────────────────────────

#[test]
fn isotropization_conserves_trace_and_approaches_mean() {
    let mut grid = MockGrid::cubic(4);
    fixtures::quiescent(&mut grid);
    let config = base(4)
        .dt(0.1)
        .relax_rate(0.5)
        .driver_seed(DriverSeed::Zero)
        .profile(|_x: f64, _y: f64, _z: f64| 4.0 / 3.0)
        .build()
        .unwrap();
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();

    let start = SymTensor::diagonal(2.0, 1.0, 1.0);
    grid.fill_tensor(FieldKey::Pressure, start);
    grid.fill_tensor(FieldKey::PressureAux, start);

    let mut gap = 2.0 - 4.0 / 3.0;
    for step in 1..=40 {
        cycle(&mut closure, &mut grid, step);
        let cells = grid.interior_tensors(FieldKey::Pressure);
        let xx = cells[0][SymTensor::XX];
        for t in &cells {
            assert!((t.trace() - 4.0).abs() < 1e-12, "trace drifted: {t:?}");
            assert_eq!(t[SymTensor::XX], xx);
        }
        let next_gap = xx - 4.0 / 3.0;
        assert!(next_gap > 0.0 && next_gap < gap, "step {step}: {next_gap} vs {gap}");
        gap = next_gap;
    }
    assert!(gap < 0.02);
}

// ── Driver combination ──────────────────────────────────────────────

#[test]
fn driver_follows_predictor_and_corrector_rules_exactly() {
    let n = 3;
    let mut grid = MockGrid::cubic(n);
    fixtures::quiescent(&mut grid);
    fixtures::uniform_magnetic(&mut grid, [0.0, 0.0, 1.0]);
    fixtures::linear_ion_flow(&mut grid, 0, 0.1, 1.0);
    grid.perturb(FieldKey::Current, 7, 0.01);
    let config = base(n)
        .profile(|x: f64, y: f64, _z: f64| 1.0 + 0.1 * x + 0.05 * y)
        .build()
        .unwrap();
    let spacing = config.spacing;
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();
    let cells = grid.cells();
    let interior: Vec<usize> = Resolution::new(n, n, n)
        .unwrap()
        .interior()
        .map(|[i, j, k]| cells.offset(i, j, k).unwrap())
        .collect();

    let previous = closure.state().driver().to_vec();
    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    let stored = grid.read(FieldKey::DriverAux).unwrap().to_vec();
    let driver = grid.read(FieldKey::Driver).unwrap().to_vec();
    for &cell in &interior {
        for h in 0..6 {
            let slot = cell * 6 + h;
            assert_eq!(driver[slot], 2.0 * stored[slot] - previous[slot]);
        }
    }

    closure.advance(&mut grid, Phase::Corrector, 1).unwrap();
    let transport = TransportTermBuilder::new(grid.resolution(), spacing);
    let mut guard = NumericGuard::new(Strictness::Abort, NumericGuard::DEFAULT_LIMIT);
    let fresh = transport
        .transport_field(
            closure.state().pressure(),
            closure.state().electron_velocity(),
            &mut guard,
        )
        .unwrap();
    let driver = grid.read(FieldKey::Driver).unwrap().to_vec();
    assert_eq!(grid.read(FieldKey::DriverAux).unwrap().to_vec(), stored);
    for &cell in &interior {
        for h in 0..6 {
            let slot = cell * 6 + h;
            assert_eq!(driver[slot], 0.5 * (fresh[slot] + stored[slot]));
        }
    }
    assert_eq!(closure.state().driver(), &driver[..]);
}

// ── Sequencing ──────────────────────────────────────────────────────

#[test]
fn phases_must_alternate() {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    let config = base(2)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();
    grid.clear_calls();

    assert_eq!(
        closure.advance(&mut grid, Phase::Corrector, 1).unwrap_err(),
        ClosureError::PhaseOrder {
            expected: Phase::Predictor,
            got: Phase::Corrector,
        }
    );
    assert!(grid.calls().is_empty());

    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert_eq!(
        closure.advance(&mut grid, Phase::Predictor, 2).unwrap_err(),
        ClosureError::PhaseOrder {
            expected: Phase::Corrector,
            got: Phase::Predictor,
        }
    );
    closure.advance(&mut grid, Phase::Corrector, 1).unwrap();
    assert_eq!(closure.next_phase(), Phase::Predictor);
}

#[test]
fn host_sync_calls_follow_the_cycle() {
    use FieldKey::*;
    use GridOp::*;

    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    let config = base(2)
        .smooth_stride(2)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();

    let predictor_init = [
        (ExchangeHalo, Pressure),
        (ApplyBoundary, Pressure),
        (ExchangeHalo, PressureAux),
        (Smooth, CurrentAux),
        (ApplyBoundary, CurrentAux),
        (ExchangeHalo, DriverAux),
        (ApplyBoundary, DriverAux),
        (ExchangeHalo, Driver),
        (ApplyBoundary, Driver),
    ];
    let corrector_init = [
        (ExchangeHalo, Pressure),
        (ApplyBoundary, Pressure),
        (Smooth, CurrentAux),
        (ApplyBoundary, CurrentAux),
        (ExchangeHalo, Driver),
        (ApplyBoundary, Driver),
    ];
    let mut expected = vec![
        (ExchangeHalo, Pressure),
        (ExchangeHalo, PressureAux),
        (ExchangeHalo, Driver),
        (ApplyBoundary, Pressure),
        (ApplyBoundary, PressureAux),
        (ApplyBoundary, Driver),
    ];
    expected.extend(predictor_init);
    expected.extend(corrector_init);
    assert_eq!(ops(&grid), expected);

    // Step 2 is a smoothing step for stride 2.
    grid.clear_calls();
    let report = closure.advance(&mut grid, Phase::Predictor, 2).unwrap();
    assert!(report.smoothed);
    assert_eq!(
        &ops(&grid)[..5],
        &[
            (ExchangeHalo, Pressure),
            (ApplyBoundary, Pressure),
            (Smooth, Pressure),
            (ApplyBoundary, Pressure),
            (ExchangeHalo, PressureAux),
        ]
    );

    grid.clear_calls();
    let report = closure.advance(&mut grid, Phase::Corrector, 3).unwrap();
    assert!(!report.smoothed);
    assert_eq!(ops(&grid), corrector_init.to_vec());
}

#[test]
fn report_describes_the_call() {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    let config = base(2)
        .emass(0.05)
        .dt(0.2)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    assert!((config.sub_dt() - 0.2 / 20.0).abs() < 1e-15);
    let mut closure = PressureClosure::new(config, &mut grid).unwrap();

    let report = closure.advance(&mut grid, Phase::Predictor, 5).unwrap();
    assert_eq!(report.phase, Phase::Predictor);
    assert_eq!(report.step, Some(5));
    assert_eq!(report.sub_steps, 20);
    assert!(report.smoothed);
    assert_eq!(report.violations, 0);
    assert!(report.timings.total() >= report.timings.subcycle);
}
