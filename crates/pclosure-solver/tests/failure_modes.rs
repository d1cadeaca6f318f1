//! Integration tests: error surfaces of the pressure closure.
//!
//! Each test drives the solver into one failure (bad density, non-finite
//! tensors, host grid failures, malformed host fields) and checks the
//! error, that the phase sequence is left where it was, and that a failed
//! phase is rolled back so a retry reproduces an undisturbed run.

use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase, Resolution, SymTensor};
use pclosure_solver::{ClosureConfig, PressureClosure, Strictness};
use pclosure_test_utils::{fixtures, GridOp, MockGrid};
use smallvec::SmallVec;

// ── Helpers ─────────────────────────────────────────────────────────

fn config(n: usize, strictness: Strictness) -> ClosureConfig {
    ClosureConfig::builder()
        .resolution(Resolution::new(n, n, n).unwrap())
        .spacing([1.0; 3])
        .emass(0.25)
        .dt(0.05)
        .strictness(strictness)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap()
}

fn ready(n: usize, strictness: Strictness) -> (PressureClosure, MockGrid) {
    let mut grid = MockGrid::cubic(n);
    fixtures::quiescent(&mut grid);
    let closure = PressureClosure::new(config(n, strictness), &mut grid).unwrap();
    (closure, grid)
}

const OWNED: [FieldKey; 5] = [
    FieldKey::Pressure,
    FieldKey::PressureAux,
    FieldKey::CurrentAux,
    FieldKey::Driver,
    FieldKey::DriverAux,
];

fn owned_fields(grid: &MockGrid) -> Vec<Vec<f64>> {
    OWNED
        .iter()
        .map(|&f| grid.read(f).unwrap().to_vec())
        .collect()
}

/// Relaxing, gyrating 2³ plasma whose next predictor rotates B from z to x.
fn anisotropic() -> (PressureClosure, MockGrid) {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    fixtures::uniform_magnetic(&mut grid, [0.0, 0.0, 1.0]);
    let config = ClosureConfig::builder()
        .resolution(Resolution::new(2, 2, 2).unwrap())
        .spacing([1.0; 3])
        .emass(0.25)
        .dt(0.05)
        .relax_rate(0.5)
        .profile(|_x: f64, _y: f64, _z: f64| 1.0)
        .build()
        .unwrap();
    let closure = PressureClosure::new(config, &mut grid).unwrap();
    grid.fill_tensor_with(FieldKey::PressureAux, |[i, j, k]| {
        SymTensor([2.0, 0.1 * i as f64, 0.0, 1.0, 0.05 * j as f64, 1.0 + 0.1 * k as f64])
    });
    grid.fill_vector(FieldKey::MagneticAux, [1.0, 0.0, 0.0]);
    (closure, grid)
}

fn poison(grid: &mut MockGrid, idx: [usize; 3]) {
    let t = SymTensor([f64::NAN, 0.0, 0.0, 1.0, 0.0, 1.0]);
    grid.set_tensor_at(FieldKey::Pressure, idx, t);
    grid.set_tensor_at(FieldKey::PressureAux, idx, t);
}

/// Host grid that hides one field or truncates corner lookups.
struct Hobbled {
    inner: MockGrid,
    hidden: Option<FieldKey>,
    short_corners: bool,
    /// Field to hide once a smoothing call has failed.
    hide_on_failure: Option<FieldKey>,
}

impl GridExchange for Hobbled {
    fn resolution(&self) -> Resolution {
        self.inner.resolution()
    }

    fn read(&self, field: FieldKey) -> Option<&[f64]> {
        if self.hidden == Some(field) {
            return None;
        }
        self.inner.read(field)
    }

    fn write(&mut self, field: FieldKey) -> Option<&mut [f64]> {
        if self.hidden == Some(field) {
            return None;
        }
        self.inner.write(field)
    }

    fn exchange_halo(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        self.inner.exchange_halo(field)
    }

    fn apply_boundary(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        self.inner.apply_boundary(field)
    }

    fn smooth(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        let result = self.inner.smooth(field);
        if result.is_err() && self.hide_on_failure.is_some() {
            self.hidden = self.hide_on_failure;
        }
        result
    }

    fn node_neighbourhood(&self, node: usize) -> Result<SmallVec<[usize; 8]>, ClosureError> {
        let mut corners = self.inner.node_neighbourhood(node)?;
        if self.short_corners {
            corners.pop();
        }
        Ok(corners)
    }
}

// ── Upstream preconditions ──────────────────────────────────────────

#[test]
fn initialisation_requires_positive_density() {
    let mut grid = MockGrid::cubic(2);
    let err = PressureClosure::new(config(2, Strictness::Warn), &mut grid).unwrap_err();
    assert_eq!(err, ClosureError::InvalidDensity { cell: 0, value: 0.0 });
}

#[test]
fn negative_density_fails_the_phase() {
    let (mut closure, mut grid) = ready(2, Strictness::Warn);
    let cell = grid.cells().offset(1, 2, 1).unwrap();
    grid.write(FieldKey::ElectronDensity).unwrap()[cell] = -1.0;

    let before = owned_fields(&grid);
    let cached = closure.state().clone();
    let err = closure
        .advance(&mut grid, Phase::Predictor, 1)
        .unwrap_err();
    assert_eq!(err, ClosureError::InvalidDensity { cell, value: -1.0 });
    assert_eq!(closure.next_phase(), Phase::Predictor);
    assert_eq!(owned_fields(&grid), before);
    assert_eq!(closure.state(), &cached);

    grid.write(FieldKey::ElectronDensity).unwrap()[cell] = 1.0;
    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert_eq!(closure.next_phase(), Phase::Corrector);
}

#[test]
fn missing_host_field_is_reported() {
    let mut inner = MockGrid::cubic(2);
    fixtures::quiescent(&mut inner);
    let mut grid = Hobbled {
        inner,
        hidden: Some(FieldKey::IonVelocity),
        short_corners: false,
        hide_on_failure: None,
    };
    let err = PressureClosure::new(config(2, Strictness::Warn), &mut grid).unwrap_err();
    assert_eq!(
        err,
        ClosureError::MissingField {
            field: FieldKey::IonVelocity
        }
    );
}

#[test]
fn short_corner_lookup_is_reported() {
    let mut inner = MockGrid::cubic(2);
    fixtures::quiescent(&mut inner);
    let mut grid = Hobbled {
        inner,
        hidden: None,
        short_corners: true,
        hide_on_failure: None,
    };
    match PressureClosure::new(config(2, Strictness::Warn), &mut grid) {
        Err(ClosureError::NeighbourhoodSize { len, .. }) => assert_eq!(len, 7),
        other => panic!("expected NeighbourhoodSize, got {other:?}"),
    }
}

// ── Numeric guard ───────────────────────────────────────────────────

#[test]
fn abort_strictness_stops_on_nan() {
    let (mut closure, mut grid) = ready(3, Strictness::Abort);
    poison(&mut grid, [2, 2, 2]);
    let cell = grid.cells().offset(2, 2, 2).unwrap();

    match closure.advance(&mut grid, Phase::Predictor, 1) {
        Err(ClosureError::NumericalInstability {
            stage,
            cell: at,
            component,
            value,
            sub_step,
        }) => {
            assert_eq!(stage, "sub-cycle");
            assert_eq!(at, cell);
            assert_eq!(component, SymTensor::XX);
            assert!(value.is_nan());
            assert_eq!(sub_step, Some(0));
        }
        other => panic!("expected NumericalInstability, got {other:?}"),
    }
    assert_eq!(closure.next_phase(), Phase::Predictor);
}

#[test]
fn warn_strictness_counts_and_continues() {
    let (mut closure, mut grid) = ready(3, Strictness::Warn);
    poison(&mut grid, [2, 2, 2]);

    let report = closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert!(report.violations >= 1);
    assert_eq!(closure.next_phase(), Phase::Corrector);
}

#[test]
fn oversized_values_trip_the_limit() {
    let mut grid = MockGrid::cubic(2);
    fixtures::quiescent(&mut grid);
    let config = ClosureConfig::builder()
        .resolution(Resolution::new(2, 2, 2).unwrap())
        .spacing([1.0; 3])
        .emass(0.5)
        .dt(0.1)
        .strictness(Strictness::Abort)
        .magnitude_limit(10.0)
        .profile(|_x: f64, _y: f64, _z: f64| 50.0)
        .build()
        .unwrap();
    assert!(matches!(
        PressureClosure::new(config, &mut grid),
        Err(ClosureError::NumericalInstability {
            stage: "sub-cycle",
            ..
        })
    ));
}

#[test]
fn off_strictness_lets_nan_through() {
    let (mut closure, mut grid) = ready(2, Strictness::Off);
    poison(&mut grid, [1, 1, 1]);
    let report = closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert_eq!(report.violations, 0);
    assert!(grid.tensor_at(FieldKey::Pressure, [1, 1, 1])[SymTensor::XX].is_nan());
}

// ── Host failures ───────────────────────────────────────────────────

#[test]
fn failed_predictor_rolls_back_and_retries_exactly() {
    let (mut clean, mut clean_grid) = anisotropic();
    clean.advance(&mut clean_grid, Phase::Predictor, 1).unwrap();

    let (mut closure, mut grid) = anisotropic();
    let before = owned_fields(&grid);
    let cached = closure.state().clone();
    grid.fail_on(GridOp::Smooth, FieldKey::CurrentAux);

    match closure.advance(&mut grid, Phase::Predictor, 1) {
        Err(ClosureError::Grid { reason }) => assert!(reason.contains("current_aux")),
        other => panic!("expected Grid error, got {other:?}"),
    }
    assert_eq!(closure.next_phase(), Phase::Predictor);
    assert_eq!(owned_fields(&grid), before);
    assert_eq!(closure.state(), &cached);
    assert_eq!(&closure.state().magnetic()[..3], &[0.0, 0.0, 1.0]);

    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    assert_eq!(closure.next_phase(), Phase::Corrector);
    assert_eq!(owned_fields(&grid), owned_fields(&clean_grid));
    assert_eq!(closure.state(), clean.state());
    assert_eq!(&closure.state().magnetic()[..3], &[1.0, 0.0, 0.0]);
}

#[test]
fn failed_corrector_keeps_predictor_results() {
    let (mut closure, mut grid) = anisotropic();
    closure.advance(&mut grid, Phase::Predictor, 1).unwrap();
    let before = owned_fields(&grid);
    let cached = closure.state().clone();
    grid.fail_on(GridOp::ExchangeHalo, FieldKey::Driver);

    assert!(matches!(
        closure.advance(&mut grid, Phase::Corrector, 1),
        Err(ClosureError::Grid { .. })
    ));
    assert_eq!(closure.next_phase(), Phase::Corrector);
    assert_eq!(owned_fields(&grid), before);
    assert_eq!(closure.state(), &cached);
    closure.advance(&mut grid, Phase::Corrector, 1).unwrap();
}

#[test]
fn failed_rollback_halts_the_solver() {
    let mut inner = MockGrid::cubic(2);
    fixtures::quiescent(&mut inner);
    let mut grid = Hobbled {
        inner,
        hidden: None,
        short_corners: false,
        hide_on_failure: Some(FieldKey::PressureAux),
    };
    let mut closure = PressureClosure::new(config(2, Strictness::Warn), &mut grid).unwrap();
    grid.inner.fail_on(GridOp::Smooth, FieldKey::CurrentAux);

    assert!(matches!(
        closure.advance(&mut grid, Phase::Predictor, 1),
        Err(ClosureError::Grid { .. })
    ));
    assert!(closure.is_halted());

    grid.hidden = None;
    assert_eq!(
        closure.advance(&mut grid, Phase::Predictor, 1).unwrap_err(),
        ClosureError::Halted
    );
}

#[test]
fn unknown_phase_code_is_fatal() {
    let (mut closure, mut grid) = ready(2, Strictness::Warn);
    grid.clear_calls();
    assert_eq!(
        closure.advance_code(&mut grid, -1, 1).unwrap_err(),
        ClosureError::InvalidPhase { code: -1 }
    );
    assert!(grid.calls().is_empty());
}
