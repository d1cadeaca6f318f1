//! Persistent caches carried between solver calls.
//!
//! Allocated once from the resolution and overwritten in place, only at
//! call boundaries:
//!
//! | cache               | lattice | refreshed                                   |
//! |---------------------|---------|---------------------------------------------|
//! | `pressure`          | cell    | after every integrator write-back           |
//! | `driver`            | cell    | after every driver write + sync             |
//! | `electron_velocity` | cell    | at the start of every transport build       |
//! | `magnetic`          | node    | end of a predictor call (from `MagneticAux`) |

use crate::fields::{expected_len, read_checked};
use pclosure_core::{ClosureError, FieldKey, GridExchange, Resolution, SymTensor};

/// Carry-over state of the pressure closure.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosureState {
    resolution: Resolution,
    driver: Vec<f64>,
    pressure: Vec<f64>,
    electron_velocity: Vec<f64>,
    magnetic: Vec<f64>,
}

fn refresh(
    cache: &mut [f64],
    grid: &dyn GridExchange,
    field: FieldKey,
    resolution: Resolution,
) -> Result<(), ClosureError> {
    cache.copy_from_slice(read_checked(grid, field, resolution)?);
    Ok(())
}

impl ClosureState {
    /// Zeroed caches sized for `resolution`.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            driver: vec![0.0; expected_len(FieldKey::Driver, resolution)],
            pressure: vec![0.0; expected_len(FieldKey::Pressure, resolution)],
            electron_velocity: vec![0.0; expected_len(FieldKey::IonVelocity, resolution)],
            magnetic: vec![0.0; expected_len(FieldKey::Magnetic, resolution)],
        }
    }

    /// Resolution the caches are sized for.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Driver as of the last driver write, 6 components per cell.
    pub fn driver(&self) -> &[f64] {
        &self.driver
    }

    /// Pressure as of the last integrator write-back, 6 components per cell.
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// Electron bulk velocity, 3 components per cell.
    pub fn electron_velocity(&self) -> &[f64] {
        &self.electron_velocity
    }

    /// Magnetic field at the start of the current macro step, 3 components
    /// per node.
    pub fn magnetic(&self) -> &[f64] {
        &self.magnetic
    }

    /// Cached pressure tensor at flat cell index `cell`.
    pub fn pressure_at(&self, cell: usize) -> SymTensor {
        SymTensor::from_slice(&self.pressure[cell * 6..])
    }

    /// Cached driver tensor at flat cell index `cell`.
    pub fn driver_at(&self, cell: usize) -> SymTensor {
        SymTensor::from_slice(&self.driver[cell * 6..])
    }

    pub(crate) fn electron_velocity_mut(&mut self) -> &mut [f64] {
        &mut self.electron_velocity
    }

    pub(crate) fn capture_pressure(&mut self, grid: &dyn GridExchange) -> Result<(), ClosureError> {
        refresh(&mut self.pressure, grid, FieldKey::Pressure, self.resolution)
    }

    pub(crate) fn capture_driver(&mut self, grid: &dyn GridExchange) -> Result<(), ClosureError> {
        refresh(&mut self.driver, grid, FieldKey::Driver, self.resolution)
    }

    pub(crate) fn capture_magnetic(
        &mut self,
        grid: &dyn GridExchange,
        field: FieldKey,
    ) -> Result<(), ClosureError> {
        refresh(&mut self.magnetic, grid, field, self.resolution)
    }
}
