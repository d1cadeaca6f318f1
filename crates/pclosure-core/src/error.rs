//! Error types for the pressure-closure solver.
//!
//! Organised by origin: lattice indexing, phase sequencing, configuration,
//! upstream preconditions, numerical validation, host-grid failures and
//! the halted state left by a failed rollback.

use crate::id::{FieldKey, Phase};
use std::error::Error;
use std::fmt;

/// Errors from 3-D lattice index arithmetic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LatticeError {
    /// A coordinate lies outside the lattice.
    OutOfBounds {
        /// The offending `(i, j, k)` coordinate (may be negative).
        coord: [i64; 3],
        /// Lattice extent on each axis.
        dims: [usize; 3],
    },
    /// A lattice was requested with a zero-length axis.
    EmptyAxis {
        /// Index of the empty axis (0 = x, 1 = y, 2 = z).
        axis: usize,
    },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { coord, dims } => {
                write!(f, "coordinate {coord:?} outside lattice {dims:?}")
            }
            Self::EmptyAxis { axis } => write!(f, "lattice axis {axis} has zero length"),
        }
    }
}

impl Error for LatticeError {}

/// Errors surfaced by the pressure-closure solver.
#[derive(Clone, Debug, PartialEq)]
pub enum ClosureError {
    /// A host passed an unrecognised phase code. Fatal.
    InvalidPhase {
        /// The raw phase code.
        code: i32,
    },
    /// The host broke the predictor/corrector alternation.
    PhaseOrder {
        /// Phase the solver was waiting for.
        expected: Phase,
        /// Phase that was requested.
        got: Phase,
    },
    /// Configuration failed validation.
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
    /// The pressure profile returned a non-finite value.
    InvalidProfile {
        /// Physical coordinate of the sample.
        position: [f64; 3],
        /// The sampled value.
        value: f64,
    },
    /// Electron density is non-positive or non-finite at a cell.
    InvalidDensity {
        /// Flat cell-lattice index.
        cell: usize,
        /// The offending density.
        value: f64,
    },
    /// A tensor component failed the numerical sanity check.
    NumericalInstability {
        /// Pipeline stage that produced the value.
        stage: &'static str,
        /// Flat cell-lattice index.
        cell: usize,
        /// Component index (0..6, `xx, xy, xz, yy, yz, zz`).
        component: usize,
        /// The offending value.
        value: f64,
        /// Sub-step at which the value first went bad, for sub-cycled
        /// tensors.
        sub_step: Option<usize>,
    },
    /// The host grid does not expose a field the solver needs.
    MissingField {
        /// The missing field.
        field: FieldKey,
    },
    /// A host field buffer has the wrong length.
    FieldSizeMismatch {
        /// The field.
        field: FieldKey,
        /// Expected number of f64 slots.
        expected: usize,
        /// Actual number of f64 slots.
        actual: usize,
    },
    /// The host returned a corner neighbourhood without exactly 8 entries.
    NeighbourhoodSize {
        /// Flat node-lattice index that was queried.
        node: usize,
        /// Number of entries returned.
        len: usize,
    },
    /// Lattice index arithmetic failed.
    Lattice(LatticeError),
    /// A host grid operation (halo exchange, BC, smoothing) failed.
    Grid {
        /// Description supplied by the host.
        reason: String,
    },
    /// An earlier phase failed and its partial writes could not be rolled
    /// back. The solver must be rebuilt.
    Halted,
}

impl fmt::Display for ClosureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhase { code } => write!(f, "unrecognised phase code {code}"),
            Self::PhaseOrder { expected, got } => {
                write!(f, "phase order violated: expected {expected}, got {got}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid configuration: {reason}"),
            Self::InvalidProfile { position, value } => {
                write!(f, "pressure profile returned {value} at {position:?}")
            }
            Self::InvalidDensity { cell, value } => {
                write!(f, "electron density {value} at cell {cell} is not positive")
            }
            Self::NumericalInstability {
                stage,
                cell,
                component,
                value,
                sub_step,
            } => {
                write!(f, "{stage}: component {component} at cell {cell} is {value}")?;
                if let Some(m) = sub_step {
                    write!(f, " after sub-step {m}")?;
                }
                Ok(())
            }
            Self::MissingField { field } => write!(f, "field '{field}' not available"),
            Self::FieldSizeMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field '{field}' has {actual} elements, expected {expected}"
            ),
            Self::NeighbourhoodSize { node, len } => {
                write!(f, "node {node} has {len} corner neighbours, expected 8")
            }
            Self::Lattice(e) => write!(f, "lattice: {e}"),
            Self::Grid { reason } => write!(f, "grid: {reason}"),
            Self::Halted => write!(f, "solver halted after a failed rollback"),
        }
    }
}

impl Error for ClosureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lattice(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LatticeError> for ClosureError {
    fn from(e: LatticeError) -> Self {
        Self::Lattice(e)
    }
}
