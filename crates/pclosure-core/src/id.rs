//! Named field keys and the integration [`Phase`].

use crate::error::ClosureError;
use std::fmt;

/// Which of the two co-located lattices a field lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LatticeKind {
    /// Cell-corner lattice (G1), `(N+1)` points per axis, no ghosts.
    Node,
    /// Cell-centre lattice (G2), `(N+2)` points per axis including one
    /// ghost layer on each side.
    Cell,
}

/// Identifies a field owned by the host grid.
///
/// The solver never allocates these fields; it reads and writes them
/// through [`GridExchange`](crate::GridExchange). Primary/auxiliary pairs
/// hold the two phases of a macro step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    /// Electron pressure tensor, corrector (primary) instance.
    Pressure,
    /// Electron pressure tensor, predictor (auxiliary) instance.
    PressureAux,
    /// Explicit transport forcing applied during the next sub-cycle.
    Driver,
    /// Transport term computed by the last predictor call.
    DriverAux,
    /// Magnetic field, corrector (primary) instance.
    Magnetic,
    /// Magnetic field, predictor (auxiliary) instance.
    MagneticAux,
    /// Current density.
    Current,
    /// Smoothed copy of the current density, owned by the solver.
    CurrentAux,
    /// Ion bulk velocity.
    IonVelocity,
    /// Electron number density.
    ElectronDensity,
}

impl FieldKey {
    /// Every field key, in declaration order.
    pub const ALL: [FieldKey; 10] = [
        FieldKey::Pressure,
        FieldKey::PressureAux,
        FieldKey::Driver,
        FieldKey::DriverAux,
        FieldKey::Magnetic,
        FieldKey::MagneticAux,
        FieldKey::Current,
        FieldKey::CurrentAux,
        FieldKey::IonVelocity,
        FieldKey::ElectronDensity,
    ];

    /// Lattice the field is stored on.
    pub fn lattice(self) -> LatticeKind {
        match self {
            Self::Magnetic | Self::MagneticAux => LatticeKind::Node,
            _ => LatticeKind::Cell,
        }
    }

    /// Number of f64 slots per lattice point.
    pub fn components(self) -> usize {
        match self {
            Self::Pressure | Self::PressureAux | Self::Driver | Self::DriverAux => 6,
            Self::Magnetic
            | Self::MagneticAux
            | Self::Current
            | Self::CurrentAux
            | Self::IonVelocity => 3,
            Self::ElectronDensity => 1,
        }
    }

    /// Short lowercase name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::PressureAux => "pressure_aux",
            Self::Driver => "driver",
            Self::DriverAux => "driver_aux",
            Self::Magnetic => "magnetic",
            Self::MagneticAux => "magnetic_aux",
            Self::Current => "current",
            Self::CurrentAux => "current_aux",
            Self::IonVelocity => "ion_velocity",
            Self::ElectronDensity => "electron_density",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage of the outer predictor-corrector macro step.
///
/// The host driver calls the solver once per phase, strictly alternating
/// `Predictor`, `Corrector` for every macro step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// First half of the macro step: integrates from the auxiliary
    /// buffers towards the auxiliary (predicted) magnetic field.
    Predictor,
    /// Second half of the macro step: integrates from the primary
    /// buffers towards the primary magnetic field.
    Corrector,
}

impl Phase {
    /// Numeric code used by hosts that pass phases as integers.
    pub fn code(self) -> i32 {
        match self {
            Self::Predictor => 0,
            Self::Corrector => 1,
        }
    }

    /// The phase that must follow this one.
    pub fn next(self) -> Self {
        match self {
            Self::Predictor => Self::Corrector,
            Self::Corrector => Self::Predictor,
        }
    }

    /// Start-of-call pressure buffer for this phase.
    pub fn pressure_source(self) -> FieldKey {
        match self {
            Self::Predictor => FieldKey::PressureAux,
            Self::Corrector => FieldKey::Pressure,
        }
    }

    /// Magnetic field the sub-cycle interpolates towards.
    pub fn magnetic_target(self) -> FieldKey {
        match self {
            Self::Predictor => FieldKey::MagneticAux,
            Self::Corrector => FieldKey::Magnetic,
        }
    }
}

impl TryFrom<i32> for Phase {
    type Error = ClosureError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Predictor),
            1 => Ok(Self::Corrector),
            _ => Err(ClosureError::InvalidPhase { code }),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predictor => f.write_str("predictor"),
            Self::Corrector => f.write_str("corrector"),
        }
    }
}
