//! Phase rollback.
//!
//! A [`Checkpoint`] holds every host buffer a phase writes, ghosts
//! included, together with the carry-over caches. Restoring it after a
//! failed phase leaves the host and the solver exactly as they were before
//! the phase began, so the same phase can be retried.

use crate::fields::{read_checked, write_checked};
use crate::state::ClosureState;
use pclosure_core::{ClosureError, FieldKey, GridExchange, Phase};

const PREDICTOR_WRITES: [FieldKey; 5] = [
    FieldKey::Pressure,
    FieldKey::PressureAux,
    FieldKey::CurrentAux,
    FieldKey::Driver,
    FieldKey::DriverAux,
];

const CORRECTOR_WRITES: [FieldKey; 3] =
    [FieldKey::Pressure, FieldKey::CurrentAux, FieldKey::Driver];

/// Host fields `phase` may modify.
pub(crate) fn written_by(phase: Phase) -> &'static [FieldKey] {
    match phase {
        Phase::Predictor => &PREDICTOR_WRITES,
        Phase::Corrector => &CORRECTOR_WRITES,
    }
}

/// Pre-phase copy of the solver-owned host fields and caches.
#[derive(Debug)]
pub(crate) struct Checkpoint {
    fields: Vec<(FieldKey, Vec<f64>)>,
    state: ClosureState,
}

impl Checkpoint {
    pub(crate) fn take(
        grid: &dyn GridExchange,
        state: &ClosureState,
        phase: Phase,
    ) -> Result<Self, ClosureError> {
        let res = state.resolution();
        let written = written_by(phase);
        let mut fields = Vec::with_capacity(written.len());
        for &field in written {
            fields.push((field, read_checked(grid, field, res)?.to_vec()));
        }
        Ok(Self {
            fields,
            state: state.clone(),
        })
    }

    pub(crate) fn restore(
        self,
        grid: &mut dyn GridExchange,
        state: &mut ClosureState,
    ) -> Result<(), ClosureError> {
        let res = self.state.resolution();
        for (field, values) in &self.fields {
            write_checked(grid, *field, res)?.copy_from_slice(values);
        }
        *state = self.state;
        Ok(())
    }
}
