//! The host-grid collaborator trait.

use crate::error::ClosureError;
use crate::id::FieldKey;
use crate::lattice::Resolution;
use smallvec::SmallVec;

/// Access to the host simulation's grid, halo exchange and boundary
/// conditions.
///
/// The solver owns none of the field storage. Every mutation it performs
/// goes through [`write`](GridExchange::write) and is followed by the
/// appropriate [`exchange_halo`](GridExchange::exchange_halo) /
/// [`apply_boundary`](GridExchange::apply_boundary) calls, which block
/// until neighbouring subdomains are consistent.
///
/// Buffers are flat, lattice-point major with components interleaved:
/// component `c` of point `n` lives at `n * field.components() + c`.
pub trait GridExchange {
    /// Physical resolution of the local subdomain.
    fn resolution(&self) -> Resolution;

    /// Full value array of a field, or `None` if the host does not carry it.
    fn read(&self, field: FieldKey) -> Option<&[f64]>;

    /// Mutable value array of a field, or `None` if it is not writable.
    fn write(&mut self, field: FieldKey) -> Option<&mut [f64]>;

    /// Synchronise the ghost layer of `field` with neighbouring subdomains.
    fn exchange_halo(&mut self, field: FieldKey) -> Result<(), ClosureError>;

    /// Apply the physical boundary condition to `field`.
    fn apply_boundary(&mut self, field: FieldKey) -> Result<(), ClosureError>;

    /// Run the host's spatial smoothing filter over `field`.
    fn smooth(&mut self, field: FieldKey) -> Result<(), ClosureError>;

    /// The 8 node-lattice indices surrounding the cell whose upper corner
    /// is node `node`, used for trilinear averaging of node fields.
    fn node_neighbourhood(&self, node: usize) -> Result<SmallVec<[usize; 8]>, ClosureError>;

    /// Set one component of one lattice point.
    fn set_component(
        &mut self,
        field: FieldKey,
        node: usize,
        component: usize,
        value: f64,
    ) -> Result<(), ClosureError> {
        let comps = field.components();
        let buf = self
            .write(field)
            .ok_or(ClosureError::MissingField { field })?;
        let slot = node * comps + component;
        let len = buf.len();
        match buf.get_mut(slot) {
            Some(v) if component < comps => {
                *v = value;
                Ok(())
            }
            _ => Err(ClosureError::FieldSizeMismatch {
                field,
                expected: slot + 1,
                actual: len,
            }),
        }
    }

    /// Copy every value of `src` into `dst` (ghosts included).
    fn copy_field(&mut self, src: FieldKey, dst: FieldKey) -> Result<(), ClosureError> {
        let values = self
            .read(src)
            .ok_or(ClosureError::MissingField { field: src })?
            .to_vec();
        let out = self
            .write(dst)
            .ok_or(ClosureError::MissingField { field: dst })?;
        if out.len() != values.len() {
            return Err(ClosureError::FieldSizeMismatch {
                field: dst,
                expected: values.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&values);
        Ok(())
    }
}
