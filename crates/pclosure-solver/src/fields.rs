//! Checked access to host-grid buffers.

use pclosure_core::{ClosureError, FieldKey, GridExchange, LatticeKind, Resolution};

/// Number of f64 slots `field` occupies at `resolution`.
pub(crate) fn expected_len(field: FieldKey, resolution: Resolution) -> usize {
    let points = match field.lattice() {
        LatticeKind::Node => resolution.node_lattice().len(),
        LatticeKind::Cell => resolution.cell_lattice().len(),
    };
    points * field.components()
}

fn check_len(field: FieldKey, expected: usize, actual: usize) -> Result<(), ClosureError> {
    if expected != actual {
        return Err(ClosureError::FieldSizeMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Borrow `field` read-only, verifying its length.
pub(crate) fn read_checked(
    grid: &dyn GridExchange,
    field: FieldKey,
    resolution: Resolution,
) -> Result<&[f64], ClosureError> {
    let buf = grid.read(field).ok_or(ClosureError::MissingField { field })?;
    check_len(field, expected_len(field, resolution), buf.len())?;
    Ok(buf)
}

/// Borrow `field` mutably, verifying its length.
pub(crate) fn write_checked(
    grid: &mut dyn GridExchange,
    field: FieldKey,
    resolution: Resolution,
) -> Result<&mut [f64], ClosureError> {
    let buf = grid
        .write(field)
        .ok_or(ClosureError::MissingField { field })?;
    check_len(field, expected_len(field, resolution), buf.len())?;
    Ok(buf)
}

/// Halo exchange followed by the boundary condition.
pub(crate) fn sync(grid: &mut dyn GridExchange, field: FieldKey) -> Result<(), ClosureError> {
    grid.exchange_halo(field)?;
    grid.apply_boundary(field)
}
