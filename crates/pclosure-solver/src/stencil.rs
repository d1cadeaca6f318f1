//! Finite-difference gradients at one interior cell of the ghosted lattice.
//!
//! Two schemes are evaluated against flat host buffers:
//!
//! - **Velocity gradient** `grad_v[l][m] = ∂_l V_m`, a smoothed centred
//!   difference. The face pair across axis `l` carries weight
//!   [`FACE_WEIGHT`](GradientStencil::FACE_WEIGHT); each of the four
//!   edge-diagonal pairs (shifted by `±1` along one of the other two axes)
//!   carries [`EDGE_WEIGHT`](GradientStencil::EDGE_WEIGHT).
//!
//!   ```text
//!   grad_v[l] = ( 0.25   * (V[+l]      - V[-l])
//!               + 0.0625 * Σ_{t≠l, s=±1} (V[+l + s·t] - V[-l + s·t]) ) / h_l
//!   ```
//!
//! - **Pressure gradient** `grad_p[s]`, a three-point upwind scheme along
//!   axis `s` chosen by the sign of the local `V_s`:
//!
//!   ```text
//!   sign = copysign(1, V_s)
//!   grad_p[s] = 0.5(1 - sign)/h · P[+s] + sign/h · P - 0.5(1 + sign)/h · P[-s]
//!   ```
//!
//!   Positive (or `+0.0`) velocity reduces to a backward difference,
//!   negative to a forward one. Each slice is a symmetric tensor, so only
//!   six components are computed.

use pclosure_core::{ClosureError, Lattice3, Resolution, SymTensor};

/// Everything the transport term needs at one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalGradients {
    /// Pressure tensor at the cell.
    pub pressure: SymTensor,
    /// `grad_v[l][m] = ∂_l V_m`.
    pub grad_v: [[f64; 3]; 3],
    /// `grad_p[s] = ∂_s P`, one symmetric slice per axis.
    pub grad_p: [SymTensor; 3],
}

/// Gradient evaluator bound to a ghosted cell lattice and spacing.
#[derive(Clone, Copy, Debug)]
pub struct GradientStencil {
    cells: Lattice3,
    spacing: [f64; 3],
}

fn unit(axis: usize, scale: i64) -> [i64; 3] {
    let mut d = [0i64; 3];
    d[axis] = scale;
    d
}

fn vector_at(buf: &[f64], n: usize) -> [f64; 3] {
    [buf[n * 3], buf[n * 3 + 1], buf[n * 3 + 2]]
}

impl GradientStencil {
    /// Weight of the direct face-neighbour difference.
    pub const FACE_WEIGHT: f64 = 0.25;
    /// Weight of each edge-diagonal neighbour-pair difference.
    pub const EDGE_WEIGHT: f64 = 0.0625;

    /// Stencil over the ghosted lattice of `resolution`.
    pub fn new(resolution: Resolution, spacing: [f64; 3]) -> Self {
        Self {
            cells: resolution.cell_lattice(),
            spacing,
        }
    }

    /// The lattice the stencil indexes.
    pub fn cells(&self) -> Lattice3 {
        self.cells
    }

    /// Velocity gradient at `idx` from a three-component cell buffer.
    ///
    /// Needs the full 3×3×3 neighbourhood; a ghost-layer `idx` fails with
    /// [`ClosureError::Lattice`].
    pub fn velocity_gradient(
        &self,
        velocity: &[f64],
        idx: [usize; 3],
    ) -> Result<[[f64; 3]; 3], ClosureError> {
        let mut grad = [[0.0; 3]; 3];
        for (l, row) in grad.iter_mut().enumerate() {
            let right = vector_at(velocity, self.cells.shifted(idx, unit(l, 1))?);
            let left = vector_at(velocity, self.cells.shifted(idx, unit(l, -1))?);
            let mut acc = [0.0; 3];
            for m in 0..3 {
                acc[m] = Self::FACE_WEIGHT * (right[m] - left[m]);
            }

            for t in (0..3).filter(|&t| t != l) {
                for s in [-1i64, 1] {
                    let mut up = unit(l, 1);
                    let mut down = unit(l, -1);
                    up[t] = s;
                    down[t] = s;
                    let right = vector_at(velocity, self.cells.shifted(idx, up)?);
                    let left = vector_at(velocity, self.cells.shifted(idx, down)?);
                    for m in 0..3 {
                        acc[m] += Self::EDGE_WEIGHT * (right[m] - left[m]);
                    }
                }
            }

            for m in 0..3 {
                row[m] = acc[m] / self.spacing[l];
            }
        }
        Ok(grad)
    }

    /// Upwind pressure gradient at `idx` given the local velocity `v`.
    pub fn pressure_gradient(
        &self,
        pressure: &[f64],
        idx: [usize; 3],
        v: [f64; 3],
    ) -> Result<[SymTensor; 3], ClosureError> {
        let centre = self.cells.offset(idx[0], idx[1], idx[2])?;
        let p0 = SymTensor::from_slice(&pressure[centre * 6..]);
        let mut grad = [SymTensor::ZERO; 3];
        for (s, slice) in grad.iter_mut().enumerate() {
            let h = self.spacing[s];
            let sign = 1.0f64.copysign(v[s]);
            let c_plus = 0.5 * (1.0 - sign) / h;
            let c_zero = sign / h;
            let c_minus = -0.5 * (1.0 + sign) / h;

            let ahead = self.cells.shifted(idx, unit(s, 1))?;
            let behind = self.cells.shifted(idx, unit(s, -1))?;
            let p_plus = SymTensor::from_slice(&pressure[ahead * 6..]);
            let p_minus = SymTensor::from_slice(&pressure[behind * 6..]);
            for h in 0..6 {
                slice.0[h] = c_plus * p_plus[h] + c_zero * p0[h] + c_minus * p_minus[h];
            }
        }
        Ok(grad)
    }

    /// Pressure, velocity gradient and pressure gradient at `idx`.
    pub fn evaluate(
        &self,
        pressure: &[f64],
        velocity: &[f64],
        idx: [usize; 3],
    ) -> Result<LocalGradients, ClosureError> {
        let centre = self.cells.offset(idx[0], idx[1], idx[2])?;
        let v = vector_at(velocity, centre);
        Ok(LocalGradients {
            pressure: SymTensor::from_slice(&pressure[centre * 6..]),
            grad_v: self.velocity_gradient(velocity, idx)?,
            grad_p: self.pressure_gradient(pressure, idx, v)?,
        })
    }
}
