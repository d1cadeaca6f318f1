//! Bounds-checked 3-D lattice indexing shared by every solver component.
//!
//! Both lattices are stored as flat buffers in `(i, j, k)` row-major order
//! with `k` fastest: `offset = (i * ny + j) * nz + k`.

use crate::error::LatticeError;

/// A dense 3-D lattice of `nx * ny * nz` points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lattice3 {
    dims: [usize; 3],
}

impl Lattice3 {
    /// Create a lattice with the given extents.
    ///
    /// Returns `Err(LatticeError::EmptyAxis)` if any extent is zero.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self, LatticeError> {
        let dims = [nx, ny, nz];
        if let Some(axis) = dims.iter().position(|&n| n == 0) {
            return Err(LatticeError::EmptyAxis { axis });
        }
        Ok(Self { dims })
    }

    /// Extent on each axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Total number of points.
    pub fn len(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Always `false`; construction rejects empty axes.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Flat offset of `(i, j, k)`.
    pub fn offset(&self, i: usize, j: usize, k: usize) -> Result<usize, LatticeError> {
        if i >= self.dims[0] || j >= self.dims[1] || k >= self.dims[2] {
            return Err(self.out_of_bounds([i as i64, j as i64, k as i64]));
        }
        Ok((i * self.dims[1] + j) * self.dims[2] + k)
    }

    /// Flat offset of `base + delta`, where `delta` may be negative.
    pub fn shifted(&self, base: [usize; 3], delta: [i64; 3]) -> Result<usize, LatticeError> {
        let mut coord = [0i64; 3];
        for axis in 0..3 {
            coord[axis] = base[axis] as i64 + delta[axis];
        }
        if coord
            .iter()
            .zip(self.dims.iter())
            .any(|(&c, &n)| c < 0 || c >= n as i64)
        {
            return Err(self.out_of_bounds(coord));
        }
        self.offset(coord[0] as usize, coord[1] as usize, coord[2] as usize)
    }

    /// Inverse of [`offset`](Self::offset).
    pub fn coords(&self, offset: usize) -> Result<[usize; 3], LatticeError> {
        if offset >= self.len() {
            return Err(self.out_of_bounds([offset as i64, 0, 0]));
        }
        let k = offset % self.dims[2];
        let j = (offset / self.dims[2]) % self.dims[1];
        let i = offset / (self.dims[1] * self.dims[2]);
        Ok([i, j, k])
    }

    fn out_of_bounds(&self, coord: [i64; 3]) -> LatticeError {
        LatticeError::OutOfBounds {
            coord,
            dims: self.dims,
        }
    }
}

/// Number of physical cells on each axis, excluding ghosts.
///
/// Derives the node lattice (G1, `N + 1` points per axis) and the ghosted
/// cell lattice (G2, `N + 2` points per axis).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Resolution {
    cells: [usize; 3],
}

impl Resolution {
    /// Create a resolution of `nx * ny * nz` physical cells.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self, LatticeError> {
        let cells = [nx, ny, nz];
        if let Some(axis) = cells.iter().position(|&n| n == 0) {
            return Err(LatticeError::EmptyAxis { axis });
        }
        Ok(Self { cells })
    }

    /// Physical cells per axis.
    pub fn cells(&self) -> [usize; 3] {
        self.cells
    }

    /// The node (cell-corner) lattice.
    pub fn node_lattice(&self) -> Lattice3 {
        let [nx, ny, nz] = self.cells;
        Lattice3 {
            dims: [nx + 1, ny + 1, nz + 1],
        }
    }

    /// The ghosted cell-centre lattice.
    pub fn cell_lattice(&self) -> Lattice3 {
        let [nx, ny, nz] = self.cells;
        Lattice3 {
            dims: [nx + 2, ny + 2, nz + 2],
        }
    }

    /// Number of interior (non-ghost) cells.
    pub fn interior_count(&self) -> usize {
        self.cells.iter().product()
    }

    /// Iterate interior cells as ghosted-lattice coordinates `1..=N`.
    pub fn interior(&self) -> impl Iterator<Item = [usize; 3]> {
        let [nx, ny, nz] = self.cells;
        (1..=nx).flat_map(move |i| (1..=ny).flat_map(move |j| (1..=nz).map(move |k| [i, j, k])))
    }

    /// Physical centre of the interior cell at ghosted coordinate `idx`.
    pub fn cell_centre(&self, idx: [usize; 3], spacing: [f64; 3], origin: [f64; 3]) -> [f64; 3] {
        let mut x = [0.0; 3];
        for axis in 0..3 {
            x[axis] = (idx[axis] as f64 - 0.5) * spacing[axis] + origin[axis];
        }
        x
    }
}
