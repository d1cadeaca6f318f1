//! Test utilities and a mock grid for pclosure development.
//!
//! Provides [`MockGrid`], a single-subdomain, in-memory implementation of
//! [`GridExchange`] with periodic halo exchange, identity boundary
//! conditions and a 7-point smoothing filter. Every collaborator call is
//! recorded so tests can assert on synchronisation order.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use indexmap::IndexMap;
use pclosure_core::{
    ClosureError, FieldKey, GridExchange, Lattice3, LatticeKind, Resolution, SymTensor,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::SmallVec;

/// A collaborator operation recorded by [`MockGrid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridOp {
    ExchangeHalo,
    ApplyBoundary,
    Smooth,
}

/// One recorded collaborator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCall {
    pub op: GridOp,
    pub field: FieldKey,
}

/// In-memory grid covering a single periodic subdomain.
///
/// All fields are allocated zeroed at construction. Halo exchange wraps
/// ghost cells to the opposite interior face; boundary conditions are the
/// identity; smoothing replaces each interior value with
/// `(2 * centre + sum of 6 face neighbours) / 8`.
pub struct MockGrid {
    resolution: Resolution,
    fields: IndexMap<FieldKey, Vec<f64>>,
    calls: Vec<GridCall>,
    fail_on: Option<GridCall>,
}

impl MockGrid {
    pub fn new(resolution: Resolution) -> Self {
        let mut fields = IndexMap::new();
        for key in FieldKey::ALL {
            let points = match key.lattice() {
                LatticeKind::Node => resolution.node_lattice().len(),
                LatticeKind::Cell => resolution.cell_lattice().len(),
            };
            fields.insert(key, vec![0.0; points * key.components()]);
        }
        Self {
            resolution,
            fields,
            calls: Vec::new(),
            fail_on: None,
        }
    }

    /// An `n × n × n` grid.
    pub fn cubic(n: usize) -> Self {
        Self::new(Resolution::new(n, n, n).unwrap())
    }

    /// Every collaborator call made so far, in order.
    pub fn calls(&self) -> &[GridCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Make the next matching call return `ClosureError::Grid`.
    pub fn fail_on(&mut self, op: GridOp, field: FieldKey) {
        self.fail_on = Some(GridCall { op, field });
    }

    /// Ghosted cell-lattice geometry.
    pub fn cells(&self) -> Lattice3 {
        self.resolution.cell_lattice()
    }

    /// Node-lattice geometry.
    pub fn nodes(&self) -> Lattice3 {
        self.resolution.node_lattice()
    }

    fn lattice_of(&self, field: FieldKey) -> Lattice3 {
        match field.lattice() {
            LatticeKind::Node => self.nodes(),
            LatticeKind::Cell => self.cells(),
        }
    }

    fn buffer(&self, field: FieldKey) -> &[f64] {
        &self.fields[&field]
    }

    fn buffer_mut(&mut self, field: FieldKey) -> &mut Vec<f64> {
        self.fields
            .get_mut(&field)
            .expect("MockGrid allocates every field")
    }

    /// Set every lattice point of a six-component field to `t`.
    pub fn fill_tensor(&mut self, field: FieldKey, t: SymTensor) {
        assert_eq!(field.components(), 6, "{field} is not a tensor field");
        for chunk in self.buffer_mut(field).chunks_mut(6) {
            t.write_to(chunk);
        }
    }

    /// Set every lattice point of a three-component field to `v`.
    pub fn fill_vector(&mut self, field: FieldKey, v: [f64; 3]) {
        assert_eq!(field.components(), 3, "{field} is not a vector field");
        for chunk in self.buffer_mut(field).chunks_mut(3) {
            chunk.copy_from_slice(&v);
        }
    }

    /// Set every lattice point of a vector field from its coordinate.
    pub fn fill_vector_with(&mut self, field: FieldKey, f: impl Fn([usize; 3]) -> [f64; 3]) {
        assert_eq!(field.components(), 3, "{field} is not a vector field");
        let lattice = self.lattice_of(field);
        let buf = self.buffer_mut(field);
        for (n, chunk) in buf.chunks_mut(3).enumerate() {
            let idx = lattice.coords(n).unwrap();
            chunk.copy_from_slice(&f(idx));
        }
    }

    /// Set every lattice point of a tensor field from its coordinate.
    pub fn fill_tensor_with(&mut self, field: FieldKey, f: impl Fn([usize; 3]) -> SymTensor) {
        assert_eq!(field.components(), 6, "{field} is not a tensor field");
        let lattice = self.lattice_of(field);
        let buf = self.buffer_mut(field);
        for (n, chunk) in buf.chunks_mut(6).enumerate() {
            f(lattice.coords(n).unwrap()).write_to(chunk);
        }
    }

    /// Set every slot of a field to `v`.
    pub fn fill_scalar(&mut self, field: FieldKey, v: f64) {
        self.buffer_mut(field).fill(v);
    }

    pub fn tensor_at(&self, field: FieldKey, idx: [usize; 3]) -> SymTensor {
        let n = self.lattice_of(field).offset(idx[0], idx[1], idx[2]).unwrap();
        SymTensor::from_slice(&self.buffer(field)[n * 6..])
    }

    pub fn set_tensor_at(&mut self, field: FieldKey, idx: [usize; 3], t: SymTensor) {
        let n = self.lattice_of(field).offset(idx[0], idx[1], idx[2]).unwrap();
        t.write_to(&mut self.buffer_mut(field)[n * 6..]);
    }

    pub fn vector_at(&self, field: FieldKey, idx: [usize; 3]) -> [f64; 3] {
        let n = self.lattice_of(field).offset(idx[0], idx[1], idx[2]).unwrap();
        let buf = self.buffer(field);
        [buf[n * 3], buf[n * 3 + 1], buf[n * 3 + 2]]
    }

    pub fn set_vector_at(&mut self, field: FieldKey, idx: [usize; 3], v: [f64; 3]) {
        let n = self.lattice_of(field).offset(idx[0], idx[1], idx[2]).unwrap();
        self.buffer_mut(field)[n * 3..n * 3 + 3].copy_from_slice(&v);
    }

    /// Tensors of every interior cell, in lattice order.
    pub fn interior_tensors(&self, field: FieldKey) -> Vec<SymTensor> {
        self.resolution
            .interior()
            .map(|idx| self.tensor_at(field, idx))
            .collect()
    }

    /// Add seeded uniform noise in `[-amplitude, amplitude)` to every slot.
    pub fn perturb(&mut self, field: FieldKey, seed: u64, amplitude: f64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for v in self.buffer_mut(field).iter_mut() {
            *v += rng.random_range(-amplitude..amplitude);
        }
    }

    fn record(&mut self, op: GridOp, field: FieldKey) -> Result<(), ClosureError> {
        let call = GridCall { op, field };
        self.calls.push(call);
        if self.fail_on == Some(call) {
            self.fail_on = None;
            return Err(ClosureError::Grid {
                reason: format!("injected {op:?} failure on {field}"),
            });
        }
        Ok(())
    }

    fn wrap_ghosts(&mut self, field: FieldKey) {
        if field.lattice() != LatticeKind::Cell {
            return;
        }
        let lattice = self.cells();
        let dims = lattice.dims();
        let comps = field.components();
        let buf = self.buffer_mut(field);
        for axis in 0..3 {
            let n = dims[axis] - 2;
            for off in 0..lattice.len() {
                let mut idx = lattice.coords(off).unwrap();
                let src = match idx[axis] {
                    0 => n,
                    c if c == n + 1 => 1,
                    _ => continue,
                };
                idx[axis] = src;
                let from = lattice.offset(idx[0], idx[1], idx[2]).unwrap();
                for c in 0..comps {
                    buf[off * comps + c] = buf[from * comps + c];
                }
            }
        }
    }
}

impl GridExchange for MockGrid {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read(&self, field: FieldKey) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }

    fn write(&mut self, field: FieldKey) -> Option<&mut [f64]> {
        self.fields.get_mut(&field).map(|v| v.as_mut_slice())
    }

    fn exchange_halo(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        self.record(GridOp::ExchangeHalo, field)?;
        self.wrap_ghosts(field);
        Ok(())
    }

    fn apply_boundary(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        self.record(GridOp::ApplyBoundary, field)
    }

    fn smooth(&mut self, field: FieldKey) -> Result<(), ClosureError> {
        self.record(GridOp::Smooth, field)?;
        if field.lattice() != LatticeKind::Cell {
            return Ok(());
        }
        let lattice = self.cells();
        let comps = field.components();
        let old = self.buffer(field).to_vec();
        let interior: Vec<[usize; 3]> = self.resolution.interior().collect();
        let buf = self.buffer_mut(field);
        for idx in interior {
            let centre = lattice.offset(idx[0], idx[1], idx[2]).unwrap();
            for c in 0..comps {
                let mut sum = 2.0 * old[centre * comps + c];
                for axis in 0..3 {
                    for step in [-1i64, 1] {
                        let mut delta = [0i64; 3];
                        delta[axis] = step;
                        let nb = lattice.shifted(idx, delta).unwrap();
                        sum += old[nb * comps + c];
                    }
                }
                buf[centre * comps + c] = sum / 8.0;
            }
        }
        self.wrap_ghosts(field);
        Ok(())
    }

    fn node_neighbourhood(&self, node: usize) -> Result<SmallVec<[usize; 8]>, ClosureError> {
        let nodes = self.nodes();
        let idx = nodes.coords(node)?;
        let mut out = SmallVec::new();
        for di in [-1i64, 0] {
            for dj in [-1i64, 0] {
                for dk in [-1i64, 0] {
                    out.push(nodes.shifted(idx, [di, dj, dk])?);
                }
            }
        }
        Ok(out)
    }
}
