//! Symmetric 3×3 tensor stored as its six independent components.

use std::ops::{Add, AddAssign, Index, Mul, Neg, Sub};

/// A symmetric 3×3 tensor.
///
/// Components are stored in the order `xx, xy, xz, yy, yz, zz`, matching
/// the layout of six-component fields on the host grid. Symmetry holds by
/// construction: `get(l, m) == get(m, l)` for every pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SymTensor(pub [f64; 6]);

impl SymTensor {
    /// Index of the `xx` component.
    pub const XX: usize = 0;
    /// Index of the `xy` component.
    pub const XY: usize = 1;
    /// Index of the `xz` component.
    pub const XZ: usize = 2;
    /// Index of the `yy` component.
    pub const YY: usize = 3;
    /// Index of the `yz` component.
    pub const YZ: usize = 4;
    /// Index of the `zz` component.
    pub const ZZ: usize = 5;

    /// The zero tensor.
    pub const ZERO: SymTensor = SymTensor([0.0; 6]);

    /// `p` times the identity.
    pub fn isotropic(p: f64) -> Self {
        Self::diagonal(p, p, p)
    }

    /// Diagonal tensor with zero off-diagonals.
    pub fn diagonal(xx: f64, yy: f64, zz: f64) -> Self {
        Self([xx, 0.0, 0.0, yy, 0.0, zz])
    }

    /// Storage index of row `l`, column `m`.
    pub fn component(l: usize, m: usize) -> usize {
        let (a, b) = if l <= m { (l, m) } else { (m, l) };
        match (a, b) {
            (0, 0) => Self::XX,
            (0, 1) => Self::XY,
            (0, 2) => Self::XZ,
            (1, 1) => Self::YY,
            (1, 2) => Self::YZ,
            (2, 2) => Self::ZZ,
            _ => panic!("tensor index ({l}, {m}) out of range"),
        }
    }

    /// Element at row `l`, column `m`.
    pub fn get(&self, l: usize, m: usize) -> f64 {
        self.0[Self::component(l, m)]
    }

    /// Set element `(l, m)` (and therefore `(m, l)`).
    pub fn set(&mut self, l: usize, m: usize, value: f64) {
        self.0[Self::component(l, m)] = value;
    }

    /// Read a tensor from a six-component field buffer.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut t = [0.0; 6];
        t.copy_from_slice(&values[..6]);
        Self(t)
    }

    /// Write this tensor into a six-component field buffer.
    pub fn write_to(&self, out: &mut [f64]) {
        out[..6].copy_from_slice(&self.0);
    }

    /// Sum of the diagonal.
    pub fn trace(&self) -> f64 {
        self.0[Self::XX] + self.0[Self::YY] + self.0[Self::ZZ]
    }

    /// Expand to a full 3×3 matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        let mut m = [[0.0; 3]; 3];
        for (l, row) in m.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.get(l, c);
            }
        }
        m
    }

    /// `true` if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Iterate the six stored components.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }
}

impl Index<usize> for SymTensor {
    type Output = f64;

    fn index(&self, h: usize) -> &f64 {
        &self.0[h]
    }
}

impl Add for SymTensor {
    type Output = SymTensor;

    fn add(mut self, rhs: SymTensor) -> SymTensor {
        self += rhs;
        self
    }
}

impl AddAssign for SymTensor {
    fn add_assign(&mut self, rhs: SymTensor) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Sub for SymTensor {
    type Output = SymTensor;

    fn sub(mut self, rhs: SymTensor) -> SymTensor {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a -= b;
        }
        self
    }
}

impl Mul<SymTensor> for f64 {
    type Output = SymTensor;

    fn mul(self, mut rhs: SymTensor) -> SymTensor {
        for a in rhs.0.iter_mut() {
            *a *= self;
        }
        rhs
    }
}

impl Neg for SymTensor {
    type Output = SymTensor;

    fn neg(mut self) -> SymTensor {
        for a in self.0.iter_mut() {
            *a = -*a;
        }
        self
    }
}
