//! Relaxation of the pressure tensor toward its isotropic part.

use pclosure_core::SymTensor;

/// Pitch-angle scattering model: `-rate * (P - (tr P / 3) I)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Isotropization {
    rate: f64,
}

impl Isotropization {
    /// Create the model with relaxation rate `rate`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    /// The relaxation rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Relaxation term for `p`. Traceless by construction.
    ///
    /// Each diagonal deviation is formed as `(2 a - b - c) / 3`, which is
    /// exactly zero whenever the three diagonal entries are equal.
    pub fn term(&self, p: &SymTensor) -> SymTensor {
        let [xx, xy, xz, yy, yz, zz] = p.0;
        let r = self.rate;
        SymTensor([
            -r * ((2.0 * xx - yy - zz) / 3.0),
            -r * xy,
            -r * xz,
            -r * ((2.0 * yy - xx - zz) / 3.0),
            -r * yz,
            -r * ((2.0 * zz - xx - yy) / 3.0),
        ])
    }
}
