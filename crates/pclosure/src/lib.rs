//! pclosure: a sub-cycled anisotropic electron-pressure closure for hybrid
//! plasma simulations.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! pclosure sub-crates. A host simulation implements
//! [`GridExchange`](prelude::GridExchange) for its subdomain, builds a
//! [`ClosureConfig`](prelude::ClosureConfig) and drives a
//! [`PressureClosure`](prelude::PressureClosure) once per predictor and
//! corrector phase.
//!
//! # Quick start
//!
//! ```rust
//! use pclosure::prelude::*;
//! use pclosure_test_utils::{fixtures, MockGrid};
//!
//! let mut grid = MockGrid::cubic(4);
//! fixtures::quiescent(&mut grid);
//! fixtures::uniform_magnetic(&mut grid, [0.0, 0.0, 1.0]);
//!
//! let config = ClosureConfig::builder()
//!     .resolution(Resolution::new(4, 4, 4).unwrap())
//!     .spacing([0.5; 3])
//!     .emass(0.04)
//!     .dt(0.01)
//!     .relax_rate(0.1)
//!     .profile(|_x: f64, _y: f64, _z: f64| 1.0)
//!     .build()
//!     .unwrap();
//!
//! let mut closure = PressureClosure::new(config, &mut grid).unwrap();
//! for step in 1..=3 {
//!     closure.advance(&mut grid, Phase::Predictor, step).unwrap();
//!     closure.advance(&mut grid, Phase::Corrector, step).unwrap();
//! }
//! assert_eq!(closure.next_phase(), Phase::Predictor);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `pclosure-core` | Field keys, phases, lattices, tensors, errors, the grid trait |
//! | [`solver`] | `pclosure-solver` | Configuration, integrator, transport, the closure itself |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits and errors (`pclosure-core`).
///
/// Contains [`types::FieldKey`], [`types::Phase`], [`types::SymTensor`],
/// the bounds-checked [`types::Lattice3`] and the host-facing
/// [`types::GridExchange`] trait.
pub use pclosure_core as types;

/// The pressure-closure solver (`pclosure-solver`).
///
/// [`solver::PressureClosure`] is the entry point; its components
/// ([`solver::SubcycledIntegrator`], [`solver::TransportTermBuilder`],
/// [`solver::GradientStencil`], [`solver::Isotropization`]) are usable on
/// their own.
pub use pclosure_solver as solver;

/// Common imports for driving the solver from a host.
///
/// ```rust
/// use pclosure::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use pclosure_core::{FieldKey, GridExchange, Phase, Resolution, SymTensor};

    // Errors
    pub use pclosure_core::{ClosureError, LatticeError};

    // Solver
    pub use pclosure_solver::{
        AdvanceReport, ClosureConfig, DriverSeed, PressureClosure, PressureProfile, Strictness,
    };
}
