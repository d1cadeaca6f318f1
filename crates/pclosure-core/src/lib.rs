//! Core types and traits for the pclosure pressure-tensor solver.
//!
//! This is the leaf crate of the workspace. It defines the vocabulary the
//! solver shares with its host simulation: named field keys, the
//! predictor/corrector [`Phase`], bounds-checked lattice indexing, the
//! six-component [`SymTensor`], error types, and the [`GridExchange`]
//! trait through which the host's grid, halo exchange and boundary
//! conditions are reached.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod lattice;
pub mod tensor;
pub mod traits;

pub use error::{ClosureError, LatticeError};
pub use id::{FieldKey, LatticeKind, Phase};
pub use lattice::{Lattice3, Resolution};
pub use tensor::SymTensor;
pub use traits::GridExchange;
