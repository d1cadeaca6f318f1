//! Sub-cycled anisotropic electron-pressure closure for hybrid plasma
//! simulations.
//!
//! The solver advances a symmetric electron pressure tensor on the host's
//! ghosted cell lattice, one predictor or corrector phase at a time:
//!
//! 1. [`SubcycledIntegrator`]: gyration about the local magnetic field,
//!    a frozen driver term and isotropization, sub-cycled
//!    `round(1/emass)` times per call.
//! 2. [`TransportTermBuilder`]: the next driver from pressure and
//!    electron-flow gradients ([`GradientStencil`]), combined with the
//!    previous driver according to the phase.
//!
//! [`PressureClosure`] owns the carry-over caches ([`ClosureState`]),
//! enforces predictor/corrector alternation, rolls a failed phase back and
//! reports each call through [`AdvanceReport`]. The host grid is reached only through
//! [`GridExchange`](pclosure_core::GridExchange).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod checkpoint;
pub mod closure;
pub mod config;
mod fields;
pub mod guard;
pub mod integrator;
pub mod isotropization;
pub mod report;
pub mod sequencer;
pub mod state;
pub mod stencil;
pub mod transport;

pub use closure::PressureClosure;
pub use config::{ClosureConfig, ClosureConfigBuilder, DriverSeed, PressureProfile};
pub use guard::{NumericGuard, Strictness};
pub use integrator::{CellInputs, SubcycledIntegrator};
pub use isotropization::Isotropization;
pub use report::{AdvanceReport, PhaseTimings};
pub use sequencer::PhaseSequencer;
pub use state::ClosureState;
pub use stencil::{GradientStencil, LocalGradients};
pub use transport::TransportTermBuilder;
