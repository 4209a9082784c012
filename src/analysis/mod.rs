//! Abstract interpretation of value types
//!
//! [`TypeLatticeElement`] is the abstract domain. [`TypeAnalysis`] computes, per method, the
//! fixed point of types used for optimization decisions, while [`VerificationTypes`] computes the
//! (separate) precise reference types needed to describe stack map frames. Both use the same
//! deduplicating [`Worklist`] and only ever move types up the lattice.

mod errors;
mod lattice;
mod type_analysis;
mod verification_types;
mod worklist;

pub use errors::*;
pub use lattice::*;
pub use type_analysis::*;
pub use verification_types::*;
pub use worklist::*;
