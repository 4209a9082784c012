//! JVM naming and typing vocabulary
//!
//! Everything here is independent of any particular method body: names, type descriptors, the
//! class hierarchy, and the types used in stack map frames.

pub mod class_graph;
pub mod verifier;

mod access_flags;
mod descriptors;
mod errors;
mod names;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
