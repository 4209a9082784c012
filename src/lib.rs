//! Typing and lowering core of a class file optimizer
//!
//! Method bodies are held as a value graph in SSA form ([`ir::IrCode`]). On that graph,
//! [`analysis::TypeAnalysis`] computes the most precise type of every value with respect to the
//! class hierarchy ([`jvm::class_graph::ClassGraph`]), and [`lower`] turns the graph back into
//! stack based code, resolving phis into local variable moves and computing the frames the JVM
//! verifier needs.

pub mod analysis;
pub mod ir;
pub mod jvm;
pub mod lower;
mod settings;
pub mod util;

pub use settings::*;
