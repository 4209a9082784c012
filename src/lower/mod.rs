//! Lowering of a typed value graph to JVM stack code
//!
//! Lowering happens after type analysis: every value is either kept in a local (as decided by a
//! [`LocalAllocator`]) or is pushed/popped around the instructions that use it. Phis are resolved
//! into moves at the end of their predecessors.

mod allocator;
mod frames;
mod load_store;
mod stack_value;

pub use allocator::*;
pub use frames::*;
pub use load_store::*;
pub use stack_value::*;

use crate::analysis::{self, TypeAnalysis, VerificationTypes};
use crate::ir::{BlockId, IrCode};
use crate::jvm::class_graph::SubtypeOracle;
use crate::jvm::verifier::VerifierFrame;
use crate::settings::Settings;
use crate::util::Offset;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Method body after lowering, along with what was learned while lowering it
#[derive(Debug)]
pub struct LoweredMethod<'g> {
    pub code: IrCode<'g>,

    /// Types from the analysis run before lowering
    pub types: TypeAnalysis<'g>,

    pub verification_types: VerificationTypes<'g>,

    /// Maximum height of the operand stack
    pub max_stack: Offset,

    /// Frames at the entry of blocks (empty if frames were not requested)
    pub frames: BTreeMap<BlockId, VerifierFrame<'g>>,
}

#[derive(Debug)]
pub enum CompilationError {
    /// An internal invariant was broken while processing a method
    Internal {
        method: String,
        error: analysis::Error,
    },
}

impl Display for CompilationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompilationError::Internal { method, error } => {
                write!(f, "Internal compiler error in {}: {}", method, error)
            }
        }
    }
}

impl std::error::Error for CompilationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompilationError::Internal { error, .. } => Some(error),
        }
    }
}

/// Run type analysis and lower a method body to stack code
///
/// Nothing partial is returned: if any step fails, the error names the method.
pub fn lower_method<'g>(
    mut code: IrCode<'g>,
    oracle: &dyn SubtypeOracle<'g>,
    allocator: &mut dyn LocalAllocator,
    settings: &Settings,
) -> Result<LoweredMethod<'g>, CompilationError> {
    let method = code.method;
    let internal = |error: analysis::Error| {
        log::error!("Failed to lower {:?}: {}", method, error);
        CompilationError::Internal {
            method: format!("{:?}", method),
            error,
        }
    };

    let types = TypeAnalysis::run(&code, oracle, settings).map_err(internal)?;
    let verification_types = VerificationTypes::compute(&code, oracle).map_err(internal)?;

    let max_stack = {
        let precise = if settings.precise_stack_values {
            Some(&verification_types)
        } else {
            None
        };
        let mut helper = LoadStoreHelper::new(&mut code, precise, settings);
        helper.insert_loads_and_stores().map_err(internal)?;
        helper.insert_phi_moves(allocator).map_err(internal)?;
        helper.max_stack()
    };

    let frames = if settings.compute_frames {
        compute_entry_frames(&code, allocator, &verification_types).map_err(internal)?
    } else {
        BTreeMap::new()
    };

    Ok(LoweredMethod {
        code,
        types,
        verification_types,
        max_stack,
        frames,
    })
}
