use crate::ir::{BlockId, InstructionId, ValueId};
use std::fmt;

/// Internal invariant violations
///
/// These point at malformed IR from an earlier phase (or a bug here). They abort processing of
/// the current method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Joining reference types produced something that is not a reference
    NonReferenceJoin {
        value: Option<ValueId>,
        joined: String,
    },

    /// Verification types were requested for a primitive value
    PrimitiveVerificationQuery { value: ValueId },

    /// An instruction already reads or produces an operand stack value
    UnexpectedStackValue {
        instruction: InstructionId,
        value: ValueId,
    },

    /// A phi does not have exactly one operand per predecessor of its block
    MissingPhiOperand {
        phi: ValueId,
        expected: usize,
        found: usize,
    },

    /// A phi operand was added to a value that is not a phi
    NotAPhi { value: ValueId },

    /// Moves for phis would have to be placed on an edge from a block with several successors
    CriticalEdge { from: BlockId, to: BlockId },

    /// A recomputed type is not an upper bound of the previous type
    NonMonotoneUpdate {
        value: ValueId,
        old: String,
        candidate: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NonReferenceJoin {
                value: Some(value),
                joined,
            } => write!(f, "join for {} is not a reference type: {}", value, joined),
            Error::NonReferenceJoin { value: None, joined } => {
                write!(f, "join of class types is not a reference type: {}", joined)
            }
            Error::PrimitiveVerificationQuery { value } => {
                write!(f, "{} is primitive and has no verification class", value)
            }
            Error::UnexpectedStackValue { instruction, value } => {
                write!(f, "{} already uses stack value {}", instruction, value)
            }
            Error::MissingPhiOperand {
                phi,
                expected,
                found,
            } => write!(
                f,
                "phi {} has {} operands but its block has {} predecessors",
                phi, found, expected
            ),
            Error::NotAPhi { value } => write!(f, "{} is not a phi", value),
            Error::CriticalEdge { from, to } => {
                write!(f, "phi moves needed on critical edge {} -> {}", from, to)
            }
            Error::NonMonotoneUpdate {
                value,
                old,
                candidate,
            } => write!(
                f,
                "type of {} would move from {} down to {}",
                value, old, candidate
            ),
        }
    }
}

impl std::error::Error for Error {}
