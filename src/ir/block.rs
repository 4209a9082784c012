use super::{InstructionId, ValueId};
use std::fmt;

/// Index of a block in [`super::IrCode`]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[derive(Debug, Default, Clone)]
pub struct BasicBlock {
    /// Instructions, in program order
    pub instructions: Vec<InstructionId>,

    /// Predecessors, in the order phi operands are given
    pub predecessors: Vec<BlockId>,

    pub successors: Vec<BlockId>,

    /// Phis merged at the entry of the block
    pub phis: Vec<ValueId>,

    /// Does any instruction in the block throw?
    pub throwing: bool,
}

impl BasicBlock {
    /// Last instruction in the block
    pub fn exit(&self) -> Option<InstructionId> {
        self.instructions.last().copied()
    }
}
