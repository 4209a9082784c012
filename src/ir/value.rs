use super::{BlockId, InstructionId};
use crate::jvm::class_graph::ClassId;
use crate::jvm::{FieldType, RefType};
use crate::lower::StackSlot;
use crate::util::Width;
use std::collections::BTreeSet;
use std::fmt;

/// Index of a value in [`super::IrCode`]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ValueId(pub usize);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Node in the value graph
#[derive(Debug)]
pub struct Value<'g> {
    /// Where the value comes from
    pub kind: ValueKind<'g>,

    /// Static type of the value, as declared in the bytecode
    pub out_type: DeclaredType<'g>,

    /// Instructions and phis reading this value
    pub users: Users,
}

impl<'g> Value<'g> {
    pub fn is_phi(&self) -> bool {
        matches!(self.kind, ValueKind::Phi { .. })
    }

    pub fn is_stack(&self) -> bool {
        matches!(self.kind, ValueKind::Stack { .. })
    }

    /// Instruction defining the value (`None` for phis)
    pub fn definition(&self) -> Option<InstructionId> {
        match self.kind {
            ValueKind::Definition(insn) => Some(insn),
            ValueKind::Stack { definition, .. } => definition,
            ValueKind::Phi { .. } => None,
        }
    }
}

#[derive(Debug)]
pub enum ValueKind<'g> {
    /// Output of exactly one instruction
    Definition(InstructionId),

    /// Merge at the entry of a block, with one operand per predecessor (in predecessor order)
    Phi {
        block: BlockId,
        operands: Vec<ValueId>,
    },

    /// Operand stack slot introduced when lowering to stack instructions
    Stack {
        slot: StackSlot<'g>,
        definition: Option<InstructionId>,
    },
}

/// Use sites of a value
///
/// Sets are ordered so that anything iterating over users (eg. the worklist) is deterministic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Users {
    pub instructions: BTreeSet<InstructionId>,
    pub phis: BTreeSet<ValueId>,
}

impl Users {
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty() && self.phis.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len() + self.phis.len()
    }
}

/// Statically declared type of a value
///
/// This is a field type, except for the literal `null` which has no field type of its own.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DeclaredType<'g> {
    Null,
    Field(FieldType<ClassId<'g>>),
}

impl<'g> DeclaredType<'g> {
    pub fn is_reference(&self) -> bool {
        match self {
            DeclaredType::Null => true,
            DeclaredType::Field(field_type) => field_type.is_reference(),
        }
    }

    pub fn ref_type(&self) -> Option<RefType<ClassId<'g>>> {
        match self {
            DeclaredType::Field(FieldType::Ref(ref_type)) => Some(*ref_type),
            _ => None,
        }
    }
}

impl<'g> From<FieldType<ClassId<'g>>> for DeclaredType<'g> {
    fn from(field_type: FieldType<ClassId<'g>>) -> Self {
        DeclaredType::Field(field_type)
    }
}

impl<'g> Width for DeclaredType<'g> {
    fn width(&self) -> usize {
        match self {
            DeclaredType::Null => 1,
            DeclaredType::Field(field_type) => field_type.width(),
        }
    }
}
