use super::{BlockId, DeclaredType, ValueId};
use crate::jvm::class_graph::{ClassId, MethodId};
use crate::jvm::{BaseType, FieldType, RefType, UnqualifiedName};
use std::fmt;

/// Index of an instruction in [`super::IrCode`]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct InstructionId(pub usize);

impl fmt::Display for InstructionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}

/// Source line of an instruction
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct Instruction<'g> {
    pub kind: InstructionKind<'g>,

    /// Operands, in the order they are pushed onto the operand stack
    pub inputs: Vec<ValueId>,

    pub output: Option<ValueId>,

    /// Block containing the instruction
    pub block: BlockId,

    pub position: Option<Position>,
}

/// Closed set of instructions in the IR
///
/// Operands are stored in [`Instruction::inputs`], so variants only carry the static parts of the
/// instruction (types, members, constants).
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind<'g> {
    /// Incoming method argument (index 0 is the receiver for instance methods)
    Argument { index: usize },

    ConstNumber(NumericConstant),
    ConstString(String),
    ConstNull,
    ConstClass(RefType<ClassId<'g>>),

    /// Two operands, one output of the same primitive type
    Binop(BinaryOp),
    NumberConversion { from: BaseType, to: BaseType },

    /// `lcmp`, `fcmpl`, `dcmpg`, and friends
    Cmp,

    CheckCast(RefType<ClassId<'g>>),
    InstanceOf(RefType<ClassId<'g>>),

    ArrayLength,

    /// Inputs: array, index
    ArrayGet,

    /// Inputs: array, index, value
    ArrayPut,

    NewInstance(ClassId<'g>),

    /// Inputs: length
    NewArray(RefType<ClassId<'g>>),

    /// Inputs: receiver (unless static), then arguments
    Invoke {
        method: MethodId<'g>,
        kind: InvokeKind,
    },

    FieldGet(FieldRef<'g>),
    FieldPut(FieldRef<'g>),

    MonitorEnter,
    MonitorExit,

    /// Caught exception, at the start of a handler block
    MoveException(ClassId<'g>),

    Goto,

    /// Jumps to the first successor if the condition holds, otherwise to the second
    If(Condition),
    Return,
    Throw,

    /// Push a value from its local onto the operand stack
    Load,

    /// Pop the top of the operand stack into the local of the output value
    Store,

    /// Discard the top of the operand stack
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericConstant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl NumericConstant {
    pub fn base_type(&self) -> BaseType {
        match self {
            NumericConstant::Int(_) => BaseType::Int,
            NumericConstant::Long(_) => BaseType::Long,
            NumericConstant::Float(_) => BaseType::Float,
            NumericConstant::Double(_) => BaseType::Double,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Lt,
    Ge,
    Gt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef<'g> {
    pub class: ClassId<'g>,
    pub name: UnqualifiedName,
    pub field_type: FieldType<ClassId<'g>>,
    pub is_static: bool,
}

impl<'g> InstructionKind<'g> {
    pub fn is_argument(&self) -> bool {
        matches!(self, InstructionKind::Argument { .. })
    }

    /// Does the instruction only push a compile-time constant?
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            InstructionKind::ConstNumber(_)
                | InstructionKind::ConstString(_)
                | InstructionKind::ConstNull
                | InstructionKind::ConstClass(_)
        )
    }

    pub fn is_goto(&self) -> bool {
        matches!(self, InstructionKind::Goto)
    }

    /// Can the output type be computed without looking at the types of the inputs?
    ///
    /// Arguments are not included: their type comes from the method signature.
    pub fn has_invariant_out_type(&self) -> bool {
        match self {
            InstructionKind::Argument { .. }
            | InstructionKind::CheckCast(_)
            | InstructionKind::ArrayGet
            | InstructionKind::Load
            | InstructionKind::Store => false,

            InstructionKind::ConstNumber(_)
            | InstructionKind::ConstString(_)
            | InstructionKind::ConstNull
            | InstructionKind::ConstClass(_)
            | InstructionKind::Binop(_)
            | InstructionKind::NumberConversion { .. }
            | InstructionKind::Cmp
            | InstructionKind::InstanceOf(_)
            | InstructionKind::ArrayLength
            | InstructionKind::ArrayPut
            | InstructionKind::NewInstance(_)
            | InstructionKind::NewArray(_)
            | InstructionKind::Invoke { .. }
            | InstructionKind::FieldGet(_)
            | InstructionKind::FieldPut(_)
            | InstructionKind::MonitorEnter
            | InstructionKind::MonitorExit
            | InstructionKind::MoveException(_)
            | InstructionKind::Goto
            | InstructionKind::If(_)
            | InstructionKind::Return
            | InstructionKind::Throw
            | InstructionKind::Pop => true,
        }
    }

    /// Can the verification type of the output be computed without a fixed point?
    ///
    /// Unlike [`Self::has_invariant_out_type`], a cast is exactly its cast type here and an array
    /// read is the element type of the statically declared array.
    pub fn has_invariant_verification_type(&self) -> bool {
        match self {
            InstructionKind::Argument { .. } | InstructionKind::Load | InstructionKind::Store => {
                false
            }
            InstructionKind::CheckCast(_) | InstructionKind::ArrayGet => true,
            other => other.has_invariant_out_type(),
        }
    }

    /// Could executing this instruction raise an exception?
    ///
    /// `out_type` is the declared type of the output (if any). Division only throws on `int` and
    /// `long`, so a division without a known type counts as throwing.
    pub fn can_throw(&self, out_type: Option<&DeclaredType<'_>>) -> bool {
        match self {
            InstructionKind::Argument { .. }
            | InstructionKind::ConstNumber(_)
            | InstructionKind::ConstString(_)
            | InstructionKind::ConstNull
            | InstructionKind::NumberConversion { .. }
            | InstructionKind::Cmp
            | InstructionKind::InstanceOf(_)
            | InstructionKind::MoveException(_)
            | InstructionKind::Goto
            | InstructionKind::If(_)
            | InstructionKind::Return
            | InstructionKind::Load
            | InstructionKind::Store
            | InstructionKind::Pop => false,

            InstructionKind::Binop(BinaryOp::Div | BinaryOp::Rem) => !matches!(
                out_type,
                Some(DeclaredType::Field(FieldType::Base(BaseType::Float | BaseType::Double)))
            ),
            InstructionKind::Binop(_) => false,

            InstructionKind::ConstClass(_)
            | InstructionKind::CheckCast(_)
            | InstructionKind::ArrayLength
            | InstructionKind::ArrayGet
            | InstructionKind::ArrayPut
            | InstructionKind::NewInstance(_)
            | InstructionKind::NewArray(_)
            | InstructionKind::Invoke { .. }
            | InstructionKind::FieldGet(_)
            | InstructionKind::FieldPut(_)
            | InstructionKind::MonitorEnter
            | InstructionKind::MonitorExit
            | InstructionKind::Throw => true,
        }
    }
}
