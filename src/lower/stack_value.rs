use crate::ir::DeclaredType;
use crate::jvm::class_graph::ClassId;
use crate::jvm::verifier::VerificationType;
use crate::jvm::{BaseType, FieldType, RefType};
use crate::util::{Offset, Width};

/// What kind of value occupies an operand stack slot
///
/// Object slots keep their exact reference type (needed in stack map frames), while primitive
/// slots only need their computational category.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StackValueType<'g> {
    Object(RefType<ClassId<'g>>),
    Null,
    Int,
    Float,
    Long,
    Double,
}

impl<'g> StackValueType<'g> {
    pub fn from_declared_type(declared_type: &DeclaredType<'g>) -> Self {
        match declared_type {
            DeclaredType::Null => StackValueType::Null,
            DeclaredType::Field(FieldType::Ref(ref_type)) => StackValueType::Object(*ref_type),
            DeclaredType::Field(FieldType::Base(base_type)) => match base_type {
                BaseType::Int
                | BaseType::Char
                | BaseType::Short
                | BaseType::Byte
                | BaseType::Boolean => StackValueType::Int,
                BaseType::Float => StackValueType::Float,
                BaseType::Long => StackValueType::Long,
                BaseType::Double => StackValueType::Double,
            },
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, StackValueType::Object(_) | StackValueType::Null)
    }

    pub fn verification_type(&self) -> VerificationType<RefType<ClassId<'g>>> {
        match self {
            StackValueType::Object(ref_type) => VerificationType::Object(*ref_type),
            StackValueType::Null => VerificationType::Null,
            StackValueType::Int => VerificationType::Integer,
            StackValueType::Float => VerificationType::Float,
            StackValueType::Long => VerificationType::Long,
            StackValueType::Double => VerificationType::Double,
        }
    }
}

impl<'g> Width for StackValueType<'g> {
    fn width(&self) -> usize {
        match self {
            StackValueType::Long | StackValueType::Double => 2,
            _ => 1,
        }
    }
}

/// Position and type of a value on the operand stack
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StackSlot<'g> {
    /// Stack height below the value
    pub height: Offset,

    pub value_type: StackValueType<'g>,
}
