use super::VerificationType;
use crate::jvm::class_graph::ClassId;
use crate::jvm::RefType;
use crate::util::OffsetVec;

/// Snapshot of the stack and local variables at a point in the bytecode
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame<Cls> {
    /// Local variables in scope
    pub locals: OffsetVec<VerificationType<Cls>>,

    /// Types of values on the stack
    pub stack: OffsetVec<VerificationType<Cls>>,
}

impl<Cls> Default for Frame<Cls> {
    fn default() -> Self {
        Frame {
            locals: OffsetVec::new(),
            stack: OffsetVec::new(),
        }
    }
}

/// Frame whose object types refer to classes in the class graph
pub type VerifierFrame<'g> = Frame<RefType<ClassId<'g>>>;
