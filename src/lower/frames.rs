use super::LocalAllocator;
use crate::analysis::{Error, VerificationTypes};
use crate::ir::{BlockId, DeclaredType, InstructionKind, IrCode, ValueId};
use crate::jvm::class_graph::ClassId;
use crate::jvm::verifier::{VerificationType, VerifierFrame};
use crate::jvm::{FieldType, RefType, UnqualifiedName};
use std::collections::BTreeMap;

/// Frame at the entry of every block
///
/// Locals are the values the allocator reports live at the entry of the block, ordered by slot,
/// with unused slots filled with `Top`. The stack is empty, except in exception handlers where it
/// holds the caught exception.
pub fn compute_entry_frames<'g>(
    code: &IrCode<'g>,
    allocator: &dyn LocalAllocator,
    verification_types: &VerificationTypes<'g>,
) -> Result<BTreeMap<BlockId, VerifierFrame<'g>>, Error> {
    let mut frames = BTreeMap::new();

    for (block, _) in code.blocks() {
        let mut live: Vec<(u16, ValueId)> = allocator
            .live_at_entry(block)
            .into_iter()
            .filter_map(|value| allocator.local_of(value).map(|local| (local, value)))
            .collect();
        live.sort();

        let mut frame = VerifierFrame::default();
        for (local, value) in live {
            let local = usize::from(local);
            if local < frame.locals.offset_len().0 {
                log::trace!("{} overlaps another local at entry of {}", value, block);
                continue;
            }
            while frame.locals.offset_len().0 < local {
                frame.locals.push(VerificationType::Top);
            }
            frame.locals.push(local_type(code, block, value, verification_types)?);
        }

        if code.is_handler(block) {
            let caught = code
                .block_instructions(block)
                .find_map(|(_, insn)| match insn.kind {
                    InstructionKind::MoveException(class) => Some(class),
                    _ => None,
                });
            if let Some(class) = caught {
                frame
                    .stack
                    .push(VerificationType::Object(RefType::Object(class)));
            }
        }

        frames.insert(block, frame);
    }

    Ok(frames)
}

fn local_type<'g>(
    code: &IrCode<'g>,
    block: BlockId,
    value: ValueId,
    verification_types: &VerificationTypes<'g>,
) -> Result<VerificationType<RefType<ClassId<'g>>>, Error> {
    let method = code.method;
    let is_uninitialized_this = block == IrCode::ENTRY_BLOCK
        && !method.is_static()
        && method.name == UnqualifiedName::INIT
        && matches!(
            code.definition(value).map(|insn| &insn.kind),
            Some(InstructionKind::Argument { index: 0 })
        );
    if is_uninitialized_this {
        return Ok(VerificationType::UninitializedThis);
    }

    match code.value(value).out_type {
        DeclaredType::Field(FieldType::Base(base_type)) => {
            Ok(VerificationType::from(FieldType::<ClassId<'g>>::Base(base_type)))
        }
        _ => verification_types.type_of(value),
    }
}
