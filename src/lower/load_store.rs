use super::{LocalAllocator, StackSlot, StackValueType};
use crate::analysis::{Error, VerificationTypes};
use crate::ir::{BlockId, InstructionId, InstructionKind, IrCode, Position, ValueId, ValueKind};
use crate::jvm::verifier::VerificationType;
use crate::settings::Settings;
use crate::util::{Offset, OffsetVec};

/// Converts a method body from values in locals to explicit operand stack instructions
///
/// Every input is pushed right before the instruction reading it (in operand order), and every
/// output is popped right after into the local of the value (or discarded if the value is
/// unused). Constants are re-pushed at each use instead of being stored.
pub struct LoadStoreHelper<'a, 'g> {
    code: &'a mut IrCode<'g>,
    verification_types: Option<&'a VerificationTypes<'g>>,
    settings: &'a Settings,

    /// Highest the operand stack has been so far
    max_stack: Offset,
}

impl<'a, 'g> LoadStoreHelper<'a, 'g> {
    pub fn new(
        code: &'a mut IrCode<'g>,
        verification_types: Option<&'a VerificationTypes<'g>>,
        settings: &'a Settings,
    ) -> Self {
        LoadStoreHelper {
            code,
            verification_types,
            settings,
            max_stack: Offset(0),
        }
    }

    pub fn max_stack(&self) -> Offset {
        self.max_stack
    }

    /// Rewrite every instruction to read its inputs from and write its output to the stack
    pub fn insert_loads_and_stores(&mut self) -> Result<(), Error> {
        for block in 0..self.code.block_count() {
            let block = BlockId(block);
            let old_instructions = self.code.take_block_instructions(block);
            let mut instructions = Vec::with_capacity(old_instructions.len() * 2);
            let mut stack: OffsetVec<StackValueType<'g>> = OffsetVec::new();

            for insn_id in old_instructions {
                self.convert_instruction(block, insn_id, &mut stack, &mut instructions)?;
            }

            self.code.set_block_instructions(block, instructions);
        }

        log::debug!(
            "Loads and stores of {:?} need a stack of {}",
            self.code.method,
            self.max_stack.0
        );
        Ok(())
    }

    fn convert_instruction(
        &mut self,
        block: BlockId,
        insn_id: InstructionId,
        stack: &mut OffsetVec<StackValueType<'g>>,
        instructions: &mut Vec<InstructionId>,
    ) -> Result<(), Error> {
        let insn = self.code.instruction(insn_id);
        let inputs = insn.inputs.clone();
        let output = insn.output;
        let position = insn.position;

        // Arguments are already in their locals on entry
        if insn.kind.is_argument() {
            instructions.push(insn_id);
            return Ok(());
        }

        // Constants are pushed again at each use
        if insn.kind.is_constant() {
            let on_stack = output.map_or(false, |output| self.code.value(output).is_stack());
            if self.settings.rematerialize_constants || on_stack {
                log::trace!("Dropping {} (constant pushed at each use)", insn_id);
                return Ok(());
            }
        }

        for (index, input) in inputs.iter().enumerate() {
            if self.code.value(*input).is_stack() && !self.code.is_constant(*input) {
                return Err(Error::UnexpectedStackValue {
                    instruction: insn_id,
                    value: *input,
                });
            }
            let stack_value = self.push_value(block, *input, stack, instructions, position);
            self.code.replace_input(insn_id, index, stack_value);
        }
        for _ in &inputs {
            stack.pop();
        }

        let output = match output {
            None => {
                instructions.push(insn_id);
                return Ok(());
            }
            Some(output) if self.code.value(output).is_stack() => {
                return Err(Error::UnexpectedStackValue {
                    instruction: insn_id,
                    value: output,
                });
            }
            Some(output) => output,
        };

        let value_type = self.stack_value_type(output);
        let stack_value = self.new_stack_value(output, value_type, stack);
        self.code.replace_output(insn_id, stack_value);
        instructions.push(insn_id);

        if self.code.value(output).users.is_empty() {
            let pop = self.code.add_instruction(
                block,
                InstructionKind::Pop,
                vec![stack_value],
                None,
                position,
            );
            log::trace!("Pop {} after {}", output, insn_id);
            instructions.push(pop);
        } else {
            let store = self.code.add_instruction(
                block,
                InstructionKind::Store,
                vec![stack_value],
                Some(output),
                position,
            );
            log::trace!("Store {} after {}", output, insn_id);
            instructions.push(store);
        }
        stack.pop();

        Ok(())
    }

    /// Assign every phi from the operand of each incoming edge
    ///
    /// Phis of a block are assigned simultaneously. On each edge, all moving operands are first
    /// pushed onto the stack and only then stored (in reverse) into the phis, so that no local is
    /// overwritten while its old value is still needed. Moves are placed before the jump ending
    /// the predecessor.
    pub fn insert_phi_moves(&mut self, allocator: &mut dyn LocalAllocator) -> Result<(), Error> {
        for block in 0..self.code.block_count() {
            let block = BlockId(block);
            let phis = self.code.block(block).phis.clone();
            if phis.is_empty() {
                continue;
            }
            let predecessors = self.code.block(block).predecessors.clone();
            for phi in &phis {
                let found = self.code.phi_operands(*phi).len();
                if found != predecessors.len() {
                    return Err(Error::MissingPhiOperand {
                        phi: *phi,
                        expected: predecessors.len(),
                        found,
                    });
                }
            }

            for (edge, predecessor) in predecessors.iter().enumerate() {
                let moves: Vec<(ValueId, ValueId)> = phis
                    .iter()
                    .map(|phi| (*phi, self.code.phi_operands(*phi)[edge]))
                    .filter(|(phi, operand)| {
                        let destination = allocator.local_of(*phi);
                        self.code.is_constant(*operand)
                            || destination.is_none()
                            || destination != allocator.local_of(*operand)
                    })
                    .collect();
                if moves.is_empty() {
                    continue;
                }
                if self.code.block(*predecessor).successors.len() > 1 {
                    return Err(Error::CriticalEdge {
                        from: *predecessor,
                        to: block,
                    });
                }
                self.insert_parallel_moves(*predecessor, &moves);
            }

            for phi in &phis {
                for operand in self.code.phi_operands(*phi).to_vec() {
                    self.code.remove_phi_user(operand, *phi);
                }
                allocator.add_live_at_entry(block, *phi);
            }
        }
        Ok(())
    }

    fn insert_parallel_moves(&mut self, block: BlockId, moves: &[(ValueId, ValueId)]) {
        let mut instructions = self.code.take_block_instructions(block);
        let ends_with_jump = instructions
            .last()
            .map_or(false, |last| self.code.instruction(*last).kind.is_goto());
        let jump = if ends_with_jump {
            instructions.pop()
        } else {
            None
        };
        let position = jump.and_then(|jump| self.code.instruction(jump).position);
        let mut stack: OffsetVec<StackValueType<'g>> = OffsetVec::new();

        let temporaries: Vec<ValueId> = moves
            .iter()
            .map(|(_, operand)| {
                self.push_value(block, *operand, &mut stack, &mut instructions, position)
            })
            .collect();

        for ((phi, operand), temporary) in moves.iter().zip(temporaries).rev() {
            stack.pop();
            let store = self.code.add_instruction(
                block,
                InstructionKind::Store,
                vec![temporary],
                Some(*phi),
                position,
            );
            log::trace!("Phi move {} <- {} in {}", phi, operand, block);
            instructions.push(store);
        }

        instructions.extend(jump);
        self.code.set_block_instructions(block, instructions);
    }

    /// Push a value onto the stack, either by loading it or by re-pushing its constant
    fn push_value(
        &mut self,
        block: BlockId,
        value: ValueId,
        stack: &mut OffsetVec<StackValueType<'g>>,
        instructions: &mut Vec<InstructionId>,
        position: Option<Position>,
    ) -> ValueId {
        let value_type = self.stack_value_type(value);
        let stack_value = self.new_stack_value(value, value_type, stack);

        let constant = self
            .code
            .definition(value)
            .filter(|definition| definition.kind.is_constant())
            .map(|definition| definition.kind.clone())
            .filter(|_| self.settings.rematerialize_constants || self.code.value(value).is_stack());
        let insn = match constant {
            Some(kind) => {
                log::trace!("Push constant {:?} for {}", kind, value);
                self.code
                    .add_instruction(block, kind, vec![], Some(stack_value), position)
            }
            None => {
                log::trace!("Load {}", value);
                self.code.add_instruction(
                    block,
                    InstructionKind::Load,
                    vec![value],
                    Some(stack_value),
                    position,
                )
            }
        };
        instructions.push(insn);
        stack_value
    }

    /// Create a stack value at the top of the stack
    fn new_stack_value(
        &mut self,
        value: ValueId,
        value_type: StackValueType<'g>,
        stack: &mut OffsetVec<StackValueType<'g>>,
    ) -> ValueId {
        let height = stack.push(value_type);
        self.max_stack.0 = self.max_stack.0.max(stack.offset_len().0);
        let out_type = self.code.value(value).out_type;
        self.code
            .add_stack_value(StackSlot { height, value_type }, out_type)
    }

    /// Object slots use the precise verification type, falling back to the declared type
    fn stack_value_type(&self, value: ValueId) -> StackValueType<'g> {
        let data = self.code.value(value);
        if let ValueKind::Stack { slot, .. } = &data.kind {
            return slot.value_type;
        }
        let precise = self
            .verification_types
            .filter(|_| self.settings.precise_stack_values && data.out_type.is_reference())
            .and_then(|types| types.type_of(value).ok());
        match precise {
            Some(VerificationType::Object(ref_type)) => StackValueType::Object(ref_type),
            Some(VerificationType::Null) => StackValueType::Null,
            _ => StackValueType::from_declared_type(&data.out_type),
        }
    }
}
