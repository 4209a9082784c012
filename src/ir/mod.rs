//! Per-method value graph
//!
//! All values, instructions, and blocks of a method live in flat vectors owned by [`IrCode`] and
//! refer to each other by index. This keeps the graph free of ownership cycles even though phis
//! make the value graph itself cyclic. Use sites are tracked as a back-reference from each value
//! to the instructions and phis reading it ([`Users`]), kept up to date by every mutation that
//! goes through [`IrCode`].

mod block;
mod instruction;
mod value;

pub use block::*;
pub use instruction::*;
pub use value::*;

use crate::analysis::Error;
use crate::jvm::class_graph::MethodId;
use crate::lower::StackSlot;

#[derive(Debug)]
pub struct IrCode<'g> {
    /// Method whose body this is
    pub method: MethodId<'g>,

    values: Vec<Value<'g>>,
    instructions: Vec<Instruction<'g>>,
    blocks: Vec<BasicBlock>,
}

impl<'g> IrCode<'g> {
    pub fn new(method: MethodId<'g>) -> IrCode<'g> {
        IrCode {
            method,
            values: vec![],
            instructions: vec![],
            blocks: vec![],
        }
    }

    /// The entry block is always the first block added
    pub const ENTRY_BLOCK: BlockId = BlockId(0);

    pub fn add_block(&mut self) -> BlockId {
        let block = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::default());
        block
    }

    /// Register a control flow edge from `predecessor` to `block`
    ///
    /// Phi operands added afterwards line up with the predecessors in the order they are added.
    pub fn add_predecessor(&mut self, block: BlockId, predecessor: BlockId) {
        self.blocks[block.0].predecessors.push(predecessor);
        self.blocks[predecessor.0].successors.push(block);
    }

    /// Add an instruction at the end of a block, creating its output value if there is a type
    pub fn append(
        &mut self,
        block: BlockId,
        kind: InstructionKind<'g>,
        inputs: Vec<ValueId>,
        out_type: Option<DeclaredType<'g>>,
    ) -> InstructionId {
        let insn = InstructionId(self.instructions.len());
        let output = out_type.map(|out_type| {
            self.push_value(Value {
                kind: ValueKind::Definition(insn),
                out_type,
                users: Users::default(),
            })
        });
        let insn = self.add_instruction(block, kind, inputs, output, None);
        self.blocks[block.0].instructions.push(insn);
        insn
    }

    /// Same as [`Self::append`], but returning the output value
    pub fn append_value(
        &mut self,
        block: BlockId,
        kind: InstructionKind<'g>,
        inputs: Vec<ValueId>,
        out_type: impl Into<DeclaredType<'g>>,
    ) -> ValueId {
        let output = self.push_value(Value {
            kind: ValueKind::Definition(InstructionId(self.instructions.len())),
            out_type: out_type.into(),
            users: Users::default(),
        });
        let insn = self.add_instruction(block, kind, inputs, Some(output), None);
        self.blocks[block.0].instructions.push(insn);
        output
    }

    /// Add a phi (without operands) at the entry of a block
    pub fn add_phi(&mut self, block: BlockId, out_type: impl Into<DeclaredType<'g>>) -> ValueId {
        let phi = self.push_value(Value {
            kind: ValueKind::Phi {
                block,
                operands: vec![],
            },
            out_type: out_type.into(),
            users: Users::default(),
        });
        self.blocks[block.0].phis.push(phi);
        phi
    }

    /// Add the operand for the next predecessor of the phi's block
    pub fn add_phi_operand(&mut self, phi: ValueId, operand: ValueId) -> Result<(), Error> {
        match &mut self.values[phi.0].kind {
            ValueKind::Phi { operands, .. } => operands.push(operand),
            _ => return Err(Error::NotAPhi { value: phi }),
        }
        self.values[operand.0].users.phis.insert(phi);
        Ok(())
    }

    pub fn set_position(&mut self, insn: InstructionId, position: Position) {
        self.instructions[insn.0].position = Some(position);
    }

    pub fn value(&self, value: ValueId) -> &Value<'g> {
        &self.values[value.0]
    }

    pub fn instruction(&self, insn: InstructionId) -> &Instruction<'g> {
        &self.instructions[insn.0]
    }

    pub fn block(&self, block: BlockId) -> &BasicBlock {
        &self.blocks[block.0]
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &Value<'g>)> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| (ValueId(idx), value))
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(idx, block)| (BlockId(idx), block))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Instructions of a block, in program order
    pub fn block_instructions(
        &self,
        block: BlockId,
    ) -> impl Iterator<Item = (InstructionId, &Instruction<'g>)> {
        self.blocks[block.0]
            .instructions
            .iter()
            .map(move |insn| (*insn, &self.instructions[insn.0]))
    }

    /// Instruction defining a value (`None` for phis)
    pub fn definition(&self, value: ValueId) -> Option<&Instruction<'g>> {
        self.values[value.0]
            .definition()
            .map(|insn| &self.instructions[insn.0])
    }

    /// Operands of a phi (empty for non-phis)
    pub fn phi_operands(&self, value: ValueId) -> &[ValueId] {
        match &self.values[value.0].kind {
            ValueKind::Phi { operands, .. } => operands,
            _ => &[],
        }
    }

    /// Is the value produced by a constant instruction?
    pub fn is_constant(&self, value: ValueId) -> bool {
        matches!(self.definition(value), Some(insn) if insn.kind.is_constant())
    }

    /// Does the block start by catching an exception?
    pub fn is_handler(&self, block: BlockId) -> bool {
        self.block_instructions(block)
            .find(|(_, insn)| !insn.kind.is_argument())
            .map_or(false, |(_, insn)| {
                matches!(insn.kind, InstructionKind::MoveException(_))
            })
    }

    fn push_value(&mut self, value: Value<'g>) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(value);
        id
    }

    /// Create an instruction (without placing it in its block's instruction list)
    pub(crate) fn add_instruction(
        &mut self,
        block: BlockId,
        kind: InstructionKind<'g>,
        inputs: Vec<ValueId>,
        output: Option<ValueId>,
        position: Option<Position>,
    ) -> InstructionId {
        let insn = InstructionId(self.instructions.len());
        for input in &inputs {
            self.values[input.0].users.instructions.insert(insn);
        }
        if let Some(output) = output {
            self.define(output, insn);
        }
        let out_type = output.map(|output| &self.values[output.0].out_type);
        if kind.can_throw(out_type) {
            self.blocks[block.0].throwing = true;
        }
        self.instructions.push(Instruction {
            kind,
            inputs,
            output,
            block,
            position,
        });
        insn
    }

    /// New operand stack value, defined by nothing yet
    pub(crate) fn add_stack_value(
        &mut self,
        slot: StackSlot<'g>,
        out_type: DeclaredType<'g>,
    ) -> ValueId {
        self.push_value(Value {
            kind: ValueKind::Stack {
                slot,
                definition: None,
            },
            out_type,
            users: Users::default(),
        })
    }

    /// Replace the input at `index` of an instruction, keeping use sites current
    pub(crate) fn replace_input(&mut self, insn: InstructionId, index: usize, new_input: ValueId) {
        let old_input = std::mem::replace(&mut self.instructions[insn.0].inputs[index], new_input);
        if !self.instructions[insn.0].inputs.contains(&old_input) {
            self.values[old_input.0].users.instructions.remove(&insn);
        }
        self.values[new_input.0].users.instructions.insert(insn);
    }

    /// Replace the output of an instruction
    ///
    /// The old output is left without a definition until it is given a new one.
    pub(crate) fn replace_output(&mut self, insn: InstructionId, new_output: ValueId) {
        self.instructions[insn.0].output = Some(new_output);
        self.define(new_output, insn);
    }

    /// Point a value at its defining instruction (phis keep being phis)
    fn define(&mut self, value: ValueId, insn: InstructionId) {
        match &mut self.values[value.0].kind {
            ValueKind::Phi { .. } => (),
            ValueKind::Stack { definition, .. } => *definition = Some(insn),
            ValueKind::Definition(definition) => *definition = insn,
        }
    }

    pub(crate) fn remove_phi_user(&mut self, value: ValueId, phi: ValueId) {
        self.values[value.0].users.phis.remove(&phi);
    }

    pub(crate) fn take_block_instructions(&mut self, block: BlockId) -> Vec<InstructionId> {
        std::mem::take(&mut self.blocks[block.0].instructions)
    }

    pub(crate) fn set_block_instructions(
        &mut self,
        block: BlockId,
        instructions: Vec<InstructionId>,
    ) {
        self.blocks[block.0].instructions = instructions;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::{ClassGraph, ClassGraphArenas, MethodData};
    use crate::jvm::{FieldType, MethodAccessFlags, Name, UnqualifiedName};

    #[test]
    fn use_sites_follow_construction() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types().unwrap();
        let method = class_graph.add_method(MethodData {
            class: java.lang.object,
            name: UnqualifiedName::from_str("loop").unwrap(),
            descriptor: class_graph.method_descriptor("(I)I").unwrap(),
            access_flags: MethodAccessFlags::STATIC,
        });

        let mut code = IrCode::new(method);
        let entry = code.add_block();
        let body = code.add_block();
        code.add_predecessor(body, entry);
        code.add_predecessor(body, body);

        let arg = code.append_value(
            entry,
            InstructionKind::Argument { index: 0 },
            vec![],
            FieldType::int(),
        );
        code.append(entry, InstructionKind::Goto, vec![], None);
        let phi = code.add_phi(body, FieldType::int());
        let sum = code.append_value(
            body,
            InstructionKind::Binop(BinaryOp::Add),
            vec![phi, phi],
            FieldType::int(),
        );
        code.add_phi_operand(phi, arg).unwrap();
        code.add_phi_operand(phi, sum).unwrap();

        assert_eq!(code.block(body).predecessors, vec![entry, body]);
        assert_eq!(code.block(entry).successors, vec![body]);
        assert_eq!(code.phi_operands(phi), &[arg, sum]);
        assert_eq!(code.value(arg).users.phis.len(), 1);
        assert_eq!(code.value(phi).users.instructions.len(), 1);
        assert!(code.value(sum).users.instructions.is_empty());
        assert!(!code.block(body).throwing);

        // Replacing one of two identical inputs keeps the use
        let add = code.value(sum).definition().unwrap();
        code.replace_input(add, 0, arg);
        assert!(code.value(phi).users.instructions.contains(&add));
        code.replace_input(add, 1, arg);
        assert!(code.value(phi).users.instructions.is_empty());
        assert!(code.value(arg).users.instructions.contains(&add));

        assert_eq!(
            code.add_phi_operand(sum, arg),
            Err(Error::NotAPhi { value: sum })
        );
        assert!(!code.value(arg).users.phis.contains(&sum));
    }

    #[test]
    fn only_integer_division_throws() {
        let arenas = ClassGraphArenas::new();
        let class_graph = ClassGraph::new(&arenas);
        let java = class_graph.insert_java_library_types().unwrap();
        let method = class_graph.add_method(MethodData {
            class: java.lang.object,
            name: UnqualifiedName::from_str("divide").unwrap(),
            descriptor: class_graph.method_descriptor("(FI)F").unwrap(),
            access_flags: MethodAccessFlags::STATIC,
        });

        let mut code = IrCode::new(method);
        let entry = code.add_block();
        let floats = code.add_block();
        let ints = code.add_block();
        let x = code.append_value(
            entry,
            InstructionKind::Argument { index: 0 },
            vec![],
            FieldType::float(),
        );
        let n = code.append_value(
            entry,
            InstructionKind::Argument { index: 1 },
            vec![],
            FieldType::int(),
        );
        assert!(!code.block(entry).throwing);

        code.append_value(
            floats,
            InstructionKind::Binop(BinaryOp::Rem),
            vec![x, x],
            FieldType::float(),
        );
        assert!(!code.block(floats).throwing);

        code.append_value(
            ints,
            InstructionKind::Binop(BinaryOp::Div),
            vec![n, n],
            FieldType::int(),
        );
        assert!(code.block(ints).throwing);

        let div = InstructionKind::Binop(BinaryOp::Div);
        assert!(div.can_throw(None));
        assert!(!InstructionKind::Binop(BinaryOp::Mul).can_throw(None));
    }
}
