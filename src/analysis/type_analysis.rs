use super::{Error, TypeLatticeElement, Worklist};
use crate::ir::{InstructionId, InstructionKind, IrCode, ValueId, ValueKind};
use crate::jvm::class_graph::{ClassId, SubtypeOracle};
use crate::settings::Settings;
use std::collections::HashMap;

/// Query interface for abstract value types
pub trait TypeEnvironment<'g> {
    /// Abstract type of a value (`Bottom` means nothing is known yet)
    fn type_of(&self, value: ValueId) -> TypeLatticeElement<'g>;

    /// Class on which a virtual call will be dispatched
    ///
    /// This is the class declaring the invoked method, unless the receiver is known to be of a
    /// narrower subtype. Returns `None` if the instruction is not an invoke with a receiver.
    fn refined_receiver_type(
        &self,
        code: &IrCode<'g>,
        invoke: InstructionId,
        oracle: &dyn SubtypeOracle<'g>,
    ) -> Option<ClassId<'g>> {
        let insn = code.instruction(invoke);
        let declared = match insn.kind {
            InstructionKind::Invoke { method, .. } if !method.is_static() => method.class,
            _ => return None,
        };
        let receiver = *insn.inputs.first()?;
        match self.type_of(receiver) {
            TypeLatticeElement::Class { class, .. }
                if class != declared && oracle.is_subtype_of(class, declared) =>
            {
                Some(class)
            }
            _ => Some(declared),
        }
    }
}

/// Environment for when no analysis has been run: every value is `Top`
#[derive(Debug, Default, Clone, Copy)]
pub struct UnknownTypeEnvironment;

impl<'g> TypeEnvironment<'g> for UnknownTypeEnvironment {
    fn type_of(&self, _value: ValueId) -> TypeLatticeElement<'g> {
        TypeLatticeElement::Top
    }
}

/// Fixed point of abstract types over the value graph of one method
///
/// Types only ever move up the lattice: every update commits `join(old, candidate)`. Since the
/// lattice restricted to the classes of one method has finite height, the propagation always
/// terminates, even with phis forming cycles.
#[derive(Debug, Clone, Default)]
pub struct TypeAnalysis<'g> {
    types: HashMap<ValueId, TypeLatticeElement<'g>>,
}

impl<'g> TypeEnvironment<'g> for TypeAnalysis<'g> {
    fn type_of(&self, value: ValueId) -> TypeLatticeElement<'g> {
        self.types
            .get(&value)
            .copied()
            .unwrap_or(TypeLatticeElement::Bottom)
    }
}

impl<'g> TypeAnalysis<'g> {
    /// Analyze a method from scratch
    pub fn run(
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
        settings: &Settings,
    ) -> Result<TypeAnalysis<'g>, Error> {
        let mut analysis = TypeAnalysis::default();
        let mut worklist = Worklist::new();

        for (block, _) in code.blocks() {
            for (_, insn) in code.block_instructions(block) {
                if let (InstructionKind::Argument { index }, Some(output)) = (&insn.kind, insn.output)
                {
                    let typ = Self::argument_type(code, *index, output);
                    analysis.types.insert(output, typ);
                }
            }
            for (insn_id, insn) in code.block_instructions(block) {
                let output = match insn.output {
                    Some(output) if !insn.kind.is_argument() && !code.value(output).is_phi() => {
                        output
                    }
                    _ => continue,
                };
                if insn.kind.has_invariant_out_type() {
                    let typ = Self::invariant_type(code, insn_id, output);
                    analysis.types.insert(output, typ);
                } else {
                    worklist.push(output);
                }
            }
            worklist.extend(code.block(block).phis.iter().copied());
        }

        let steps = analysis.propagate(code, oracle, settings, worklist)?;
        log::debug!(
            "Type analysis of {:?} reached a fixed point after {} steps ({} typed values)",
            code.method,
            steps,
            analysis.types.len()
        );
        Ok(analysis)
    }

    /// Re-run propagation starting from just the given values
    ///
    /// This is for when a transformation has added values or users after the analysis ran. Types
    /// already computed are kept and can only move up.
    pub fn widening(
        &mut self,
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
        settings: &Settings,
        values: impl IntoIterator<Item = ValueId>,
    ) -> Result<(), Error> {
        let mut worklist = Worklist::new();
        worklist.extend(values);
        let steps = self.propagate(code, oracle, settings, worklist)?;
        log::debug!("Widening of {:?} took {} steps", code.method, steps);
        Ok(())
    }

    /// Number of values with a type other than `Bottom`
    pub fn typed_values(&self) -> usize {
        self.types.len()
    }

    fn propagate(
        &mut self,
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
        settings: &Settings,
        mut worklist: Worklist<ValueId>,
    ) -> Result<usize, Error> {
        let mut steps = 0;

        while let Some(value) = worklist.pop() {
            steps += 1;
            let is_phi = code.value(value).is_phi();
            let candidate = self.evaluate(code, oracle, value);
            let old = self.type_of(value);

            if is_phi && settings.check_monotonicity && old.join(candidate, oracle) != candidate {
                return Err(Error::NonMonotoneUpdate {
                    value,
                    old: old.to_string(),
                    candidate: candidate.to_string(),
                });
            }

            let new = old.join(candidate, oracle);
            if new == old {
                continue;
            }
            log::trace!("{}: {} -> {}", value, old, new);
            self.types.insert(value, new);

            let users = &code.value(value).users;
            for user in &users.instructions {
                let user = code.instruction(*user);
                if let Some(output) = user.output {
                    if !user.kind.has_invariant_out_type() && !user.kind.is_argument() {
                        worklist.push(output);
                    }
                }
            }
            worklist.extend(users.phis.iter().copied());
        }

        Ok(steps)
    }

    /// Type of a value given the current types of its inputs
    fn evaluate(
        &self,
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
        value: ValueId,
    ) -> TypeLatticeElement<'g> {
        if let ValueKind::Phi { operands, .. } = &code.value(value).kind {
            return TypeLatticeElement::join_all(
                operands.iter().map(|operand| self.type_of(*operand)),
                oracle,
            );
        }

        let insn_id = match code.value(value).definition() {
            Some(insn_id) => insn_id,
            None => return TypeLatticeElement::Bottom,
        };
        let insn = code.instruction(insn_id);
        let input = |index: usize| {
            insn.inputs
                .get(index)
                .map_or(TypeLatticeElement::Bottom, |input| self.type_of(*input))
        };
        match &insn.kind {
            InstructionKind::Argument { index } => Self::argument_type(code, *index, value),
            InstructionKind::CheckCast(cast_type) => input(0).check_cast(cast_type),
            InstructionKind::ArrayGet => input(0).array_get(),
            InstructionKind::Load | InstructionKind::Store => input(0),
            _ => Self::invariant_type(code, insn_id, value),
        }
    }

    /// Declared type of an argument
    ///
    /// The receiver is never null. Parameters might be.
    fn argument_type(code: &IrCode<'g>, index: usize, value: ValueId) -> TypeLatticeElement<'g> {
        let method = code.method;
        let parameter = if method.is_static() {
            Some(index)
        } else if index == 0 {
            return TypeLatticeElement::Class {
                class: method.class,
                nullable: false,
            };
        } else {
            Some(index - 1)
        };
        match parameter.and_then(|parameter| method.descriptor.parameters.get(parameter)) {
            Some(field_type) => TypeLatticeElement::from_field_type(field_type, true),
            None => TypeLatticeElement::from_declared_type(&code.value(value).out_type, true),
        }
    }

    /// Type of an output which does not depend on the types of the inputs
    fn invariant_type(
        code: &IrCode<'g>,
        insn: InstructionId,
        value: ValueId,
    ) -> TypeLatticeElement<'g> {
        let out_type = &code.value(value).out_type;
        match &code.instruction(insn).kind {
            InstructionKind::ConstNull => TypeLatticeElement::Null,
            InstructionKind::NewInstance(class) | InstructionKind::MoveException(class) => {
                TypeLatticeElement::Class {
                    class: *class,
                    nullable: false,
                }
            }
            InstructionKind::NewArray(array_type) => {
                TypeLatticeElement::from_ref_type(array_type, false)
            }
            InstructionKind::ConstString(_) | InstructionKind::ConstClass(_) => {
                TypeLatticeElement::from_declared_type(out_type, false)
            }
            _ => TypeLatticeElement::from_declared_type(out_type, true),
        }
    }
}
