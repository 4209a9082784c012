use super::{Error, TypeLatticeElement, Worklist};
use crate::ir::{InstructionId, InstructionKind, IrCode, ValueId, ValueKind};
use crate::jvm::class_graph::{ClassId, SubtypeOracle};
use crate::jvm::verifier::VerificationType;
use crate::jvm::RefType;
use std::collections::HashMap;

/// Precise reference types of values, as needed in stack map frames
///
/// This is a second fixed point, separate from [`super::TypeAnalysis`]: only reference values are
/// tracked, casts are exactly their cast type, and the receiver is always the class holding the
/// method.
#[derive(Debug, Clone)]
pub struct VerificationTypes<'g> {
    types: HashMap<ValueId, TypeLatticeElement<'g>>,
}

impl<'g> VerificationTypes<'g> {
    pub fn compute(
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
    ) -> Result<VerificationTypes<'g>, Error> {
        let mut types = HashMap::new();
        let mut worklist = Worklist::new();

        for (block, _) in code.blocks() {
            for (insn_id, insn) in code.block_instructions(block) {
                let output = match insn.output {
                    Some(output) if Self::is_tracked(code, output) => output,
                    _ => continue,
                };
                match &insn.kind {
                    InstructionKind::Argument { index } => {
                        types.insert(output, Self::argument_type(code, *index, output));
                    }
                    kind if kind.has_invariant_verification_type() => {
                        types.insert(output, Self::invariant_type(code, insn_id, output));
                    }
                    _ => {
                        worklist.push(output);
                    }
                }
            }
            for phi in &code.block(block).phis {
                if Self::is_tracked(code, *phi) {
                    worklist.push(*phi);
                }
            }
        }

        let mut steps = 0;
        while let Some(value) = worklist.pop() {
            steps += 1;
            let old = types
                .get(&value)
                .copied()
                .unwrap_or(TypeLatticeElement::Bottom);
            let candidate = Self::evaluate(code, oracle, &types, value);
            let new = old.join(candidate, oracle);
            if !new.is_reference() && !new.is_bottom() {
                return Err(Error::NonReferenceJoin {
                    value: Some(value),
                    joined: new.to_string(),
                });
            }
            if new == old {
                continue;
            }
            types.insert(value, new);

            let users = &code.value(value).users;
            for user in &users.instructions {
                let user = code.instruction(*user);
                match user.output {
                    Some(output)
                        if Self::is_tracked(code, output)
                            && !user.kind.is_argument()
                            && !user.kind.has_invariant_verification_type() =>
                    {
                        worklist.push(output);
                    }
                    _ => (),
                }
            }
            worklist.extend(
                users
                    .phis
                    .iter()
                    .copied()
                    .filter(|phi| Self::is_tracked(code, *phi)),
            );
        }

        // Values never reached fall back to their declared type
        for (value, data) in code.values() {
            if data.out_type.is_reference() {
                let typ = types.entry(value).or_insert(TypeLatticeElement::Bottom);
                if typ.is_bottom() {
                    *typ = TypeLatticeElement::from_declared_type(&data.out_type, true);
                }
            }
        }

        log::debug!(
            "Verification types of {:?} reached a fixed point after {} steps",
            code.method,
            steps
        );
        Ok(VerificationTypes { types })
    }

    /// Verification type of a reference value
    pub fn type_of(
        &self,
        value: ValueId,
    ) -> Result<VerificationType<RefType<ClassId<'g>>>, Error> {
        match self.types.get(&value) {
            None => Err(Error::PrimitiveVerificationQuery { value }),
            Some(TypeLatticeElement::Null) => Ok(VerificationType::Null),
            Some(typ) => typ
                .to_ref_type()
                .map(VerificationType::Object)
                .ok_or_else(|| Error::NonReferenceJoin {
                    value: Some(value),
                    joined: typ.to_string(),
                }),
        }
    }

    /// Lattice element backing the verification type of a value
    pub fn lattice_type_of(&self, value: ValueId) -> Option<TypeLatticeElement<'g>> {
        self.types.get(&value).copied()
    }

    /// Least upper bound of a set of reference types
    pub fn join_class_types(
        classes: impl IntoIterator<Item = RefType<ClassId<'g>>>,
        oracle: &dyn SubtypeOracle<'g>,
    ) -> Result<RefType<ClassId<'g>>, Error> {
        let classes: Vec<RefType<ClassId<'g>>> = classes.into_iter().collect();
        if let [single] = classes.as_slice() {
            return Ok(*single);
        }
        let joined = TypeLatticeElement::join_all(
            classes
                .iter()
                .map(|class| TypeLatticeElement::from_ref_type(class, false)),
            oracle,
        );
        joined.to_ref_type().ok_or_else(|| Error::NonReferenceJoin {
            value: None,
            joined: joined.to_string(),
        })
    }

    fn is_tracked(code: &IrCode<'g>, value: ValueId) -> bool {
        code.value(value).out_type.is_reference()
    }

    fn evaluate(
        code: &IrCode<'g>,
        oracle: &dyn SubtypeOracle<'g>,
        types: &HashMap<ValueId, TypeLatticeElement<'g>>,
        value: ValueId,
    ) -> TypeLatticeElement<'g> {
        let type_of = |value: &ValueId| {
            types
                .get(value)
                .copied()
                .unwrap_or(TypeLatticeElement::Bottom)
        };
        match &code.value(value).kind {
            ValueKind::Phi { operands, .. } => {
                TypeLatticeElement::join_all(operands.iter().map(type_of), oracle)
            }
            _ => match code.definition(value) {
                Some(insn) => match insn.kind {
                    InstructionKind::Load | InstructionKind::Store => {
                        insn.inputs.first().map_or(TypeLatticeElement::Bottom, type_of)
                    }
                    _ => TypeLatticeElement::from_declared_type(&code.value(value).out_type, true),
                },
                None => TypeLatticeElement::Bottom,
            },
        }
    }

    /// Receiver is the class holding the method, parameters are their declared types
    fn argument_type(code: &IrCode<'g>, index: usize, value: ValueId) -> TypeLatticeElement<'g> {
        let method = code.method;
        let parameter = match (method.is_static(), index) {
            (false, 0) => {
                return TypeLatticeElement::Class {
                    class: method.class,
                    nullable: false,
                }
            }
            (false, index) => index - 1,
            (true, index) => index,
        };
        match method.descriptor.parameters.get(parameter) {
            Some(field_type) => TypeLatticeElement::from_field_type(field_type, true),
            None => TypeLatticeElement::from_declared_type(&code.value(value).out_type, true),
        }
    }

    fn invariant_type(
        code: &IrCode<'g>,
        insn: InstructionId,
        value: ValueId,
    ) -> TypeLatticeElement<'g> {
        let insn = code.instruction(insn);
        let declared = TypeLatticeElement::from_declared_type(&code.value(value).out_type, true);
        match &insn.kind {
            InstructionKind::ConstNull => TypeLatticeElement::Null,
            InstructionKind::CheckCast(cast_type) => {
                TypeLatticeElement::from_ref_type(cast_type, true)
            }
            InstructionKind::NewInstance(class) | InstructionKind::MoveException(class) => {
                TypeLatticeElement::Class {
                    class: *class,
                    nullable: false,
                }
            }
            InstructionKind::NewArray(array_type) => {
                TypeLatticeElement::from_ref_type(array_type, false)
            }
            InstructionKind::ArrayGet => {
                let element = insn
                    .inputs
                    .first()
                    .and_then(|array| code.value(*array).out_type.ref_type())
                    .map(|array| TypeLatticeElement::from_ref_type(&array, true).array_get());
                match element {
                    Some(element) if element.is_reference() => element,
                    _ => declared,
                }
            }
            _ => declared,
        }
    }
}
