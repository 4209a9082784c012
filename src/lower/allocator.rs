use crate::ir::{BlockId, InstructionKind, IrCode, ValueId, ValueKind};
use crate::settings::Settings;
use crate::util::Width;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Assignment of values to local variable slots
///
/// Phi resolution only reads the assignment (to skip moves between identical slots) and records
/// which phis are live at the entry of their block.
pub trait LocalAllocator {
    /// Local variable holding the value, if it has one
    fn local_of(&self, value: ValueId) -> Option<u16>;

    fn add_live_at_entry(&mut self, block: BlockId, value: ValueId);

    /// Values live at the entry of a block
    fn live_at_entry(&self, block: BlockId) -> Vec<ValueId>;
}

/// Map based [`LocalAllocator`]
#[derive(Debug, Default, Clone)]
pub struct LocalAssignment {
    locals: HashMap<ValueId, u16>,
    live_at_entry: BTreeMap<BlockId, BTreeSet<ValueId>>,

    /// First local not yet handed out
    next_local: u16,
}

impl LocalAssignment {
    pub fn new() -> LocalAssignment {
        LocalAssignment::default()
    }

    /// Put a value in a specific local
    pub fn assign(&mut self, value: ValueId, local: u16) {
        self.locals.insert(value, local);
        self.next_local = self.next_local.max(local + 1);
    }

    /// Reserve a new local of the given width
    pub fn fresh(&mut self, width: usize) -> u16 {
        let local = self.next_local;
        self.next_local += width as u16;
        local
    }

    /// Share the local of `with` (returns `false` if `with` has no local)
    pub fn coalesce(&mut self, value: ValueId, with: ValueId) -> bool {
        match self.locals.get(&with).copied() {
            Some(local) => {
                self.locals.insert(value, local);
                true
            }
            None => false,
        }
    }

    /// Number of locals used
    pub fn max_locals(&self) -> u16 {
        self.next_local
    }

    /// Every argument in its parameter slot, and a fresh local for every other stored value
    ///
    /// Stored values are phis and used outputs of instructions. Constants only get a local when
    /// they are not re-pushed at each use.
    pub fn naive(code: &IrCode<'_>, settings: &Settings) -> LocalAssignment {
        let mut assignment = LocalAssignment::new();

        let mut arguments: Vec<(usize, ValueId)> = code
            .block_instructions(IrCode::ENTRY_BLOCK)
            .filter_map(|(_, insn)| match (&insn.kind, insn.output) {
                (InstructionKind::Argument { index }, Some(output)) => Some((*index, output)),
                _ => None,
            })
            .collect();
        arguments.sort();
        for (_, argument) in arguments {
            let local = assignment.fresh(code.value(argument).out_type.width());
            assignment.locals.insert(argument, local);
            assignment.add_live_at_entry(IrCode::ENTRY_BLOCK, argument);
        }

        for (value, data) in code.values() {
            if assignment.locals.contains_key(&value) {
                continue;
            }
            let needs_local = match data.kind {
                ValueKind::Phi { .. } => true,
                ValueKind::Stack { .. } => false,
                ValueKind::Definition(insn) => {
                    let kind = &code.instruction(insn).kind;
                    !data.users.is_empty()
                        && !kind.is_argument()
                        && !(kind.is_constant() && settings.rematerialize_constants)
                }
            };
            if needs_local {
                let local = assignment.fresh(data.out_type.width());
                assignment.locals.insert(value, local);
            }
        }

        assignment
    }
}

impl LocalAllocator for LocalAssignment {
    fn local_of(&self, value: ValueId) -> Option<u16> {
        self.locals.get(&value).copied()
    }

    fn add_live_at_entry(&mut self, block: BlockId, value: ValueId) {
        self.live_at_entry.entry(block).or_default().insert(value);
    }

    fn live_at_entry(&self, block: BlockId) -> Vec<ValueId> {
        self.live_at_entry
            .get(&block)
            .map(|values| values.iter().copied().collect())
            .unwrap_or_default()
    }
}
