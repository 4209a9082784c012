/// Knobs controlling how a method is analyzed and lowered
#[derive(Debug, Clone)]
pub struct Settings {
    /// Re-push constants at each use instead of storing them to a local
    ///
    /// This trades a few extra instructions for fewer locals and simpler stack height accounting.
    /// When disabled, constant-producing instructions are treated like any other instruction.
    pub rematerialize_constants: bool,

    /// Type object stack slots using the verification types
    ///
    /// When disabled (or when verification types are not available), stack slots fall back to the
    /// statically declared type of the value.
    pub precise_stack_values: bool,

    /// Check that every recomputed phi type is an upper bound of its previous type
    ///
    /// A violation means the fixed point would be unsound. This is reported as an internal error.
    pub check_monotonicity: bool,

    /// Compute the frame at the entry of every block after lowering
    pub compute_frames: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            rematerialize_constants: true,
            precise_stack_values: true,
            check_monotonicity: cfg!(debug_assertions),
            compute_frames: true,
        }
    }
}
