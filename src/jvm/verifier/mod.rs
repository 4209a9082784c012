//! Stack map frame vocabulary
//!
//! For any specific instruction inside a method body, the stack and locals must have the same
//! structure regardless of which control flow was used to reach that instruction. Although the
//! values in the stack and locals differ, their types and order cannot. That information is the
//! _stack map frame_ (represented using [`Frame`]) and the set of frames for all jump targets in a
//! method is the _stack map table_.
//!
//! The "types" used in verification (represented using [`VerificationType`]) are slightly
//! augmented JVM types: all small integral types collapse into `int`, and there are extra types
//! for `null`, unusable locals, and uninitialized `this`.
//!
//! See <https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.10.1>

mod frame;
mod types;

pub use frame::*;
pub use types::*;
