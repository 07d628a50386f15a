//! Operating system routines the generated code relies on.
//!
//! These are provided by the Jack OS and only referenced by name and arity.

use super::vm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum Routine {
    /// Allocates a block of the given size and returns its base address.
    #[strum(serialize = "Memory.alloc")]
    MemoryAlloc,
    /// Creates a string object with the given maximum length.
    #[strum(serialize = "String.new")]
    StringNew,
    /// Appends a character to a string and returns the string.
    #[strum(serialize = "String.appendChar")]
    StringAppendChar,
    #[strum(serialize = "Math.multiply")]
    MathMultiply,
    #[strum(serialize = "Math.divide")]
    MathDivide,
}

impl Routine {
    pub const fn arity(self) -> usize {
        match self {
            Self::MemoryAlloc | Self::StringNew => 1,
            Self::StringAppendChar | Self::MathMultiply | Self::MathDivide => 2,
        }
    }

    /// Call instruction for the routine (with its arguments already on the stack).
    pub fn call(self) -> vm::VMInstruction {
        let name: &'static str = self.into();

        vm::call(name, self.arity())
    }
}
