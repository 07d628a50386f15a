//! Instruction sequences for accessing array elements
//! through the `that` segment.
//!
//! Both expect the address of the element (array base + index)
//! to already be computed on the stack.

use super::vm::{self, Segment};

/// Replace the element address on top of the stack with the element's value.
pub fn element_read() -> Vec<vm::VMInstruction> {
    vec![vm::pop(Segment::Pointer, 1), vm::push(Segment::That, 0)]
}

/// Store the value on top of the stack into the element
/// whose address lies right below it.
///
/// The value is parked in `temp 0` while `pointer 1` is being set,
/// since evaluating the value may itself have moved `pointer 1`.
pub fn element_write() -> Vec<vm::VMInstruction> {
    vec![
        vm::pop(Segment::Temp, 0),
        vm::pop(Segment::Pointer, 1),
        vm::push(Segment::Temp, 0),
        vm::pop(Segment::That, 0),
    ]
}
