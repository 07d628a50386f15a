use super::{
    runtime::Routine,
    vm::{self, Segment},
};

pub fn construct_integer(i: u16) -> Vec<vm::VMInstruction> {
    vec![vm::push(Segment::Constant, i.into())]
}

/// Allocate a new string sized to the literal, then append its characters one by one
/// (leaving the string object on the stack).
pub fn construct_string(s: &str) -> Vec<vm::VMInstruction> {
    let string_init = vec![
        vm::push(Segment::Constant, s.chars().count()),
        Routine::StringNew.call(),
    ];

    let string_population = s
        .chars()
        .flat_map(|c| {
            [
                vm::push(Segment::Constant, to_char_code(c)),
                Routine::StringAppendChar.call(),
            ]
        })
        .collect();

    [string_init, string_population].concat()
}

/// `true` is all ones (-1), `false` is 0.
pub fn construct_bool(b: bool) -> Vec<vm::VMInstruction> {
    if b {
        vec![
            vm::push(Segment::Constant, 1),
            vm::command(vm::VMCommand::Neg),
        ]
    } else {
        vec![vm::push(Segment::Constant, 0)]
    }
}

pub fn construct_null() -> Vec<vm::VMInstruction> {
    vec![vm::push(Segment::Constant, 0)]
}

fn to_char_code(c: char) -> usize {
    u32::from(c) as usize
}
