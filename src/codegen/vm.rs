//! Hack VM instructions and the sinks they are emitted into.

use std::{io, str::FromStr};

use thiserror::Error;

// region: VMWriter

/// Destination of emitted instructions.
///
/// The compiler hands over every instruction as soon as the construct
/// producing it is recognized, so implementations see instructions
/// in their final order.
pub trait VMWriter {
    fn write(&mut self, instruction: VMInstruction) -> io::Result<()>;
}

/// Writes every instruction as a separate line of text.
#[derive(Debug)]
pub struct StreamWriter<W> {
    inner: W,
}

impl<W: io::Write> StreamWriter<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> VMWriter for StreamWriter<W> {
    fn write(&mut self, instruction: VMInstruction) -> io::Result<()> {
        writeln!(self.inner, "{instruction}")
    }
}

// endregion

// region: VMModule

/// In-memory collection of the instructions generated for a single class.
#[derive(Debug, Default)]
pub struct VMModule {
    instructions: Vec<VMInstruction>,
}

impl VMModule {
    pub const fn new() -> Self {
        Self {
            instructions: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[VMInstruction] {
        &self.instructions
    }

    pub fn compile(self) -> String {
        self.to_string()
    }
}

impl VMWriter for VMModule {
    fn write(&mut self, instruction: VMInstruction) -> io::Result<()> {
        self.instructions.push(instruction);
        Ok(())
    }
}

impl std::fmt::Display for VMModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{instruction}")?;
        }

        Ok(())
    }
}

// endregion

// region: VMInstruction

// region: VMInstruction utility functions

/// Utility function for the `push` VM instruction.
pub const fn push(segment: Segment, i: usize) -> VMInstruction {
    VMInstruction::Push(segment, i)
}

/// Utility function for the `pop` VM instruction.
pub const fn pop(segment: Segment, i: usize) -> VMInstruction {
    VMInstruction::Pop(segment, i)
}

/// Utility function for the arithmetic/logical VM instructions.
pub const fn command(command: VMCommand) -> VMInstruction {
    VMInstruction::Command(command)
}

/// Utility function for the `return` VM instruction.
pub const fn vm_return() -> VMInstruction {
    VMInstruction::Command(VMCommand::Return)
}

/// Utility function for the `label`, `goto` and `if-goto` VM instructions.
pub fn label<S: Into<String>>(label_action: LabelAction, label: S) -> VMInstruction {
    VMInstruction::Label(label_action, label.into())
}

/// Utility function for the `function` VM instruction.
pub fn function<S: Into<String>>(function_name: S, variable_count: usize) -> VMInstruction {
    VMInstruction::Function(function_name.into(), variable_count)
}

/// Utility function for the `call` VM instruction.
pub fn call<S: Into<String>>(function_name: S, argument_count: usize) -> VMInstruction {
    VMInstruction::Call(function_name.into(), argument_count)
}

// endregion

type Index = usize;
type Label = String;
type Count = usize;
type FunctionName = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VMInstruction {
    Push(Segment, Index),
    Pop(Segment, Index),
    Command(VMCommand),
    Label(LabelAction, Label),
    Function(FunctionName, Count),
    Call(FunctionName, Count),
}

impl std::fmt::Display for VMInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push(segment, i) => write!(f, "push {segment} {i}"),
            Self::Pop(segment, i) => write!(f, "pop {segment} {i}"),
            Self::Command(command) => write!(f, "{command}"),
            Self::Label(label_action, label) => write!(f, "{label_action} {label}"),
            Self::Function(function_name, variable_count) => {
                write!(f, "function {function_name} {variable_count}")
            }
            Self::Call(function_name, argument_count) => {
                write!(f, "call {function_name} {argument_count}")
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid VM instruction `{0}`")]
pub struct ParseInstructionError(String);

impl FromStr for VMInstruction {
    type Err = ParseInstructionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseInstructionError(line.to_owned());
        let words: Vec<&str> = line.split_whitespace().collect();

        let instruction = match words.as_slice() {
            ["push", segment, i] => Self::Push(
                segment.parse().map_err(|_| invalid())?,
                i.parse().map_err(|_| invalid())?,
            ),
            ["pop", segment, i] => Self::Pop(
                segment.parse().map_err(|_| invalid())?,
                i.parse().map_err(|_| invalid())?,
            ),
            ["function", name, count] => {
                Self::Function((*name).to_owned(), count.parse().map_err(|_| invalid())?)
            }
            ["call", name, count] => {
                Self::Call((*name).to_owned(), count.parse().map_err(|_| invalid())?)
            }
            [label_action, label] => Self::Label(
                label_action.parse().map_err(|_| invalid())?,
                (*label).to_owned(),
            ),
            [command] => Self::Command(command.parse().map_err(|_| invalid())?),
            _ => return Err(invalid()),
        };

        Ok(instruction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum VMCommand {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum LabelAction {
    Label,
    Goto,
    IfGoto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Segment {
    Local,
    Argument,
    Static,
    Constant,
    This,
    That,
    Pointer,
    Temp,
}

// endregion
