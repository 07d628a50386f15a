use std::io::BufRead;

use phf::phf_map;

use super::{
    array, call,
    error::FallableAction,
    literal,
    runtime::Routine,
    unexpected_token,
    vm::{self, Segment, VMCommand, VMWriter},
    Compiler,
};
use crate::common::{Keyword, Span, TokenKind};

/// How a binary operator is carried out by the VM.
#[derive(Debug, Clone, Copy)]
enum Operation {
    Command(VMCommand),
    Routine(Routine),
}

impl Operation {
    fn instruction(self) -> vm::VMInstruction {
        match self {
            Self::Command(command) => vm::command(command),
            Self::Routine(routine) => routine.call(),
        }
    }
}

static BINARY_OPERATORS: phf::Map<char, Operation> = phf_map! {
    '+' => Operation::Command(VMCommand::Add),
    '-' => Operation::Command(VMCommand::Sub),
    '*' => Operation::Routine(Routine::MathMultiply),
    '/' => Operation::Routine(Routine::MathDivide),
    '&' => Operation::Command(VMCommand::And),
    '|' => Operation::Command(VMCommand::Or),
    '<' => Operation::Command(VMCommand::Lt),
    '>' => Operation::Command(VMCommand::Gt),
    '=' => Operation::Command(VMCommand::Eq),
};

/// Compile `term (op term)*`.
///
/// All operators have the same precedence and are applied strictly
/// left to right, so `2 + 3 * 4` is `(2 + 3) * 4`.
pub(super) fn construct<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    construct_term(compiler)?;

    while let Some(operation) = current_operator(compiler) {
        compiler.advance("an operator")?;
        construct_term(compiler)?;

        compiler.emit(operation.instruction())?;
    }

    Ok(())
}

fn current_operator<R: BufRead, W: VMWriter>(compiler: &Compiler<R, W>) -> Option<Operation> {
    match compiler.tokenizer.current()?.kind {
        TokenKind::Symbol(symbol) => BINARY_OPERATORS.get(&symbol).copied(),
        _ => None,
    }
}

fn construct_term<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    let expected = "a term";
    let token = compiler.advance(expected)?;

    match token.kind {
        TokenKind::IntegerConstant(i) => compiler.emit_all(literal::construct_integer(i)),
        TokenKind::StringConstant(s) => compiler.emit_all(literal::construct_string(&s)),
        TokenKind::Keyword(Keyword::True) => compiler.emit_all(literal::construct_bool(true)),
        TokenKind::Keyword(Keyword::False) => compiler.emit_all(literal::construct_bool(false)),
        TokenKind::Keyword(Keyword::Null) => compiler.emit_all(literal::construct_null()),
        TokenKind::Keyword(Keyword::This) => compiler.emit(this(compiler)),
        TokenKind::Symbol('(') => {
            construct(compiler)?;
            compiler.expect_symbol(')')?;

            Ok(())
        }
        TokenKind::Symbol('-') => {
            construct_term(compiler)?;
            compiler.emit(vm::command(VMCommand::Neg))
        }
        TokenKind::Symbol('~') => {
            construct_term(compiler)?;
            compiler.emit(vm::command(VMCommand::Not))
        }
        TokenKind::Identifier(name) => construct_identifier(compiler, name, token.span),
        TokenKind::Keyword(_) | TokenKind::Symbol(_) => Err(unexpected_token(token, expected)),
    }
}

/// Compile a term starting with an identifier: a variable,
/// an array element or a subroutine call.
fn construct_identifier<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
    name: String,
    span: Span,
) -> FallableAction {
    if compiler.at_symbol('[') {
        let array = compiler.resolve(&name, span)?;

        compiler.emit(array.push())?;
        compiler.expect_symbol('[')?;
        construct(compiler)?;
        compiler.expect_symbol(']')?;
        compiler.emit(vm::command(VMCommand::Add))?;

        compiler.emit_all(array::element_read())
    } else if compiler.at_symbol('(') || compiler.at_symbol('.') {
        call::construct(compiler, name, span)
    } else {
        let variable = compiler.resolve(&name, span)?;

        compiler.emit(variable.push())
    }
}

/// `this` is the implicit first argument inside a method,
/// and the bound object pointer everywhere else.
pub(super) fn this<R: BufRead, W: VMWriter>(compiler: &Compiler<R, W>) -> vm::VMInstruction {
    compiler
        .context
        .resolve(&Keyword::This.to_string())
        .map_or(vm::push(Segment::Pointer, 0), |symbol| symbol.push())
}
