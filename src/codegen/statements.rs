use std::io::BufRead;

use super::{
    array, call,
    error::FallableAction,
    expression,
    vm::{self, LabelAction, Segment, VMCommand, VMWriter},
    Compiler,
};
use crate::common::Keyword;

/// Compile statements until something other than a statement keyword is found.
pub(super) fn construct<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    loop {
        match compiler.current_keyword() {
            Some(Keyword::Let) => construct_let(compiler)?,
            Some(Keyword::If) => construct_if(compiler)?,
            Some(Keyword::While) => construct_while(compiler)?,
            Some(Keyword::Do) => construct_do(compiler)?,
            Some(Keyword::Return) => construct_return(compiler)?,
            _ => return Ok(()),
        }
    }
}

/// `{ statements }`
fn construct_block<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_symbol('{')?;
    construct(compiler)?;
    compiler.expect_symbol('}')?;

    Ok(())
}

/// `let name = expression;` or `let name[expression] = expression;`
fn construct_let<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_keyword(Keyword::Let)?;

    let (name, span) = compiler.expect_identifier("a variable name")?;
    let target = compiler.resolve(&name, span)?;

    if compiler.at_symbol('[') {
        // the element address is computed before the assigned value is evaluated
        compiler.emit(target.push())?;
        compiler.expect_symbol('[')?;
        expression::construct(compiler)?;
        compiler.expect_symbol(']')?;
        compiler.emit(vm::command(VMCommand::Add))?;

        compiler.expect_symbol('=')?;
        expression::construct(compiler)?;

        compiler.emit_all(array::element_write())?;
    } else {
        compiler.expect_symbol('=')?;
        expression::construct(compiler)?;

        compiler.emit(target.pop())?;
    }

    compiler.expect_symbol(';')?;

    Ok(())
}

/// `if ( expression ) { statements } [else { statements }]`
fn construct_if<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    let labels = compiler.context.create_if_labels();

    compiler.expect_keyword(Keyword::If)?;
    construct_condition(compiler)?;
    compiler.emit(vm::label(LabelAction::IfGoto, labels.if_false.clone()))?;

    construct_block(compiler)?;

    compiler.emit_all([
        vm::label(LabelAction::Goto, labels.end.clone()),
        vm::label(LabelAction::Label, labels.if_false),
    ])?;

    if compiler.at_keyword(Keyword::Else) {
        compiler.expect_keyword(Keyword::Else)?;
        construct_block(compiler)?;
    }

    compiler.emit(vm::label(LabelAction::Label, labels.end))
}

/// `while ( expression ) { statements }`
fn construct_while<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    let labels = compiler.context.create_while_labels();

    compiler.expect_keyword(Keyword::While)?;
    compiler.emit(vm::label(LabelAction::Label, labels.expression.clone()))?;

    construct_condition(compiler)?;
    compiler.emit(vm::label(LabelAction::IfGoto, labels.end.clone()))?;

    construct_block(compiler)?;

    compiler.emit_all([
        vm::label(LabelAction::Goto, labels.expression),
        vm::label(LabelAction::Label, labels.end),
    ])
}

/// `( expression )`, negated so that a jump is taken when the condition is false.
fn construct_condition<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_symbol('(')?;
    expression::construct(compiler)?;
    compiler.expect_symbol(')')?;

    compiler.emit(vm::command(VMCommand::Not))
}

/// `do subroutineCall;`
fn construct_do<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_keyword(Keyword::Do)?;

    let (name, span) = compiler.expect_identifier("a subroutine call")?;
    call::construct(compiler, name, span)?;

    // every subroutine returns a value, which is discarded here
    compiler.emit(vm::pop(Segment::Temp, 0))?;

    compiler.expect_symbol(';')?;

    Ok(())
}

/// `return [expression];`
fn construct_return<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_keyword(Keyword::Return)?;

    if !compiler.at_symbol(';') {
        expression::construct(compiler)?;
    }

    compiler.emit(vm::vm_return())?;
    compiler.expect_symbol(';')?;

    Ok(())
}
