use std::io::BufRead;

use super::{
    context::{class::SubroutineKind, SymbolKind},
    error::FallableAction,
    runtime::Routine,
    statements, variable,
    vm::{self, Segment, VMWriter},
    Compiler,
};
use crate::common::Keyword;

/// Compile a subroutine declaration:
/// `(constructor | function | method) (void | type) name ( parameterList ) body`.
pub(super) fn construct<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    let expected = "`constructor`, `function` or `method`";

    let Some(kind) = compiler
        .current_keyword()
        .and_then(|keyword| SubroutineKind::try_from(keyword).ok())
    else {
        return Err(compiler.unexpected(expected));
    };
    compiler.advance(expected)?;

    construct_return_type(compiler)?;

    let (name, _) = compiler.expect_identifier("a subroutine name")?;

    log::debug!("compiling {kind} `{}.{name}`", compiler.context.class_name);
    compiler.context.enter_subroutine(name, kind);

    compiler.expect_symbol('(')?;
    construct_parameter_list(compiler)?;
    compiler.expect_symbol(')')?;

    construct_body(compiler, kind)
}

fn construct_return_type<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    if compiler.at_keyword(Keyword::Void) {
        compiler.expect_keyword(Keyword::Void)?;
    } else {
        compiler.expect_type()?;
    }

    Ok(())
}

/// Compile a (possibly empty) list of `type name` pairs separated by commas.
fn construct_parameter_list<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
) -> FallableAction {
    if compiler.at_symbol(')') {
        return Ok(());
    }

    loop {
        let type_name = compiler.expect_type()?;
        let (name, span) = compiler.expect_identifier("a parameter name")?;
        compiler.define(name, type_name, SymbolKind::Argument, span)?;

        if !compiler.at_symbol(',') {
            return Ok(());
        }

        compiler.expect_symbol(',')?;
    }
}

/// Compile `{ varDec* statements }`, emitting the function header
/// (and the prologue binding `this`) once all locals are known.
fn construct_body<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
    kind: SubroutineKind,
) -> FallableAction {
    compiler.expect_symbol('{')?;

    while compiler.at_keyword(Keyword::Var) {
        variable::construct(compiler, SymbolKind::Local)?;
    }

    let local_count = compiler.context.subroutine_scope.count(SymbolKind::Local);
    compiler.emit(vm::function(compiler.context.function_name(), local_count))?;

    match kind {
        SubroutineKind::Constructor => {
            let field_count = compiler.context.class_scope.count(SymbolKind::Field);

            compiler.emit_all([
                vm::push(Segment::Constant, field_count),
                Routine::MemoryAlloc.call(),
                vm::pop(Segment::Pointer, 0),
            ])?;
        }
        SubroutineKind::Method => {
            compiler.emit_all([
                vm::push(Segment::Argument, 0),
                vm::pop(Segment::Pointer, 0),
            ])?;
        }
        SubroutineKind::Function => {}
    }

    statements::construct(compiler)?;

    compiler.expect_symbol('}')?;

    Ok(())
}
