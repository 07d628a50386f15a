use std::io::BufRead;

use super::{
    context::{class::SubroutineKind, SymbolKind},
    error::{Error, FallableAction},
    subroutine, variable,
    vm::VMWriter,
    Compiler,
};
use crate::common::Keyword;

/// Compile a whole class:
/// `class Name { classVarDec* subroutineDec* }`.
pub(super) fn construct<R: BufRead, W: VMWriter>(compiler: &mut Compiler<R, W>) -> FallableAction {
    compiler.expect_keyword(Keyword::Class)?;
    let (class_name, _) = compiler.expect_identifier("a class name")?;

    log::debug!("compiling class `{class_name}`");
    compiler.context.enter_class(class_name);

    compiler.expect_symbol('{')?;

    while let Some(kind) = class_variable_kind(compiler.current_keyword()) {
        variable::construct(compiler, kind)?;
    }

    while compiler
        .current_keyword()
        .is_some_and(|keyword| SubroutineKind::try_from(keyword).is_ok())
    {
        subroutine::construct(compiler)?;
    }

    compiler.expect_symbol('}')?;

    // a source file contains exactly one class
    if let Some(token) = compiler.tokenizer.current() {
        return Err(Error::TrailingInput {
            class_name: compiler.context.class_name.clone(),
            found: token.lexeme.clone(),
            span: token.span.clone(),
        });
    }

    Ok(())
}

const fn class_variable_kind(keyword: Option<Keyword>) -> Option<SymbolKind> {
    match keyword {
        Some(Keyword::Static) => Some(SymbolKind::Static),
        Some(Keyword::Field) => Some(SymbolKind::Field),
        _ => None,
    }
}
