use std::io::BufRead;

use super::{context::SymbolKind, error::FallableAction, vm::VMWriter, Compiler};

/// Compile a variable declaration (`static`, `field` or `var`), such as
/// `field int x, y;`, defining every listed name with the given kind.
///
/// Declarations produce no instructions.
pub(super) fn construct<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
    kind: SymbolKind,
) -> FallableAction {
    // `static`, `field` or `var`, already checked by the caller
    compiler.advance("a variable declaration")?;

    let type_name = compiler.expect_type()?;

    loop {
        let (name, span) = compiler.expect_identifier("a variable name")?;
        compiler.define(name, type_name.clone(), kind, span)?;

        if !compiler.at_symbol(',') {
            break;
        }

        compiler.expect_symbol(',')?;
    }

    compiler.expect_symbol(';')?;

    Ok(())
}
