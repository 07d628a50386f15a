use std::io::BufRead;

use super::{
    error::{Error, FallableAction},
    expression,
    vm::{self, VMWriter},
    Compiler,
};
use crate::common::{Keyword, Span};

/// Compile a subroutine call whose leading identifier (`name`) was already consumed:
///
/// - `name(args)` calls a method of the current class on the current object,
/// - `variable.name(args)` calls a method on the object stored in `variable`,
/// - `ClassName.name(args)` calls a function or constructor.
pub(super) fn construct<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
    name: String,
    span: Span,
) -> FallableAction {
    if compiler.at_symbol('(') {
        let receiver = expression::this(compiler);
        compiler.emit(receiver)?;

        let argument_count = construct_argument_list(compiler)?;
        let function_name = format!("{}.{name}", compiler.context.class_name);

        return compiler.emit(vm::call(function_name, argument_count + 1));
    }

    if !compiler.at_symbol('.') {
        return Err(compiler.unexpected("`(` or `.`"));
    }

    compiler.expect_symbol('.')?;
    let (subroutine_name, _) = compiler.expect_identifier("a subroutine name")?;

    match compiler.context.resolve(&name).cloned() {
        Some(receiver) => {
            if is_primitive(&receiver.type_name) {
                return Err(Error::InvalidCallTarget {
                    name,
                    type_name: receiver.type_name,
                    subroutine_name,
                    span,
                });
            }

            compiler.emit(receiver.push())?;

            let argument_count = construct_argument_list(compiler)?;
            let function_name = format!("{}.{subroutine_name}", receiver.type_name);

            compiler.emit(vm::call(function_name, argument_count + 1))
        }
        None => {
            let argument_count = construct_argument_list(compiler)?;

            compiler.emit(vm::call(format!("{name}.{subroutine_name}"), argument_count))
        }
    }
}

/// `( expressionList )`, returning the number of expressions.
fn construct_argument_list<R: BufRead, W: VMWriter>(
    compiler: &mut Compiler<R, W>,
) -> Result<usize, Error> {
    compiler.expect_symbol('(')?;

    let mut count = 0;

    if !compiler.at_symbol(')') {
        loop {
            expression::construct(compiler)?;
            count += 1;

            if !compiler.at_symbol(',') {
                break;
            }

            compiler.expect_symbol(',')?;
        }
    }

    compiler.expect_symbol(')')?;

    Ok(count)
}

fn is_primitive(type_name: &str) -> bool {
    [Keyword::Int, Keyword::Char, Keyword::Boolean]
        .into_iter()
        .any(|keyword| <&'static str>::from(keyword) == type_name)
}
