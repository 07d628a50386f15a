//! Single-pass compiler from `Jack` classes to Hack VM code.
//!
//! Source text is tokenized lazily and every grammar production emits its
//! instructions as soon as it is recognized, so a class is compiled
//! without ever building a syntax tree.
//!
//! ```
//! let vm = jackc::compile_str("class Main { function int one() { return 1; } }");
//!
//! assert_eq!(vm.ok().as_deref(), Some("function Main.one 0\npush constant 1\nreturn\n"));
//! ```

use std::io::BufRead;

pub mod codegen;
pub mod common;
pub mod error_report;
pub mod tokenizer;

pub use codegen::{
    error::{Error, ErrorCategory},
    vm::{StreamWriter, VMInstruction, VMModule, VMWriter},
};

/// Compile a single class read from `source`, emitting its instructions into `output`.
///
/// Every call starts from a clean state: symbols and label counters
/// never carry over between classes.
pub fn compile<R: BufRead, W: VMWriter>(source: R, output: W) -> Result<W, Error> {
    codegen::construct_class(source, output)
}

/// Compile a single class, returning its instructions as newline-terminated text.
pub fn compile_str(source: &str) -> Result<String, Error> {
    compile(source.as_bytes(), VMModule::new()).map(VMModule::compile)
}
