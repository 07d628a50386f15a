pub mod class;
pub mod symbol_table;

pub use class::Context as ClassContext;
pub use symbol_table::{Symbol, SymbolKind, SymbolTable};
