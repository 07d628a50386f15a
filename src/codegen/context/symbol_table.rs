use std::collections::HashMap;

use crate::codegen::vm;

/// Category of a defined name, which also determines
/// the VM segment the name lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    pub const fn segment(self) -> vm::Segment {
        match self {
            Self::Static => vm::Segment::Static,
            Self::Field => vm::Segment::This,
            Self::Argument => vm::Segment::Argument,
            Self::Local => vm::Segment::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub type_name: String,
    pub kind: SymbolKind,
    pub index: usize,
}

impl Symbol {
    /// Helper function for performing a `push`
    /// action with the symbol's segment and index.
    pub const fn push(&self) -> vm::VMInstruction {
        vm::push(self.kind.segment(), self.index)
    }

    /// Helper function for performing a `pop`
    /// action with the symbol's segment and index.
    pub const fn pop(&self) -> vm::VMInstruction {
        vm::pop(self.kind.segment(), self.index)
    }
}

type Name = String;

/// Names defined in a single scope (class or subroutine).
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<Name, Symbol>,
    counts: HashMap<SymbolKind, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all symbols and restart every index from 0.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.counts.clear();
    }

    /// Define a new symbol, giving it the next free index of its kind.
    ///
    /// A symbol with the same name is replaced (its index is not reused).
    pub fn define(&mut self, name: Name, type_name: String, kind: SymbolKind) -> &Symbol {
        let counter = self.counts.entry(kind).or_default();
        let index = *counter;
        *counter += 1;

        let symbol = Symbol {
            name: name.clone(),
            type_name,
            kind,
            index,
        };

        self.symbols.insert(name.clone(), symbol);
        &self.symbols[&name]
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Number of symbols of the given kind defined since the last reset.
    pub fn count(&self, kind: SymbolKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or_default()
    }
}
