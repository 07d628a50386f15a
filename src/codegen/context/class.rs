use crate::common::Keyword;

use super::symbol_table::{Symbol, SymbolKind, SymbolTable};

// region: Context

/// Compilation state of a single class.
///
/// A new context is created for every compiled class, so nothing
/// (symbols, label counters) leaks between classes.
#[derive(Debug, Default)]
pub struct Context {
    pub class_name: String,
    pub subroutine: Option<Subroutine>,
    /// `static` and `field` symbols, alive for the whole class.
    pub class_scope: SymbolTable,
    /// `argument` and `local` symbols, cleared for every subroutine.
    pub subroutine_scope: SymbolTable,
    labels: LabelCounters,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start compiling the class with the given name.
    pub fn enter_class(&mut self, class_name: String) {
        self.class_scope.reset();
        self.class_name = class_name;
    }

    /// Start compiling a subroutine, resetting the subroutine scope.
    ///
    /// Methods receive the object they were called on as an implicit
    /// first argument (`this`), so explicit parameters start at index 1.
    pub fn enter_subroutine(&mut self, name: String, kind: SubroutineKind) {
        self.subroutine_scope.reset();

        if kind == SubroutineKind::Method {
            self.subroutine_scope.define(
                Keyword::This.to_string(),
                self.class_name.clone(),
                SymbolKind::Argument,
            );
        }

        self.subroutine = Some(Subroutine { name, kind });
    }

    /// Search for a symbol, first in the subroutine scope
    /// and then in the class scope.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .lookup(name)
            .or_else(|| self.class_scope.lookup(name))
    }

    /// Fully qualified VM name of the subroutine being compiled.
    pub fn function_name(&self) -> String {
        let subroutine_name = self
            .subroutine
            .as_ref()
            .map_or("", |subroutine| subroutine.name.as_str());

        format!("{}.{subroutine_name}", self.class_name)
    }

    pub fn create_if_labels(&mut self) -> IfLabels {
        let n = self.labels.next_if();

        IfLabels {
            if_false: format!("IF_FALSE{n}"),
            end: format!("IF_END{n}"),
        }
    }

    pub fn create_while_labels(&mut self) -> WhileLabels {
        let n = self.labels.next_while();

        WhileLabels {
            expression: format!("WHILE_EXP{n}"),
            end: format!("WHILE_END{n}"),
        }
    }
}

// endregion

// region: Subroutine

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl TryFrom<Keyword> for SubroutineKind {
    type Error = Keyword;

    fn try_from(keyword: Keyword) -> Result<Self, Self::Error> {
        match keyword {
            Keyword::Constructor => Ok(Self::Constructor),
            Keyword::Function => Ok(Self::Function),
            Keyword::Method => Ok(Self::Method),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    pub name: String,
    pub kind: SubroutineKind,
}

// endregion

// region: Labels

/// Counters used to make control flow labels unique within a class
/// (never reset while the class is being compiled).
#[derive(Debug, Default)]
struct LabelCounters {
    if_count: usize,
    while_count: usize,
}

impl LabelCounters {
    fn next_if(&mut self) -> usize {
        self.if_count += 1;
        self.if_count - 1
    }

    fn next_while(&mut self) -> usize {
        self.while_count += 1;
        self.while_count - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfLabels {
    pub if_false: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileLabels {
    pub expression: String,
    pub end: String,
}

// endregion
