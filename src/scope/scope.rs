use std::collections::HashMap;

use crate::{
    ast::types::{SType, SecurityLabel, StaticType},
    errors::errors::ErrorImpl,
};

/// A bound variable. `S` is the storage slot: `()` while type checking, a
/// backend slot handle while generating code.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol<S> {
    pub slot: S,
    pub ty: StaticType,
    pub security: SecurityLabel,
}

impl<S> Symbol<S> {
    pub fn new(slot: S, ty: StaticType, security: SecurityLabel) -> Self {
        Symbol { slot, ty, security }
    }

    pub fn stype(&self) -> SType {
        SType::new(self.ty, self.security)
    }
}

#[derive(Debug)]
pub struct SymbolTable<S> {
    locals: HashMap<String, Symbol<S>>,
}

impl<S> SymbolTable<S> {
    pub fn new() -> Self {
        SymbolTable {
            locals: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: String, symbol: Symbol<S>) -> Result<(), ErrorImpl> {
        if self.locals.contains_key(&name) {
            Err(ErrorImpl::VariableRedeclaration { variable: name })
        } else {
            self.locals.insert(name, symbol);
            Ok(())
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol<S>> {
        self.locals.get(name)
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

impl<S> Default for SymbolTable<S> {
    fn default() -> Self {
        SymbolTable::new()
    }
}

/// Stack of symbol tables, innermost last, each paired with the security
/// context code in that scope executes under.
///
/// `initialize` and `finalize` must pair up; popping an empty stack is an
/// internal error and panics.
#[derive(Debug)]
pub struct Scope<S> {
    tables: Vec<(SymbolTable<S>, SecurityLabel)>,
}

impl<S> Scope<S> {
    pub fn new() -> Self {
        Scope { tables: vec![] }
    }

    pub fn depth(&self) -> usize {
        self.tables.len()
    }

    pub fn initialize(&mut self, context: SecurityLabel) {
        self.tables.push((SymbolTable::new(), context));
    }

    pub fn finalize(&mut self) {
        if self.tables.pop().is_none() {
            panic!("internal compiler error: finalized a scope that was never initialized");
        }
    }

    /// Binds `name` in the innermost table. Fails only if that table already
    /// holds `name`; bindings in enclosing tables are shadowed.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol<S>) -> Result<(), ErrorImpl> {
        match self.tables.last_mut() {
            Some((table, _)) => table.insert(name.into(), symbol),
            None => panic!("internal compiler error: insert into an empty scope stack"),
        }
    }

    /// Nearest enclosing binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol<S>> {
        self.tables
            .iter()
            .rev()
            .find_map(|(table, _)| table.lookup(name))
    }

    pub fn is_declared_locally(&self, name: &str) -> bool {
        self.tables
            .last()
            .is_some_and(|(table, _)| table.lookup(name).is_some())
    }

    /// Context of the innermost scope, `Low` when no scope is open.
    pub fn current_security_context(&self) -> SecurityLabel {
        self.tables
            .last()
            .map(|(_, context)| *context)
            .unwrap_or_default()
    }
}

impl<S> Default for Scope<S> {
    fn default() -> Self {
        Scope::new()
    }
}
