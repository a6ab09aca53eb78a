use crate::{
    ast::types::{SecurityLabel, StaticType},
    errors::errors::ErrorImpl,
};

use super::scope::{Scope, Symbol};

fn int_symbol(security: SecurityLabel) -> Symbol<()> {
    Symbol::new((), StaticType::Int64, security)
}

#[test]
fn test_initialize_and_finalize_pair() {
    let mut scope: Scope<()> = Scope::new();
    assert_eq!(scope.depth(), 0);

    scope.initialize(SecurityLabel::Low);
    scope.initialize(SecurityLabel::High);
    assert_eq!(scope.depth(), 2);

    scope.finalize();
    scope.finalize();
    assert_eq!(scope.depth(), 0);
}

#[test]
#[should_panic(expected = "internal compiler error")]
fn test_finalize_empty_scope_panics() {
    let mut scope: Scope<()> = Scope::new();
    scope.finalize();
}

#[test]
fn test_redeclaration_in_same_table_fails() {
    let mut scope = Scope::new();
    scope.initialize(SecurityLabel::Low);

    assert!(scope.insert("x", int_symbol(SecurityLabel::Low)).is_ok());
    assert_eq!(
        scope.insert("x", int_symbol(SecurityLabel::High)),
        Err(ErrorImpl::VariableRedeclaration { variable: String::from("x") })
    );
    // The original binding is kept
    assert_eq!(scope.lookup("x").unwrap().security, SecurityLabel::Low);
}

#[test]
fn test_shadowing_across_levels() {
    let mut scope = Scope::new();
    scope.initialize(SecurityLabel::Low);
    scope.insert("x", int_symbol(SecurityLabel::Low)).unwrap();

    scope.initialize(SecurityLabel::Low);
    assert!(!scope.is_declared_locally("x"));
    scope.insert("x", int_symbol(SecurityLabel::High)).unwrap();
    assert_eq!(scope.lookup("x").unwrap().security, SecurityLabel::High);

    scope.finalize();
    assert_eq!(scope.lookup("x").unwrap().security, SecurityLabel::Low);
}

#[test]
fn test_lookup_walks_outward() {
    let mut scope = Scope::new();
    scope.initialize(SecurityLabel::Low);
    scope.insert("outer", int_symbol(SecurityLabel::Low)).unwrap();
    scope.initialize(SecurityLabel::Low);
    scope.initialize(SecurityLabel::Low);

    assert!(scope.lookup("outer").is_some());
    assert!(scope.lookup("missing").is_none());
}

#[test]
fn test_security_context_is_per_level() {
    let mut scope: Scope<()> = Scope::new();
    assert_eq!(scope.current_security_context(), SecurityLabel::Low);

    scope.initialize(SecurityLabel::Low);
    scope.initialize(SecurityLabel::High);
    assert_eq!(scope.current_security_context(), SecurityLabel::High);

    scope.finalize();
    assert_eq!(scope.current_security_context(), SecurityLabel::Low);
}

#[test]
fn test_symbol_stype() {
    let symbol = Symbol::new(7usize, StaticType::Double, SecurityLabel::High);
    let stype = symbol.stype();

    assert_eq!(stype.ty, StaticType::Double);
    assert_eq!(stype.security, SecurityLabel::High);
    assert_eq!(symbol.slot, 7);
}
