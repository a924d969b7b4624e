//! Name scopes for decoration
//!
//! A `NamesScope` maps names to declarations; a `NamesStack` is a stack of
//! scopes where lookup walks from the innermost scope outward and returns
//! the first match.

use crate::ast::DeclId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NamesScope {
    names: HashMap<String, DeclId>,
}

impl NamesScope {
    pub fn new() -> Self {
        NamesScope::default()
    }

    /// Insert a new name.
    /// Returns false when the name already exists in this scope.
    pub fn add_name(&mut self, name: &str, decl: DeclId) -> bool {
        if self.names.contains_key(name) {
            false
        } else {
            self.names.insert(name.to_string(), decl);
            true
        }
    }

    pub fn find_name(&self, name: &str) -> Option<DeclId> {
        self.names.get(name).copied()
    }
}

#[derive(Debug, Default)]
pub struct NamesStack {
    scopes: Vec<NamesScope>,
}

impl NamesStack {
    pub fn new() -> Self {
        NamesStack::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(NamesScope::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Add a name to the innermost scope.
    /// Returns false when the name already exists there.
    pub fn add_name(&mut self, name: &str, decl: DeclId) -> bool {
        self.scopes
            .last_mut()
            .map(|scope| scope.add_name(name, decl))
            .unwrap_or(false)
    }

    /// Walk the scopes from innermost outward and return the first match.
    pub fn find_name(&self, name: &str) -> Option<DeclId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.find_name(name))
    }

    /// Find a name only in the innermost scope.
    pub fn find_name_innermost(&self, name: &str) -> Option<DeclId> {
        self.scopes.last().and_then(|scope| scope.find_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclId, VarId};

    #[test]
    fn test_duplicate_in_same_scope_is_rejected() {
        let mut scope = NamesScope::new();
        assert!(scope.add_name("x", DeclId::Var(VarId(0))));
        assert!(!scope.add_name("x", DeclId::Var(VarId(1))));
        assert_eq!(scope.find_name("x"), Some(DeclId::Var(VarId(0))));
    }

    #[test]
    fn test_lookup_walks_innermost_outward() {
        let mut stack = NamesStack::new();
        stack.push_scope();
        stack.add_name("x", DeclId::Var(VarId(0)));
        stack.push_scope();
        stack.add_name("x", DeclId::Var(VarId(1)));

        // inner shadows outer
        assert_eq!(stack.find_name("x"), Some(DeclId::Var(VarId(1))));
        stack.pop_scope();
        assert_eq!(stack.find_name("x"), Some(DeclId::Var(VarId(0))));
    }

    #[test]
    fn test_outer_names_visible_from_inner_scope() {
        let mut stack = NamesStack::new();
        stack.push_scope();
        stack.add_name("global", DeclId::Var(VarId(7)));
        stack.push_scope();
        assert_eq!(stack.find_name("global"), Some(DeclId::Var(VarId(7))));
        assert_eq!(stack.find_name_innermost("global"), None);
    }

    #[test]
    fn test_missing_name() {
        let mut stack = NamesStack::new();
        stack.push_scope();
        assert_eq!(stack.find_name("nope"), None);
    }
}
