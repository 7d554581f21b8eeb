//! Lexical scopes of a Yul program.
use cranelift_entity::{entity_impl, PrimaryMap};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::YulName;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);
entity_impl!(ScopeId, "scope");

/// An opaque reference to a declared variable. Identity is by declaration, not by name.
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariableId(pub u32);
entity_impl!(VariableId, "var");

#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionId(pub u32);
entity_impl!(FunctionId, "func");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Variable(VariableId),
    Function(FunctionId),
}

#[derive(Debug, Clone)]
pub struct VariableData {
    pub name: YulName,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: YulName,
    pub num_params: usize,
    pub num_returns: usize,
    pub scope: ScopeId,
}

#[derive(Debug, Clone, Default)]
pub struct ScopeData {
    pub parent: Option<ScopeId>,
    /// Set on the scope holding a function's parameters and return variables. Variables of
    /// enclosing scopes are not visible across it, functions are.
    pub function_scope: bool,
    identifiers: FxHashMap<YulName, Symbol>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("identifier `{0}` is already declared in this scope")]
    AlreadyDeclared(YulName),
}

#[derive(Debug, Clone, Default)]
pub struct Scopes {
    scopes: PrimaryMap<ScopeId, ScopeData>,
    variables: PrimaryMap<VariableId, VariableData>,
    functions: PrimaryMap<FunctionId, FunctionData>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_scope(&mut self, parent: Option<ScopeId>, function_scope: bool) -> ScopeId {
        self.scopes.push(ScopeData {
            parent,
            function_scope,
            identifiers: FxHashMap::default(),
        })
    }

    pub fn declare_variable(
        &mut self,
        scope: ScopeId,
        name: impl Into<YulName>,
    ) -> Result<VariableId, ScopeError> {
        let name = name.into();
        self.ensure_undeclared(scope, &name)?;
        let var = self.variables.push(VariableData {
            name: name.clone(),
            scope,
        });
        self.scopes[scope]
            .identifiers
            .insert(name, Symbol::Variable(var));
        Ok(var)
    }

    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        name: impl Into<YulName>,
        num_params: usize,
        num_returns: usize,
    ) -> Result<FunctionId, ScopeError> {
        let name = name.into();
        self.ensure_undeclared(scope, &name)?;
        let func = self.functions.push(FunctionData {
            name: name.clone(),
            num_params,
            num_returns,
            scope,
        });
        self.scopes[scope]
            .identifiers
            .insert(name, Symbol::Function(func));
        Ok(func)
    }

    /// Looks `name` up starting at `scope` and walking towards the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Symbol> {
        let mut crossed_function = false;
        let mut current = Some(scope);
        while let Some(scope) = current {
            let data = self.scopes.get(scope)?;
            match data.identifiers.get(name) {
                Some(Symbol::Variable(_)) if crossed_function => {}
                Some(symbol) => return Some(*symbol),
                None => {}
            }
            crossed_function |= data.function_scope;
            current = data.parent;
        }

        None
    }

    pub fn scope(&self, scope: ScopeId) -> &ScopeData {
        &self.scopes[scope]
    }

    pub fn variable(&self, var: VariableId) -> &VariableData {
        &self.variables[var]
    }

    pub fn function(&self, func: FunctionId) -> &FunctionData {
        &self.functions[func]
    }

    pub fn get_variable(&self, var: VariableId) -> Option<&VariableData> {
        self.variables.get(var)
    }

    pub fn get_function(&self, func: FunctionId) -> Option<&FunctionData> {
        self.functions.get(func)
    }

    fn ensure_undeclared(&self, scope: ScopeId, name: &YulName) -> Result<(), ScopeError> {
        if self.scopes[scope].identifiers.contains_key(name) {
            Err(ScopeError::AlreadyDeclared(name.clone()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_parent() {
        let mut scopes = Scopes::new();
        let root = scopes.make_scope(None, false);
        let inner = scopes.make_scope(Some(root), false);
        let x = scopes.declare_variable(root, "x").unwrap();

        assert_eq!(scopes.lookup(inner, "x"), Some(Symbol::Variable(x)));
        assert_eq!(scopes.lookup(inner, "y"), None);
    }

    #[test]
    fn variables_do_not_cross_function_scope() {
        let mut scopes = Scopes::new();
        let root = scopes.make_scope(None, false);
        let x = scopes.declare_variable(root, "x").unwrap();
        let f = scopes.declare_function(root, "f", 1, 1).unwrap();

        let func_scope = scopes.make_scope(Some(root), true);
        let a = scopes.declare_variable(func_scope, "a").unwrap();
        let body = scopes.make_scope(Some(func_scope), false);

        assert_eq!(scopes.lookup(body, "a"), Some(Symbol::Variable(a)));
        assert_eq!(scopes.lookup(body, "f"), Some(Symbol::Function(f)));
        assert_eq!(scopes.lookup(body, "x"), None);
        assert_eq!(scopes.lookup(root, "x"), Some(Symbol::Variable(x)));
    }

    #[test]
    fn duplicate_declaration_is_rejected() {
        let mut scopes = Scopes::new();
        let root = scopes.make_scope(None, false);
        scopes.declare_variable(root, "x").unwrap();

        assert_eq!(
            scopes.declare_function(root, "x", 0, 0),
            Err(ScopeError::AlreadyDeclared("x".into()))
        );
    }
}
