//! Builtin functions available to a Yul program.
mod evm;

pub use evm::evm_dialect;

use cranelift_entity::{entity_impl, PrimaryMap};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::YulName;

#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct BuiltinHandle(pub u32);
entity_impl!(BuiltinHandle, "builtin");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlowSideEffects {
    pub can_terminate: bool,
    pub can_revert: bool,
    /// `false` when control never returns from the call, e.g. `revert` or `stop`.
    pub can_continue: bool,
}

impl ControlFlowSideEffects {
    pub const fn continuing() -> Self {
        Self {
            can_terminate: false,
            can_revert: false,
            can_continue: true,
        }
    }

    pub const fn terminating() -> Self {
        Self {
            can_terminate: true,
            can_revert: false,
            can_continue: false,
        }
    }

    pub const fn reverting() -> Self {
        Self {
            can_terminate: false,
            can_revert: true,
            can_continue: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuiltinFunction {
    pub name: YulName,
    pub num_params: usize,
    pub num_returns: usize,
    pub side_effects: ControlFlowSideEffects,
    literal_arguments: SmallVec<[bool; 4]>,
}

impl BuiltinFunction {
    pub fn new(name: impl Into<YulName>, num_params: usize, num_returns: usize) -> Self {
        Self {
            name: name.into(),
            num_params,
            num_returns,
            side_effects: ControlFlowSideEffects::continuing(),
            literal_arguments: SmallVec::new(),
        }
    }

    pub fn with_side_effects(mut self, side_effects: ControlFlowSideEffects) -> Self {
        self.side_effects = side_effects;
        self
    }

    /// Marks argument `idx` as a literal argument. Literal arguments are resolved at compile time
    /// and never become operation inputs.
    pub fn with_literal_argument(mut self, idx: usize) -> Self {
        if self.literal_arguments.len() <= idx {
            self.literal_arguments.resize(idx + 1, false);
        }
        self.literal_arguments[idx] = true;
        self
    }

    pub fn is_literal_argument(&self, idx: usize) -> bool {
        self.literal_arguments.get(idx).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dialect {
    builtins: PrimaryMap<BuiltinHandle, BuiltinFunction>,
    by_name: FxHashMap<YulName, BuiltinHandle>,
    equality_function: Option<BuiltinHandle>,
}

impl Dialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_builtin(&mut self, builtin: BuiltinFunction) -> BuiltinHandle {
        let name = builtin.name.clone();
        let handle = self.builtins.push(builtin);
        self.by_name.insert(name, handle);
        handle
    }

    pub fn set_equality_function(&mut self, handle: BuiltinHandle) {
        self.equality_function = Some(handle);
    }

    pub fn find_builtin(&self, name: &str) -> Option<BuiltinHandle> {
        self.by_name.get(name).copied()
    }

    pub fn builtin(&self, handle: BuiltinHandle) -> &BuiltinFunction {
        &self.builtins[handle]
    }

    /// The builtin used to compare a `switch` expression against its case values.
    pub fn equality_function(&self) -> Option<BuiltinHandle> {
        self.equality_function
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_arguments() {
        let builtin = BuiltinFunction::new("datacopy", 3, 0).with_literal_argument(1);
        assert!(!builtin.is_literal_argument(0));
        assert!(builtin.is_literal_argument(1));
        assert!(!builtin.is_literal_argument(2));
        assert!(!builtin.is_literal_argument(7));
    }

    #[test]
    fn lookup_by_name() {
        let dialect = evm_dialect();
        let add = dialect.find_builtin("add").unwrap();
        assert_eq!(dialect.builtin(add).num_params, 2);
        assert_eq!(dialect.builtin(add).num_returns, 1);
        assert!(dialect.find_builtin("no_such_builtin").is_none());

        let eq = dialect.equality_function().unwrap();
        assert_eq!(dialect.builtin(eq).name.as_str(), "eq");
    }
}
