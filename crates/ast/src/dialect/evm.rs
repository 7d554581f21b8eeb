use super::{BuiltinFunction, ControlFlowSideEffects, Dialect};

/// `(name, params, returns)` of the continuing EVM builtins.
const CONTINUING: &[(&str, usize, usize)] = &[
    ("add", 2, 1),
    ("sub", 2, 1),
    ("mul", 2, 1),
    ("div", 2, 1),
    ("mod", 2, 1),
    ("exp", 2, 1),
    ("not", 1, 1),
    ("lt", 2, 1),
    ("gt", 2, 1),
    ("slt", 2, 1),
    ("sgt", 2, 1),
    ("eq", 2, 1),
    ("iszero", 1, 1),
    ("and", 2, 1),
    ("or", 2, 1),
    ("xor", 2, 1),
    ("shl", 2, 1),
    ("shr", 2, 1),
    ("keccak256", 2, 1),
    ("address", 0, 1),
    ("caller", 0, 1),
    ("callvalue", 0, 1),
    ("calldataload", 1, 1),
    ("calldatasize", 0, 1),
    ("calldatacopy", 3, 0),
    ("mload", 1, 1),
    ("mstore", 2, 0),
    ("mstore8", 2, 0),
    ("sload", 1, 1),
    ("sstore", 2, 0),
    ("gas", 0, 1),
    ("pop", 1, 0),
];

/// A subset of the EVM dialect, enough to express the programs the validator is exercised with.
pub fn evm_dialect() -> Dialect {
    let mut dialect = Dialect::new();

    for &(name, params, returns) in CONTINUING {
        let handle = dialect.add_builtin(BuiltinFunction::new(name, params, returns));
        if name == "eq" {
            dialect.set_equality_function(handle);
        }
    }

    dialect.add_builtin(
        BuiltinFunction::new("return", 2, 0).with_side_effects(ControlFlowSideEffects::terminating()),
    );
    dialect.add_builtin(
        BuiltinFunction::new("stop", 0, 0).with_side_effects(ControlFlowSideEffects::terminating()),
    );
    dialect.add_builtin(
        BuiltinFunction::new("revert", 2, 0).with_side_effects(ControlFlowSideEffects::reverting()),
    );
    dialect.add_builtin(
        BuiltinFunction::new("invalid", 0, 0).with_side_effects(ControlFlowSideEffects::reverting()),
    );
    dialect.add_builtin(BuiltinFunction::new("datasize", 1, 1).with_literal_argument(0));
    dialect.add_builtin(BuiltinFunction::new("dataoffset", 1, 1).with_literal_argument(0));
    dialect.add_builtin(BuiltinFunction::new("datacopy", 3, 0));

    dialect
}
