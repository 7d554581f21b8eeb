pub mod analysis;
pub mod builder;
pub mod dialect;
pub mod node;
pub mod scope;

pub use analysis::AnalysisInfo;
pub use dialect::{BuiltinFunction, BuiltinHandle, ControlFlowSideEffects, Dialect};
pub use node::{
    Assignment, Block, Case, Expression, ForLoop, FunctionCall, FunctionDefinition, Identifier,
    If, Literal, LiteralKind, NodeId, Statement, Switch, VariableDeclaration,
};
pub use primitive_types::U256;
pub use scope::{FunctionData, FunctionId, ScopeError, ScopeId, Scopes, Symbol, VariableData, VariableId};

/// Identifier text as it appears in the source.
pub type YulName = smol_str::SmolStr;
