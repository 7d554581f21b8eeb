use yulssa_ast::{FunctionId, Identifier, Literal, ScopeId, Symbol, VariableId};
use yulssa_ir::{OperationKind, ValueId};

use super::{Fallible, Validator, ValueSet};
use crate::diagnostic::DiagnosticCode;

impl Validator<'_> {
    fn current_scope(&self) -> Fallible<ScopeId> {
        self.scope.ok_or_else(|| {
            self.error(
                DiagnosticCode::MissingScope,
                "no lexical scope is active",
                self.block_location(),
            )
        })
    }

    fn lookup_symbol(&self, name: &str) -> Fallible<Symbol> {
        let scope = self.current_scope()?;
        self.ctx
            .analysis_info
            .scopes
            .lookup(scope, name)
            .ok_or_else(|| {
                self.error(
                    DiagnosticCode::UnresolvedIdentifier,
                    format!("`{name}` is not declared in `{scope}`"),
                    self.block_location(),
                )
            })
    }

    pub(super) fn resolve_variable(&self, name: &str) -> Fallible<VariableId> {
        match self.lookup_symbol(name)? {
            Symbol::Variable(var) => Ok(var),
            Symbol::Function(_) => Err(self.error(
                DiagnosticCode::ExpectedVariable,
                format!("`{name}` names a function where a variable is expected"),
                self.block_location(),
            )),
        }
    }

    pub(super) fn resolve_function(&self, name: &str) -> Fallible<FunctionId> {
        match self.lookup_symbol(name)? {
            Symbol::Function(func) => Ok(func),
            Symbol::Variable(_) => Err(self.error(
                DiagnosticCode::ExpectedFunction,
                format!("`{name}` names a variable where a function is expected"),
                self.block_location(),
            )),
        }
    }

    pub(super) fn lookup_identifier(&self, identifier: &Identifier) -> Fallible<ValueSet> {
        let var = self.resolve_variable(&identifier.name)?;
        self.mapping.lookup(var).cloned().ok_or_else(|| {
            self.error(
                DiagnosticCode::UnboundVariable,
                format!("`{}` has no value on this path", identifier.name),
                self.operation_location(),
            )
        })
    }

    pub(super) fn lookup_literal(&self, literal: &Literal) -> Fallible<ValueId> {
        self.ctx.cfg.lookup_literal(literal.value).ok_or_else(|| {
            self.error(
                DiagnosticCode::MissingLiteral,
                format!("literal {literal} has no value in the graph"),
                self.operation_location(),
            )
        })
    }

    /// The zero literal bound to variables declared without a value and to return variables.
    pub(super) fn zero_literal(&self) -> Fallible<ValueId> {
        self.ctx.cfg.zero_literal().ok_or_else(|| {
            self.error(
                DiagnosticCode::MissingLiteral,
                "literal 0 has no value in the graph",
                self.operation_location(),
            )
        })
    }

    /// Checks that the operation at the replay position calls `function_name` with
    /// `num_outputs` results. Returns whether control continues after the call.
    pub(super) fn validate_call(
        &self,
        kind: OperationKind,
        function_name: &str,
        num_outputs: usize,
    ) -> Fallible<bool> {
        let dialect = self.ctx.dialect;
        match kind {
            OperationKind::BuiltinCall { builtin } => {
                if dialect.find_builtin(function_name) != Some(builtin) {
                    return Err(self.error(
                        DiagnosticCode::CalleeMismatch,
                        format!(
                            "operation calls builtin `{}`, the source calls `{function_name}`",
                            dialect.builtin(builtin).name
                        ),
                        self.operation_location(),
                    ));
                }

                let data = dialect.builtin(builtin);
                if data.num_returns != num_outputs {
                    return Err(self.error(
                        DiagnosticCode::CallArityMismatch,
                        format!(
                            "`{function_name}` returns {} value(s), the operation has {num_outputs} output(s)",
                            data.num_returns
                        ),
                        self.operation_location(),
                    ));
                }

                Ok(data.side_effects.can_continue)
            }

            OperationKind::Call {
                function,
                can_continue,
            } => {
                if dialect.find_builtin(function_name).is_some() {
                    return Err(self.error(
                        DiagnosticCode::CalleeMismatch,
                        format!(
                            "operation calls function `{}`, the source calls builtin `{function_name}`",
                            self.function_label(function)
                        ),
                        self.operation_location(),
                    ));
                }

                let resolved = self.resolve_function(function_name)?;
                if resolved != function {
                    return Err(self.error(
                        DiagnosticCode::CalleeMismatch,
                        format!(
                            "operation calls `{function}`, `{function_name}` resolves to `{resolved}`"
                        ),
                        self.operation_location(),
                    ));
                }

                let graph = self
                    .ctx
                    .control_flow
                    .function_graph(function)
                    .ok_or_else(|| {
                        self.error(
                            DiagnosticCode::MissingFunctionGraph,
                            format!("`{function_name}` has no graph"),
                            self.operation_location(),
                        )
                    })?;
                if graph.returns.len() != num_outputs {
                    return Err(self.error(
                        DiagnosticCode::CallArityMismatch,
                        format!(
                            "`{function_name}` returns {} value(s), the operation has {num_outputs} output(s)",
                            graph.returns.len()
                        ),
                        self.operation_location(),
                    ));
                }

                Ok(can_continue)
            }
        }
    }
}
