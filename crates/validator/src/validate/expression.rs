use yulssa_ast::{Expression, FunctionCall};
use yulssa_ir::ValueId;

use super::{Fallible, Validator, ValueSet};
use crate::diagnostic::DiagnosticCode;

impl Validator<'_> {
    /// Consumes `expr` from the replay position and returns one candidate set per produced
    /// value, or `None` if control does not continue past it.
    pub(super) fn consume_expression(&mut self, expr: &Expression) -> Fallible<Option<Vec<ValueSet>>> {
        match expr {
            Expression::Identifier(identifier) => {
                Ok(Some(vec![self.lookup_identifier(identifier)?]))
            }
            Expression::Literal(literal) => {
                Ok(Some(vec![ValueSet::single(self.lookup_literal(literal)?)]))
            }
            Expression::FunctionCall(call) => self.consume_call(call),
        }
    }

    pub(super) fn consume_unary_expression(&mut self, expr: &Expression) -> Fallible<Option<ValueSet>> {
        let Some(mut values) = self.consume_expression(expr)? else {
            return Ok(None);
        };

        if values.len() != 1 {
            return Err(self.error(
                DiagnosticCode::ResultCountMismatch,
                format!("expected exactly one value, found {}", values.len()),
                self.operation_location(),
            ));
        }
        Ok(values.pop())
    }

    /// Checks that `expr`, consumed into `consumed`, can be the graph's `value`, and commits an
    /// identifier to it.
    pub(super) fn reconcile_operand(
        &mut self,
        expr: &Expression,
        consumed: &ValueSet,
        value: ValueId,
    ) -> Fallible<bool> {
        match expr {
            Expression::Identifier(identifier) => {
                // Uses of the same variable earlier in the expression may have narrowed it.
                let var = self.resolve_variable(&identifier.name)?;
                if !self.mapping.lookup(var).is_some_and(|values| values.contains(value)) {
                    return Ok(false);
                }
                self.mapping.narrow(var, value);
                Ok(true)
            }
            _ => Ok(consumed.as_single() == Some(value)),
        }
    }

    fn consume_call(&mut self, call: &FunctionCall) -> Fallible<Option<Vec<ValueSet>>> {
        let name = call.function_name.name.as_str();
        let dialect = self.ctx.dialect;
        let builtin = dialect
            .find_builtin(name)
            .map(|handle| dialect.builtin(handle));

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for (idx, arg) in call.arguments.iter().enumerate().rev() {
            if builtin.is_some_and(|builtin| builtin.is_literal_argument(idx)) {
                continue;
            }
            let Some(values) = self.consume_unary_expression(arg)? else {
                return Ok(None);
            };
            arguments.push((arg, values));
        }
        arguments.reverse();

        let block = self.current_block_data()?;
        let Some(op) = block.operations.get(self.current_operation) else {
            return Err(self.error(
                DiagnosticCode::MissingOperation,
                format!(
                    "expected an operation for the call to `{name}`, `{}` has {} operation(s)",
                    self.current_block,
                    block.operations.len()
                ),
                self.operation_location(),
            ));
        };

        if op.inputs.len() != arguments.len() {
            return Err(self.error(
                DiagnosticCode::OperandCountMismatch,
                format!(
                    "call to `{name}` has {} argument(s), the operation has {} input(s)",
                    arguments.len(),
                    op.inputs.len()
                ),
                self.operation_location(),
            ));
        }

        for (idx, ((arg, values), input)) in arguments.iter().zip(&op.inputs).enumerate() {
            if !self.reconcile_operand(arg, values, *input)? {
                let diag = self.error(
                    DiagnosticCode::OperandMismatch,
                    format!("operand {idx} of the call to `{name}` cannot be `{input}`"),
                    self.operation_location(),
                );
                return Err(Box::new(
                    (*diag).with_note(format!("the argument may hold {values}")),
                ));
            }
        }

        let can_continue = self.validate_call(op.kind, name, op.outputs.len())?;
        self.current_operation += 1;

        if !can_continue {
            self.expect_terminated()?;
            return Ok(None);
        }

        Ok(Some(
            op.outputs
                .iter()
                .map(|output| ValueSet::single(*output))
                .collect(),
        ))
    }
}
