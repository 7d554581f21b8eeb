use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use yulssa_ast::{Expression, If, Literal, Switch};
use yulssa_ir::{
    BlockId, ConditionalJump, Exit, FunctionReturn, Jump, OperationKind, ValueId, ValueInfo,
};

use super::{Fallible, Validator, ValueSet, VariableMapping};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

impl<'a> Validator<'a> {
    /// The exit of the current block, once all of its operations have been consumed.
    fn current_exit(&self) -> Fallible<&'a Exit> {
        let block = self.current_block_data()?;
        if self.current_operation < block.operations.len() {
            return Err(self.error(
                DiagnosticCode::UnconsumedOperations,
                format!(
                    "{} operation(s) of `{}` are not accounted for by the source",
                    block.operations.len() - self.current_operation,
                    self.current_block
                ),
                self.operation_location(),
            ));
        }
        Ok(&block.exit)
    }

    fn unexpected_exit(&self, expected: &str, found: &Exit) -> Box<Diagnostic> {
        self.error(
            DiagnosticCode::UnexpectedTerminator,
            format!(
                "expected `{}` to end in a {expected}, found {}",
                self.current_block,
                found.kind_name()
            ),
            self.operation_location(),
        )
    }

    pub(super) fn expect_conditional_jump(&self) -> Fallible<ConditionalJump> {
        match self.current_exit()? {
            Exit::ConditionalJump(jump) => Ok(*jump),
            other => Err(self.unexpected_exit("conditional jump", other)),
        }
    }

    pub(super) fn expect_jump(&self) -> Fallible<Jump> {
        match self.current_exit()? {
            Exit::Jump(jump) => Ok(*jump),
            other => Err(self.unexpected_exit("jump", other)),
        }
    }

    pub(super) fn expect_function_return(&self) -> Fallible<&'a FunctionReturn> {
        match self.current_exit()? {
            Exit::FunctionReturn(ret) => Ok(ret),
            other => Err(self.unexpected_exit("function return", other)),
        }
    }

    pub(super) fn expect_main_exit(&self) -> Fallible<()> {
        match self.current_exit()? {
            Exit::MainExit => Ok(()),
            other => Err(self.unexpected_exit("main exit", other)),
        }
    }

    pub(super) fn expect_terminated(&self) -> Fallible<()> {
        match self.current_exit()? {
            Exit::Terminated => Ok(()),
            other => Err(self.unexpected_exit("terminating call", other)),
        }
    }

    /// Requires the graph to record the edge from `source` to `target` on both ends.
    pub(super) fn check_edge(&self, source: BlockId, target: BlockId) -> Fallible<()> {
        let source_data = self.block_data(source)?;
        let target_data = self.block_data(target)?;
        if !source_data.exit.targets().contains(&target) || !target_data.entries.contains(&source)
        {
            return Err(self.error(
                DiagnosticCode::BrokenEdge,
                format!("the graph has no edge from `{source}` to `{target}`"),
                Location::Block {
                    graph: self.graph,
                    block: source,
                },
            ));
        }
        Ok(())
    }

    /// Moves the replay position along the edge from `source` to `target`.
    pub(super) fn advance_to_block(&mut self, source: BlockId, target: BlockId) -> Fallible<()> {
        self.check_edge(source, target)?;
        debug!(graph = %self.graph, from = %source, to = %target, "advance");
        self.current_block = target;
        self.current_operation = 0;
        Ok(())
    }

    /// The current mapping as seen in `target` when entered from `source`: every variable also
    /// holds the phis of `target` its candidates flow into, and none of the phis `target`
    /// redefines.
    pub(super) fn apply_phis(&self, source: BlockId, target: BlockId) -> Fallible<VariableMapping> {
        let target_data = self.block_data(target)?;
        let location = Location::Block {
            graph: self.graph,
            block: target,
        };

        let mut phi_map: FxHashMap<ValueId, ValueSet> = FxHashMap::default();
        if !target_data.phis.is_empty() {
            let Some(offset) = target_data.entry_offset(source) else {
                return Err(self.error(
                    DiagnosticCode::PhiEntryMissing,
                    format!("`{source}` is not an entry of `{target}`"),
                    location,
                ));
            };

            for phi in &target_data.phis {
                let arguments = match self.ctx.cfg.value_info(*phi) {
                    Some(ValueInfo::Phi { arguments, .. }) => arguments,
                    Some(_) => {
                        return Err(self.error(
                            DiagnosticCode::InvalidPhi,
                            format!("`{phi}` listed as a phi of `{target}` is not a phi"),
                            location,
                        ))
                    }
                    None => {
                        return Err(self.error(
                            DiagnosticCode::InvalidValueRef,
                            format!("phi `{phi}` of `{target}` is not in the value table"),
                            location,
                        ))
                    }
                };
                if arguments.len() != target_data.entries.len() {
                    return Err(self.error(
                        DiagnosticCode::PhiEntryMissing,
                        format!(
                            "phi `{phi}` has {} argument(s), `{target}` has {} entries",
                            arguments.len(),
                            target_data.entries.len()
                        ),
                        location,
                    ));
                }
                phi_map.entry(arguments[offset]).or_default().insert(*phi);
            }
        }

        Ok(self.mapping.apply_phi_map(&phi_map, &target_data.phis))
    }

    /// Merges the mappings of all paths entering `join`.
    pub(super) fn consolidate_variables(
        &self,
        join: BlockId,
        contributions: &[VariableMapping],
    ) -> Fallible<VariableMapping> {
        let merged = VariableMapping::consolidate(contributions).map_err(|conflict| {
            let diag = self.error(
                DiagnosticCode::InconsistentBinding,
                format!(
                    "paths entering `{join}` disagree on `{}`",
                    self.variable_label(conflict.variable)
                ),
                Location::Block {
                    graph: self.graph,
                    block: join,
                },
            );
            let diag = conflict
                .candidates
                .iter()
                .enumerate()
                .fold(*diag, |diag, (i, values)| {
                    diag.with_note(format!("path {i} may hold {values}"))
                });
            Box::new(diag)
        })?;

        trace!(
            graph = %self.graph,
            join = %join,
            mapping = %merged.display(&self.ctx.analysis_info.scopes),
            "consolidated"
        );
        Ok(merged)
    }

    /// Requires every phi of `join` to be a candidate of some variable.
    pub(super) fn check_phi_ownership(
        &self,
        join: BlockId,
        mapping: &VariableMapping,
    ) -> Fallible<()> {
        if !self.ctx.config.should_check_phi_ownership() {
            return Ok(());
        }

        for phi in &self.block_data(join)?.phis {
            if mapping.variables_holding(*phi).next().is_none() {
                return Err(self.error(
                    DiagnosticCode::UnownedPhi,
                    format!("phi `{phi}` of `{join}` is not held by any variable"),
                    Location::Block {
                        graph: self.graph,
                        block: join,
                    },
                ));
            }
        }
        Ok(())
    }

    pub(super) fn consume_if(&mut self, if_: &If) -> Fallible<bool> {
        let Some(condition) = self.consume_unary_expression(&if_.condition)? else {
            return Ok(false);
        };
        let jump = self.expect_conditional_jump()?;
        self.reconcile_condition(&if_.condition, &condition, jump.condition)?;

        let source = self.current_block;
        let zero_values = self.apply_phis(source, jump.zero)?;
        self.advance_to_block(source, jump.non_zero)?;

        if self.consume_block(&if_.body)? {
            let jump_back = self.expect_jump()?;
            if jump_back.target != jump.zero {
                return Err(self.error(
                    DiagnosticCode::JumpTargetMismatch,
                    format!(
                        "body of the `if` in `{source}` jumps to `{}`, expected `{}`",
                        jump_back.target, jump.zero
                    ),
                    self.operation_location(),
                ));
            }

            let body_values = self.apply_phis(self.current_block, jump.zero)?;
            let merged = self.consolidate_variables(jump.zero, &[zero_values, body_values])?;
            self.check_phi_ownership(jump.zero, &merged)?;
            self.advance_to_block(self.current_block, jump.zero)?;
            self.mapping = merged;
        } else {
            self.advance_to_block(source, jump.zero)?;
            self.mapping = zero_values;
        }

        Ok(true)
    }

    pub(super) fn reconcile_condition(
        &mut self,
        expr: &Expression,
        consumed: &ValueSet,
        condition: ValueId,
    ) -> Fallible<()> {
        if self.reconcile_operand(expr, consumed, condition)? {
            return Ok(());
        }
        let diag = self.error(
            DiagnosticCode::ConditionMismatch,
            format!("the branch condition `{condition}` is not a value of the source condition"),
            self.operation_location(),
        );
        Err(Box::new(
            (*diag).with_note(format!("the condition may hold {consumed}")),
        ))
    }

    /// A `switch` is lowered to a chain of conditional jumps, each on the output of a comparison
    /// of the switch value against one case literal. The default case, if any, is replayed in the
    /// block the last comparison jumps to when it fails.
    pub(super) fn consume_switch(&mut self, switch: &Switch) -> Fallible<bool> {
        let Some(value) = self.consume_unary_expression(&switch.expression)? else {
            return Ok(false);
        };

        let (cases, default) = match switch.cases.split_last() {
            Some((last, cases)) if last.value.is_none() => (cases, Some(last)),
            _ => (switch.cases.as_slice(), None),
        };
        if cases.is_empty() {
            return match default {
                Some(default) => self.consume_block(&default.body),
                None => Ok(true),
            };
        }

        // The join after the switch, the last edge found into it and the mappings along them.
        let mut after: Option<(BlockId, BlockId)> = None;
        let mut contributions = Vec::new();

        for case in cases {
            let Some(case_value) = &case.value else {
                return Err(self.error(
                    DiagnosticCode::SwitchCaseMismatch,
                    "the default case must come last",
                    self.block_location(),
                ));
            };
            let comparison = self.consume_case_comparison(&switch.expression, &value, case_value)?;

            let jump = self.expect_conditional_jump()?;
            if jump.condition != comparison {
                return Err(self.error(
                    DiagnosticCode::SwitchCaseMismatch,
                    format!(
                        "case {case_value} branches on `{}` instead of the comparison `{comparison}`",
                        jump.condition
                    ),
                    self.operation_location(),
                ));
            }

            let source = self.current_block;
            let zero_values = self.apply_phis(source, jump.zero)?;
            self.advance_to_block(source, jump.non_zero)?;
            if self.consume_block(&case.body)? {
                let exit = self.current_block;
                let target = self.expect_join(after.map(|(_, join)| join))?;
                contributions.push(self.apply_phis(exit, target)?);
                after = Some((exit, target));
            }

            self.mapping = zero_values;
            self.advance_to_block(source, jump.zero)?;
        }

        let fallback = self.current_block;
        match default {
            Some(default) => {
                if self.consume_block(&default.body)? {
                    let exit = self.current_block;
                    let target = self.expect_join(after.map(|(_, join)| join))?;
                    contributions.push(self.apply_phis(exit, target)?);
                    after = Some((exit, target));
                }
            }
            None => match after {
                // Without a default, the last failing comparison may fall into the join directly.
                Some((_, join)) if join == fallback => contributions.push(self.mapping.clone()),
                Some((_, join)) => {
                    let target = self.expect_join(Some(join))?;
                    contributions.push(self.apply_phis(fallback, target)?);
                    after = Some((fallback, target));
                }
                None => return Ok(true),
            },
        }

        let Some((source, join)) = after else {
            return Ok(false);
        };
        let merged = self.consolidate_variables(join, &contributions)?;
        self.check_phi_ownership(join, &merged)?;
        if self.current_block != join {
            self.advance_to_block(source, join)?;
        }
        self.mapping = merged;
        Ok(true)
    }

    /// Consumes the comparison of the switch value against `case_value`, which must be the last
    /// operation of the current block. Returns its output.
    fn consume_case_comparison(
        &mut self,
        expression: &Expression,
        value: &ValueSet,
        case_value: &Literal,
    ) -> Fallible<ValueId> {
        let block = self.current_block_data()?;
        let location = self.operation_location();
        let mismatch = |this: &Self, message: String| {
            this.error(DiagnosticCode::SwitchCaseMismatch, message, location.clone())
        };

        if self.current_operation + 1 != block.operations.len() {
            return Err(mismatch(
                self,
                format!(
                    "expected the comparison against case {case_value} as the last operation of `{}`",
                    self.current_block
                ),
            ));
        }
        let op = &block.operations[self.current_operation];

        let equality = self.ctx.dialect.equality_function();
        let is_equality = matches!(
            op.kind,
            OperationKind::BuiltinCall { builtin } if Some(builtin) == equality
        );
        if !is_equality || op.inputs.len() != 2 || op.outputs.len() != 1 {
            return Err(mismatch(
                self,
                format!("case {case_value} is not compared with the equality builtin"),
            ));
        }

        let literal = self.lookup_literal(case_value)?;
        if op.inputs[0] != literal {
            return Err(mismatch(
                self,
                format!("comparison is against `{}`, not case {case_value}", op.inputs[0]),
            ));
        }
        if !self.reconcile_operand(expression, value, op.inputs[1])? {
            return Err(mismatch(
                self,
                format!(
                    "comparison for case {case_value} reads `{}`, the switch value may hold {value}",
                    op.inputs[1]
                ),
            ));
        }

        self.current_operation += 1;
        Ok(op.outputs[0])
    }

    /// Requires the current block to jump to the join after a branching statement. `expected` is
    /// the join found by an earlier branch.
    fn expect_join(&self, expected: Option<BlockId>) -> Fallible<BlockId> {
        let jump = self.expect_jump()?;
        match expected {
            Some(expected) if expected != jump.target => Err(self.error(
                DiagnosticCode::JumpTargetMismatch,
                format!(
                    "branch jumps to `{}`, an earlier branch joins at `{expected}`",
                    jump.target
                ),
                self.operation_location(),
            )),
            _ => Ok(jump.target),
        }
    }
}
