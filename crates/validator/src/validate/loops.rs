use tracing::trace;
use yulssa_ast::{Expression, ForLoop};
use yulssa_ir::BlockId;

use super::{Fallible, Validator, VariableMapping};
use crate::diagnostic::{DiagnosticCode, Location};

/// Edges leaving a loop body towards one target, either the loop exit or the continue target.
#[derive(Debug, Default)]
struct LoopEdges {
    /// Source and target of the first edge recorded. Later edges must agree on the target.
    first: Option<(BlockId, BlockId)>,
    mappings: Vec<VariableMapping>,
}

#[derive(Debug)]
pub(super) struct LoopInfo {
    header: BlockId,
    exit: LoopEdges,
    continues: LoopEdges,
    back_edges: Vec<VariableMapping>,
}

impl LoopInfo {
    fn new(header: BlockId) -> Self {
        Self {
            header,
            exit: LoopEdges::default(),
            continues: LoopEdges::default(),
            back_edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Exit,
    Continue,
}

impl Validator<'_> {
    pub(super) fn consume_for_loop(&mut self, for_loop: &ForLoop) -> Fallible<bool> {
        let scope = self.ctx.analysis_info.scope_of(&for_loop.pre).ok_or_else(|| {
            self.error(
                DiagnosticCode::MissingScope,
                format!("`{}` has no scope", for_loop.pre.id),
                self.block_location(),
            )
        })?;

        // The condition, post and body all resolve names through the pre scope.
        let saved = self.scope.replace(scope);
        let result = self.consume_loop(for_loop);
        self.scope = saved;
        result
    }

    fn consume_loop(&mut self, for_loop: &ForLoop) -> Fallible<bool> {
        if !self.consume_statements(&for_loop.pre)? {
            return Ok(false);
        }

        let pre = self.current_block;
        let header = self.expect_jump()?.target;
        let entry = self.apply_phis(pre, header)?;
        self.advance_to_block(pre, header)?;
        self.mapping = entry;

        match &*for_loop.condition {
            Expression::Literal(literal) => {
                self.lookup_literal(literal)?;
                if literal.is_zero() {
                    return Ok(true);
                }
                self.iterate_loop(for_loop, false)
            }
            _ => self.iterate_loop(for_loop, true),
        }
    }

    /// Replays the loop from its header until the header mapping is stable under its back edges,
    /// then continues at the loop exit with the exit paths of the last iteration.
    fn iterate_loop(&mut self, for_loop: &ForLoop, dynamic: bool) -> Fallible<bool> {
        let header = self.current_block;
        let warnings = self.warnings.len();
        let mut entry = self.mapping.clone();

        for iteration in 0..self.ctx.config.max_loop_iterations {
            self.warnings.truncate(warnings);
            self.current_block = header;
            self.current_operation = 0;
            self.mapping = entry.clone();
            trace!(
                graph = %self.graph,
                header = %header,
                iteration,
                mapping = %entry.display(&self.ctx.analysis_info.scopes),
                "loop iteration"
            );

            let (result, info) =
                self.with_loop(LoopInfo::new(header), |this| this.walk_loop(for_loop, dynamic));
            result?;

            let mut contributions = Vec::with_capacity(info.back_edges.len() + 1);
            contributions.push(entry.clone());
            contributions.extend(info.back_edges);
            let refined = self.consolidate_variables(header, &contributions)?;
            if refined == entry {
                self.check_phi_ownership(header, &entry)?;
                return self.leave_loop(info.exit);
            }
            entry = refined;
        }

        Err(self.error(
            DiagnosticCode::LoopDidNotConverge,
            format!(
                "bindings at `{header}` still change after {} iterations",
                self.ctx.config.max_loop_iterations
            ),
            Location::Block {
                graph: self.graph,
                block: header,
            },
        ))
    }

    /// Runs `f` with `info` on top of the loop stack. The entry is popped whatever `f` returns.
    fn with_loop<T>(
        &mut self,
        info: LoopInfo,
        f: impl FnOnce(&mut Self) -> Fallible<T>,
    ) -> (Fallible<T>, LoopInfo) {
        self.loops.push(info);
        let result = f(self);
        let info = self.loops.pop().expect("loop stack is balanced");
        (result, info)
    }

    fn innermost_loop(&mut self) -> &mut LoopInfo {
        self.loops.last_mut().expect("walking a loop body")
    }

    /// One pass over condition, body and post block, recording exit, continue and back edges.
    fn walk_loop(&mut self, for_loop: &ForLoop, dynamic: bool) -> Fallible<()> {
        let header = self.current_block;

        if dynamic {
            let Some(condition) = self.consume_unary_expression(&for_loop.condition)? else {
                return Ok(());
            };
            let jump = self.expect_conditional_jump()?;
            self.reconcile_condition(&for_loop.condition, &condition, jump.condition)?;

            let source = self.current_block;
            let exit_values = self.apply_phis(source, jump.zero)?;
            self.record_edge(EdgeKind::Exit, source, jump.zero, exit_values)?;
            self.advance_to_block(source, jump.non_zero)?;
        }

        if self.consume_block(&for_loop.body)? {
            let source = self.current_block;
            let target = self.expect_jump()?.target;
            let values = self.apply_phis(source, target)?;
            self.record_edge(EdgeKind::Continue, source, target, values)?;
        }

        let Some((source, target)) = self.innermost_loop().continues.first else {
            return Ok(());
        };
        let continues = std::mem::take(&mut self.innermost_loop().continues.mappings);

        if target == header {
            if !for_loop.post.statements.is_empty() {
                return Err(self.error(
                    DiagnosticCode::JumpTargetMismatch,
                    format!("loop body continues at `{header}`, skipping its post block"),
                    Location::Block {
                        graph: self.graph,
                        block: source,
                    },
                ));
            }
            self.innermost_loop().back_edges = continues;
            return Ok(());
        }

        let merged = self.consolidate_variables(target, &continues)?;
        self.check_phi_ownership(target, &merged)?;
        self.advance_to_block(source, target)?;
        self.mapping = merged;

        if self.consume_block(&for_loop.post)? {
            let latch = self.current_block;
            let jump = self.expect_jump()?;
            if jump.target != header {
                return Err(self.error(
                    DiagnosticCode::JumpTargetMismatch,
                    format!(
                        "post block jumps to `{}`, expected the loop header `{header}`",
                        jump.target
                    ),
                    self.operation_location(),
                ));
            }
            self.check_edge(latch, header)?;
            let back_edge = self.apply_phis(latch, header)?;
            self.innermost_loop().back_edges.push(back_edge);
        }
        Ok(())
    }

    fn leave_loop(&mut self, exit: LoopEdges) -> Fallible<bool> {
        // A loop nothing leaves never falls through.
        let Some((source, target)) = exit.first else {
            return Ok(false);
        };

        let merged = self.consolidate_variables(target, &exit.mappings)?;
        self.check_phi_ownership(target, &merged)?;
        self.advance_to_block(source, target)?;
        self.mapping = merged;
        Ok(true)
    }

    fn record_edge(
        &mut self,
        kind: EdgeKind,
        source: BlockId,
        target: BlockId,
        values: VariableMapping,
    ) -> Fallible<()> {
        self.check_edge(source, target)?;

        let info = self.innermost_loop();
        let header = info.header;
        let edges = match kind {
            EdgeKind::Exit => &mut info.exit,
            EdgeKind::Continue => &mut info.continues,
        };
        match edges.first {
            Some((_, expected)) if expected != target => {
                let what = match kind {
                    EdgeKind::Exit => "leaves",
                    EdgeKind::Continue => "continues",
                };
                Err(self.error(
                    DiagnosticCode::JumpTargetMismatch,
                    format!(
                        "loop at `{header}` {what} through `{target}`, an earlier edge goes to `{expected}`"
                    ),
                    Location::Block {
                        graph: self.graph,
                        block: source,
                    },
                ))
            }
            _ => {
                edges.first.get_or_insert((source, target));
                edges.mappings.push(values);
                Ok(())
            }
        }
    }

    pub(super) fn consume_break(&mut self) -> Fallible<bool> {
        self.consume_loop_jump(EdgeKind::Exit)
    }

    pub(super) fn consume_continue(&mut self) -> Fallible<bool> {
        self.consume_loop_jump(EdgeKind::Continue)
    }

    fn consume_loop_jump(&mut self, kind: EdgeKind) -> Fallible<bool> {
        if self.loops.is_empty() {
            let (code, keyword) = match kind {
                EdgeKind::Exit => (DiagnosticCode::BreakOutsideLoop, "break"),
                EdgeKind::Continue => (DiagnosticCode::ContinueOutsideLoop, "continue"),
            };
            return Err(self.error(
                code,
                format!("`{keyword}` outside of a loop"),
                self.operation_location(),
            ));
        }

        let source = self.current_block;
        let target = self.expect_jump()?.target;
        let values = self.apply_phis(source, target)?;
        self.record_edge(kind, source, target, values)?;
        Ok(false)
    }
}
