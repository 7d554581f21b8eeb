use tracing::debug;
use yulssa_ast::{Assignment, Block, FunctionDefinition, Statement, VariableDeclaration};

use super::{Context, Fallible, Validator, ValueSet};
use crate::diagnostic::{DiagnosticCode, GraphRef, Location};

impl Validator<'_> {
    /// Consumes `block` in its own scope. Returns whether control falls through it.
    pub(super) fn consume_block(&mut self, block: &Block) -> Fallible<bool> {
        let scope = self.ctx.analysis_info.scope_of(block).ok_or_else(|| {
            self.error(
                DiagnosticCode::MissingScope,
                format!("`{}` has no scope", block.id),
                self.block_location(),
            )
        })?;

        let saved = self.scope.replace(scope);
        let result = self.consume_statements(block);
        self.scope = saved;
        result
    }

    /// Consumes the statements of `block` in the active scope. Function definitions come first,
    /// then the remaining statements up to the first one control does not fall through.
    pub(super) fn consume_statements(&mut self, block: &Block) -> Fallible<bool> {
        for statement in block.statements.iter().filter(|s| s.is_function_definition()) {
            self.consume_statement(statement)?;
        }

        let mut statements = block
            .statements
            .iter()
            .filter(|statement| !statement.is_function_definition());
        while let Some(statement) = statements.next() {
            if !self.consume_statement(statement)? {
                let skipped = statements.count();
                if skipped > 0 && self.ctx.config.should_report_unreachable() {
                    self.emit_warning(
                        DiagnosticCode::UnreachableStatements,
                        format!("{skipped} statement(s) of `{}` are never reached", block.id),
                        self.block_location(),
                    );
                }
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn consume_statement(&mut self, statement: &Statement) -> Fallible<bool> {
        match statement {
            Statement::Expression(expr) => match self.consume_expression(expr)? {
                Some(values) if !values.is_empty() => Err(self.error(
                    DiagnosticCode::ResultCountMismatch,
                    format!("expression statement produces {} unused value(s)", values.len()),
                    self.operation_location(),
                )),
                Some(_) => Ok(true),
                None => Ok(false),
            },
            Statement::Assignment(assignment) => self.consume_assignment(assignment),
            Statement::VariableDeclaration(declaration) => {
                self.consume_variable_declaration(declaration)
            }
            Statement::FunctionDefinition(definition) => {
                self.consume_function_definition(definition)?;
                Ok(true)
            }
            Statement::If(if_) => self.consume_if(if_),
            Statement::Switch(switch) => self.consume_switch(switch),
            Statement::ForLoop(for_loop) => self.consume_for_loop(for_loop),
            Statement::Break => self.consume_break(),
            Statement::Continue => self.consume_continue(),
            Statement::Leave => self.consume_leave(),
            Statement::Block(block) => self.consume_block(block),
        }
    }

    fn consume_values(
        &mut self,
        expected: usize,
        value: &yulssa_ast::Expression,
    ) -> Fallible<Option<Vec<ValueSet>>> {
        let Some(values) = self.consume_expression(value)? else {
            return Ok(None);
        };
        if values.len() != expected {
            return Err(self.error(
                DiagnosticCode::ResultCountMismatch,
                format!(
                    "{expected} variable(s) bound to {} value(s)",
                    values.len()
                ),
                self.operation_location(),
            ));
        }
        Ok(Some(values))
    }

    fn consume_assignment(&mut self, assignment: &Assignment) -> Fallible<bool> {
        let Some(values) = self.consume_values(assignment.variable_names.len(), &assignment.value)?
        else {
            return Ok(false);
        };

        for (identifier, values) in assignment.variable_names.iter().zip(values) {
            let var = self.resolve_variable(&identifier.name)?;
            self.mapping.assign(var, values);
        }
        Ok(true)
    }

    fn consume_variable_declaration(&mut self, declaration: &VariableDeclaration) -> Fallible<bool> {
        let values = match &declaration.value {
            Some(value) => {
                let Some(values) = self.consume_values(declaration.variables.len(), value)? else {
                    return Ok(false);
                };
                values
            }
            None => {
                let zero = ValueSet::single(self.zero_literal()?);
                vec![zero; declaration.variables.len()]
            }
        };

        for (identifier, values) in declaration.variables.iter().zip(values) {
            let var = self.resolve_variable(&identifier.name)?;
            if !self.mapping.define(var, values) {
                return Err(self.error(
                    DiagnosticCode::RedeclaredVariable,
                    format!("`{}` is declared twice on this path", identifier.name),
                    self.operation_location(),
                ));
            }
        }
        Ok(true)
    }

    pub(super) fn consume_leave(&mut self) -> Fallible<bool> {
        let ret = self.expect_function_return()?;
        let cfg = self.ctx.cfg;
        if ret.return_values.len() != cfg.returns.len() {
            return Err(self.error(
                DiagnosticCode::ReturnCountMismatch,
                format!(
                    "return of `{}` carries {} value(s), the function has {} return variable(s)",
                    self.current_block,
                    ret.return_values.len(),
                    cfg.returns.len()
                ),
                self.operation_location(),
            ));
        }

        for (var, value) in cfg.returns.iter().zip(&ret.return_values) {
            let name = self.variable_label(*var);
            let Some(values) = self.mapping.lookup(*var) else {
                return Err(self.error(
                    DiagnosticCode::UnboundVariable,
                    format!("return variable `{name}` has no value"),
                    self.operation_location(),
                ));
            };
            if !values.contains(*value) {
                let diag = self.error(
                    DiagnosticCode::InconsistentBinding,
                    format!("`{value}` is returned for `{name}`, which does not hold it"),
                    self.operation_location(),
                );
                let note = format!("`{name}` may hold {values}");
                return Err(Box::new((*diag).with_note(note)));
            }
            self.mapping.narrow(*var, *value);
        }

        Ok(false)
    }

    /// Validates the body of `definition` against the function's own graph.
    fn consume_function_definition(&mut self, definition: &FunctionDefinition) -> Fallible<()> {
        let func = self.resolve_function(&definition.name)?;
        let graph_location = Location::Graph(GraphRef::Function(func));
        let Some(cfg) = self.ctx.control_flow.function_graph(func) else {
            return Err(self.error(
                DiagnosticCode::MissingFunctionGraph,
                format!("`{}` has no graph", definition.name),
                graph_location,
            ));
        };

        if cfg.arguments.len() != definition.parameters.len()
            || cfg.returns.len() != definition.return_variables.len()
        {
            return Err(self.error(
                DiagnosticCode::SignatureMismatch,
                format!(
                    "`{}` takes {} parameter(s) and returns {} value(s), its graph has {} argument(s) and {} return variable(s)",
                    definition.name,
                    definition.parameters.len(),
                    definition.return_variables.len(),
                    cfg.arguments.len(),
                    cfg.returns.len()
                ),
                graph_location,
            ));
        }

        let mut nested = Validator::new(Context { cfg, ..self.ctx });
        let result = nested.run_function(definition);
        self.warnings.append(&mut nested.warnings);
        result
    }

    fn run_function(&mut self, definition: &FunctionDefinition) -> Fallible<()> {
        debug!(graph = %self.graph, name = %definition.name, "validating graph");
        let body_scope = self.ctx.analysis_info.scope_of(&definition.body);
        self.scope = body_scope;

        let cfg = self.ctx.cfg;
        for ((graph_var, argument), parameter) in cfg.arguments.iter().zip(&definition.parameters) {
            let var = self.resolve_variable(&parameter.name)?;
            self.bind_signature_variable(var, *graph_var, ValueSet::single(*argument))?;
        }

        if !cfg.returns.is_empty() {
            let zero = ValueSet::single(self.zero_literal()?);
            for (graph_var, identifier) in cfg.returns.iter().zip(&definition.return_variables) {
                let var = self.resolve_variable(&identifier.name)?;
                self.bind_signature_variable(var, *graph_var, zero.clone())?;
            }
        }

        if self.consume_block(&definition.body)? {
            self.consume_leave()?;
        }
        Ok(())
    }

    fn bind_signature_variable(
        &mut self,
        var: yulssa_ast::VariableId,
        graph_var: yulssa_ast::VariableId,
        values: ValueSet,
    ) -> Fallible<()> {
        if var != graph_var {
            return Err(self.error(
                DiagnosticCode::SignatureMismatch,
                format!(
                    "`{}` is bound to `{graph_var}` in the graph",
                    self.variable_label(var)
                ),
                Location::Graph(self.graph),
            ));
        }
        if !self.mapping.define(var, values) {
            return Err(self.error(
                DiagnosticCode::RedeclaredVariable,
                format!("`{}` is declared twice", self.variable_label(var)),
                Location::Graph(self.graph),
            ));
        }
        Ok(())
    }
}
