//! Programmatic construction of a [`Block`] together with its [`AnalysisInfo`].
//!
//! The builder assigns node ids and opens scopes exactly the way the scoping analysis does:
//! every block opens a scope, a `for` loop's body and post blocks are nested in its pre block,
//! and a function's parameters and return variables live in a function scope enclosing its body.
use primitive_types::U256;

use crate::{
    node::{
        Assignment, Case, ForLoop, FunctionCall, FunctionDefinition, If, Switch,
        VariableDeclaration,
    },
    AnalysisInfo, Block, Expression, FunctionId, Identifier, Literal, NodeId, ScopeError,
    ScopeId, Statement, VariableId, YulName,
};

pub fn lit(value: u64) -> Expression {
    Expression::Literal(Literal::number(value))
}

pub fn lit_u256(value: U256) -> Expression {
    Expression::Literal(Literal::number(value))
}

pub fn bool_lit(value: bool) -> Expression {
    Expression::Literal(Literal::boolean(value))
}

pub fn str_lit(text: &str) -> Expression {
    Expression::Literal(Literal::string(text))
}

pub fn id(name: &str) -> Expression {
    Expression::Identifier(Identifier::new(name))
}

pub fn call(name: &str, arguments: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::FunctionCall(FunctionCall {
        function_name: Identifier::new(name),
        arguments: arguments.into_iter().collect(),
    })
}

/// Ids allocated while declaring a function.
#[derive(Debug, Clone)]
pub struct DeclaredFunction {
    pub id: FunctionId,
    pub params: Vec<VariableId>,
    pub returns: Vec<VariableId>,
}

#[derive(Default)]
pub struct AstBuilder {
    info: AnalysisInfo,
    next_node: u32,
    error: Option<ScopeError>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the outermost block. Returns the first scoping error encountered, if any.
    pub fn program(
        mut self,
        f: impl FnOnce(&mut BlockBuilder<'_>),
    ) -> Result<(Block, AnalysisInfo), ScopeError> {
        let scope = self.info.scopes.make_scope(None, false);
        let block = self.build_block(scope, f);
        match self.error {
            Some(err) => Err(err),
            None => Ok((block, self.info)),
        }
    }

    fn build_block(&mut self, scope: ScopeId, f: impl FnOnce(&mut BlockBuilder<'_>)) -> Block {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.info.set_scope(id, scope);

        let mut builder = BlockBuilder {
            builder: self,
            scope,
            statements: Vec::new(),
        };
        f(&mut builder);
        Block::new(id, builder.statements)
    }

    fn nested_block(&mut self, parent: ScopeId, f: impl FnOnce(&mut BlockBuilder<'_>)) -> Block {
        let scope = self.info.scopes.make_scope(Some(parent), false);
        self.build_block(scope, f)
    }

    fn declare_variable(&mut self, scope: ScopeId, name: &str) -> VariableId {
        match self.info.scopes.declare_variable(scope, name) {
            Ok(var) => var,
            Err(err) => {
                self.error.get_or_insert(err);
                VariableId(u32::MAX)
            }
        }
    }
}

pub struct BlockBuilder<'b> {
    builder: &'b mut AstBuilder,
    scope: ScopeId,
    statements: Vec<Statement>,
}

impl BlockBuilder<'_> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn expr(&mut self, expression: Expression) {
        self.statements.push(Statement::Expression(expression));
    }

    /// `let a, b := value`, or `let a, b` when `value` is `None`.
    pub fn var(&mut self, names: &[&str], value: impl Into<Option<Expression>>) -> Vec<VariableId> {
        let vars = names
            .iter()
            .map(|name| self.builder.declare_variable(self.scope, name))
            .collect();
        self.statements
            .push(Statement::VariableDeclaration(VariableDeclaration {
                variables: names.iter().map(|name| Identifier::new(*name)).collect(),
                value: value.into().map(Box::new),
            }));
        vars
    }

    pub fn assign(&mut self, names: &[&str], value: Expression) {
        self.statements.push(Statement::Assignment(Assignment {
            variable_names: names.iter().map(|name| Identifier::new(*name)).collect(),
            value: Box::new(value),
        }));
    }

    pub fn if_(&mut self, condition: Expression, body: impl FnOnce(&mut BlockBuilder<'_>)) {
        let body = self.builder.nested_block(self.scope, body);
        self.statements.push(Statement::If(If {
            condition: Box::new(condition),
            body,
        }));
    }

    pub fn switch(&mut self, expression: Expression, cases: impl FnOnce(&mut SwitchBuilder<'_, '_>)) {
        let mut switch = SwitchBuilder {
            parent: self,
            cases: Vec::new(),
        };
        cases(&mut switch);
        let cases = switch.cases;
        self.statements.push(Statement::Switch(Switch {
            expression: Box::new(expression),
            cases,
        }));
    }

    pub fn for_loop(
        &mut self,
        pre: impl FnOnce(&mut BlockBuilder<'_>),
        condition: Expression,
        post: impl FnOnce(&mut BlockBuilder<'_>),
        body: impl FnOnce(&mut BlockBuilder<'_>),
    ) {
        let pre_scope = self.builder.info.scopes.make_scope(Some(self.scope), false);
        let pre = self.builder.build_block(pre_scope, pre);
        let post = self.builder.nested_block(pre_scope, post);
        let body = self.builder.nested_block(pre_scope, body);
        self.statements.push(Statement::ForLoop(ForLoop {
            pre,
            condition: Box::new(condition),
            post,
            body,
        }));
    }

    pub fn function(
        &mut self,
        name: &str,
        params: &[&str],
        returns: &[&str],
        body: impl FnOnce(&mut BlockBuilder<'_>),
    ) -> DeclaredFunction {
        let id = match self.builder.info.scopes.declare_function(
            self.scope,
            name,
            params.len(),
            returns.len(),
        ) {
            Ok(func) => func,
            Err(err) => {
                self.builder.error.get_or_insert(err);
                FunctionId(u32::MAX)
            }
        };

        let function_scope = self.builder.info.scopes.make_scope(Some(self.scope), true);
        let params_ids = params
            .iter()
            .map(|param| self.builder.declare_variable(function_scope, param))
            .collect();
        let returns_ids = returns
            .iter()
            .map(|ret| self.builder.declare_variable(function_scope, ret))
            .collect();
        let body = self.builder.nested_block(function_scope, body);

        self.statements
            .push(Statement::FunctionDefinition(FunctionDefinition {
                name: YulName::from(name),
                parameters: params.iter().map(|param| Identifier::new(*param)).collect(),
                return_variables: returns.iter().map(|ret| Identifier::new(*ret)).collect(),
                body,
            }));

        DeclaredFunction {
            id,
            params: params_ids,
            returns: returns_ids,
        }
    }

    pub fn block(&mut self, f: impl FnOnce(&mut BlockBuilder<'_>)) {
        let block = self.builder.nested_block(self.scope, f);
        self.statements.push(Statement::Block(block));
    }

    pub fn break_(&mut self) {
        self.statements.push(Statement::Break);
    }

    pub fn continue_(&mut self) {
        self.statements.push(Statement::Continue);
    }

    pub fn leave(&mut self) {
        self.statements.push(Statement::Leave);
    }
}

pub struct SwitchBuilder<'p, 'b> {
    parent: &'p mut BlockBuilder<'b>,
    cases: Vec<Case>,
}

impl SwitchBuilder<'_, '_> {
    pub fn case(&mut self, value: u64, body: impl FnOnce(&mut BlockBuilder<'_>)) {
        let body = self.parent.builder.nested_block(self.parent.scope, body);
        self.cases.push(Case {
            value: Some(Literal::number(value)),
            body,
        });
    }

    pub fn default(&mut self, body: impl FnOnce(&mut BlockBuilder<'_>)) {
        let body = self.parent.builder.nested_block(self.parent.scope, body);
        self.cases.push(Case { value: None, body });
    }
}
