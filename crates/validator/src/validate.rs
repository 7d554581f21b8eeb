//! Replays a Yul AST against its SSA control-flow graph.
//!
//! The walker keeps a replay position (current block and operation) and, for every variable in
//! scope, the set of values it may hold on the path being replayed. Each AST node must line up
//! with the next operation or exit of the current block, and every join must leave each variable
//! with at least one candidate common to all entering paths. The first mismatch aborts the walk.
use tracing::{debug, warn};
use yulssa_ast::{AnalysisInfo, Block, Dialect, FunctionId, ScopeId};
use yulssa_ir::{ir_writer::CfgWriter, BasicBlock, BlockId, ControlFlow, SsaCfg};

use crate::{
    config::ValidatorConfig,
    diagnostic::{Diagnostic, DiagnosticCode, DiagnosticContext, GraphRef, Location},
    report::ValidationReport,
};

mod control_flow;
mod expression;
mod loops;
mod mapping;
mod resolve;
mod statement;

pub use mapping::{ValueSet, VariableMapping};

use loops::LoopInfo;

/// Every fallible step of the walk. The diagnostic is boxed to keep `Ok` paths cheap.
pub(crate) type Fallible<T> = Result<T, Box<Diagnostic>>;

pub fn validate(
    control_flow: &ControlFlow,
    ast: &Block,
    analysis_info: &AnalysisInfo,
    dialect: &Dialect,
    config: &ValidatorConfig,
) -> ValidationReport {
    let context = Context {
        analysis_info,
        dialect,
        control_flow,
        cfg: &control_flow.main_graph,
        config,
    };

    let mut validator = Validator::new(context);
    let result = validator.run_main(ast);

    let mut report = ValidationReport::default();
    if let Err(diagnostic) = result {
        report.push(*diagnostic, config.max_diagnostics);
    }
    report.extend_with_limit(validator.warnings, config.max_diagnostics);
    report
}

pub fn validate_or_panic(
    control_flow: &ControlFlow,
    ast: &Block,
    analysis_info: &AnalysisInfo,
    dialect: &Dialect,
    config: &ValidatorConfig,
) {
    let report = validate(control_flow, ast, analysis_info, dialect, config);
    if report.has_errors() {
        eprintln!("YULSSA_VALIDATION_FAILURE");
        eprintln!("{report}");
        panic!("YULSSA_VALIDATION_FAILURE");
    }
}

/// Read-only inputs of a walk. `cfg` is the graph being replayed, the main graph or the graph of
/// the function whose body is being validated.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub analysis_info: &'a AnalysisInfo,
    pub dialect: &'a Dialect,
    pub control_flow: &'a ControlFlow,
    pub cfg: &'a SsaCfg,
    pub config: &'a ValidatorConfig,
}

pub(crate) struct Validator<'a> {
    ctx: Context<'a>,
    graph: GraphRef,
    scope: Option<ScopeId>,
    current_block: BlockId,
    current_operation: usize,
    mapping: VariableMapping,
    loops: Vec<LoopInfo>,
    warnings: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    fn new(ctx: Context<'a>) -> Self {
        Self {
            ctx,
            graph: GraphRef::from(ctx.cfg.function),
            scope: None,
            current_block: ctx.cfg.entry,
            current_operation: 0,
            mapping: VariableMapping::new(),
            loops: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn run_main(&mut self, ast: &Block) -> Fallible<()> {
        debug!(graph = %self.graph, "validating graph");
        if self.consume_block(ast)? {
            self.expect_main_exit()?;
        }
        Ok(())
    }

    fn block_data(&self, block: BlockId) -> Fallible<&'a BasicBlock> {
        let cfg: &'a SsaCfg = self.ctx.cfg;
        cfg.get_block(block).ok_or_else(|| {
            self.error(
                DiagnosticCode::InvalidBlockRef,
                format!("`{block}` does not exist"),
                Location::Graph(self.graph),
            )
        })
    }

    fn current_block_data(&self) -> Fallible<&'a BasicBlock> {
        self.block_data(self.current_block)
    }

    fn block_location(&self) -> Location {
        Location::Block {
            graph: self.graph,
            block: self.current_block,
        }
    }

    fn operation_location(&self) -> Location {
        Location::Operation {
            graph: self.graph,
            block: self.current_block,
            index: self.current_operation,
        }
    }

    fn writer(&self) -> CfgWriter<'a> {
        CfgWriter::new(self.ctx.cfg)
            .with_dialect(self.ctx.dialect)
            .with_scopes(&self.ctx.analysis_info.scopes)
    }

    fn function_label(&self, func: FunctionId) -> String {
        match self.ctx.analysis_info.scopes.get_function(func) {
            Some(data) => data.name.to_string(),
            None => func.to_string(),
        }
    }

    fn variable_label(&self, var: yulssa_ast::VariableId) -> String {
        match self.ctx.analysis_info.scopes.get_variable(var) {
            Some(data) => data.name.to_string(),
            None => var.to_string(),
        }
    }

    pub(super) fn error(
        &self,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Location,
    ) -> Box<Diagnostic> {
        Box::new(self.with_diagnostic_context(Diagnostic::error(code, message, location)))
    }

    pub(super) fn emit_warning(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        location: Location,
    ) {
        let diagnostic = self.with_diagnostic_context(Diagnostic::warning(code, message, location));
        self.warnings.push(diagnostic);
    }

    fn with_diagnostic_context(&self, mut diagnostic: Diagnostic) -> Diagnostic {
        let config = self.ctx.config;
        if config.should_attach_context() && diagnostic.context.is_none() {
            let function_name = self.ctx.cfg.function.map(|func| self.function_label(func));
            let operation_text = match diagnostic.primary {
                Location::Operation { block, index, .. } => self
                    .ctx
                    .cfg
                    .get_block(block)
                    .and_then(|data| data.operations.get(index))
                    .map(|op| self.writer().operation_string(op)),
                _ => None,
            };

            if function_name.is_some() || operation_text.is_some() {
                diagnostic.context = Some(DiagnosticContext {
                    function_name,
                    operation_text,
                });
            }
        }

        if config.should_attach_snippets() && diagnostic.snippet.is_none() {
            diagnostic.snippet = self.snippet_for(&diagnostic.primary);
        }

        warn!(code = %diagnostic.code, location = %diagnostic.primary, "{}", diagnostic.message);
        diagnostic
    }

    /// Up to two operations around the offending one, or the whole block.
    fn snippet_for(&self, location: &Location) -> Option<String> {
        let writer = self.writer();
        let (block, index) = match *location {
            Location::Graph(_) => return None,
            Location::Block { block, .. } => return Some(writer.block_string(block)),
            Location::Operation { block, index, .. } => (block, index),
        };
        let data = self.ctx.cfg.get_block(block)?;

        let mut snippet = format!("{}\n  {block}:\n", self.graph_label());
        let start = index.saturating_sub(2);
        let end = (index + 3).min(data.operations.len());
        for (offset, op) in data.operations[start.min(end)..end].iter().enumerate() {
            let marker = if start + offset == index { '>' } else { ' ' };
            snippet.push_str(&format!(" {marker}   {}\n", writer.operation_string(op)));
        }

        if end == data.operations.len() {
            let marker = if index >= data.operations.len() { '>' } else { ' ' };
            snippet.push_str(&format!(" {marker}   {}\n", writer.exit_string(&data.exit)));
        }

        Some(snippet)
    }

    fn graph_label(&self) -> String {
        match self.ctx.cfg.function {
            Some(func) => format!("function {}", self.function_label(func)),
            None => "main".to_string(),
        }
    }
}
