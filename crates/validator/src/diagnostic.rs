use std::fmt;

use yulssa_ast::FunctionId;
use yulssa_ir::BlockId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiagnosticCode {
    InvalidBlockRef,
    InvalidValueRef,
    MissingScope,
    UnresolvedIdentifier,
    ExpectedVariable,
    ExpectedFunction,
    MissingFunctionGraph,
    SignatureMismatch,
    MissingOperation,
    UnconsumedOperations,
    OperandMismatch,
    OperandCountMismatch,
    CalleeMismatch,
    CallArityMismatch,
    ResultCountMismatch,
    MissingLiteral,
    SwitchCaseMismatch,
    UnexpectedTerminator,
    BrokenEdge,
    JumpTargetMismatch,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    ReturnCountMismatch,
    PhiEntryMissing,
    InvalidPhi,
    LoopDidNotConverge,
    UnboundVariable,
    RedeclaredVariable,
    InconsistentBinding,
    ConditionMismatch,
    UnownedPhi,
    UnreachableStatements,
}

impl DiagnosticCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::InvalidBlockRef => 1,
            Self::InvalidValueRef => 2,
            Self::MissingScope => 100,
            Self::UnresolvedIdentifier => 101,
            Self::ExpectedVariable => 102,
            Self::ExpectedFunction => 103,
            Self::MissingFunctionGraph => 104,
            Self::SignatureMismatch => 105,
            Self::MissingOperation => 200,
            Self::UnconsumedOperations => 201,
            Self::OperandMismatch => 202,
            Self::OperandCountMismatch => 203,
            Self::CalleeMismatch => 204,
            Self::CallArityMismatch => 205,
            Self::ResultCountMismatch => 206,
            Self::MissingLiteral => 207,
            Self::SwitchCaseMismatch => 208,
            Self::UnexpectedTerminator => 300,
            Self::BrokenEdge => 301,
            Self::JumpTargetMismatch => 302,
            Self::BreakOutsideLoop => 303,
            Self::ContinueOutsideLoop => 304,
            Self::ReturnCountMismatch => 305,
            Self::PhiEntryMissing => 306,
            Self::InvalidPhi => 307,
            Self::LoopDidNotConverge => 308,
            Self::UnboundVariable => 400,
            Self::RedeclaredVariable => 401,
            Self::InconsistentBinding => 402,
            Self::ConditionMismatch => 403,
            Self::UnownedPhi => 404,
            Self::UnreachableStatements => 500,
        }
    }

    pub fn as_str(self) -> String {
        format!("SSA{:04}", self.as_u16())
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => "error".fmt(f),
            Self::Warning => "warning".fmt(f),
        }
    }
}

/// The graph a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GraphRef {
    Main,
    Function(FunctionId),
}

impl From<Option<FunctionId>> for GraphRef {
    fn from(function: Option<FunctionId>) -> Self {
        match function {
            Some(function) => Self::Function(function),
            None => Self::Main,
        }
    }
}

impl fmt::Display for GraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => "main".fmt(f),
            Self::Function(func) => write!(f, "{func}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Location {
    Graph(GraphRef),
    Block {
        graph: GraphRef,
        block: BlockId,
    },
    /// The `index`th operation of `block`. An index equal to the number of operations designates
    /// the block's exit.
    Operation {
        graph: GraphRef,
        block: BlockId,
        index: usize,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(graph) => graph.fmt(f),
            Self::Block { graph, block } => write!(f, "{graph}:{block}"),
            Self::Operation {
                graph,
                block,
                index,
            } => write!(f, "{graph}:{block}:op{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Note {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiagnosticContext {
    pub function_name: Option<String>,
    pub operation_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub primary: Location,
    pub notes: Vec<Note>,
    pub context: Option<DiagnosticContext>,
    pub snippet: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        primary: Location,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            primary,
            notes: Vec::new(),
            context: None,
            snippet: None,
        }
    }

    pub fn error(code: DiagnosticCode, message: impl Into<String>, primary: Location) -> Self {
        Self::new(code, Severity::Error, message, primary)
    }

    pub fn warning(code: DiagnosticCode, message: impl Into<String>, primary: Location) -> Self {
        Self::new(code, Severity::Warning, message, primary)
    }

    pub fn with_note(mut self, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            message: message.into(),
        });
        self
    }

    pub fn with_context(mut self, context: DiagnosticContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.snippet = snippet;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} @ {}",
            self.severity, self.code, self.message, self.primary
        )?;

        if let Some(context) = &self.context {
            match (&context.function_name, &context.operation_text) {
                (Some(function_name), Some(operation_text)) => {
                    write!(f, " ({function_name}, {operation_text})")?;
                }
                (Some(function_name), None) => {
                    write!(f, " ({function_name})")?;
                }
                (None, Some(operation_text)) => {
                    write!(f, " ({operation_text})")?;
                }
                (None, None) => {}
            }
        }

        writeln!(f)?;

        for note in &self.notes {
            writeln!(f, "  note: {}", note.message)?;
        }

        if let Some(snippet) = &self.snippet {
            writeln!(f, "{snippet}")?;
        }

        Ok(())
    }
}
