//! This module contains the Yul syntax tree definition.
use std::fmt;

use cranelift_entity::entity_impl;
use primitive_types::U256;

use crate::YulName;

/// An opaque reference to a [`Block`].
///
/// Blocks are the only nodes that open a lexical scope, so they are the only nodes carrying an
/// identity; [`crate::AnalysisInfo`] is keyed by it.
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);
entity_impl!(NodeId, "node");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: NodeId,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(id: NodeId, statements: Vec<Statement>) -> Self {
        Self { id, statements }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Expression(Expression),
    Assignment(Assignment),
    VariableDeclaration(VariableDeclaration),
    FunctionDefinition(FunctionDefinition),
    If(If),
    Switch(Switch),
    ForLoop(ForLoop),
    Break,
    Continue,
    Leave,
    Block(Block),
}

impl Statement {
    pub fn is_function_definition(&self) -> bool {
        matches!(self, Self::FunctionDefinition(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    FunctionCall(FunctionCall),
    Identifier(Identifier),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: YulName,
}

impl Identifier {
    pub fn new(name: impl Into<YulName>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    Boolean,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub value: U256,
    /// Source text of string literals. Literal arguments of builtins are identified by it.
    pub text: Option<YulName>,
}

impl Literal {
    pub fn number(value: impl Into<U256>) -> Self {
        Self {
            kind: LiteralKind::Number,
            value: value.into(),
            text: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            kind: LiteralKind::Boolean,
            value: U256::from(value as u8),
            text: None,
        }
    }

    /// String literals are left aligned in the 32-byte word, truncated if longer.
    pub fn string(text: &str) -> Self {
        let mut bytes = [0u8; 32];
        let len = text.len().min(32);
        bytes[..len].copy_from_slice(&text.as_bytes()[..len]);
        Self {
            kind: LiteralKind::String,
            value: U256::from_big_endian(&bytes),
            text: Some(text.into()),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.text) {
            (LiteralKind::String, Some(text)) => write!(f, "\"{text}\""),
            (LiteralKind::Boolean, _) => write!(f, "{}", !self.value.is_zero()),
            _ => write!(f, "{}", self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub function_name: Identifier,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub variable_names: Vec<Identifier>,
    pub value: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub variables: Vec<Identifier>,
    pub value: Option<Box<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: YulName,
    pub parameters: Vec<Identifier>,
    pub return_variables: Vec<Identifier>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct If {
    pub condition: Box<Expression>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switch {
    pub expression: Box<Expression>,
    pub cases: Vec<Case>,
}

/// A `case` of a [`Switch`]. `value` is `None` for the `default` case, which always comes last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForLoop {
    pub pre: Block,
    pub condition: Box<Expression>,
    pub post: Block,
    pub body: Block,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_is_left_aligned() {
        let literal = Literal::string("ab");
        let mut expected = [0u8; 32];
        expected[0] = b'a';
        expected[1] = b'b';
        assert_eq!(literal.value, U256::from_big_endian(&expected));
        assert_eq!(literal.to_string(), "\"ab\"");
    }

    #[test]
    fn boolean_literal() {
        assert!(Literal::boolean(false).is_zero());
        assert_eq!(Literal::boolean(true).value, U256::one());
        assert_eq!(Literal::boolean(true).to_string(), "true");
    }
}
