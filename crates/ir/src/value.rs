//! This module contains the SSA value definition.
use std::fmt;

use cranelift_entity::entity_impl;
use primitive_types::U256;
use smallvec::SmallVec;

use crate::BlockId;

/// An opaque reference to a [`ValueInfo`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueId(pub u32);
entity_impl!(ValueId);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// How a value came into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueInfo {
    /// A value flowing out of a path that never reaches its use.
    Unreachable,

    /// The `index`th argument of the graph's function.
    Argument { index: usize },

    /// An output of an operation in `block`.
    Defined { block: BlockId },

    /// An interned constant.
    Literal(U256),

    /// A phi function of `block`. `arguments[i]` is the value flowing in along the edge from
    /// `block`'s `i`th entry.
    Phi {
        block: BlockId,
        arguments: SmallVec<[ValueId; 2]>,
    },
}

impl ValueInfo {
    pub fn literal(&self) -> Option<U256> {
        match self {
            Self::Literal(value) => Some(*value),
            _ => None,
        }
    }
}
