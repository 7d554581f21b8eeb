//! Basic blocks, their operations and their exits.
use cranelift_entity::entity_impl;
use smallvec::SmallVec;
use yulssa_ast::{BuiltinHandle, FunctionId};

use crate::ValueId;

/// An opaque reference to [`BasicBlock`].
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockId(pub u32);
entity_impl!(BlockId, "block");

#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    /// Predecessors, in the order phi arguments are laid out.
    pub entries: Vec<BlockId>,
    pub phis: Vec<ValueId>,
    pub operations: Vec<Operation>,
    pub exit: Exit,
}

impl BasicBlock {
    /// Position of `source` in [`Self::entries`], i.e. the phi argument it contributes.
    pub fn entry_offset(&self, source: BlockId) -> Option<usize> {
        self.entries.iter().position(|entry| *entry == source)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Exit {
    /// End of the main graph.
    #[default]
    MainExit,
    Jump(Jump),
    ConditionalJump(ConditionalJump),
    FunctionReturn(FunctionReturn),
    /// The block ends in a call that never returns.
    Terminated,
}

impl Exit {
    pub fn targets(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Self::Jump(jump) => smallvec::smallvec![jump.target],
            Self::ConditionalJump(jump) => smallvec::smallvec![jump.non_zero, jump.zero],
            Self::MainExit | Self::FunctionReturn(_) | Self::Terminated => SmallVec::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::MainExit => "main exit",
            Self::Jump(_) => "jump",
            Self::ConditionalJump(_) => "conditional jump",
            Self::FunctionReturn(_) => "function return",
            Self::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub target: BlockId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalJump {
    pub condition: ValueId,
    pub non_zero: BlockId,
    pub zero: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionReturn {
    pub return_values: SmallVec<[ValueId; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    /// In argument order, literal arguments of builtins excluded.
    pub inputs: SmallVec<[ValueId; 4]>,
    pub outputs: SmallVec<[ValueId; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    BuiltinCall {
        builtin: BuiltinHandle,
    },
    Call {
        function: FunctionId,
        /// `false` when the callee never returns to its caller.
        can_continue: bool,
    },
}
