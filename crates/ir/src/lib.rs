pub mod block;
pub mod builder;
pub mod graph;
pub mod ir_writer;
pub mod value;

pub use block::{
    BasicBlock, BlockId, ConditionalJump, Exit, FunctionReturn, Jump, Operation, OperationKind,
};
pub use builder::{BuildError, CfgBuilder};
pub use graph::{ControlFlow, SsaCfg};
pub use value::{ValueId, ValueInfo};
