use cranelift_entity::PrimaryMap;
use primitive_types::U256;
use rustc_hash::FxHashMap;
use yulssa_ast::{FunctionId, VariableId};

use crate::{BasicBlock, BlockId, ValueId, ValueInfo};

/// The SSA control-flow graph of the main program or of a single function.
#[derive(Debug, Clone)]
pub struct SsaCfg {
    pub entry: BlockId,
    /// `None` for the main graph.
    pub function: Option<FunctionId>,
    /// Parameters of the function, each with the argument value bound to it on entry.
    pub arguments: Vec<(VariableId, ValueId)>,
    pub returns: Vec<VariableId>,
    pub(crate) blocks: PrimaryMap<BlockId, BasicBlock>,
    pub(crate) values: PrimaryMap<ValueId, ValueInfo>,
    pub(crate) literals: FxHashMap<U256, ValueId>,
}

impl SsaCfg {
    pub(crate) fn new(function: Option<FunctionId>) -> Self {
        let mut blocks = PrimaryMap::new();
        let entry = blocks.push(BasicBlock::default());
        Self {
            entry,
            function,
            arguments: Vec::new(),
            returns: Vec::new(),
            blocks,
            values: PrimaryMap::new(),
            literals: FxHashMap::default(),
        }
    }

    pub fn block(&self, block: BlockId) -> &BasicBlock {
        &self.blocks[block]
    }

    pub fn block_mut(&mut self, block: BlockId) -> &mut BasicBlock {
        &mut self.blocks[block]
    }

    pub fn get_block(&self, block: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(block)
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &BasicBlock)> {
        self.blocks.iter()
    }

    pub fn value_info(&self, value: ValueId) -> Option<&ValueInfo> {
        self.values.get(value)
    }

    /// The value interned for the constant `value`, if the graph uses it.
    pub fn lookup_literal(&self, value: U256) -> Option<ValueId> {
        self.literals.get(&value).copied()
    }

    pub fn zero_literal(&self) -> Option<ValueId> {
        self.lookup_literal(U256::zero())
    }
}

/// The graphs of a whole program.
#[derive(Debug, Clone)]
pub struct ControlFlow {
    pub main_graph: SsaCfg,
    function_graphs: FxHashMap<FunctionId, SsaCfg>,
}

impl ControlFlow {
    pub fn new(main_graph: SsaCfg) -> Self {
        Self {
            main_graph,
            function_graphs: FxHashMap::default(),
        }
    }

    pub fn insert_function_graph(&mut self, function: FunctionId, cfg: SsaCfg) {
        self.function_graphs.insert(function, cfg);
    }

    pub fn function_graph(&self, function: FunctionId) -> Option<&SsaCfg> {
        self.function_graphs.get(&function)
    }

    pub fn function_graphs(&self) -> impl Iterator<Item = (FunctionId, &SsaCfg)> {
        self.function_graphs.iter().map(|(func, cfg)| (*func, cfg))
    }
}
