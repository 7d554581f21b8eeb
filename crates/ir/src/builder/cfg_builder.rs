use cranelift_entity::SecondaryMap;
use primitive_types::U256;
use smallvec::SmallVec;
use thiserror::Error;
use yulssa_ast::{BuiltinHandle, FunctionId, VariableId};

use crate::{
    BasicBlock, BlockId, ConditionalJump, Exit, FunctionReturn, Jump, Operation, OperationKind,
    SsaCfg, ValueId, ValueInfo,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("`{0}` already has an exit")]
    BlockAlreadyTerminated(BlockId),

    #[error("`{0}` is not the result of a phi function")]
    NotAPhi(ValueId),
}

/// Assembles an [`SsaCfg`] block by block.
///
/// Edges are recorded on both ends: an exit naming a target also appends the current block to
/// the target's entries. Phi arguments are laid out by the caller in entry order. Misuse is
/// remembered and reported by [`CfgBuilder::finish`].
pub struct CfgBuilder {
    cfg: SsaCfg,
    current: BlockId,
    terminated: SecondaryMap<BlockId, bool>,
    error: Option<BuildError>,
}

impl CfgBuilder {
    /// Builder of the main graph.
    pub fn new() -> Self {
        Self::with_graph(SsaCfg::new(None))
    }

    pub fn for_function(function: FunctionId) -> Self {
        Self::with_graph(SsaCfg::new(Some(function)))
    }

    fn with_graph(cfg: SsaCfg) -> Self {
        let current = cfg.entry;
        Self {
            cfg,
            current,
            terminated: SecondaryMap::default(),
            error: None,
        }
    }

    pub fn finish(self) -> Result<SsaCfg, BuildError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.cfg),
        }
    }

    pub fn entry_block(&self) -> BlockId {
        self.cfg.entry
    }

    pub fn current_block(&self) -> BlockId {
        self.current
    }

    pub fn append_block(&mut self) -> BlockId {
        self.cfg.blocks.push(BasicBlock::default())
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Returns the value interned for `value`, creating it on first use.
    pub fn make_literal(&mut self, value: impl Into<U256>) -> ValueId {
        let value = value.into();
        if let Some(literal) = self.cfg.lookup_literal(value) {
            return literal;
        }

        let literal = self.cfg.values.push(ValueInfo::Literal(value));
        self.cfg.literals.insert(value, literal);
        literal
    }

    pub fn make_unreachable(&mut self) -> ValueId {
        self.cfg.values.push(ValueInfo::Unreachable)
    }

    pub fn append_argument(&mut self, var: VariableId) -> ValueId {
        let index = self.cfg.arguments.len();
        let value = self.cfg.values.push(ValueInfo::Argument { index });
        self.cfg.arguments.push((var, value));
        value
    }

    pub fn declare_return(&mut self, var: VariableId) {
        self.cfg.returns.push(var);
    }

    pub fn builtin(
        &mut self,
        builtin: BuiltinHandle,
        inputs: &[ValueId],
        num_outputs: usize,
    ) -> SmallVec<[ValueId; 2]> {
        self.append_operation(OperationKind::BuiltinCall { builtin }, inputs, num_outputs)
    }

    pub fn call(
        &mut self,
        function: FunctionId,
        inputs: &[ValueId],
        num_outputs: usize,
        can_continue: bool,
    ) -> SmallVec<[ValueId; 2]> {
        self.append_operation(
            OperationKind::Call {
                function,
                can_continue,
            },
            inputs,
            num_outputs,
        )
    }

    fn append_operation(
        &mut self,
        kind: OperationKind,
        inputs: &[ValueId],
        num_outputs: usize,
    ) -> SmallVec<[ValueId; 2]> {
        let block = self.current;
        self.check_open(block);

        let outputs: SmallVec<[ValueId; 2]> = (0..num_outputs)
            .map(|_| self.cfg.values.push(ValueInfo::Defined { block }))
            .collect();
        self.cfg.blocks[block].operations.push(Operation {
            kind,
            inputs: inputs.iter().copied().collect(),
            outputs: outputs.clone(),
        });
        outputs
    }

    /// Declares a phi function in `block`. Its arguments are set with [`Self::set_phi_args`].
    pub fn make_phi(&mut self, block: BlockId) -> ValueId {
        let phi = self.cfg.values.push(ValueInfo::Phi {
            block,
            arguments: SmallVec::new(),
        });
        self.cfg.blocks[block].phis.push(phi);
        phi
    }

    pub fn set_phi_args(&mut self, phi: ValueId, args: &[ValueId]) {
        match self.cfg.values.get_mut(phi) {
            Some(ValueInfo::Phi { arguments, .. }) => {
                *arguments = args.iter().copied().collect();
            }
            _ => self.record(BuildError::NotAPhi(phi)),
        }
    }

    pub fn jump(&mut self, target: BlockId) {
        self.set_exit(Exit::Jump(Jump { target }));
    }

    pub fn branch(&mut self, condition: ValueId, non_zero: BlockId, zero: BlockId) {
        self.set_exit(Exit::ConditionalJump(ConditionalJump {
            condition,
            non_zero,
            zero,
        }));
    }

    pub fn ret(&mut self, return_values: &[ValueId]) {
        self.set_exit(Exit::FunctionReturn(FunctionReturn {
            return_values: return_values.iter().copied().collect(),
        }));
    }

    pub fn terminate(&mut self) {
        self.set_exit(Exit::Terminated);
    }

    pub fn main_exit(&mut self) {
        self.set_exit(Exit::MainExit);
    }

    fn set_exit(&mut self, exit: Exit) {
        let block = self.current;
        self.check_open(block);

        for target in exit.targets() {
            self.cfg.blocks[target].entries.push(block);
        }
        self.cfg.blocks[block].exit = exit;
        self.terminated[block] = true;
    }

    fn check_open(&mut self, block: BlockId) {
        if self.terminated[block] {
            self.record(BuildError::BlockAlreadyTerminated(block));
        }
    }

    fn record(&mut self, err: BuildError) {
        self.error.get_or_insert(err);
    }
}

impl Default for CfgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_are_interned() {
        let mut builder = CfgBuilder::new();
        let one = builder.make_literal(1u64);
        assert_eq!(builder.make_literal(1u64), one);
        assert_ne!(builder.make_literal(2u64), one);

        let cfg = builder.finish().unwrap();
        assert_eq!(cfg.lookup_literal(U256::one()), Some(one));
        assert_eq!(cfg.zero_literal(), None);
    }

    #[test]
    fn exits_record_entries() {
        let mut builder = CfgBuilder::new();
        let entry = builder.entry_block();
        let then_block = builder.append_block();
        let join = builder.append_block();

        let cond = builder.make_literal(1u64);
        builder.branch(cond, then_block, join);
        builder.switch_to_block(then_block);
        builder.jump(join);

        let cfg = builder.finish().unwrap();
        assert_eq!(cfg.block(join).entries, vec![entry, then_block]);
        assert_eq!(cfg.block(join).entry_offset(then_block), Some(1));
        assert_eq!(cfg.block(then_block).entries, vec![entry]);
        assert_eq!(cfg.block(join).exit, Exit::MainExit);
    }

    #[test]
    fn second_exit_is_rejected() {
        let mut builder = CfgBuilder::new();
        let entry = builder.entry_block();
        builder.terminate();
        builder.main_exit();
        assert_eq!(
            builder.finish().unwrap_err(),
            BuildError::BlockAlreadyTerminated(entry)
        );
    }

    #[test]
    fn phi_args_require_a_phi() {
        let mut builder = CfgBuilder::new();
        let one = builder.make_literal(1u64);
        builder.set_phi_args(one, &[one]);
        assert_eq!(builder.finish().unwrap_err(), BuildError::NotAPhi(one));
    }
}
