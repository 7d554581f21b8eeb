use cranelift_entity::{packed_option::PackedOption, SecondaryMap};

use crate::{node::NodeId, Block, ScopeId, Scopes};

/// Result of the scoping analysis: the scope tree and the scope each [`Block`] opens.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInfo {
    pub scopes: Scopes,
    block_scopes: SecondaryMap<NodeId, PackedOption<ScopeId>>,
}

impl AnalysisInfo {
    pub fn new(scopes: Scopes) -> Self {
        Self {
            scopes,
            block_scopes: SecondaryMap::default(),
        }
    }

    pub fn set_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.block_scopes[node] = scope.into();
    }

    pub fn scope_of(&self, block: &Block) -> Option<ScopeId> {
        self.block_scopes.get(block.id).and_then(|scope| scope.expand())
    }
}
