//! The owner of the current layout snapshot.
//!
//! Readers get an `Arc<LayoutTree>`; applying an action swaps in a new snapshot
//! and never touches one already handed out.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::LayoutError;
use crate::ids::{IdGenerator, NodeId, TabId};
use crate::tree::{Action, LayoutTree};

/// Result of a dispatch. `applied` is false when the action was a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub applied: bool,
    pub created_leaf: Option<NodeId>,
    pub created_tab: Option<TabId>,
}

impl DispatchResult {
    pub fn ignored() -> Self {
        Self::default()
    }
}

/// The single sink every mutation flows through.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action) -> DispatchResult;
}

pub struct LayoutStore {
    tree: Arc<LayoutTree>,
    ids: IdGenerator,
    config: EngineConfig,
    revision: u64,
}

impl LayoutStore {
    pub fn new(config: EngineConfig) -> Self {
        let mut ids = IdGenerator::new();
        let tree = LayoutTree::new(&mut ids);
        Self {
            tree: Arc::new(tree),
            ids,
            config,
            revision: 0,
        }
    }

    /// The current snapshot.
    pub fn tree(&self) -> Arc<LayoutTree> {
        Arc::clone(&self.tree)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drag the gutter after `children[index]` of `split_id` by `delta_cells`.
    /// `container_cells` is the split's content extent along its axis.
    pub fn resize_gutter(
        &mut self,
        split_id: &NodeId,
        index: usize,
        delta_cells: i32,
        container_cells: u16,
    ) -> bool {
        match self
            .tree
            .resize_gutter(split_id, index, delta_cells, container_cells, &self.config)
        {
            Some(next) => {
                tracing::trace!(split_id = %split_id, index, delta_cells, "gutter resized");
                self.replace(next);
                true
            }
            None => false,
        }
    }

    /// Replace the current tree with a persisted one. Invalid trees are
    /// rejected and the current tree stays in place.
    pub fn restore(&mut self, tree: LayoutTree) -> Result<(), LayoutError> {
        let tree = tree.normalized(&mut self.ids, self.config.min_ratio)?;
        tracing::debug!(leaves = tree.leaf_count(), "layout restored");
        self.replace(tree);
        Ok(())
    }

    fn replace(&mut self, tree: LayoutTree) {
        self.tree = Arc::new(tree);
        self.revision += 1;
    }
}

impl Dispatch for LayoutStore {
    fn dispatch(&mut self, action: Action) -> DispatchResult {
        let name = action.name();
        match self
            .tree
            .apply(&action, &mut self.ids, self.config.min_ratio)
        {
            Some((next, outcome)) => {
                tracing::debug!(action = name, revision = self.revision + 1, "action applied");
                self.replace(next);
                DispatchResult {
                    applied: true,
                    created_leaf: outcome.created_leaf,
                    created_tab: outcome.created_tab,
                }
            }
            None => {
                tracing::trace!(action = name, "action ignored");
                DispatchResult::ignored()
            }
        }
    }
}
