//! The root context object handed to commands and the host.
//!
//! A [`Workspace`] owns the layout store, the focus registry and the drag
//! manager. Every dispatch goes through it so the focus registry tracks the
//! leaves of the current tree: each leaf is registered as a focus target, and a
//! leaf that takes focus asks the workspace to make it the active leaf.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use ratatui::layout::Rect;

use crate::config::EngineConfig;
use crate::drag::{DragDropManager, DragIndicator, DragOutcome, DragState, NoIndicator};
use crate::error::{FocusError, LayoutError};
use crate::focus::{FocusRegistry, FocusTarget};
use crate::ids::{NodeId, TabId};
use crate::store::{Dispatch, DispatchResult, LayoutStore};
use crate::tree::{
    Action, GUTTER_THICKNESS, LayoutTree, LeafBounds, NavDirection, SplitDirection, TabSpec,
    WidgetKind,
};

/// Focus group holding one entry per leaf.
pub const PANE_GROUP: &str = "panes";

const DEFAULT_VIEWPORT: Rect = Rect {
    x: 0,
    y: 0,
    width: 80,
    height: 24,
};

pub fn pane_focus_id(leaf_id: &NodeId) -> String {
    format!("pane:{leaf_id}")
}

#[derive(Default)]
struct FocusBridge {
    attached: BTreeSet<NodeId>,
    /// Leaves not on screen while the tree is in focus mode.
    hidden: BTreeSet<NodeId>,
    requests: VecDeque<NodeId>,
}

struct LeafFocus {
    leaf_id: NodeId,
    bridge: Rc<RefCell<FocusBridge>>,
}

impl FocusTarget for LeafFocus {
    fn acquire_focus(&self) -> Result<(), FocusError> {
        let mut bridge = self.bridge.borrow_mut();
        if !bridge.attached.contains(&self.leaf_id) {
            return Err(FocusError::Detached);
        }
        if bridge.hidden.contains(&self.leaf_id) {
            return Err(FocusError::Rejected(format!(
                "{} is hidden by focus mode",
                self.leaf_id
            )));
        }
        bridge.requests.push_back(self.leaf_id.clone());
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.bridge.borrow().attached.contains(&self.leaf_id)
    }
}

pub struct Workspace {
    store: LayoutStore,
    focus: FocusRegistry,
    drag: DragDropManager,
    bridge: Rc<RefCell<FocusBridge>>,
    viewport: Rect,
    untitled: usize,
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_drag_indicator(config, Box::new(NoIndicator))
    }

    pub fn with_drag_indicator(config: EngineConfig, indicator: Box<dyn DragIndicator>) -> Self {
        let focus = FocusRegistry::new(config.focus_history_limit);
        let drag = DragDropManager::with_indicator(config.drop_edge_band, indicator);
        let mut workspace = Self {
            store: LayoutStore::new(config),
            focus,
            drag,
            bridge: Rc::default(),
            viewport: DEFAULT_VIEWPORT,
            untitled: 0,
        };
        workspace.sync_focus_targets();
        workspace
    }

    pub fn tree(&self) -> Arc<LayoutTree> {
        self.store.tree()
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        self.store.config()
    }

    pub fn focus(&self) -> &FocusRegistry {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusRegistry {
        &mut self.focus
    }

    pub fn drag(&self) -> &DragDropManager {
        &self.drag
    }

    pub fn drag_mut(&mut self) -> &mut DragDropManager {
        &mut self.drag
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Area the host lays the tree out in; directional focus uses it.
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
    }

    pub fn leaf_bounds(&self) -> LeafBounds {
        self.store.tree().layout(self.viewport)
    }

    pub fn active_leaf(&self) -> NodeId {
        self.store.tree().active_leaf().clone()
    }

    pub fn active_tab(&self) -> Option<TabId> {
        let tree = self.store.tree();
        tree.leaf(tree.active_leaf()).map(|leaf| leaf.active_tab.clone())
    }

    pub fn split_active(&mut self, direction: SplitDirection) -> Option<NodeId> {
        let ratio = self.config().default_split_ratio;
        self.dispatch(Action::SplitLeaf {
            leaf_id: self.active_leaf(),
            direction,
            ratio,
        })
        .created_leaf
    }

    pub fn close_active_split(&mut self) -> bool {
        self.dispatch(Action::CloseSplit {
            leaf_id: self.active_leaf(),
        })
        .applied
    }

    pub fn open_tab(&mut self, spec: TabSpec) -> Option<TabId> {
        self.dispatch(Action::OpenTab {
            leaf_id: None,
            tab: spec,
        })
        .created_tab
    }

    pub fn open_untitled(&mut self) -> Option<TabId> {
        self.untitled += 1;
        let title = format!("Untitled-{}", self.untitled);
        self.open_tab(TabSpec::new(title, WidgetKind::Editor))
    }

    pub fn close_active_tab(&mut self) -> bool {
        match self.active_tab() {
            Some(tab_id) => self.dispatch(Action::CloseTab { tab_id }).applied,
            None => false,
        }
    }

    pub fn close_all_active_tabs(&mut self) -> bool {
        self.dispatch(Action::CloseAllTabs {
            leaf_id: self.active_leaf(),
        })
        .applied
    }

    /// Activate the neighbouring tab in the active leaf's strip, wrapping.
    pub fn cycle_tab(&mut self, forward: bool) -> bool {
        let tree = self.store.tree();
        let Some(leaf) = tree.leaf(tree.active_leaf()) else {
            return false;
        };
        let len = leaf.tabs.len();
        if len < 2 {
            return false;
        }
        let index = leaf
            .tabs
            .iter()
            .position(|tab| tab.id == leaf.active_tab)
            .unwrap_or(0);
        let next = if forward {
            (index + 1) % len
        } else {
            (index + len - 1) % len
        };
        let tab_id = leaf.tabs[next].id.clone();
        self.dispatch(Action::SetActiveTab { tab_id }).applied
    }

    pub fn focus_toward(&mut self, direction: NavDirection) -> bool {
        let bounds = self.leaf_bounds();
        let action = match direction {
            NavDirection::Up => Action::FocusAboveSplit { bounds },
            NavDirection::Down => Action::FocusBelowSplit { bounds },
            NavDirection::Left => Action::FocusLeftSplit { bounds },
            NavDirection::Right => Action::FocusRightSplit { bounds },
        };
        self.dispatch(action).applied
    }

    /// Move keyboard focus through the registry and follow it in the tree.
    pub fn focus_target(&mut self, forward: bool) -> bool {
        let moved = if forward {
            self.focus.focus_next(None)
        } else {
            self.focus.focus_previous(None)
        };
        self.apply_focus_requests();
        moved
    }

    pub fn resize_gutter(
        &mut self,
        split_id: &NodeId,
        index: usize,
        delta_cells: i32,
        container_cells: u16,
    ) -> bool {
        self.store
            .resize_gutter(split_id, index, delta_cells, container_cells)
    }

    pub fn restore(&mut self, tree: LayoutTree) -> Result<(), LayoutError> {
        self.store.restore(tree)?;
        self.sync_focus_targets();
        Ok(())
    }

    /// Start dragging `tab_id` out of the leaf that holds it. Welcome tabs
    /// never move.
    pub fn start_tab_drag(&mut self, tab_id: &TabId) -> bool {
        let tree = self.store.tree();
        let Some(source) = tree.leaf_of_tab(tab_id) else {
            return false;
        };
        if source.tab(tab_id).is_some_and(|tab| tab.is_welcome()) {
            tracing::debug!(%tab_id, "welcome tab is not draggable");
            return false;
        }
        self.drag
            .start_drag(DragState::tab(tab_id.clone(), source.id.clone()))
    }

    pub fn end_drag(&mut self) -> DragOutcome {
        let mut drag = std::mem::take(&mut self.drag);
        let outcome = drag.end_drag(self);
        self.drag = drag;
        outcome
    }

    /// Check a split against the target leaf's laid out extent. Returns `None`
    /// when the leaf cannot hold two panes of `min_pane_cells` plus a gutter;
    /// otherwise the ratio is clamped so neither side drops below that size.
    fn fit_split(&self, action: Action) -> Option<Action> {
        let Action::SplitLeaf {
            leaf_id,
            direction,
            ratio,
        } = action
        else {
            return Some(action);
        };
        let bounds = self.leaf_bounds();
        let Some((_, rect)) = bounds.iter().find(|(id, _)| *id == leaf_id) else {
            return Some(Action::SplitLeaf {
                leaf_id,
                direction,
                ratio,
            });
        };
        let extent = match direction {
            SplitDirection::Horizontal => rect.width,
            SplitDirection::Vertical => rect.height,
        };
        let min_cells = self.config().min_pane_cells;
        let needed = min_cells.saturating_mul(2).saturating_add(GUTTER_THICKNESS);
        if extent < needed {
            tracing::debug!(%leaf_id, extent, needed, "not enough room to split");
            return None;
        }
        let min_fraction = self.config().min_fraction(extent - GUTTER_THICKNESS);
        let ratio = if ratio.is_finite() {
            ratio.clamp(min_fraction, 1.0 - min_fraction)
        } else {
            ratio
        };
        Some(Action::SplitLeaf {
            leaf_id,
            direction,
            ratio,
        })
    }

    /// Register one focus target per leaf, drop targets of vanished leaves and
    /// point the registry at the active leaf.
    pub fn sync_focus_targets(&mut self) {
        let tree = self.store.tree();
        let leaves = tree.leaf_ids();
        {
            let mut bridge = self.bridge.borrow_mut();
            bridge.attached = leaves.iter().cloned().collect();
            bridge.hidden = if tree.focus_mode() {
                leaves
                    .iter()
                    .filter(|id| *id != tree.active_leaf())
                    .cloned()
                    .collect()
            } else {
                BTreeSet::new()
            };
        }

        let live: BTreeSet<String> = leaves.iter().map(pane_focus_id).collect();
        let stale: Vec<String> = self
            .focus
            .group_members(PANE_GROUP)
            .into_iter()
            .filter(|id| !live.contains(*id))
            .map(str::to_string)
            .collect();
        for id in stale {
            self.focus.unregister_focusable(&id);
        }
        for (order, leaf_id) in leaves.iter().enumerate() {
            let target = LeafFocus {
                leaf_id: leaf_id.clone(),
                bridge: Rc::clone(&self.bridge),
            };
            let order = i32::try_from(order).unwrap_or(i32::MAX);
            self.focus
                .register_focusable(pane_focus_id(leaf_id), Box::new(target), Some(PANE_GROUP), order);
        }

        let active = pane_focus_id(tree.active_leaf());
        let follows_tree = self
            .focus
            .current_focus()
            .is_none_or(|current| current.starts_with("pane:"));
        if follows_tree && self.focus.current_focus() != Some(active.as_str()) {
            self.focus.focus(&active);
        }
        self.bridge.borrow_mut().requests.clear();
    }

    /// Activate leaves whose focus target was focused since the last call.
    pub fn apply_focus_requests(&mut self) {
        loop {
            let next = self.bridge.borrow_mut().requests.pop_front();
            let Some(leaf_id) = next else {
                break;
            };
            self.dispatch(Action::SetActiveLeaf { leaf_id });
        }
    }
}

impl Dispatch for Workspace {
    fn dispatch(&mut self, action: Action) -> DispatchResult {
        let Some(action) = self.fit_split(action) else {
            return DispatchResult::default();
        };
        let result = self.store.dispatch(action);
        if result.applied {
            self.sync_focus_targets();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_registry_tracks_leaves() {
        let mut ws = Workspace::new(EngineConfig::default());
        let first = ws.active_leaf();
        let second = ws.split_active(SplitDirection::Horizontal).unwrap();
        assert_eq!(ws.focus().group_members(PANE_GROUP).len(), 2);
        assert_eq!(ws.focus().current_focus(), Some(pane_focus_id(&second).as_str()));

        assert!(ws.close_active_split());
        assert_eq!(ws.focus().group_members(PANE_GROUP), vec![pane_focus_id(&first).as_str()]);
        assert_eq!(ws.focus().current_focus(), Some(pane_focus_id(&first).as_str()));
    }

    #[test]
    fn focus_target_cycles_active_leaf() {
        let mut ws = Workspace::new(EngineConfig::default());
        let first = ws.active_leaf();
        let second = ws.split_active(SplitDirection::Vertical).unwrap();
        assert_eq!(ws.active_leaf(), second);
        assert!(ws.focus_target(true));
        assert_eq!(ws.active_leaf(), first);
        assert!(ws.focus_target(false));
        assert_eq!(ws.active_leaf(), second);
    }

    #[test]
    fn directional_focus_uses_viewport_layout() {
        let mut ws = Workspace::new(EngineConfig::default());
        ws.set_viewport(Rect::new(0, 0, 100, 40));
        let left = ws.active_leaf();
        let right = ws.split_active(SplitDirection::Horizontal).unwrap();
        assert!(ws.focus_toward(NavDirection::Left));
        assert_eq!(ws.active_leaf(), left);
        assert!(!ws.focus_toward(NavDirection::Up));
        assert!(ws.focus_toward(NavDirection::Right));
        assert_eq!(ws.active_leaf(), right);
    }

    #[test]
    fn split_needs_room_for_two_minimum_panes() {
        let mut ws = Workspace::new(EngineConfig::default());
        ws.set_viewport(Rect::new(0, 0, 20, 10));
        let min = ws.config().min_pane_cells;

        let mut splits = 0;
        while ws.split_active(SplitDirection::Horizontal).is_some() {
            splits += 1;
            assert!(splits < 10, "splits never ran out of room");
        }
        assert_eq!(splits, 2);
        assert!(ws.leaf_bounds().iter().all(|(_, rect)| rect.width >= min));

        let revision = ws.store().revision();
        let result = ws.dispatch(Action::SplitLeaf {
            leaf_id: ws.active_leaf(),
            direction: SplitDirection::Horizontal,
            ratio: 0.5,
        });
        assert!(!result.applied);
        assert_eq!(ws.store().revision(), revision);
    }

    #[test]
    fn skewed_split_ratio_keeps_minimum_cells() {
        let mut ws = Workspace::new(EngineConfig::default());
        ws.set_viewport(Rect::new(0, 0, 20, 10));
        let leaf_id = ws.active_leaf();
        let result = ws.dispatch(Action::SplitLeaf {
            leaf_id,
            direction: SplitDirection::Vertical,
            ratio: 0.05,
        });
        assert!(result.applied);
        let heights: Vec<u16> = ws.leaf_bounds().iter().map(|(_, rect)| rect.height).collect();
        assert_eq!(heights, vec![4, 5]);
    }

    #[test]
    fn edge_drop_without_room_is_split_rejected() {
        let mut ws = Workspace::new(EngineConfig::default());
        ws.set_viewport(Rect::new(0, 0, 8, 8));
        let tab_id = ws.open_untitled().unwrap();
        let leaf_id = ws.active_leaf();
        assert!(ws.start_tab_drag(&tab_id));
        let bounds = ws.leaf_bounds()[0].1;
        ws.drag_mut().update_pointer(&leaf_id, bounds, 0, 4);
        assert_eq!(ws.end_drag(), DragOutcome::SplitRejected);
        assert_eq!(ws.tree().leaf_count(), 1);
        assert!(!ws.drag().is_dragging());
    }

    #[test]
    fn welcome_tab_cannot_be_dragged() {
        let mut ws = Workspace::new(EngineConfig::default());
        let welcome = ws.active_tab().unwrap();
        assert!(!ws.start_tab_drag(&welcome));
        assert!(!ws.drag().is_dragging());

        let tab_id = ws.open_untitled().unwrap();
        assert!(ws.start_tab_drag(&tab_id));
    }

    #[test]
    fn focus_mode_keeps_keyboard_focus_on_the_visible_leaf() {
        let mut ws = Workspace::new(EngineConfig::default());
        let first = ws.active_leaf();
        let second = ws.split_active(SplitDirection::Horizontal).unwrap();
        ws.dispatch(Action::ToggleFocusMode { tab_id: None });
        ws.focus_target(true);
        assert_eq!(ws.active_leaf(), second);
        assert!(!ws.focus_mut().focus(&pane_focus_id(&first)));

        ws.dispatch(Action::ToggleFocusMode { tab_id: None });
        assert!(ws.focus_target(true));
        assert_eq!(ws.active_leaf(), first);
    }

    #[test]
    fn cycle_tab_wraps_within_leaf() {
        let mut ws = Workspace::new(EngineConfig::default());
        let a = ws.open_untitled().unwrap();
        let b = ws.open_untitled().unwrap();
        assert_eq!(ws.active_tab(), Some(b.clone()));
        assert!(ws.cycle_tab(true));
        assert_eq!(ws.active_tab(), Some(a));
        assert!(ws.cycle_tab(false));
        assert_eq!(ws.active_tab(), Some(b));
    }
}
