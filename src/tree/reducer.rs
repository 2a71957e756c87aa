//! The layout reducer: `(tree, action) -> tree'`.
//!
//! [`LayoutTree::apply`] never mutates its receiver. It returns `None` when the
//! action references something that does not exist or would not change the
//! tree, and otherwise the next snapshot plus whatever the action created.

use ratatui::layout::Rect;

use super::geometry::{NavDirection, neighbor};
use super::{Leaf, LayoutTree, Node, Split, SplitDirection, Tab, TabSpec, normalize_sizes};
use crate::ids::{IdGenerator, NodeId, TabId};

/// Rendered leaf rectangles, as reported by the view layer.
pub type LeafBounds = Vec<(NodeId, Rect)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SplitLeaf {
        leaf_id: NodeId,
        direction: SplitDirection,
        ratio: f64,
    },
    CloseSplit {
        leaf_id: NodeId,
    },
    MoveTab {
        tab_id: TabId,
        target_leaf_id: NodeId,
    },
    CloseTab {
        tab_id: TabId,
    },
    CloseAllTabs {
        leaf_id: NodeId,
    },
    RebalanceSplits,
    FocusNextSplit,
    FocusPreviousSplit,
    FocusAboveSplit {
        bounds: LeafBounds,
    },
    FocusBelowSplit {
        bounds: LeafBounds,
    },
    FocusLeftSplit {
        bounds: LeafBounds,
    },
    FocusRightSplit {
        bounds: LeafBounds,
    },
    ToggleFocusMode {
        tab_id: Option<TabId>,
    },
    OpenTab {
        leaf_id: Option<NodeId>,
        tab: TabSpec,
    },
    SetActiveTab {
        tab_id: TabId,
    },
    SetActiveLeaf {
        leaf_id: NodeId,
    },
    SetTabDirty {
        tab_id: TabId,
        dirty: bool,
    },
}

impl Action {
    /// Short stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SplitLeaf { .. } => "SPLIT_LEAF",
            Action::CloseSplit { .. } => "CLOSE_SPLIT",
            Action::MoveTab { .. } => "MOVE_TAB",
            Action::CloseTab { .. } => "CLOSE_TAB",
            Action::CloseAllTabs { .. } => "CLOSE_ALL_TABS",
            Action::RebalanceSplits => "REBALANCE_SPLITS",
            Action::FocusNextSplit => "FOCUS_NEXT_SPLIT",
            Action::FocusPreviousSplit => "FOCUS_PREVIOUS_SPLIT",
            Action::FocusAboveSplit { .. } => "FOCUS_ABOVE_SPLIT",
            Action::FocusBelowSplit { .. } => "FOCUS_BELOW_SPLIT",
            Action::FocusLeftSplit { .. } => "FOCUS_LEFT_SPLIT",
            Action::FocusRightSplit { .. } => "FOCUS_RIGHT_SPLIT",
            Action::ToggleFocusMode { .. } => "TOGGLE_FOCUS_MODE",
            Action::OpenTab { .. } => "OPEN_TAB",
            Action::SetActiveTab { .. } => "SET_ACTIVE_TAB",
            Action::SetActiveLeaf { .. } => "SET_ACTIVE_LEAF",
            Action::SetTabDirty { .. } => "SET_TAB_DIRTY",
        }
    }
}

/// Ids an action created, handed back synchronously to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub created_leaf: Option<NodeId>,
    pub created_tab: Option<TabId>,
}

impl LayoutTree {
    pub fn apply(
        &self,
        action: &Action,
        ids: &mut IdGenerator,
        min_ratio: f64,
    ) -> Option<(LayoutTree, ActionOutcome)> {
        let mut next = self.clone();
        let outcome = match action {
            Action::SplitLeaf {
                leaf_id,
                direction,
                ratio,
            } => next.split_leaf(leaf_id, *direction, *ratio, ids, min_ratio)?,
            Action::CloseSplit { leaf_id } => next.close_split(leaf_id)?,
            Action::MoveTab {
                tab_id,
                target_leaf_id,
            } => next.move_tab(tab_id, target_leaf_id, ids)?,
            Action::CloseTab { tab_id } => next.close_tab(tab_id, ids)?,
            Action::CloseAllTabs { leaf_id } => next.close_all_tabs(leaf_id, ids)?,
            Action::RebalanceSplits => next.rebalance(),
            Action::FocusNextSplit => next.cycle_leaf(true)?,
            Action::FocusPreviousSplit => next.cycle_leaf(false)?,
            Action::FocusAboveSplit { bounds } => next.focus_toward(bounds, NavDirection::Up)?,
            Action::FocusBelowSplit { bounds } => next.focus_toward(bounds, NavDirection::Down)?,
            Action::FocusLeftSplit { bounds } => next.focus_toward(bounds, NavDirection::Left)?,
            Action::FocusRightSplit { bounds } => next.focus_toward(bounds, NavDirection::Right)?,
            Action::ToggleFocusMode { tab_id } => next.toggle_focus_mode(tab_id.as_ref())?,
            Action::OpenTab { leaf_id, tab } => next.open_tab(leaf_id.as_ref(), tab, ids)?,
            Action::SetActiveTab { tab_id } => next.set_active_tab(tab_id)?,
            Action::SetActiveLeaf { leaf_id } => next.set_active_leaf(leaf_id)?,
            Action::SetTabDirty { tab_id, dirty } => next.set_tab_dirty(tab_id, *dirty)?,
        };
        if next == *self {
            return None;
        }
        Some((next, outcome))
    }

    fn split_leaf(
        &mut self,
        leaf_id: &NodeId,
        direction: SplitDirection,
        ratio: f64,
        ids: &mut IdGenerator,
        min_ratio: f64,
    ) -> Option<ActionOutcome> {
        self.leaf(leaf_id)?;
        if !ratio.is_finite() {
            return None;
        }
        let ratio = ratio.clamp(min_ratio, 1.0 - min_ratio);

        let split_id = ids.next_node("split");
        let new_leaf = Leaf::welcome(ids.next_node("leaf"), ids.next_tab());
        let new_leaf_id = new_leaf.id.clone();

        self.replace_reference(leaf_id, &split_id);
        self.nodes.insert(
            split_id.clone(),
            Node::Split(Split {
                id: split_id,
                direction,
                children: vec![leaf_id.clone(), new_leaf_id.clone()],
                sizes: vec![ratio, 1.0 - ratio],
            }),
        );
        self.nodes.insert(new_leaf_id.clone(), Node::Leaf(new_leaf));
        self.active_leaf = new_leaf_id.clone();

        Some(ActionOutcome {
            created_leaf: Some(new_leaf_id),
            created_tab: None,
        })
    }

    fn close_split(&mut self, leaf_id: &NodeId) -> Option<ActionOutcome> {
        self.leaf(leaf_id)?;
        let (parent, index) = self.parent_of(leaf_id)?;
        let parent_id = parent.id.clone();

        self.nodes.remove(leaf_id);
        let split = self.split_mut(&parent_id)?;
        split.children.remove(index);
        split.sizes.remove(index);
        normalize_sizes(&mut split.sizes);
        let heir = split
            .children
            .get(index.min(split.children.len().saturating_sub(1)))
            .cloned();

        self.compact_from(&parent_id);

        if self.active_leaf == *leaf_id {
            let fallback = heir
                .as_ref()
                .and_then(|heir| self.first_leaf(heir))
                .or_else(|| self.first_leaf(&self.root))
                .cloned();
            if let Some(fallback) = fallback {
                self.active_leaf = fallback;
            }
        }
        Some(ActionOutcome::default())
    }

    /// Collapse single-child splits, walking from `start` towards the root.
    fn compact_from(&mut self, start: &NodeId) {
        let mut cursor = Some(start.clone());
        while let Some(id) = cursor {
            let parent = self.parent_id(&id);
            let Some(split) = self.split(&id) else {
                break;
            };
            match split.children.len() {
                0 => {
                    self.nodes.remove(&id);
                    if let Some(parent_id) = &parent
                        && let Some(parent_split) = self.split_mut(parent_id)
                        && let Some(index) = parent_split.children.iter().position(|c| *c == id)
                    {
                        parent_split.children.remove(index);
                        parent_split.sizes.remove(index);
                        normalize_sizes(&mut parent_split.sizes);
                    }
                }
                1 => {
                    let only = split.children[0].clone();
                    self.replace_reference(&id, &only);
                    self.nodes.remove(&id);
                }
                _ => break,
            }
            cursor = parent;
        }
    }

    fn move_tab(
        &mut self,
        tab_id: &TabId,
        target: &NodeId,
        ids: &mut IdGenerator,
    ) -> Option<ActionOutcome> {
        self.leaf(target)?;
        if self.tab(tab_id)?.is_welcome() {
            return None;
        }
        let source = self.leaf_of_tab(tab_id)?.id.clone();
        let tab = self.leaf_mut(&source)?.remove_tab(tab_id)?;
        if source != *target {
            self.leaf_mut(&source)?.normalize(ids);
        }
        self.leaf_mut(target)?.adopt(tab);
        self.active_leaf = target.clone();
        Some(ActionOutcome::default())
    }

    fn close_tab(&mut self, tab_id: &TabId, ids: &mut IdGenerator) -> Option<ActionOutcome> {
        let leaf = self.leaf_of_tab_mut(tab_id)?;
        if leaf.is_welcome_only() {
            return None;
        }
        leaf.remove_tab(tab_id)?;
        leaf.normalize(ids);
        Some(ActionOutcome::default())
    }

    fn close_all_tabs(&mut self, leaf_id: &NodeId, ids: &mut IdGenerator) -> Option<ActionOutcome> {
        let leaf = self.leaf_mut(leaf_id)?;
        if leaf.is_welcome_only() {
            return None;
        }
        leaf.tabs.clear();
        leaf.recent.clear();
        leaf.normalize(ids);
        Some(ActionOutcome::default())
    }

    fn rebalance(&mut self) -> ActionOutcome {
        for node in self.nodes.values_mut() {
            if let Node::Split(split) = node {
                let even = 1.0 / split.children.len().max(1) as f64;
                split.sizes = vec![even; split.children.len()];
            }
        }
        ActionOutcome::default()
    }

    fn cycle_leaf(&mut self, forward: bool) -> Option<ActionOutcome> {
        let order = self.leaf_ids();
        if order.len() < 2 {
            return None;
        }
        let index = order
            .iter()
            .position(|id| *id == self.active_leaf)
            .unwrap_or(0);
        let step = if forward { 1isize } else { -1isize };
        let next = (index as isize + step).rem_euclid(order.len() as isize) as usize;
        self.active_leaf = order[next].clone();
        Some(ActionOutcome::default())
    }

    fn focus_toward(&mut self, bounds: &LeafBounds, direction: NavDirection) -> Option<ActionOutcome> {
        let known: LeafBounds = bounds
            .iter()
            .filter(|(id, _)| self.leaf(id).is_some())
            .cloned()
            .collect();
        let target = neighbor(&known, &self.active_leaf, direction)?;
        self.active_leaf = target;
        Some(ActionOutcome::default())
    }

    fn toggle_focus_mode(&mut self, tab_id: Option<&TabId>) -> Option<ActionOutcome> {
        match tab_id {
            Some(tab_id) => {
                let leaf = self.leaf_of_tab_mut(tab_id)?;
                let tab = leaf.tabs.iter_mut().find(|tab| tab.id == *tab_id)?;
                tab.focus_mode = !tab.focus_mode;
            }
            None => self.focus_mode = !self.focus_mode,
        }
        Some(ActionOutcome::default())
    }

    fn open_tab(
        &mut self,
        leaf_id: Option<&NodeId>,
        spec: &TabSpec,
        ids: &mut IdGenerator,
    ) -> Option<ActionOutcome> {
        let leaf_id = leaf_id.cloned().unwrap_or_else(|| self.active_leaf.clone());
        let tab_id = ids.next_tab();
        self.leaf_mut(&leaf_id)?
            .adopt(Tab::from_spec(tab_id.clone(), spec));
        self.active_leaf = leaf_id;
        Some(ActionOutcome {
            created_leaf: None,
            created_tab: Some(tab_id),
        })
    }

    fn set_active_tab(&mut self, tab_id: &TabId) -> Option<ActionOutcome> {
        let leaf = self.leaf_of_tab_mut(tab_id)?;
        leaf.activate(tab_id);
        let leaf_id = leaf.id.clone();
        self.active_leaf = leaf_id;
        Some(ActionOutcome::default())
    }

    fn set_active_leaf(&mut self, leaf_id: &NodeId) -> Option<ActionOutcome> {
        self.leaf(leaf_id)?;
        self.active_leaf = leaf_id.clone();
        Some(ActionOutcome::default())
    }

    fn set_tab_dirty(&mut self, tab_id: &TabId, dirty: bool) -> Option<ActionOutcome> {
        let leaf = self.leaf_of_tab_mut(tab_id)?;
        let tab = leaf.tabs.iter_mut().find(|tab| tab.id == *tab_id)?;
        tab.dirty = dirty;
        Some(ActionOutcome::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::WidgetKind;

    const MIN: f64 = 0.05;

    struct Fixture {
        ids: IdGenerator,
        tree: LayoutTree,
    }

    impl Fixture {
        fn new() -> Self {
            let mut ids = IdGenerator::new();
            let tree = LayoutTree::new(&mut ids);
            Self { ids, tree }
        }

        fn apply(&mut self, action: Action) -> Option<ActionOutcome> {
            let (next, outcome) = self.tree.apply(&action, &mut self.ids, MIN)?;
            next.validate(MIN).expect("invariants hold after every action");
            self.tree = next;
            Some(outcome)
        }

        fn root_leaf(&self) -> NodeId {
            self.tree.leaf_ids()[0].clone()
        }

        fn split(&mut self, leaf: &NodeId, direction: SplitDirection) -> NodeId {
            self.apply(Action::SplitLeaf {
                leaf_id: leaf.clone(),
                direction,
                ratio: 0.5,
            })
            .and_then(|o| o.created_leaf)
            .expect("split creates a leaf")
        }

        fn open(&mut self, leaf: &NodeId, title: &str) -> TabId {
            self.apply(Action::OpenTab {
                leaf_id: Some(leaf.clone()),
                tab: TabSpec::new(title, WidgetKind::Editor),
            })
            .and_then(|o| o.created_tab)
            .expect("open creates a tab")
        }
    }

    #[test]
    fn split_leaf_returns_new_leaf_and_wraps_target() {
        let mut fx = Fixture::new();
        let original = fx.root_leaf();
        let created = fx.split(&original, SplitDirection::Horizontal);

        let split = fx.tree.split(fx.tree.root()).expect("root becomes a split");
        assert_eq!(split.children, vec![original, created.clone()]);
        assert_eq!(split.sizes, vec![0.5, 0.5]);
        assert!(fx.tree.leaf(&created).unwrap().is_welcome_only());
        assert_eq!(fx.tree.active_leaf(), &created);
    }

    #[test]
    fn split_ratio_is_clamped_to_minimum() {
        let mut fx = Fixture::new();
        let leaf = fx.root_leaf();
        fx.apply(Action::SplitLeaf {
            leaf_id: leaf,
            direction: SplitDirection::Vertical,
            ratio: 0.0,
        });
        let split = fx.tree.split(fx.tree.root()).unwrap();
        assert_eq!(split.sizes, vec![MIN, 1.0 - MIN]);
    }

    #[test]
    fn split_then_close_restores_layout() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Vertical);
        fx.open(&a, "main.rs");
        let before = fx.tree.clone();

        let c = fx.split(&a, SplitDirection::Horizontal);
        fx.apply(Action::CloseSplit { leaf_id: c });
        assert!(fx.tree.same_layout(&before));
        assert!(fx.tree.leaf(&b).is_some());
    }

    #[test]
    fn close_split_promotes_sibling_subtree() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Horizontal);
        let c = fx.split(&b, SplitDirection::Vertical);

        fx.apply(Action::CloseSplit { leaf_id: a.clone() });
        let root = fx.tree.split(fx.tree.root()).expect("inner split promoted to root");
        assert_eq!(root.children, vec![b.clone(), c]);
        assert_eq!(root.direction, SplitDirection::Vertical);
        assert!(fx.tree.leaf(&a).is_none());
        assert_eq!(fx.tree.splits().count(), 1);
    }

    #[test]
    fn close_split_on_lone_root_is_noop() {
        let fx = Fixture::new();
        let mut ids = IdGenerator::new();
        let action = Action::CloseSplit {
            leaf_id: fx.root_leaf(),
        };
        assert!(fx.tree.apply(&action, &mut ids, MIN).is_none());
    }

    #[test]
    fn nested_close_promotes_into_grandparent_slot() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Horizontal);
        let split_id = fx.tree.root().clone();
        let c = fx.split(&b, SplitDirection::Horizontal);
        fx.apply(Action::CloseSplit { leaf_id: b });
        let split = fx.tree.split(&split_id).unwrap();
        assert_eq!(split.children, vec![a, c]);
        let sum: f64 = split.sizes.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn active_leaf_moves_to_heir_when_closed() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Horizontal);
        assert_eq!(fx.tree.active_leaf(), &b);
        fx.apply(Action::CloseSplit { leaf_id: b });
        assert_eq!(fx.tree.active_leaf(), &a);
    }

    #[test]
    fn move_tab_appends_and_activates() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        let t2 = fx.open(&a, "two");
        let b = fx.split(&a, SplitDirection::Horizontal);
        let t3 = fx.open(&b, "three");

        fx.apply(Action::MoveTab {
            tab_id: t1.clone(),
            target_leaf_id: b.clone(),
        });
        let target = fx.tree.leaf(&b).unwrap();
        let titles: Vec<&TabId> = target.tabs.iter().map(|t| &t.id).collect();
        assert_eq!(titles, vec![&t3, &t1]);
        assert_eq!(target.active_tab, t1);
        assert_eq!(fx.tree.active_leaf(), &b);
        assert_eq!(fx.tree.leaf(&a).unwrap().active_tab, t2);
    }

    #[test]
    fn move_last_tab_leaves_welcome_behind() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        let b = fx.split(&a, SplitDirection::Horizontal);
        fx.apply(Action::MoveTab {
            tab_id: t1,
            target_leaf_id: b.clone(),
        });
        assert!(fx.tree.leaf(&a).unwrap().is_welcome_only());
        let target = fx.tree.leaf(&b).unwrap();
        assert_eq!(target.tabs.len(), 1, "welcome tab replaced by the moved tab");
    }

    #[test]
    fn move_tab_to_unknown_leaf_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        let before = fx.tree.clone();
        assert!(
            fx.apply(Action::MoveTab {
                tab_id: t1,
                target_leaf_id: NodeId::from("missing"),
            })
            .is_none()
        );
        assert_eq!(fx.tree, before);
    }

    #[test]
    fn welcome_tab_stays_put() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Horizontal);
        fx.open(&b, "notes");
        let welcome = fx.tree.leaf(&a).unwrap().active_tab.clone();
        let before = fx.tree.clone();
        assert!(
            fx.apply(Action::MoveTab {
                tab_id: welcome.clone(),
                target_leaf_id: b.clone(),
            })
            .is_none()
        );
        assert_eq!(fx.tree, before);
        let welcome_tabs = fx
            .tree
            .leaves()
            .iter()
            .flat_map(|leaf| leaf.tabs.iter())
            .filter(|tab| tab.is_welcome())
            .count();
        assert_eq!(welcome_tabs, 1);
        assert!(fx.tree.leaf(&a).unwrap().tab(&welcome).is_some());
    }

    #[test]
    fn close_tab_falls_back_then_to_welcome() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        let t2 = fx.open(&a, "two");
        fx.apply(Action::CloseTab { tab_id: t2 });
        assert_eq!(fx.tree.leaf(&a).unwrap().active_tab, t1);
        fx.apply(Action::CloseTab { tab_id: t1 });
        assert!(fx.tree.leaf(&a).unwrap().is_welcome_only());
        assert_eq!(fx.tree.leaf_count(), 1, "closing tabs never closes panes");
    }

    #[test]
    fn closing_lone_welcome_tab_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let welcome = fx.tree.leaf(&a).unwrap().active_tab.clone();
        assert!(fx.apply(Action::CloseTab { tab_id: welcome }).is_none());
        assert!(fx.apply(Action::CloseAllTabs { leaf_id: a }).is_none());
    }

    #[test]
    fn close_all_tabs_keeps_the_pane() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Vertical);
        fx.open(&b, "one");
        fx.open(&b, "two");
        fx.apply(Action::CloseAllTabs { leaf_id: b.clone() });
        assert!(fx.tree.leaf(&b).unwrap().is_welcome_only());
        assert_eq!(fx.tree.leaf_count(), 2);
    }

    #[test]
    fn rebalance_resets_every_split() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        fx.apply(Action::SplitLeaf {
            leaf_id: a.clone(),
            direction: SplitDirection::Horizontal,
            ratio: 0.8,
        });
        fx.apply(Action::SplitLeaf {
            leaf_id: a,
            direction: SplitDirection::Vertical,
            ratio: 0.3,
        });
        fx.apply(Action::RebalanceSplits);
        for split in fx.tree.splits() {
            assert!(split.sizes.iter().all(|s| *s == 0.5));
        }
        assert!(fx.apply(Action::RebalanceSplits).is_none());
    }

    #[test]
    fn focus_next_and_previous_cycle_in_document_order() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let b = fx.split(&a, SplitDirection::Horizontal);
        let c = fx.split(&a, SplitDirection::Vertical);
        // Document order: a, c, b.
        assert_eq!(fx.tree.leaf_ids(), vec![a.clone(), c.clone(), b.clone()]);
        fx.apply(Action::SetActiveLeaf { leaf_id: a.clone() });
        fx.apply(Action::FocusNextSplit);
        assert_eq!(fx.tree.active_leaf(), &c);
        fx.apply(Action::FocusNextSplit);
        fx.apply(Action::FocusNextSplit);
        assert_eq!(fx.tree.active_leaf(), &a);
        fx.apply(Action::FocusPreviousSplit);
        assert_eq!(fx.tree.active_leaf(), &b);
    }

    #[test]
    fn focus_next_with_single_leaf_is_noop() {
        let mut fx = Fixture::new();
        assert!(fx.apply(Action::FocusNextSplit).is_none());
    }

    #[test]
    fn focus_below_uses_supplied_bounds() {
        let mut fx = Fixture::new();
        let top = fx.root_leaf();
        let bottom = fx.split(&top, SplitDirection::Vertical);
        fx.apply(Action::SetActiveLeaf {
            leaf_id: top.clone(),
        });
        let bounds = vec![
            (top.clone(), Rect::new(0, 0, 80, 12)),
            (bottom.clone(), Rect::new(0, 12, 80, 12)),
        ];
        fx.apply(Action::FocusBelowSplit {
            bounds: bounds.clone(),
        });
        assert_eq!(fx.tree.active_leaf(), &bottom);
        assert!(
            fx.apply(Action::FocusBelowSplit { bounds }).is_none(),
            "nothing below the bottom pane"
        );
    }

    #[test]
    fn toggle_focus_mode_on_tree_and_tab() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        fx.apply(Action::ToggleFocusMode { tab_id: None });
        assert!(fx.tree.focus_mode());
        fx.apply(Action::ToggleFocusMode {
            tab_id: Some(t1.clone()),
        });
        assert!(fx.tree.tab(&t1).unwrap().focus_mode);
        assert!(
            fx.apply(Action::ToggleFocusMode {
                tab_id: Some(TabId::from("nope")),
            })
            .is_none()
        );
    }

    #[test]
    fn dirty_flag_and_activation() {
        let mut fx = Fixture::new();
        let a = fx.root_leaf();
        let t1 = fx.open(&a, "one");
        let t2 = fx.open(&a, "two");
        fx.apply(Action::SetTabDirty {
            tab_id: t1.clone(),
            dirty: true,
        });
        assert!(fx.tree.tab(&t1).unwrap().dirty);
        fx.apply(Action::SetActiveTab { tab_id: t1.clone() });
        let leaf = fx.tree.leaf(&a).unwrap();
        assert_eq!(leaf.active_tab, t1);
        assert_eq!(leaf.recent.last(), Some(&t1));
        assert!(leaf.holds(&t2));
    }

    #[test]
    fn unknown_references_are_noops() {
        let fx = Fixture::new();
        let mut ids = IdGenerator::new();
        let missing_leaf = NodeId::from("ghost");
        let missing_tab = TabId::from("ghost");
        for action in [
            Action::SplitLeaf {
                leaf_id: missing_leaf.clone(),
                direction: SplitDirection::Horizontal,
                ratio: 0.5,
            },
            Action::CloseSplit {
                leaf_id: missing_leaf.clone(),
            },
            Action::CloseTab {
                tab_id: missing_tab.clone(),
            },
            Action::CloseAllTabs {
                leaf_id: missing_leaf.clone(),
            },
            Action::SetActiveLeaf {
                leaf_id: missing_leaf,
            },
            Action::SetTabDirty {
                tab_id: missing_tab,
                dirty: true,
            },
        ] {
            assert!(fx.tree.apply(&action, &mut ids, MIN).is_none(), "{action:?}");
        }
    }
}
