//! Pane/tab split tree.
//!
//! Nodes live in a flat map keyed by id; splits refer to their children by id.
//! A [`LayoutTree`] is a plain value: every action produces a fresh copy, so a
//! snapshot handed to a reader is never mutated behind its back.

pub mod geometry;
pub mod reducer;

pub use geometry::*;
pub use reducer::{Action, ActionOutcome, LeafBounds};

use std::collections::{BTreeMap, BTreeSet};

use ratatui::layout::Direction;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::ids::{IdGenerator, NodeId, TabId};

/// Tolerance for the "sizes sum to one" invariant.
pub const SIZE_EPSILON: f64 = 1e-6;

pub const WELCOME_TITLE: &str = "Welcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDirection {
    /// Children are laid out left to right.
    Horizontal,
    /// Children are laid out top to bottom.
    Vertical,
}

impl From<SplitDirection> for Direction {
    fn from(direction: SplitDirection) -> Self {
        match direction {
            SplitDirection::Horizontal => Direction::Horizontal,
            SplitDirection::Vertical => Direction::Vertical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Welcome,
    Editor,
    Markdown,
    Preview,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub widget_kind: WidgetKind,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub content_ref: Option<String>,
    #[serde(default)]
    pub focus_mode: bool,
}

impl Tab {
    pub fn welcome(id: TabId) -> Self {
        Self {
            id,
            title: WELCOME_TITLE.to_string(),
            widget_kind: WidgetKind::Welcome,
            dirty: false,
            content_ref: None,
            focus_mode: false,
        }
    }

    pub fn from_spec(id: TabId, spec: &TabSpec) -> Self {
        Self {
            id,
            title: spec.title.clone(),
            widget_kind: spec.widget_kind.clone(),
            dirty: false,
            content_ref: spec.content_ref.clone(),
            focus_mode: false,
        }
    }

    pub fn is_welcome(&self) -> bool {
        self.widget_kind == WidgetKind::Welcome
    }
}

/// What the host knows about a tab it wants opened; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSpec {
    pub title: String,
    pub widget_kind: WidgetKind,
    pub content_ref: Option<String>,
}

impl TabSpec {
    pub fn new(title: impl Into<String>, widget_kind: WidgetKind) -> Self {
        Self {
            title: title.into(),
            widget_kind,
            content_ref: None,
        }
    }

    pub fn with_content_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.content_ref = Some(content_ref.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub id: NodeId,
    pub tabs: Vec<Tab>,
    pub active_tab: TabId,
    /// Most-recently-activated order, oldest first.
    #[serde(default)]
    pub recent: Vec<TabId>,
}

impl Leaf {
    pub fn welcome(id: NodeId, tab_id: TabId) -> Self {
        Self {
            id,
            tabs: vec![Tab::welcome(tab_id.clone())],
            active_tab: tab_id.clone(),
            recent: vec![tab_id],
        }
    }

    pub fn tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == *id)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.tab(&self.active_tab)
    }

    pub fn holds(&self, id: &TabId) -> bool {
        self.tabs.iter().any(|tab| tab.id == *id)
    }

    /// True when the leaf only shows the synthetic welcome tab.
    pub fn is_welcome_only(&self) -> bool {
        self.tabs.len() == 1 && self.tabs[0].is_welcome()
    }

    fn activate(&mut self, id: &TabId) {
        self.active_tab = id.clone();
        self.recent.retain(|recent| recent != id);
        self.recent.push(id.clone());
    }

    /// Append a tab and make it active. A lone welcome tab makes room for it.
    fn adopt(&mut self, tab: Tab) {
        if self.is_welcome_only() && !tab.is_welcome() {
            self.tabs.clear();
            self.recent.clear();
        }
        let id = tab.id.clone();
        self.tabs.push(tab);
        self.activate(&id);
    }

    fn remove_tab(&mut self, id: &TabId) -> Option<Tab> {
        let index = self.tabs.iter().position(|tab| tab.id == *id)?;
        let tab = self.tabs.remove(index);
        self.recent.retain(|recent| recent != id);
        if self.active_tab == *id {
            let fallback = self
                .recent
                .iter()
                .rev()
                .find(|recent| self.holds(recent))
                .cloned()
                .or_else(|| self.tabs.last().map(|tab| tab.id.clone()));
            if let Some(fallback) = fallback {
                self.activate(&fallback);
            }
        }
        Some(tab)
    }

    /// Restore the "never empty" invariant and repair a dangling active tab.
    fn normalize(&mut self, ids: &mut IdGenerator) {
        if self.tabs.is_empty() {
            let tab_id = ids.next_tab();
            self.tabs.push(Tab::welcome(tab_id.clone()));
            self.recent.clear();
            self.activate(&tab_id);
            return;
        }
        let tabs: BTreeSet<&TabId> = self.tabs.iter().map(|tab| &tab.id).collect();
        self.recent.retain(|recent| tabs.contains(recent));
        if !self.holds(&self.active_tab) {
            let fallback = self
                .recent
                .last()
                .cloned()
                .unwrap_or_else(|| self.tabs[self.tabs.len() - 1].id.clone());
            self.activate(&fallback);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: NodeId,
    pub direction: SplitDirection,
    pub children: Vec<NodeId>,
    pub sizes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Leaf(Leaf),
    Split(Split),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Leaf(leaf) => &leaf.id,
            Node::Split(split) => &split.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTree {
    root: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    active_leaf: NodeId,
    #[serde(default)]
    focus_mode: bool,
}

impl LayoutTree {
    /// A tree holding one leaf with the welcome tab.
    pub fn new(ids: &mut IdGenerator) -> Self {
        let leaf = Leaf::welcome(ids.next_node("leaf"), ids.next_tab());
        let root = leaf.id.clone();
        let mut nodes = BTreeMap::new();
        nodes.insert(root.clone(), Node::Leaf(leaf));
        Self {
            root: root.clone(),
            nodes,
            active_leaf: root,
            focus_mode: false,
        }
    }

    /// Assemble a tree from parts, e.g. a persisted snapshot. Empty leaves are
    /// normalized to the welcome tab before validation.
    pub fn from_parts(
        root: NodeId,
        nodes: impl IntoIterator<Item = Node>,
        active_leaf: NodeId,
        ids: &mut IdGenerator,
        min_ratio: f64,
    ) -> Result<Self, LayoutError> {
        let tree = Self {
            root,
            nodes: nodes
                .into_iter()
                .map(|node| (node.id().clone(), node))
                .collect(),
            active_leaf,
            focus_mode: false,
        };
        tree.normalized(ids, min_ratio)
    }

    /// Repair empty leaves and validate everything else.
    pub fn normalized(mut self, ids: &mut IdGenerator, min_ratio: f64) -> Result<Self, LayoutError> {
        for node in self.nodes.values_mut() {
            if let Node::Leaf(leaf) = node {
                leaf.normalize(ids);
            }
        }
        self.validate(min_ratio)?;
        Ok(self)
    }

    pub fn root(&self) -> &NodeId {
        &self.root
    }

    pub fn active_leaf(&self) -> &NodeId {
        &self.active_leaf
    }

    pub fn focus_mode(&self) -> bool {
        self.focus_mode
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn leaf(&self, id: &NodeId) -> Option<&Leaf> {
        match self.nodes.get(id) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    pub fn split(&self, id: &NodeId) -> Option<&Split> {
        match self.nodes.get(id) {
            Some(Node::Split(split)) => Some(split),
            _ => None,
        }
    }

    pub fn splits(&self) -> impl Iterator<Item = &Split> {
        self.nodes.values().filter_map(|node| match node {
            Node::Split(split) => Some(split),
            Node::Leaf(_) => None,
        })
    }

    /// Leaves in document order (pre-order, depth first).
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.walk_leaves(&self.root, &mut out);
        out
    }

    pub fn leaf_ids(&self) -> Vec<NodeId> {
        self.leaves().into_iter().map(|leaf| leaf.id.clone()).collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node, Node::Leaf(_)))
            .count()
    }

    fn walk_leaves<'a>(&'a self, id: &NodeId, out: &mut Vec<&'a Leaf>) {
        match self.nodes.get(id) {
            Some(Node::Leaf(leaf)) => out.push(leaf),
            Some(Node::Split(split)) => {
                for child in &split.children {
                    self.walk_leaves(child, out);
                }
            }
            None => {}
        }
    }

    /// First leaf of the subtree rooted at `id`, in document order.
    pub fn first_leaf(&self, id: &NodeId) -> Option<&NodeId> {
        match self.nodes.get(id)? {
            Node::Leaf(leaf) => Some(&leaf.id),
            Node::Split(split) => split.children.first().and_then(|c| self.first_leaf(c)),
        }
    }

    /// The split holding `id` and the child index it sits at.
    pub fn parent_of(&self, id: &NodeId) -> Option<(&Split, usize)> {
        self.splits().find_map(|split| {
            split
                .children
                .iter()
                .position(|child| child == id)
                .map(|index| (split, index))
        })
    }

    pub fn leaf_of_tab(&self, tab: &TabId) -> Option<&Leaf> {
        self.nodes.values().find_map(|node| match node {
            Node::Leaf(leaf) if leaf.holds(tab) => Some(leaf),
            _ => None,
        })
    }

    pub fn tab(&self, tab: &TabId) -> Option<&Tab> {
        self.leaf_of_tab(tab).and_then(|leaf| leaf.tab(tab))
    }

    /// Structural equality: same nodes and root, ignoring focus state.
    pub fn same_layout(&self, other: &LayoutTree) -> bool {
        self.root == other.root && self.nodes == other.nodes
    }

    pub fn validate(&self, min_ratio: f64) -> Result<(), LayoutError> {
        if !self.nodes.contains_key(&self.root) {
            return Err(LayoutError::MissingRoot(self.root.clone()));
        }
        for (key, node) in &self.nodes {
            if node.id() != key {
                return Err(LayoutError::IdMismatch {
                    key: key.clone(),
                    id: node.id().clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        let mut stack = vec![self.root.clone()];
        let mut tabs = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                return Err(LayoutError::SharedNode(id));
            }
            match self.nodes.get(&id) {
                None => return Err(LayoutError::MissingNode(id)),
                Some(Node::Leaf(leaf)) => {
                    for tab in &leaf.tabs {
                        if !tabs.insert(tab.id.clone()) {
                            return Err(LayoutError::DuplicateTab(tab.id.clone()));
                        }
                    }
                    if !leaf.holds(&leaf.active_tab) {
                        return Err(LayoutError::DanglingActiveTab {
                            leaf: leaf.id.clone(),
                            tab: leaf.active_tab.clone(),
                        });
                    }
                }
                Some(Node::Split(split)) => {
                    validate_split(split, min_ratio)?;
                    stack.extend(split.children.iter().rev().cloned());
                }
            }
        }

        if let Some(orphan) = self.nodes.keys().find(|id| !seen.contains(*id)) {
            return Err(LayoutError::Orphan(orphan.clone()));
        }
        if self.leaf(&self.active_leaf).is_none() {
            return Err(LayoutError::DanglingActiveLeaf(self.active_leaf.clone()));
        }
        Ok(())
    }

    fn leaf_mut(&mut self, id: &NodeId) -> Option<&mut Leaf> {
        match self.nodes.get_mut(id) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    fn split_mut(&mut self, id: &NodeId) -> Option<&mut Split> {
        match self.nodes.get_mut(id) {
            Some(Node::Split(split)) => Some(split),
            _ => None,
        }
    }

    fn leaf_of_tab_mut(&mut self, tab: &TabId) -> Option<&mut Leaf> {
        self.nodes.values_mut().find_map(|node| match node {
            Node::Leaf(leaf) if leaf.holds(tab) => Some(leaf),
            _ => None,
        })
    }

    fn parent_id(&self, id: &NodeId) -> Option<NodeId> {
        self.parent_of(id).map(|(split, _)| split.id.clone())
    }

    /// Point whatever referenced `old` (the root slot or a parent split) at `new`.
    fn replace_reference(&mut self, old: &NodeId, new: &NodeId) {
        if self.root == *old {
            self.root = new.clone();
            return;
        }
        let Some(parent) = self.parent_id(old) else {
            return;
        };
        if let Some(split) = self.split_mut(&parent) {
            for child in split.children.iter_mut() {
                if child == old {
                    *child = new.clone();
                }
            }
        }
    }
}

fn validate_split(split: &Split, min_ratio: f64) -> Result<(), LayoutError> {
    if split.children.len() != split.sizes.len() {
        return Err(LayoutError::SizeMismatch {
            id: split.id.clone(),
            children: split.children.len(),
            sizes: split.sizes.len(),
        });
    }
    if split.children.len() < 2 {
        return Err(LayoutError::Degenerate {
            id: split.id.clone(),
            children: split.children.len(),
        });
    }
    let sum: f64 = split.sizes.iter().sum();
    if !sum.is_finite() || (sum - 1.0).abs() > SIZE_EPSILON {
        return Err(LayoutError::Unnormalized {
            id: split.id.clone(),
            sum,
        });
    }
    if let Some(ratio) = split
        .sizes
        .iter()
        .copied()
        .find(|ratio| *ratio < min_ratio - SIZE_EPSILON)
    {
        return Err(LayoutError::RatioTooSmall {
            id: split.id.clone(),
            ratio,
        });
    }
    Ok(())
}

/// Scale `sizes` so they sum to one. Degenerate input becomes an even split.
pub(crate) fn normalize_sizes(sizes: &mut [f64]) {
    if sizes.is_empty() {
        return;
    }
    let sum: f64 = sizes.iter().sum();
    if sum.is_finite() && sum > 0.0 {
        for size in sizes.iter_mut() {
            *size /= sum;
        }
    } else {
        let even = 1.0 / sizes.len() as f64;
        sizes.fill(even);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: &str) -> Tab {
        Tab::from_spec(TabId::from(id), &TabSpec::new(id, WidgetKind::Editor))
    }

    fn leaf(id: &str, tabs: &[&str]) -> Leaf {
        let tabs: Vec<Tab> = tabs.iter().map(|t| tab(t)).collect();
        Leaf {
            id: NodeId::from(id),
            active_tab: tabs
                .last()
                .map(|t| t.id.clone())
                .unwrap_or_else(|| TabId::from("none")),
            recent: tabs.iter().map(|t| t.id.clone()).collect(),
            tabs,
        }
    }

    #[test]
    fn new_tree_is_a_single_welcome_leaf() {
        let mut ids = IdGenerator::new();
        let tree = LayoutTree::new(&mut ids);
        assert_eq!(tree.leaf_count(), 1);
        let root = tree.leaf(tree.root()).unwrap();
        assert!(root.is_welcome_only());
        assert_eq!(tree.active_leaf(), tree.root());
        assert!(tree.validate(0.05).is_ok());
    }

    #[test]
    fn from_parts_normalizes_empty_leaves() {
        let mut ids = IdGenerator::new();
        let split = Split {
            id: NodeId::from("s"),
            direction: SplitDirection::Horizontal,
            children: vec![NodeId::from("a"), NodeId::from("b")],
            sizes: vec![0.5, 0.5],
        };
        let tree = LayoutTree::from_parts(
            NodeId::from("s"),
            vec![
                Node::Split(split),
                Node::Leaf(leaf("a", &["t1"])),
                Node::Leaf(leaf("b", &[])),
            ],
            NodeId::from("a"),
            &mut ids,
            0.05,
        )
        .unwrap();
        assert!(tree.leaf(&NodeId::from("b")).unwrap().is_welcome_only());
    }

    #[test]
    fn validate_rejects_broken_splits() {
        let mut ids = IdGenerator::new();
        let split = Split {
            id: NodeId::from("s"),
            direction: SplitDirection::Vertical,
            children: vec![NodeId::from("a"), NodeId::from("b")],
            sizes: vec![0.7, 0.7],
        };
        let err = LayoutTree::from_parts(
            NodeId::from("s"),
            vec![
                Node::Split(split),
                Node::Leaf(leaf("a", &["t1"])),
                Node::Leaf(leaf("b", &["t2"])),
            ],
            NodeId::from("a"),
            &mut ids,
            0.05,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::Unnormalized { .. }));
    }

    #[test]
    fn validate_rejects_duplicate_tabs_and_orphans() {
        let mut ids = IdGenerator::new();
        let split = Split {
            id: NodeId::from("s"),
            direction: SplitDirection::Vertical,
            children: vec![NodeId::from("a"), NodeId::from("b")],
            sizes: vec![0.5, 0.5],
        };
        let err = LayoutTree::from_parts(
            NodeId::from("s"),
            vec![
                Node::Split(split.clone()),
                Node::Leaf(leaf("a", &["t1"])),
                Node::Leaf(leaf("b", &["t1"])),
            ],
            NodeId::from("a"),
            &mut ids,
            0.05,
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateTab(TabId::from("t1")));

        let err = LayoutTree::from_parts(
            NodeId::from("s"),
            vec![
                Node::Split(split),
                Node::Leaf(leaf("a", &["t1"])),
                Node::Leaf(leaf("b", &["t2"])),
                Node::Leaf(leaf("c", &["t3"])),
            ],
            NodeId::from("a"),
            &mut ids,
            0.05,
        )
        .unwrap_err();
        assert_eq!(err, LayoutError::Orphan(NodeId::from("c")));
    }

    #[test]
    fn removing_the_active_tab_falls_back_to_most_recent() {
        let mut l = leaf("a", &["t1", "t2", "t3"]);
        l.activate(&TabId::from("t1"));
        l.activate(&TabId::from("t3"));
        l.remove_tab(&TabId::from("t3"));
        assert_eq!(l.active_tab, TabId::from("t1"));
    }

    #[test]
    fn adopting_into_welcome_only_leaf_replaces_welcome() {
        let mut l = Leaf::welcome(NodeId::from("a"), TabId::from("w"));
        l.adopt(tab("t1"));
        assert_eq!(l.tabs.len(), 1);
        assert_eq!(l.active_tab, TabId::from("t1"));
    }

    #[test]
    fn normalize_sizes_handles_degenerate_input() {
        let mut sizes = vec![0.0, 0.0, 0.0];
        normalize_sizes(&mut sizes);
        assert!(sizes.iter().all(|s| (*s - 1.0 / 3.0).abs() < 1e-12));
        let mut sizes = vec![1.0, 3.0];
        normalize_sizes(&mut sizes);
        assert_eq!(sizes, vec![0.25, 0.75]);
    }

    #[test]
    fn tree_round_trips_through_json() {
        let mut ids = IdGenerator::new();
        let tree = LayoutTree::new(&mut ids);
        let json = serde_json::to_string(&tree).unwrap();
        let restored: LayoutTree = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, tree);
    }
}
