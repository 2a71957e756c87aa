//! Tab drag-and-drop docking.
//!
//! A drag session records the dragged tab and the last drop target the pointer
//! was over. Ending the session issues either one `MOVE_TAB`, or a `SPLIT_LEAF`
//! followed by a `MOVE_TAB` into the leaf that split just created. The new
//! leaf id comes straight from the first dispatch's result.

use ratatui::layout::Rect;

use crate::config::DEFAULT_DROP_EDGE_BAND;
use crate::ids::{NodeId, TabId};
use crate::store::Dispatch;
use crate::tree::{Action, SplitDirection, rect_contains};

/// Ratio used when a drop on an edge splits the target leaf.
pub const DROP_SPLIT_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Tab,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    pub kind: DragKind,
    pub tab_id: TabId,
    pub source_leaf_id: NodeId,
    /// Host handle of the element being dragged, if it has one.
    pub drag_element: Option<String>,
}

impl DragState {
    pub fn tab(tab_id: TabId, source_leaf_id: NodeId) -> Self {
        Self {
            kind: DragKind::Tab,
            tab_id,
            source_leaf_id,
            drag_element: None,
        }
    }

    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.drag_element = Some(element.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Center,
    Left,
    Right,
    Top,
    Bottom,
}

impl DropPosition {
    /// The split an edge drop produces; `None` for a center drop.
    pub fn split_direction(self) -> Option<SplitDirection> {
        match self {
            DropPosition::Center => None,
            DropPosition::Left | DropPosition::Right => Some(SplitDirection::Horizontal),
            DropPosition::Top | DropPosition::Bottom => Some(SplitDirection::Vertical),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub leaf_id: NodeId,
    pub bounds: Rect,
    pub position: DropPosition,
}

impl DropTarget {
    pub fn new(leaf_id: NodeId, bounds: Rect, position: DropPosition) -> Self {
        Self {
            leaf_id,
            bounds,
            position,
        }
    }

    /// Classify the pointer against `bounds`; `None` when it lies outside.
    pub fn from_pointer(
        leaf_id: NodeId,
        bounds: Rect,
        column: u16,
        row: u16,
        edge_band: f64,
    ) -> Option<Self> {
        let position = get_drop_position(bounds, column, row, edge_band)?;
        Some(Self::new(leaf_id, bounds, position))
    }
}

/// Where a pointer at (`column`, `row`) would drop relative to `bounds`.
///
/// Each edge owns a band `edge_band` of the extent wide; the rest is the
/// center. Inside a band the nearest edge wins, ties resolved left, right,
/// top, bottom.
pub fn get_drop_position(bounds: Rect, column: u16, row: u16, edge_band: f64) -> Option<DropPosition> {
    if !rect_contains(bounds, column, row) {
        return None;
    }
    // Measure from cell centers so a 1-cell wide target is all center.
    let rx = (f64::from(column - bounds.x) + 0.5) / f64::from(bounds.width);
    let ry = (f64::from(row - bounds.y) + 0.5) / f64::from(bounds.height);
    let band = edge_band.clamp(0.0, 0.5);
    let inside = |v: f64| v >= band && v <= 1.0 - band;
    if inside(rx) && inside(ry) {
        return Some(DropPosition::Center);
    }
    let candidates = [
        (rx, DropPosition::Left),
        (1.0 - rx, DropPosition::Right),
        (ry, DropPosition::Top),
        (1.0 - ry, DropPosition::Bottom),
    ];
    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.0 < best.0 {
            best = *candidate;
        }
    }
    Some(best.1)
}

/// Host hook toggled while a drag is in progress, e.g. to draw drop zones.
pub trait DragIndicator {
    fn set_dragging(&mut self, dragging: bool);
}

#[derive(Debug, Default)]
pub struct NoIndicator;

impl DragIndicator for NoIndicator {
    fn set_dragging(&mut self, _dragging: bool) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub state: DragState,
    pub target: Option<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// `end_drag` without an active session.
    NotDragging,
    /// The pointer never reached a drop target.
    NoTarget,
    /// Center drop; the tab moved into the target leaf.
    Moved,
    /// Edge drop; the target split and the tab moved into the new leaf.
    SplitAndMoved { new_leaf_id: NodeId },
    /// Edge drop whose split was refused, so nothing moved.
    SplitRejected,
    /// The tab could not move, usually because it no longer exists.
    MoveRejected,
}

pub struct DragDropManager {
    session: Option<DragSession>,
    indicator: Box<dyn DragIndicator>,
    edge_band: f64,
}

impl Default for DragDropManager {
    fn default() -> Self {
        Self::new(DEFAULT_DROP_EDGE_BAND)
    }
}

impl DragDropManager {
    pub fn new(edge_band: f64) -> Self {
        Self::with_indicator(edge_band, Box::new(NoIndicator))
    }

    pub fn with_indicator(edge_band: f64, indicator: Box<dyn DragIndicator>) -> Self {
        Self {
            session: None,
            indicator,
            edge_band,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.session.as_ref().map(|session| &session.state)
    }

    pub fn drop_target(&self) -> Option<&DropTarget> {
        self.session.as_ref().and_then(|session| session.target.as_ref())
    }

    /// Begin a drag. A second start while one is active is ignored.
    pub fn start_drag(&mut self, state: DragState) -> bool {
        if let Some(active) = &self.session {
            tracing::debug!(
                active = %active.state.tab_id,
                ignored = %state.tab_id,
                "drag already in progress"
            );
            return false;
        }
        tracing::debug!(tab_id = %state.tab_id, source = %state.source_leaf_id, "drag started");
        self.session = Some(DragSession {
            state,
            target: None,
        });
        self.indicator.set_dragging(true);
        true
    }

    pub fn update_drop_target(&mut self, target: DropTarget) -> bool {
        match &mut self.session {
            Some(session) => {
                session.target = Some(target);
                true
            }
            None => false,
        }
    }

    /// Record the target under the pointer. Outside `bounds` the last target is kept.
    pub fn update_pointer(
        &mut self,
        leaf_id: &NodeId,
        bounds: Rect,
        column: u16,
        row: u16,
    ) -> Option<DropPosition> {
        if !self.is_dragging() {
            return None;
        }
        let target = DropTarget::from_pointer(leaf_id.clone(), bounds, column, row, self.edge_band)?;
        let position = target.position;
        self.update_drop_target(target);
        Some(position)
    }

    /// Finish the drag against the last recorded drop target.
    pub fn end_drag(&mut self, sink: &mut dyn Dispatch) -> DragOutcome {
        let Some(session) = self.session.take() else {
            return DragOutcome::NotDragging;
        };
        self.indicator.set_dragging(false);
        let Some(target) = session.target else {
            tracing::debug!(tab_id = %session.state.tab_id, "drag ended without a target");
            return DragOutcome::NoTarget;
        };
        let tab_id = session.state.tab_id;

        let outcome = match target.position.split_direction() {
            None => {
                let moved = sink.dispatch(Action::MoveTab {
                    tab_id,
                    target_leaf_id: target.leaf_id,
                });
                if moved.applied {
                    DragOutcome::Moved
                } else {
                    DragOutcome::MoveRejected
                }
            }
            Some(direction) => {
                let split = sink.dispatch(Action::SplitLeaf {
                    leaf_id: target.leaf_id,
                    direction,
                    ratio: DROP_SPLIT_RATIO,
                });
                match split.created_leaf {
                    Some(new_leaf_id) => {
                        let moved = sink.dispatch(Action::MoveTab {
                            tab_id,
                            target_leaf_id: new_leaf_id.clone(),
                        });
                        if moved.applied {
                            DragOutcome::SplitAndMoved { new_leaf_id }
                        } else {
                            // Undo the split so no empty pane is left behind.
                            sink.dispatch(Action::CloseSplit {
                                leaf_id: new_leaf_id,
                            });
                            DragOutcome::MoveRejected
                        }
                    }
                    None => DragOutcome::SplitRejected,
                }
            }
        };
        tracing::debug!(?outcome, position = ?target.position, "drag ended");
        outcome
    }

    pub fn cancel_drag(&mut self) -> bool {
        if self.session.take().is_none() {
            return false;
        }
        self.indicator.set_dragging(false);
        tracing::debug!("drag cancelled");
        true
    }
}

/// Floating label that follows the pointer during a drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPreview {
    pub label: String,
    pub rect: Rect,
}

pub fn create_drag_preview(title: &str, column: u16, row: u16, area: Rect) -> DragPreview {
    let width = (title.chars().count() as u16).saturating_add(4).min(area.width);
    let height = 3.min(area.height);
    let preview = DragPreview {
        label: title.to_string(),
        rect: Rect::new(area.x, area.y, width, height),
    };
    update_preview_position(&preview, column, row, area)
}

/// The preview moved next to the pointer, kept inside `area`.
pub fn update_preview_position(preview: &DragPreview, column: u16, row: u16, area: Rect) -> DragPreview {
    let max_x = area.right().saturating_sub(preview.rect.width);
    let max_y = area.bottom().saturating_sub(preview.rect.height);
    let x = column.saturating_add(1).clamp(area.x, max_x.max(area.x));
    let y = row.saturating_add(1).clamp(area.y, max_y.max(area.y));
    DragPreview {
        label: preview.label.clone(),
        rect: Rect::new(x, y, preview.rect.width, preview.rect.height),
    }
}
