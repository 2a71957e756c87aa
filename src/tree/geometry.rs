//! Cell geometry for a [`LayoutTree`]: where each leaf lands inside an area,
//! where the draggable gutters between split children sit, gutter resizing and
//! the directional neighbour search used by the above/below/left/right actions.

use ratatui::layout::Rect;

use super::{LayoutTree, Node, SIZE_EPSILON, SplitDirection};
use crate::config::EngineConfig;
use crate::ids::NodeId;

/// Gutter thickness in cells between adjacent split children.
pub const GUTTER_THICKNESS: u16 = 1;

/// A draggable boundary between `children[index]` and `children[index + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gutter {
    pub rect: Rect,
    pub split_id: NodeId,
    pub index: usize,
    pub direction: SplitDirection,
    /// Cells the split distributes among its children (its extent minus
    /// gutters); resize deltas are relative to it.
    pub container_cells: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

impl LayoutTree {
    pub fn layout(&self, area: Rect) -> Vec<(NodeId, Rect)> {
        let (regions, _) = self.layout_with_gutters(area);
        regions
    }

    pub fn layout_with_gutters(&self, area: Rect) -> (Vec<(NodeId, Rect)>, Vec<Gutter>) {
        let mut regions = Vec::new();
        let mut gutters = Vec::new();
        self.layout_recursive(self.root(), area, &mut regions, &mut gutters);
        (regions, gutters)
    }

    fn layout_recursive(
        &self,
        id: &NodeId,
        area: Rect,
        regions: &mut Vec<(NodeId, Rect)>,
        gutters: &mut Vec<Gutter>,
    ) {
        match self.node(id) {
            Some(Node::Leaf(leaf)) => regions.push((leaf.id.clone(), area)),
            Some(Node::Split(split)) => {
                let (rects, gaps) = split_rects_with_gaps(split.direction, area, &split.sizes);
                for (child, rect) in split.children.iter().zip(rects) {
                    self.layout_recursive(child, rect, regions, gutters);
                }
                let gap_total: u16 = gaps.iter().map(|gap| axis_len(split.direction, *gap)).sum();
                let container_cells = axis_len(split.direction, area).saturating_sub(gap_total);
                for (index, rect) in gaps.into_iter().enumerate() {
                    gutters.push(Gutter {
                        rect,
                        split_id: split.id.clone(),
                        index,
                        direction: split.direction,
                        container_cells,
                    });
                }
            }
            None => {}
        }
    }

    /// Move the gutter between `children[index]` and `children[index + 1]` by
    /// `delta_cells`. Both neighbours stay at or above the minimum fraction and
    /// keep their combined share, so the split still sums to one.
    pub fn resize_gutter(
        &self,
        split_id: &NodeId,
        index: usize,
        delta_cells: i32,
        container_cells: u16,
        config: &EngineConfig,
    ) -> Option<LayoutTree> {
        if container_cells == 0 || delta_cells == 0 {
            return None;
        }
        let split = self.split(split_id)?;
        if index + 1 >= split.sizes.len() {
            return None;
        }
        let min = config.min_fraction(container_cells);
        let pair = split.sizes[index] + split.sizes[index + 1];
        if pair < 2.0 * min {
            return None;
        }
        let delta = f64::from(delta_cells) / f64::from(container_cells);
        let left = (split.sizes[index] + delta).clamp(min, pair - min);
        let right = pair - left;
        if (left - split.sizes[index]).abs() < SIZE_EPSILON {
            return None;
        }

        let mut next = self.clone();
        let split = next.split_mut(split_id)?;
        split.sizes[index] = left;
        split.sizes[index + 1] = right;
        Some(next)
    }
}

pub fn hit_test_gutter(gutters: &[Gutter], column: u16, row: u16) -> Option<&Gutter> {
    gutters
        .iter()
        .find(|gutter| rect_contains(gutter.rect, column, row))
}

pub fn leaf_at(regions: &[(NodeId, Rect)], column: u16, row: u16) -> Option<(&NodeId, Rect)> {
    regions
        .iter()
        .find(|(_, rect)| rect_contains(*rect, column, row))
        .map(|(id, rect)| (id, *rect))
}

/// The nearest leaf whose center lies strictly beyond the current leaf's center
/// in `direction` and whose span on the cross axis overlaps the current leaf's;
/// ties go to the smaller distance between centers on the cross axis.
pub fn neighbor(
    bounds: &[(NodeId, Rect)],
    current: &NodeId,
    direction: NavDirection,
) -> Option<NodeId> {
    let (_, origin) = bounds.iter().find(|(id, _)| id == current)?;
    let (ox, oy) = doubled_center(*origin);
    bounds
        .iter()
        .filter(|(id, _)| id != current)
        .filter(|(_, rect)| match direction {
            NavDirection::Up | NavDirection::Down => spans_overlap(
                (origin.x, origin.right()),
                (rect.x, rect.right()),
            ),
            NavDirection::Left | NavDirection::Right => spans_overlap(
                (origin.y, origin.bottom()),
                (rect.y, rect.bottom()),
            ),
        })
        .filter_map(|(id, rect)| {
            let (cx, cy) = doubled_center(*rect);
            let (along, across) = match direction {
                NavDirection::Up => (oy - cy, (cx - ox).abs()),
                NavDirection::Down => (cy - oy, (cx - ox).abs()),
                NavDirection::Left => (ox - cx, (cy - oy).abs()),
                NavDirection::Right => (cx - ox, (cy - oy).abs()),
            };
            (along > 0).then_some((along, across, id))
        })
        .min_by_key(|(along, across, _)| (*along, *across))
        .map(|(_, _, id)| id.clone())
}

/// Half-open spans `[start, end)` share at least one cell.
fn spans_overlap(a: (u16, u16), b: (u16, u16)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Twice the center, so odd extents stay in integer space.
fn doubled_center(rect: Rect) -> (i32, i32) {
    (
        2 * i32::from(rect.x) + i32::from(rect.width),
        2 * i32::from(rect.y) + i32::from(rect.height),
    )
}

fn axis_len(direction: SplitDirection, area: Rect) -> u16 {
    match direction {
        SplitDirection::Horizontal => area.width,
        SplitDirection::Vertical => area.height,
    }
}

fn gap_size(direction: SplitDirection, area: Rect, child_count: usize) -> u16 {
    if child_count < 2 {
        return 0;
    }
    let total = axis_len(direction, area);
    let min_content = child_count as u16;
    if total <= min_content {
        return 0;
    }
    let max_gap = total.saturating_sub(min_content);
    let per_gap = max_gap / (child_count as u16 - 1);
    GUTTER_THICKNESS.min(per_gap)
}

fn split_rects_with_gaps(
    direction: SplitDirection,
    area: Rect,
    sizes: &[f64],
) -> (Vec<Rect>, Vec<Rect>) {
    let child_count = sizes.len();
    let gap = gap_size(direction, area, child_count);
    if gap == 0 {
        return (split_rects_weighted(direction, area, sizes), Vec::new());
    }
    let gap_total = gap.saturating_mul(child_count.saturating_sub(1) as u16);
    let mut shrunk = area;
    match direction {
        SplitDirection::Horizontal => shrunk.width = area.width.saturating_sub(gap_total),
        SplitDirection::Vertical => shrunk.height = area.height.saturating_sub(gap_total),
    }
    let rects: Vec<Rect> = split_rects_weighted(direction, shrunk, sizes)
        .into_iter()
        .enumerate()
        .map(|(idx, rect)| {
            let offset = gap.saturating_mul(idx as u16);
            match direction {
                SplitDirection::Horizontal => Rect {
                    x: rect.x.saturating_add(offset),
                    ..rect
                },
                SplitDirection::Vertical => Rect {
                    y: rect.y.saturating_add(offset),
                    ..rect
                },
            }
        })
        .collect();
    let gaps = rects
        .iter()
        .take(child_count.saturating_sub(1))
        .map(|rect| match direction {
            SplitDirection::Horizontal => Rect {
                x: rect.x.saturating_add(rect.width),
                y: area.y,
                width: gap,
                height: area.height,
            },
            SplitDirection::Vertical => Rect {
                x: area.x,
                y: rect.y.saturating_add(rect.height),
                width: area.width,
                height: gap,
            },
        })
        .collect();
    (rects, gaps)
}

fn split_rects_weighted(direction: SplitDirection, area: Rect, sizes: &[f64]) -> Vec<Rect> {
    let count = sizes.len().max(1);
    let total = axis_len(direction, area);
    let total_weight: f64 = sizes.iter().sum::<f64>().max(f64::EPSILON);
    let mut cells = Vec::with_capacity(count);
    let mut used: u16 = 0;
    // Edges come from cumulative fractions, so a one-cell gutter drag always
    // moves the boundary by exactly one cell.
    let mut acc = 0.0;
    for (idx, size) in sizes.iter().enumerate() {
        let cell = if idx + 1 == count {
            total.saturating_sub(used)
        } else {
            acc += size / total_weight;
            let edge = (acc * f64::from(total) + SIZE_EPSILON).floor() as u16;
            let portion = edge.min(total).saturating_sub(used);
            used = used.saturating_add(portion);
            portion
        };
        cells.push(cell);
    }
    build_rects_from_cells(direction, area, &cells)
}

fn build_rects_from_cells(direction: SplitDirection, area: Rect, cells: &[u16]) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(cells.len());
    let mut cursor_x = area.x;
    let mut cursor_y = area.y;
    for cell in cells {
        let rect = match direction {
            SplitDirection::Horizontal => {
                let rect = Rect {
                    x: cursor_x,
                    y: area.y,
                    width: *cell,
                    height: area.height,
                };
                cursor_x = cursor_x.saturating_add(*cell);
                rect
            }
            SplitDirection::Vertical => {
                let rect = Rect {
                    x: area.x,
                    y: cursor_y,
                    width: area.width,
                    height: *cell,
                };
                cursor_y = cursor_y.saturating_add(*cell);
                rect
            }
        };
        rects.push(rect);
    }
    rects
}
