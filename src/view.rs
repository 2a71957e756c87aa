//! Terminal rendering of a workspace.
//!
//! The view draws straight into a ratatui [`Buffer`] and reports back where
//! things landed, so the host can hit-test pointer events against the frame
//! the user is actually looking at.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::drag::{DragPreview, DropPosition, DropTarget};
use crate::ids::{NodeId, TabId};
use crate::theme;
use crate::tree::{
    Gutter, LayoutTree, Leaf, LeafBounds, SplitDirection, Tab, WidgetKind, hit_test_gutter,
    leaf_at, rect_contains,
};
use crate::workspace::Workspace;

const DIRTY_MARKER: &str = "●";

/// Per-frame UI state owned by the host rather than the workspace.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub hovered_gutter: Option<(NodeId, usize)>,
    pub preview: Option<DragPreview>,
    pub pending_chord: Option<String>,
    pub message: Option<String>,
    /// `(label, keybinding)` rows; the overlay shows when this is non-empty.
    pub help: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHit {
    pub tab_id: TabId,
    pub leaf_id: NodeId,
    pub rect: Rect,
}

/// Where the last frame put leaves, gutters and tabs.
#[derive(Debug, Clone, Default)]
pub struct ViewGeometry {
    pub layout_area: Rect,
    pub leaves: LeafBounds,
    pub gutters: Vec<Gutter>,
    pub tabs: Vec<TabHit>,
}

impl ViewGeometry {
    pub fn tab_at(&self, column: u16, row: u16) -> Option<&TabHit> {
        self.tabs
            .iter()
            .find(|hit| rect_contains(hit.rect, column, row))
    }

    pub fn leaf_at(&self, column: u16, row: u16) -> Option<(&NodeId, Rect)> {
        leaf_at(&self.leaves, column, row)
    }

    pub fn gutter_at(&self, column: u16, row: u16) -> Option<&Gutter> {
        hit_test_gutter(&self.gutters, column, row)
    }
}

/// Render into a terminal frame, covering the whole frame area.
pub fn draw(frame: &mut Frame, workspace: &Workspace, chrome: &Chrome) -> ViewGeometry {
    let area = frame.area();
    render(frame.buffer_mut(), area, workspace, chrome)
}

pub fn render(buffer: &mut Buffer, area: Rect, workspace: &Workspace, chrome: &Chrome) -> ViewGeometry {
    let tree = workspace.tree();
    let mut geometry = ViewGeometry::default();
    if area.width == 0 || area.height == 0 {
        return geometry;
    }

    let focus_mode = tree.focus_mode();
    let (layout_area, status_area) = if focus_mode || area.height < 2 {
        (area, None)
    } else {
        let layout = Rect::new(area.x, area.y, area.width, area.height - 1);
        let status = Rect::new(area.x, area.bottom() - 1, area.width, 1);
        (layout, Some(status))
    };
    geometry.layout_area = layout_area;

    if focus_mode {
        geometry.leaves = vec![(tree.active_leaf().clone(), layout_area)];
    } else {
        let (leaves, gutters) = tree.layout_with_gutters(layout_area);
        geometry.leaves = leaves;
        geometry.gutters = gutters;
    }

    for (leaf_id, rect) in &geometry.leaves {
        if let Some(leaf) = tree.leaf(leaf_id) {
            let active = leaf_id == tree.active_leaf();
            render_leaf(buffer, *rect, leaf, active, &mut geometry.tabs);
        }
    }
    for gutter in &geometry.gutters {
        let hovered = chrome
            .hovered_gutter
            .as_ref()
            .is_some_and(|(split, index)| *split == gutter.split_id && *index == gutter.index);
        render_gutter(buffer, gutter, hovered);
    }

    if let Some(target) = workspace.drag().drop_target() {
        render_drop_zone(buffer, target);
    }
    if let Some(preview) = &chrome.preview {
        render_preview(buffer, preview);
    }
    if let Some(status) = status_area {
        render_status(buffer, status, &tree, workspace, chrome);
    }
    if !chrome.help.is_empty() {
        render_help(buffer, layout_area, &chrome.help);
    }
    geometry
}

fn render_leaf(buffer: &mut Buffer, rect: Rect, leaf: &Leaf, active: bool, tabs: &mut Vec<TabHit>) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let hide_strip = leaf.active().is_some_and(|tab| tab.focus_mode);
    let body = if hide_strip || rect.height < 2 {
        rect
    } else {
        let strip = Rect::new(rect.x, rect.y, rect.width, 1);
        render_tab_strip(buffer, strip, leaf, active, tabs);
        Rect::new(rect.x, rect.y + 1, rect.width, rect.height - 1)
    };
    if let Some(tab) = leaf.active() {
        render_body(buffer, body, tab, active);
    }
}

fn render_tab_strip(buffer: &mut Buffer, strip: Rect, leaf: &Leaf, active: bool, tabs: &mut Vec<TabHit>) {
    buffer.set_style(strip, Style::default().bg(theme::strip_bg()));
    let mut x = strip.x;
    for tab in &leaf.tabs {
        if x >= strip.right() {
            break;
        }
        let label = if tab.dirty {
            format!(" {} {} ", tab.title, DIRTY_MARKER)
        } else {
            format!(" {} ", tab.title)
        };
        let available = strip.right() - x;
        let width = (label.chars().count() as u16).min(available);
        let style = if tab.id == leaf.active_tab {
            let style = Style::default()
                .bg(theme::tab_active_bg())
                .fg(theme::tab_active_fg());
            if active {
                style.add_modifier(Modifier::BOLD)
            } else {
                style
            }
        } else {
            Style::default().bg(theme::strip_bg()).fg(theme::tab_fg())
        };
        let text: String = label.chars().take(width as usize).collect();
        buffer.set_string(x, strip.y, text, style);
        tabs.push(TabHit {
            tab_id: tab.id.clone(),
            leaf_id: leaf.id.clone(),
            rect: Rect::new(x, strip.y, width, 1),
        });
        x = x.saturating_add(width);
    }
    if active && x < strip.right() {
        let marker = Rect::new(strip.right() - 1, strip.y, 1, 1);
        buffer.set_string(marker.x, marker.y, "▌", Style::default().fg(theme::accent()));
    }
}

fn render_body(buffer: &mut Buffer, body: Rect, tab: &Tab, active: bool) {
    if body.width == 0 || body.height == 0 {
        return;
    }
    let border_style = if active {
        Style::default().fg(theme::accent())
    } else {
        Style::default().fg(theme::muted_fg())
    };
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(border_style);
    let lines: Vec<Line> = match &tab.widget_kind {
        WidgetKind::Welcome => vec![
            Line::from("Welcome"),
            Line::from(""),
            Line::from("Ctrl+N        new tab"),
            Line::from("Ctrl+K \\      split right"),
            Line::from("Ctrl+K -      split down"),
            Line::from("F1            all commands"),
            Line::from("Ctrl+Q        quit"),
        ],
        kind => {
            let mut lines = vec![Line::from(tab.title.clone()), Line::from(format!("{kind:?}"))];
            if let Some(content) = &tab.content_ref {
                lines.push(Line::from(content.clone()));
            }
            lines
        }
    };
    let alignment = if tab.is_welcome() {
        Alignment::Center
    } else {
        Alignment::Left
    };
    Paragraph::new(lines)
        .alignment(alignment)
        .block(block)
        .render(body, buffer);
}

fn render_gutter(buffer: &mut Buffer, gutter: &Gutter, hovered: bool) {
    let style = if hovered {
        Style::default()
            .fg(theme::gutter_hover_fg())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(theme::gutter_fg())
            .add_modifier(Modifier::DIM)
    };
    let symbol = match gutter.direction {
        SplitDirection::Horizontal => "│",
        SplitDirection::Vertical => "─",
    };
    let clip = gutter.rect.intersection(buffer.area);
    for y in clip.y..clip.bottom() {
        for x in clip.x..clip.right() {
            if let Some(cell) = buffer.cell_mut((x, y)) {
                cell.reset();
                cell.set_symbol(symbol);
                cell.set_style(style);
            }
        }
    }
}

/// The part of the target a drop would occupy.
pub fn drop_zone(target: &DropTarget) -> Rect {
    let b = target.bounds;
    match target.position {
        DropPosition::Center => b,
        DropPosition::Left => Rect::new(b.x, b.y, b.width / 2, b.height),
        DropPosition::Right => Rect::new(b.x + b.width / 2, b.y, b.width - b.width / 2, b.height),
        DropPosition::Top => Rect::new(b.x, b.y, b.width, b.height / 2),
        DropPosition::Bottom => Rect::new(b.x, b.y + b.height / 2, b.width, b.height - b.height / 2),
    }
}

fn render_drop_zone(buffer: &mut Buffer, target: &DropTarget) {
    let zone = drop_zone(target).intersection(buffer.area);
    buffer.set_style(zone, Style::default().bg(theme::drop_zone_bg()));
}

fn render_preview(buffer: &mut Buffer, preview: &DragPreview) {
    let rect = preview.rect.intersection(buffer.area);
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    Clear.render(rect, buffer);
    Paragraph::new(preview.label.as_str())
        .style(Style::default().bg(theme::preview_bg()).fg(theme::preview_fg()))
        .block(Block::default().borders(Borders::ALL))
        .render(rect, buffer);
}

fn render_status(buffer: &mut Buffer, area: Rect, tree: &LayoutTree, workspace: &Workspace, chrome: &Chrome) {
    let style = Style::default().bg(theme::status_bg()).fg(theme::status_fg());
    buffer.set_style(area, style);
    let active_title = tree
        .leaf(tree.active_leaf())
        .and_then(Leaf::active)
        .map(|tab| tab.title.as_str())
        .unwrap_or("");
    let left = format!(
        " pane-deck │ {} panes │ {}",
        tree.leaf_count(),
        active_title
    );
    buffer.set_string(area.x, area.y, truncate(&left, area.width), style);

    let right = if let Some(state) = workspace.drag().drag_state() {
        format!("dragging {} ", tree.tab(&state.tab_id).map_or("tab", |tab| tab.title.as_str()))
    } else if let Some(chord) = &chrome.pending_chord {
        format!("{chord} … ")
    } else if let Some(message) = &chrome.message {
        format!("{message} ")
    } else {
        String::new()
    };
    let right_width = right.chars().count() as u16;
    if right_width > 0 && right_width < area.width {
        buffer.set_string(area.right() - right_width, area.y, right, style);
    }
}

fn render_help(buffer: &mut Buffer, area: Rect, rows: &[(String, String)]) {
    let label_width = rows.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
    let binding_width = rows.iter().map(|(_, key)| key.chars().count()).max().unwrap_or(0);
    let width = ((label_width + binding_width + 6) as u16).min(area.width);
    let height = ((rows.len() + 2) as u16).min(area.height);
    let rect = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    let lines: Vec<Line> = rows
        .iter()
        .map(|(label, key)| Line::from(format!(" {label:<label_width$}  {key}")))
        .collect();
    Clear.render(rect, buffer);
    Paragraph::new(lines)
        .style(Style::default().bg(theme::overlay_bg()).fg(theme::overlay_fg()))
        .block(Block::default().borders(Borders::ALL).title(" Commands "))
        .render(rect, buffer);
}

fn truncate(value: &str, width: u16) -> String {
    value.chars().take(width as usize).collect()
}
