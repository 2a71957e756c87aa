//! The default command set bound to a [`Workspace`].

use crate::commands::{Command, CommandRegistry};
use crate::error::KeybindingError;
use crate::store::Dispatch;
use crate::tree::{Action, NavDirection, SplitDirection};
use crate::workspace::Workspace;

fn has_splits(ws: &Workspace) -> bool {
    ws.tree().leaf_count() > 1
}

fn active_leaf_has_content(ws: &Workspace) -> bool {
    let tree = ws.tree();
    tree.leaf(tree.active_leaf())
        .is_some_and(|leaf| !leaf.is_welcome_only())
}

fn active_leaf_has_tabs_to_cycle(ws: &Workspace) -> bool {
    let tree = ws.tree();
    tree.leaf(tree.active_leaf())
        .is_some_and(|leaf| leaf.tabs.len() > 1)
}

pub fn register_defaults(registry: &mut CommandRegistry<Workspace>) -> Result<(), KeybindingError> {
    let commands = [
        Command::new("split.right", "Split pane right", |ws: &mut Workspace| {
            ws.split_active(SplitDirection::Horizontal);
        })
        .with_keybinding("Ctrl+K \\")?,
        Command::new("split.down", "Split pane down", |ws: &mut Workspace| {
            ws.split_active(SplitDirection::Vertical);
        })
        .with_keybinding("Ctrl+K -")?,
        Command::new("split.close", "Close pane", |ws: &mut Workspace| {
            ws.close_active_split();
        })
        .with_keybinding("Ctrl+K Ctrl+W")?
        .with_predicate(has_splits),
        Command::new("split.focus_next", "Focus next pane", |ws: &mut Workspace| {
            ws.dispatch(Action::FocusNextSplit);
        })
        .with_keybinding("Ctrl+K Ctrl+N")?
        .with_predicate(has_splits),
        Command::new("split.focus_previous", "Focus previous pane", |ws: &mut Workspace| {
            ws.dispatch(Action::FocusPreviousSplit);
        })
        .with_keybinding("Ctrl+K Ctrl+P")?
        .with_predicate(has_splits),
        Command::new("split.focus_above", "Focus pane above", |ws: &mut Workspace| {
            ws.focus_toward(NavDirection::Up);
        })
        .with_keybinding("Ctrl+K Up")?
        .with_predicate(has_splits),
        Command::new("split.focus_below", "Focus pane below", |ws: &mut Workspace| {
            ws.focus_toward(NavDirection::Down);
        })
        .with_keybinding("Ctrl+K Down")?
        .with_predicate(has_splits),
        Command::new("split.focus_left", "Focus pane left", |ws: &mut Workspace| {
            ws.focus_toward(NavDirection::Left);
        })
        .with_keybinding("Ctrl+K Left")?
        .with_predicate(has_splits),
        Command::new("split.focus_right", "Focus pane right", |ws: &mut Workspace| {
            ws.focus_toward(NavDirection::Right);
        })
        .with_keybinding("Ctrl+K Right")?
        .with_predicate(has_splits),
        Command::new("layout.equalize", "Equalize pane sizes", |ws: &mut Workspace| {
            ws.dispatch(Action::RebalanceSplits);
        })
        .with_keybinding("Ctrl+K =")?
        .with_predicate(has_splits),
        Command::new("view.focus_mode", "Toggle focus mode", |ws: &mut Workspace| {
            ws.dispatch(Action::ToggleFocusMode { tab_id: None });
        })
        .with_keybinding("Ctrl+K Z")?,
        Command::new("tab.new", "New tab", |ws: &mut Workspace| {
            ws.open_untitled();
        })
        .with_keybinding("Ctrl+N")?,
        Command::new("tab.close", "Close tab", |ws: &mut Workspace| {
            ws.close_active_tab();
        })
        .with_keybinding("Ctrl+W")?
        .with_predicate(active_leaf_has_content),
        Command::new("tab.close_all", "Close all tabs in pane", |ws: &mut Workspace| {
            ws.close_all_active_tabs();
        })
        .with_keybinding("Ctrl+K Shift+W")?
        .with_predicate(active_leaf_has_content),
        Command::new("tab.next", "Next tab", |ws: &mut Workspace| {
            ws.cycle_tab(true);
        })
        .with_keybinding("Ctrl+PageDown")?
        .with_predicate(active_leaf_has_tabs_to_cycle),
        Command::new("tab.previous", "Previous tab", |ws: &mut Workspace| {
            ws.cycle_tab(false);
        })
        .with_keybinding("Ctrl+PageUp")?
        .with_predicate(active_leaf_has_tabs_to_cycle),
        Command::new("focus.next", "Focus next target", |ws: &mut Workspace| {
            ws.focus_target(true);
        })
        .with_keybinding("F6")?,
        Command::new("focus.previous", "Focus previous target", |ws: &mut Workspace| {
            ws.focus_target(false);
        })
        .with_keybinding("Shift+F6")?,
    ];
    for command in commands {
        registry.register(command);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::keybindings::Chord;
    use std::time::Instant;

    fn chord(raw: &str) -> Chord {
        Chord::parse(raw).unwrap()
    }

    fn setup() -> (CommandRegistry<Workspace>, Workspace) {
        let mut registry = CommandRegistry::default();
        register_defaults(&mut registry).unwrap();
        (registry, Workspace::new(EngineConfig::default()))
    }

    #[test]
    fn every_default_has_a_binding() {
        let (registry, _) = setup();
        assert!(registry.commands().all(|c| c.keybinding().is_some()));
    }

    #[test]
    fn split_chord_then_close_chord() {
        let (mut registry, mut ws) = setup();
        let now = Instant::now();
        assert!(registry.handle_chord_at(&chord("Ctrl+K"), &mut ws, now));
        assert!(registry.handle_chord_at(&chord("\\"), &mut ws, now));
        assert_eq!(ws.tree().leaf_count(), 2);

        registry.handle_chord_at(&chord("Ctrl+K"), &mut ws, now);
        assert!(registry.handle_chord_at(&chord("Ctrl+W"), &mut ws, now));
        assert_eq!(ws.tree().leaf_count(), 1);
    }

    #[test]
    fn close_pane_is_gated_on_having_splits() {
        let (mut registry, mut ws) = setup();
        let now = Instant::now();
        registry.handle_chord_at(&chord("Ctrl+K"), &mut ws, now);
        assert!(!registry.handle_chord_at(&chord("Ctrl+W"), &mut ws, now));
    }

    #[test]
    fn close_tab_skips_welcome_only_leaf() {
        let (mut registry, mut ws) = setup();
        assert!(!registry.handle_chord(&chord("Ctrl+W"), &mut ws));
        assert!(registry.handle_chord(&chord("Ctrl+N"), &mut ws));
        assert!(registry.handle_chord(&chord("Ctrl+W"), &mut ws));
        let tree = ws.tree();
        assert!(tree.leaf(tree.active_leaf()).unwrap().is_welcome_only());
    }
}
