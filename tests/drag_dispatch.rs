use pane_deck::config::EngineConfig;
use pane_deck::drag::{DragDropManager, DragOutcome, DragState, DropPosition, DropTarget};
use pane_deck::ids::{NodeId, TabId};
use pane_deck::store::{Dispatch, DispatchResult, LayoutStore};
use pane_deck::tree::{Action, SplitDirection, TabSpec, WidgetKind};
use ratatui::layout::Rect;

const BOUNDS: Rect = Rect {
    x: 40,
    y: 0,
    width: 40,
    height: 20,
};

struct Recording {
    store: LayoutStore,
    log: Vec<Action>,
}

impl Dispatch for Recording {
    fn dispatch(&mut self, action: Action) -> DispatchResult {
        self.log.push(action.clone());
        self.store.dispatch(action)
    }
}

/// Two side by side leaves; the left one holds an editor tab.
fn setup() -> (Recording, NodeId, NodeId, TabId) {
    let mut store = LayoutStore::new(EngineConfig::default());
    let l1 = store.tree().root().clone();
    let l2 = store
        .dispatch(Action::SplitLeaf {
            leaf_id: l1.clone(),
            direction: SplitDirection::Horizontal,
            ratio: 0.5,
        })
        .created_leaf
        .unwrap();
    let t1 = store
        .dispatch(Action::OpenTab {
            leaf_id: Some(l1.clone()),
            tab: TabSpec::new("main.rs", WidgetKind::Editor),
        })
        .created_tab
        .unwrap();
    let recording = Recording {
        store,
        log: Vec::new(),
    };
    (recording, l1, l2, t1)
}

#[test]
fn center_drop_dispatches_a_single_move() {
    let (mut sink, l1, l2, t1) = setup();
    let mut manager = DragDropManager::default();
    assert!(manager.start_drag(DragState::tab(t1.clone(), l1)));
    manager.update_drop_target(DropTarget::new(l2.clone(), BOUNDS, DropPosition::Center));

    assert_eq!(manager.end_drag(&mut sink), DragOutcome::Moved);
    assert_eq!(
        sink.log,
        vec![Action::MoveTab {
            tab_id: t1.clone(),
            target_leaf_id: l2.clone(),
        }]
    );
    assert_eq!(sink.store.tree().leaf_of_tab(&t1).unwrap().id, l2);
    assert!(!manager.is_dragging());
}

#[test]
fn edge_drop_splits_then_moves_into_the_new_leaf() {
    let (mut sink, l1, l2, t1) = setup();
    let mut manager = DragDropManager::default();
    manager.start_drag(DragState::tab(t1.clone(), l1));
    manager.update_drop_target(DropTarget::new(l2.clone(), BOUNDS, DropPosition::Right));

    let DragOutcome::SplitAndMoved { new_leaf_id } = manager.end_drag(&mut sink) else {
        panic!("expected a split and move");
    };
    assert_eq!(
        sink.log,
        vec![
            Action::SplitLeaf {
                leaf_id: l2.clone(),
                direction: SplitDirection::Horizontal,
                ratio: 0.5,
            },
            Action::MoveTab {
                tab_id: t1.clone(),
                target_leaf_id: new_leaf_id.clone(),
            },
        ]
    );
    let tree = sink.store.tree();
    assert_eq!(tree.leaf_of_tab(&t1).unwrap().id, new_leaf_id);
    assert_eq!(tree.parent_of(&new_leaf_id).unwrap().0.children[0], l2);
}

#[test]
fn pointer_updates_keep_the_last_target() {
    let (mut sink, l1, l2, t1) = setup();
    let mut manager = DragDropManager::default();
    manager.start_drag(DragState::tab(t1, l1));
    assert_eq!(
        manager.update_pointer(&l2, BOUNDS, 78, 10),
        Some(DropPosition::Right)
    );
    assert_eq!(
        manager.update_pointer(&l2, BOUNDS, 60, 10),
        Some(DropPosition::Center)
    );
    assert_eq!(manager.update_pointer(&l2, BOUNDS, 5, 10), None);

    assert_eq!(manager.end_drag(&mut sink), DragOutcome::Moved);
    assert_eq!(sink.log.len(), 1);
}

#[test]
fn cancel_dispatches_nothing() {
    let (mut sink, l1, l2, t1) = setup();
    let mut manager = DragDropManager::default();
    manager.start_drag(DragState::tab(t1, l1));
    manager.update_drop_target(DropTarget::new(l2.clone(), BOUNDS, DropPosition::Left));
    manager.update_drop_target(DropTarget::new(l2, BOUNDS, DropPosition::Center));
    assert!(manager.cancel_drag());

    assert_eq!(manager.end_drag(&mut sink), DragOutcome::NotDragging);
    assert!(sink.log.is_empty());
}

#[test]
fn stale_tab_drop_is_rejected_without_leftover_panes() {
    let (mut sink, l1, l2, t1) = setup();
    let mut manager = DragDropManager::default();
    manager.start_drag(DragState::tab(t1.clone(), l1));
    sink.store.dispatch(Action::CloseTab { tab_id: t1.clone() });
    let leaves_before = sink.store.tree().leaf_ids();
    let area = Rect::new(0, 0, 80, 20);
    let layout_before = sink.store.tree().layout(area);

    manager.update_drop_target(DropTarget::new(l2.clone(), BOUNDS, DropPosition::Center));
    assert_eq!(manager.end_drag(&mut sink), DragOutcome::MoveRejected);

    manager.start_drag(DragState::tab(t1, l2.clone()));
    manager.update_drop_target(DropTarget::new(l2, BOUNDS, DropPosition::Bottom));
    assert_eq!(manager.end_drag(&mut sink), DragOutcome::MoveRejected);

    let tree = sink.store.tree();
    assert_eq!(tree.leaf_ids(), leaves_before);
    assert_eq!(tree.layout(area), layout_before);
}
