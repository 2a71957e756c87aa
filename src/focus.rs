//! Keyboard focus bookkeeping.
//!
//! The registry knows nothing about the UI toolkit: each entry wraps a
//! [`FocusTarget`] the host supplies. Navigation walks entries sorted by their
//! `order` (registration order breaks ties), optionally scoped to a group, and
//! a trapped group confines navigation until released.

use std::collections::{HashMap, VecDeque};

use crate::config::DEFAULT_FOCUS_HISTORY_LIMIT;
use crate::error::FocusError;

/// Something that can take input focus.
pub trait FocusTarget {
    fn acquire_focus(&self) -> Result<(), FocusError>;

    fn is_attached(&self) -> bool {
        true
    }
}

struct FocusEntry {
    target: Box<dyn FocusTarget>,
    group: Option<String>,
    order: i32,
    seq: u64,
}

pub struct FocusRegistry {
    entries: HashMap<String, FocusEntry>,
    current: Option<String>,
    history: VecDeque<String>,
    history_limit: usize,
    trapped: Option<String>,
    next_seq: u64,
}

impl Default for FocusRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_HISTORY_LIMIT)
    }
}

impl FocusRegistry {
    pub fn new(history_limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            current: None,
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
            trapped: None,
            next_seq: 0,
        }
    }

    /// Add or replace a target. Replacing keeps the original registration slot.
    pub fn register_focusable(
        &mut self,
        id: impl Into<String>,
        target: Box<dyn FocusTarget>,
        group: Option<&str>,
        order: i32,
    ) {
        let id = id.into();
        let seq = match self.entries.get(&id) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.entries.insert(
            id,
            FocusEntry {
                target,
                group: group.map(str::to_string),
                order,
                seq,
            },
        );
    }

    /// Remove a target, moving focus elsewhere first if it held it.
    pub fn unregister_focusable(&mut self, id: &str) -> bool {
        if !self.entries.contains_key(id) {
            return false;
        }
        self.handle_element_removal(id);
        self.entries.remove(id);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn current_focus(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Focus history, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Ids in `group`, in navigation order.
    pub fn group_members(&self, group: &str) -> Vec<&str> {
        self.candidates(Some(group))
    }

    pub fn focus(&mut self, id: &str) -> bool {
        let Some(entry) = self.entries.get(id) else {
            return false;
        };
        if !entry.target.is_attached() {
            tracing::debug!(id, "focus target is detached");
            return false;
        }
        if let Err(err) = entry.target.acquire_focus() {
            tracing::debug!(id, %err, "focus target refused focus");
            return false;
        }
        self.current = Some(id.to_string());
        self.history.retain(|seen| seen != id);
        self.history.push_back(id.to_string());
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
        true
    }

    pub fn focus_next(&mut self, group: Option<&str>) -> bool {
        self.step(group, true)
    }

    pub fn focus_previous(&mut self, group: Option<&str>) -> bool {
        self.step(group, false)
    }

    /// Return focus to the most recent still-registered target other than the current one.
    pub fn focus_last_active(&mut self) -> bool {
        let candidates: Vec<String> = self
            .history
            .iter()
            .rev()
            .filter(|id| self.current.as_ref() != Some(*id) && self.entries.contains_key(*id))
            .cloned()
            .collect();
        candidates.iter().any(|id| self.focus(id))
    }

    /// Confine `focus_next`/`focus_previous` to `group`. Focus moves into the
    /// group when it is currently elsewhere. Returns whether focus is inside
    /// the group afterwards; the trap stays armed either way.
    pub fn trap_focus(&mut self, group: &str) -> bool {
        self.trapped = Some(group.to_string());
        let inside = self
            .current
            .as_ref()
            .and_then(|id| self.entries.get(id))
            .is_some_and(|entry| entry.group.as_deref() == Some(group));
        if inside {
            return true;
        }
        let members: Vec<String> = self
            .candidates(Some(group))
            .into_iter()
            .map(str::to_string)
            .collect();
        let entered = members.iter().any(|id| self.focus(id));
        if !entered {
            tracing::debug!(group, "no member of the trapped group accepted focus");
        }
        entered
    }

    pub fn release_trap(&mut self) {
        self.trapped = None;
    }

    pub fn is_trapped(&self) -> bool {
        self.trapped.is_some()
    }

    pub fn trapped_group(&self) -> Option<&str> {
        self.trapped.as_deref()
    }

    /// Move focus off `id` before it goes away. Tries history first, then a
    /// sibling in the same group, and otherwise leaves nothing focused.
    pub fn handle_element_removal(&mut self, id: &str) {
        if self.current.as_deref() != Some(id) {
            return;
        }
        if self.focus_last_active() {
            return;
        }
        let group = self.entries.get(id).and_then(|entry| entry.group.clone());
        if let Some(group) = group {
            let siblings: Vec<String> = self
                .candidates(Some(&group))
                .into_iter()
                .filter(|member| *member != id)
                .map(str::to_string)
                .collect();
            if siblings.iter().any(|sibling| self.focus(sibling)) {
                return;
            }
        }
        tracing::trace!(id, "focus cleared");
        self.current = None;
    }

    fn candidates(&self, group: Option<&str>) -> Vec<&str> {
        let mut members: Vec<(&String, &FocusEntry)> = self
            .entries
            .iter()
            .filter(|(_, entry)| group.is_none() || entry.group.as_deref() == group)
            .collect();
        members.sort_by_key(|(_, entry)| (entry.order, entry.seq));
        members.into_iter().map(|(id, _)| id.as_str()).collect()
    }

    fn step(&mut self, group: Option<&str>, forward: bool) -> bool {
        let scope = self.trapped.clone().or_else(|| group.map(str::to_string));
        let ring: Vec<String> = self
            .candidates(scope.as_deref())
            .into_iter()
            .map(str::to_string)
            .collect();
        if ring.is_empty() {
            return false;
        }
        let len = ring.len();
        let start = match self
            .current
            .as_ref()
            .and_then(|current| ring.iter().position(|id| id == current))
        {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None => 0,
        };
        // Skip targets that refuse focus, visiting each at most once.
        (0..len).any(|offset| {
            let index = if forward {
                (start + offset) % len
            } else {
                (start + len - offset) % len
            };
            self.focus(&ring[index])
        })
    }
}
