//! Keyboard command registry with two-step chord support.
//!
//! A registry is an explicit value owned by the host, generic over the context
//! its commands run against. Key events come in one at a time; a chord that
//! only prefixes some two-chord binding arms a pending state that either
//! completes on the next key or lapses after the configured timeout.

pub mod builtin;

use std::fmt;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;

use crate::config::DEFAULT_CHORD_TIMEOUT_MS;
use crate::error::KeybindingError;
use crate::keybindings::{Chord, Keybinding};

pub type Predicate<C> = Box<dyn Fn(&C) -> bool>;
pub type Handler<C> = Box<dyn Fn(&mut C)>;

pub struct Command<C> {
    id: String,
    label: String,
    keybinding: Option<Keybinding>,
    predicate: Option<Predicate<C>>,
    execute: Handler<C>,
}

impl<C> Command<C> {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        execute: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            keybinding: None,
            predicate: None,
            execute: Box::new(execute),
        }
    }

    pub fn with_keybinding(mut self, raw: &str) -> Result<Self, KeybindingError> {
        self.keybinding = Some(Keybinding::parse(raw)?);
        Ok(self)
    }

    pub fn with_predicate(mut self, predicate: impl Fn(&C) -> bool + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn keybinding(&self) -> Option<&Keybinding> {
        self.keybinding.as_ref()
    }

    pub fn is_enabled(&self, context: &C) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(context))
    }
}

impl<C> fmt::Debug for Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("keybinding", &self.keybinding)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordState {
    Idle,
    AwaitingChord { prefix: Chord, deadline: Instant },
}

pub struct CommandRegistry<C> {
    commands: Vec<Command<C>>,
    chord_timeout: Duration,
    state: ChordState,
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_CHORD_TIMEOUT_MS))
    }
}

impl<C> CommandRegistry<C> {
    pub fn new(chord_timeout: Duration) -> Self {
        Self {
            commands: Vec::new(),
            chord_timeout,
            state: ChordState::Idle,
        }
    }

    /// Add a command. A command with the same id is replaced in place, keeping
    /// its position in the match order.
    pub fn register(&mut self, command: Command<C>) {
        if let Some(existing) = self.commands.iter_mut().find(|c| c.id == command.id) {
            tracing::debug!(command = %command.id, "command replaced");
            *existing = command;
        } else {
            self.commands.push(command);
        }
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.commands.len();
        self.commands.retain(|command| command.id != id);
        before != self.commands.len()
    }

    /// Run a command by id, honoring its predicate.
    pub fn execute(&self, id: &str, context: &mut C) -> bool {
        match self.commands.iter().find(|command| command.id == id) {
            Some(command) if command.is_enabled(context) => {
                (command.execute)(context);
                true
            }
            _ => false,
        }
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command<C>> {
        self.commands.iter()
    }

    pub fn set_chord_timeout(&mut self, timeout: Duration) {
        self.chord_timeout = timeout;
    }

    pub fn chord_timeout(&self) -> Duration {
        self.chord_timeout
    }

    pub fn state(&self) -> &ChordState {
        &self.state
    }

    pub fn pending_chord(&self) -> Option<&Chord> {
        match &self.state {
            ChordState::AwaitingChord { prefix, .. } => Some(prefix),
            ChordState::Idle => None,
        }
    }

    /// Returns true when the event was consumed by a command or a chord prefix.
    pub fn handle_keyboard_event(&mut self, event: &KeyEvent, context: &mut C) -> bool {
        self.handle_key_event_at(event, context, Instant::now())
    }

    pub fn handle_key_event_at(&mut self, event: &KeyEvent, context: &mut C, now: Instant) -> bool {
        match Chord::from_key_event(event) {
            Some(chord) => self.handle_chord_at(&chord, context, now),
            None => false,
        }
    }

    pub fn handle_chord(&mut self, chord: &Chord, context: &mut C) -> bool {
        self.handle_chord_at(chord, context, Instant::now())
    }

    pub fn handle_chord_at(&mut self, chord: &Chord, context: &mut C, now: Instant) -> bool {
        self.poll_timeout(now);
        match std::mem::replace(&mut self.state, ChordState::Idle) {
            ChordState::AwaitingChord { prefix, .. } => {
                let binding = Keybinding::pair(prefix, chord.clone());
                let handled = self.run_first(&binding, context);
                if !handled {
                    tracing::trace!(binding = %binding, "chord sequence unmatched");
                }
                handled
            }
            ChordState::Idle => {
                if self.run_first(&Keybinding::single(chord.clone()), context) {
                    return true;
                }
                let is_prefix = self
                    .commands
                    .iter()
                    .filter_map(Command::keybinding)
                    .any(|binding| binding.has_prefix(chord));
                if is_prefix {
                    tracing::trace!(prefix = %chord, "chord armed");
                    self.state = ChordState::AwaitingChord {
                        prefix: chord.clone(),
                        deadline: now + self.chord_timeout,
                    };
                }
                is_prefix
            }
        }
    }

    /// Drop an expired chord prefix. Returns true when one was dropped.
    pub fn poll_timeout(&mut self, now: Instant) -> bool {
        if let ChordState::AwaitingChord { prefix, deadline } = &self.state
            && now >= *deadline
        {
            tracing::trace!(prefix = %prefix, "chord timed out");
            self.state = ChordState::Idle;
            return true;
        }
        false
    }

    /// Time left before a pending chord lapses.
    pub fn time_until_timeout(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            ChordState::AwaitingChord { deadline, .. } => {
                Some(deadline.saturating_duration_since(now))
            }
            ChordState::Idle => None,
        }
    }

    /// First command bound to `binding` whose predicate passes, in registration order.
    fn run_first(&self, binding: &Keybinding, context: &mut C) -> bool {
        let found = self.commands.iter().find(|command| {
            command.keybinding.as_ref() == Some(binding) && command.is_enabled(context)
        });
        match found {
            Some(command) => {
                tracing::debug!(command = %command.id, binding = %binding, "command executed");
                (command.execute)(context);
                true
            }
            None => false,
        }
    }
}
