use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::KeybindingError;

/// Maximum number of chords in one keybinding.
pub const MAX_CHORDS: usize = 2;

/// One key combination in normalized form, e.g. `Ctrl+Shift+W`.
///
/// Modifiers are sorted case-insensitively and the key is uppercased, so two
/// spellings of the same combination compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord(String);

impl Chord {
    pub fn parse(raw: &str) -> Result<Self, KeybindingError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(KeybindingError::Empty);
        }
        let parts: Vec<&str> = raw.split('+').map(str::trim).collect();
        let (key, modifiers) = match parts.split_last() {
            Some((key, modifiers)) if !key.is_empty() => (*key, modifiers),
            _ => return Err(KeybindingError::MissingKey(raw.to_string())),
        };
        if modifier_name(key).is_some() {
            return Err(KeybindingError::MissingKey(raw.to_string()));
        }
        let mut names = Vec::with_capacity(modifiers.len());
        for modifier in modifiers {
            let name = modifier_name(modifier).ok_or_else(|| KeybindingError::UnknownModifier {
                chord: raw.to_string(),
                modifier: modifier.to_string(),
            })?;
            names.push(name);
        }
        Ok(Self::assemble(names, &key_name(key)))
    }

    /// The chord for a key press. Releases and keys without a name give `None`.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let mut modifiers = event.modifiers;
        let key = match event.code {
            KeyCode::Char(' ') => "SPACE".to_string(),
            KeyCode::Char('+') => "PLUS".to_string(),
            KeyCode::Char(c) => c.to_uppercase().to_string(),
            KeyCode::BackTab => {
                modifiers |= KeyModifiers::SHIFT;
                "TAB".to_string()
            }
            KeyCode::Tab => "TAB".to_string(),
            KeyCode::Enter => "ENTER".to_string(),
            KeyCode::Esc => "ESC".to_string(),
            KeyCode::Backspace => "BACKSPACE".to_string(),
            KeyCode::Delete => "DELETE".to_string(),
            KeyCode::Insert => "INSERT".to_string(),
            KeyCode::Left => "LEFT".to_string(),
            KeyCode::Right => "RIGHT".to_string(),
            KeyCode::Up => "UP".to_string(),
            KeyCode::Down => "DOWN".to_string(),
            KeyCode::Home => "HOME".to_string(),
            KeyCode::End => "END".to_string(),
            KeyCode::PageUp => "PAGEUP".to_string(),
            KeyCode::PageDown => "PAGEDOWN".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            _ => return None,
        };
        let mut names = Vec::new();
        if modifiers.contains(KeyModifiers::CONTROL) {
            names.push("Ctrl");
        }
        if modifiers.contains(KeyModifiers::ALT) {
            names.push("Alt");
        }
        if modifiers.contains(KeyModifiers::SHIFT) {
            names.push("Shift");
        }
        if modifiers.intersects(KeyModifiers::META | KeyModifiers::SUPER) {
            names.push("Meta");
        }
        Some(Self::assemble(names, &key))
    }

    fn assemble(mut modifiers: Vec<&'static str>, key: &str) -> Self {
        modifiers.sort_by_key(|name| name.to_lowercase());
        modifiers.dedup();
        let mut parts: Vec<&str> = modifiers;
        parts.push(key);
        Self(parts.join("+"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The key as `from_key_event` names it, so spellings like `Escape` or
/// `Return` match the key press.
fn key_name(raw: &str) -> String {
    let upper = raw.to_uppercase();
    let alias = match upper.as_str() {
        "ESCAPE" => "ESC",
        "RETURN" => "ENTER",
        "SPACEBAR" => "SPACE",
        "DEL" => "DELETE",
        "INS" => "INSERT",
        "BKSP" => "BACKSPACE",
        "PGUP" | "PAGE_UP" => "PAGEUP",
        "PGDN" | "PGDOWN" | "PAGE_DOWN" => "PAGEDOWN",
        "ARROWLEFT" => "LEFT",
        "ARROWRIGHT" => "RIGHT",
        "ARROWUP" => "UP",
        "ARROWDOWN" => "DOWN",
        _ => return upper,
    };
    alias.to_string()
}

fn modifier_name(raw: &str) -> Option<&'static str> {
    match raw.to_ascii_lowercase().as_str() {
        "ctrl" | "control" => Some("Ctrl"),
        "alt" | "option" => Some("Alt"),
        "shift" => Some("Shift"),
        "meta" | "cmd" | "super" | "win" => Some("Meta"),
        _ => None,
    }
}

/// One or two whitespace-separated chords.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keybinding {
    chords: Vec<Chord>,
}

impl Keybinding {
    pub fn parse(raw: &str) -> Result<Self, KeybindingError> {
        let chords = raw
            .split_whitespace()
            .map(Chord::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if chords.is_empty() {
            return Err(KeybindingError::Empty);
        }
        if chords.len() > MAX_CHORDS {
            return Err(KeybindingError::TooManyChords(raw.trim().to_string()));
        }
        Ok(Self { chords })
    }

    pub fn single(chord: Chord) -> Self {
        Self {
            chords: vec![chord],
        }
    }

    pub fn pair(first: Chord, second: Chord) -> Self {
        Self {
            chords: vec![first, second],
        }
    }

    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    pub fn is_chorded(&self) -> bool {
        self.chords.len() > 1
    }

    /// True when this is a two-chord binding whose first chord is `prefix`.
    pub fn has_prefix(&self, prefix: &Chord) -> bool {
        self.is_chorded() && self.chords[0] == *prefix
    }
}

impl fmt::Display for Keybinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.chords.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}

/// Canonical string form of a keybinding.
pub fn normalize_keybinding(raw: &str) -> Result<String, KeybindingError> {
    Keybinding::parse(raw).map(|binding| binding.to_string())
}
