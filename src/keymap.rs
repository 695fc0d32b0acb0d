use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde::{Deserialize, Serialize};

/// What a key press asks the timer to do
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Split,
    Unsplit,
    Skip,
    Reset,
    Pause,
    WriteRunFile,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized key {0:?}")]
pub struct KeyParseError(pub String);

/// A key plus modifiers, written as `space`, `ctrl+s`, `f5` or a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        let mut modifiers = event.modifiers;
        // Shifted symbols like '*' arrive with SHIFT set
        if matches!(event.code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        self.code == event.code && self.modifiers == modifiers
    }
}

impl FromStr for KeyChord {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || KeyParseError(s.to_string());
        // "+" on its own, or as the last part of "ctrl++", is the plus key
        let (prefix, key) = match s.strip_suffix("++") {
            Some(prefix) => (Some(prefix), "+"),
            None if s == "+" => (None, "+"),
            None => match s.rsplit_once('+') {
                Some((prefix, key)) => (Some(prefix), key),
                None => (None, s),
            },
        };

        let mut modifiers = KeyModifiers::NONE;
        for part in prefix.into_iter().flat_map(|p| p.split('+')) {
            modifiers |= match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                _ => return Err(err()),
            };
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "space" => KeyCode::Char(' '),
            "enter" | "return" => KeyCode::Enter,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "delete" | "del" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            lower => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => lower
                        .strip_prefix('f')
                        .and_then(|n| n.parse::<u8>().ok())
                        .filter(|n| (1..=12).contains(n))
                        .map(KeyCode::F)
                        .ok_or_else(err)?,
                }
            }
        };
        Ok(Self { code, modifiers })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            write!(f, "ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            write!(f, "alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            write!(f, "shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => write!(f, "space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "f{n}"),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Esc => write!(f, "esc"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}

/// Key strings per action, as stored in the config file
pub type KeyBindings = BTreeMap<Action, Vec<String>>;

pub fn default_bindings() -> KeyBindings {
    let bind = |keys: &[&str]| keys.iter().map(|k| k.to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        (Action::Split, bind(&["space", "+"])),
        (Action::Unsplit, bind(&["backspace", "-"])),
        (Action::Skip, bind(&["s", "/"])),
        (Action::Reset, bind(&["r", "*"])),
        (Action::Pause, bind(&["p", "."])),
        (Action::WriteRunFile, bind(&["ctrl+s", "w"])),
        (Action::Quit, bind(&["esc", "q", "ctrl+c"])),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    chords: Vec<(KeyChord, Action)>,
}

impl Keymap {
    pub fn from_bindings(bindings: &KeyBindings) -> Result<Self, KeyParseError> {
        let chords = bindings
            .iter()
            .flat_map(|(action, keys)| keys.iter().map(move |key| (key, *action)))
            .map(|(key, action)| key.parse().map(|chord| (chord, action)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { chords })
    }

    /// Key releases and repeats are ignored so a held key splits once
    pub fn action_for(&self, event: &KeyEvent) -> Option<Action> {
        if event.kind != KeyEventKind::Press {
            return None;
        }
        self.chords
            .iter()
            .find(|(chord, _)| chord.matches(event))
            .map(|(_, action)| *action)
    }

    /// First key bound to `action`, for the legend
    pub fn key_for(&self, action: Action) -> Option<KeyChord> {
        self.chords
            .iter()
            .find(|(_, bound)| *bound == action)
            .map(|(chord, _)| *chord)
    }
}

impl Default for Keymap {
    fn default() -> Self {
        // default_bindings only holds keys that parse
        Self::from_bindings(&default_bindings()).unwrap_or(Self { chords: Vec::new() })
    }
}
