//! Key bindings and virtual-key naming.
//!
//! Codes follow the Windows virtual-key numbering, which is also what the
//! low-level input drivers report.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A platform virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

const NAMED_KEYS: &[(u16, &str)] = &[
    (0x01, "Mouse1"),
    (0x02, "Mouse2"),
    (0x04, "Mouse3"),
    (0x05, "Mouse4"),
    (0x06, "Mouse5"),
    (0x08, "Backspace"),
    (0x09, "Tab"),
    (0x0D, "Enter"),
    (0x10, "Shift"),
    (0x11, "Ctrl"),
    (0x12, "Alt"),
    (0x14, "CapsLock"),
    (0x1B, "Esc"),
    (0x20, "Space"),
    (0x21, "PageUp"),
    (0x22, "PageDown"),
    (0x23, "End"),
    (0x24, "Home"),
    (0x25, "Left"),
    (0x26, "Up"),
    (0x27, "Right"),
    (0x28, "Down"),
    (0x2D, "Insert"),
    (0x2E, "Delete"),
];

impl KeyCode {
    pub const MOUSE1: KeyCode = KeyCode(0x01);
    pub const MOUSE2: KeyCode = KeyCode(0x02);
    pub const INSERT: KeyCode = KeyCode(0x2D);
    pub const END: KeyCode = KeyCode(0x23);

    /// Human-readable name, or `0xNN` for codes without one.
    #[must_use]
    pub fn name(&self) -> String {
        let code = self.0;
        if let Some((_, name)) = NAMED_KEYS.iter().find(|(c, _)| *c == code) {
            return (*name).to_string();
        }
        match code {
            0x30..=0x39 | 0x41..=0x5A => char::from(code as u8).to_string(),
            0x60..=0x69 => format!("Num{}", code - 0x60),
            0x70..=0x87 => format!("F{}", code - 0x6F),
            _ => format!("0x{code:02X}"),
        }
    }

    /// Parses a name produced by [`KeyCode::name`], case-insensitively.
    /// Hex codes (`0x2D`) are accepted as well.
    pub fn from_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u16::from_str_radix(hex, 16)
                .map(KeyCode)
                .map_err(|_| Error::UnknownKey(name.to_string()));
        }

        if let Some((code, _)) = NAMED_KEYS
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(trimmed))
        {
            return Ok(KeyCode(*code));
        }

        let upper = trimmed.to_ascii_uppercase();
        let mut chars = upper.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_digit() || c.is_ascii_uppercase() {
                return Ok(KeyCode(c as u16));
            }
        }
        if let Some(n) = upper.strip_prefix("NUM").and_then(|n| n.parse::<u16>().ok()) {
            if n <= 9 {
                return Ok(KeyCode(0x60 + n));
            }
        }
        if let Some(n) = upper.strip_prefix('F').and_then(|n| n.parse::<u16>().ok()) {
            if (1..=24).contains(&n) {
                return Ok(KeyCode(0x6F + n));
            }
        }

        Err(Error::UnknownKey(name.to_string()))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for KeyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Something the user can bind a key to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Held to allow movement injection.
    Trigger,
    /// Enables or disables automation.
    Toggle,
    /// Immediately stops any in-flight injection.
    Panic,
}

impl Action {
    pub const ALL: [Action; 3] = [Self::Trigger, Self::Toggle, Self::Panic];

    /// The code bound to this action out of the box.
    #[must_use]
    pub fn default_code(&self) -> KeyCode {
        match self {
            Self::Trigger => KeyCode::MOUSE1,
            Self::Toggle => KeyCode::INSERT,
            Self::Panic => KeyCode::END,
        }
    }
}

/// One action-to-key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub action: Action,
    pub code: KeyCode,
}

/// The full set of bindings, exactly one code per action.
///
/// Bindings are loaded and reset as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    bindings: BTreeMap<Action, KeyCode>,
}

impl KeyBindings {
    /// Bindings with every action on its default code.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            bindings: Action::ALL
                .iter()
                .map(|a| (*a, a.default_code()))
                .collect(),
        }
    }

    /// Builds bindings from a list; actions missing from the list keep their
    /// default, later entries for the same action win.
    #[must_use]
    pub fn from_bindings(list: impl IntoIterator<Item = KeyBinding>) -> Self {
        let mut out = Self::defaults();
        for b in list {
            out.bindings.insert(b.action, b.code);
        }
        out
    }

    /// The code bound to `action`.
    #[must_use]
    pub fn code(&self, action: Action) -> KeyCode {
        self.bindings
            .get(&action)
            .copied()
            .unwrap_or_else(|| action.default_code())
    }

    /// Rebinds a single action.
    pub fn set(&mut self, action: Action, code: KeyCode) {
        self.bindings.insert(action, code);
    }

    /// The action bound to `code`, if any.
    #[must_use]
    pub fn action_for(&self, code: KeyCode) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(a, _)| *a)
    }

    /// Replaces every binding at once.
    pub fn replace_all(&mut self, other: KeyBindings) {
        *self = other;
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::defaults();
    }

    /// All bindings in action order.
    pub fn iter(&self) -> impl Iterator<Item = KeyBinding> + '_ {
        self.bindings
            .iter()
            .map(|(action, code)| KeyBinding {
                action: *action,
                code: *code,
            })
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::defaults()
    }
}
