//! Keyboard key definitions.
//!
//! Resolves the key names a controller sends (`"Enter"`, `"ArrowUp"`, `"a"`)
//! into the full event description a host dispatches.
//!
//! # Example
//!
//! ```ignore
//! use page_bridge::host::{KeyEvent, Modifiers};
//!
//! let event = KeyEvent::resolve("Enter", Modifiers::default())?;
//! assert_eq!(event.key_code, 13);
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Key Enum
// ============================================================================

/// Named keyboard keys for navigation and control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // ========================================================================
    // Navigation & Control
    // ========================================================================
    /// Enter/Return key
    Enter,
    /// Tab key
    Tab,
    /// Escape key
    Escape,
    /// Backspace key
    Backspace,
    /// Delete key
    Delete,
    /// Space bar
    Space,

    // ========================================================================
    // Arrow Keys
    // ========================================================================
    /// Arrow Up
    ArrowUp,
    /// Arrow Down
    ArrowDown,
    /// Arrow Left
    ArrowLeft,
    /// Arrow Right
    ArrowRight,

    // ========================================================================
    // Page Navigation
    // ========================================================================
    /// Home key
    Home,
    /// End key
    End,
    /// Page Up key
    PageUp,
    /// Page Down key
    PageDown,
}

impl Key {
    const ALL: [Key; 14] = [
        Key::Enter,
        Key::Tab,
        Key::Escape,
        Key::Backspace,
        Key::Delete,
        Key::Space,
        Key::ArrowUp,
        Key::ArrowDown,
        Key::ArrowLeft,
        Key::ArrowRight,
        Key::Home,
        Key::End,
        Key::PageUp,
        Key::PageDown,
    ];

    /// Returns the key properties: (key, code, keyCode, printable).
    #[must_use]
    pub fn properties(self) -> (&'static str, &'static str, u32, bool) {
        match self {
            Key::Enter => ("Enter", "Enter", 13, false),
            Key::Tab => ("Tab", "Tab", 9, false),
            Key::Escape => ("Escape", "Escape", 27, false),
            Key::Backspace => ("Backspace", "Backspace", 8, false),
            Key::Delete => ("Delete", "Delete", 46, false),
            Key::Space => (" ", "Space", 32, true),
            Key::ArrowUp => ("ArrowUp", "ArrowUp", 38, false),
            Key::ArrowDown => ("ArrowDown", "ArrowDown", 40, false),
            Key::ArrowLeft => ("ArrowLeft", "ArrowLeft", 37, false),
            Key::ArrowRight => ("ArrowRight", "ArrowRight", 39, false),
            Key::Home => ("Home", "Home", 36, false),
            Key::End => ("End", "End", 35, false),
            Key::PageUp => ("PageUp", "PageUp", 33, false),
            Key::PageDown => ("PageDown", "PageDown", 34, false),
        }
    }

    /// Looks a key up by its `key` or `code` name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("esc") {
            return Some(Key::Escape);
        }
        if name.eq_ignore_ascii_case("return") {
            return Some(Key::Enter);
        }
        Self::ALL.into_iter().find(|key| {
            let (key_str, code, _, _) = key.properties();
            name.eq_ignore_ascii_case(key_str) || name.eq_ignore_ascii_case(code)
        })
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Ctrl modifier.
    pub ctrl: bool,
    /// Shift modifier.
    pub shift: bool,
    /// Alt modifier.
    pub alt: bool,
    /// Meta modifier.
    pub meta: bool,
}

// ============================================================================
// KeyEvent
// ============================================================================

/// Full description of a key event for the host to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    /// Key value (e.g., "a", "Enter").
    pub key: String,
    /// Physical key code (e.g., "KeyA", "Enter").
    pub code: String,
    /// Legacy keyCode number.
    pub key_code: u32,
    /// Whether the key produces visible output.
    pub printable: bool,
    /// Held modifiers.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Resolves a key name or single character into an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is neither a known key
    /// nor a single character.
    pub fn resolve(name: &str, modifiers: Modifiers) -> Result<Self> {
        if let Some(key) = Key::from_name(name) {
            let (key_str, code, key_code, printable) = key.properties();
            return Ok(Self {
                key: key_str.to_string(),
                code: code.to_string(),
                key_code,
                printable,
                modifiers,
            });
        }

        let mut chars = name.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(Error::invalid_argument(format!("Unknown key: {name:?}")));
        };

        let upper = c.to_ascii_uppercase();
        let (code, key_code) = if c.is_ascii_alphabetic() {
            (format!("Key{upper}"), upper as u32)
        } else if c.is_ascii_digit() {
            (format!("Digit{c}"), c as u32)
        } else {
            (String::new(), 0)
        };

        Ok(Self {
            key: c.to_string(),
            code,
            key_code,
            printable: true,
            modifiers,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
