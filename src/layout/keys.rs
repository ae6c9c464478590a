// SPDX-License-Identifier: GPL-3.0-only

//! Key classification for the on-screen letter keyboard.
//!
//! Buttons are named by the strings in a layout row (`"Q"`, `"space"`, ...).
//! Only single ASCII letters and the space key produce input; anything else
//! renders but is ignored when pressed.

use std::fmt;

/// Returns `true` for a single ASCII letter button.
pub fn is_letter_key(button: &str) -> bool {
    let mut chars = button.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

/// Returns `true` for the space button (case-insensitive).
pub fn is_space_key(button: &str) -> bool {
    button.eq_ignore_ascii_case("space")
}

/// Text shown on a button.
pub fn display_label(button: &str) -> String {
    if is_space_key(button) {
        "Space".to_string()
    } else if is_letter_key(button) {
        button.to_ascii_uppercase()
    } else {
        button.to_string()
    }
}

/// Accessible name of a button.
pub fn aria_label(button: &str) -> String {
    if is_space_key(button) {
        "Space key".to_string()
    } else if is_letter_key(button) {
        format!("Letter {}", button.to_ascii_uppercase())
    } else {
        format!("Key {}", button)
    }
}

/// Value of the `data-letter` attribute used to find a button again.
pub fn data_letter(button: &str) -> String {
    if is_space_key(button) {
        "SPACE".to_string()
    } else {
        button.to_uppercase()
    }
}

/// A virtual button press mapped to game input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    /// Character forwarded to the game: a lowercase letter or `' '`
    pub value: char,
    /// Button name as pressed
    pub label: String,
}

/// Maps a pressed button to the character the game receives.
///
/// Returns `None` for buttons that are neither letters nor space.
pub fn normalize_virtual_key(button: &str) -> Option<NormalizedKey> {
    if is_space_key(button) {
        return Some(NormalizedKey {
            value: ' ',
            label: "Space".to_string(),
        });
    }
    if is_letter_key(button) {
        let value = button.chars().next()?.to_ascii_lowercase();
        return Some(NormalizedKey {
            value,
            label: button.to_string(),
        });
    }
    None
}

// ============================================================================
// Flash Keys
// ============================================================================

/// Identity of a flashable button, keyed the way `data-letter` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlashKey {
    /// Upper-case ASCII letter
    Letter(char),
    Space,
}

impl FlashKey {
    /// Resolves the button a typed character should flash.
    ///
    /// Letters match case-insensitively; `' '` is the space button.
    pub fn for_char(c: char) -> Option<Self> {
        if c == ' ' {
            Some(FlashKey::Space)
        } else if c.is_ascii_alphabetic() {
            Some(FlashKey::Letter(c.to_ascii_uppercase()))
        } else {
            None
        }
    }

    /// Selector of the matching rendered button.
    pub fn selector(&self) -> String {
        format!(".hg-button[data-letter=\"{}\"]", self)
    }
}

impl fmt::Display for FlashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashKey::Letter(c) => write!(f, "{}", c),
            FlashKey::Space => write!(f, "SPACE"),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: Letter and space classification
    #[test]
    fn test_key_classification() {
        assert!(is_letter_key("q"));
        assert!(is_letter_key("Q"));
        assert!(!is_letter_key("QU"));
        assert!(!is_letter_key("1"));
        assert!(!is_letter_key(""));
        assert!(!is_letter_key("é"));

        assert!(is_space_key("space"));
        assert!(is_space_key("SPACE"));
        assert!(!is_space_key(" "));
    }

    /// Test 2: Display, aria and data-letter values
    #[test]
    fn test_button_labels() {
        assert_eq!(display_label("q"), "Q");
        assert_eq!(display_label("space"), "Space");
        assert_eq!(display_label("{bksp}"), "{bksp}");

        assert_eq!(aria_label("q"), "Letter Q");
        assert_eq!(aria_label("Space"), "Space key");
        assert_eq!(aria_label("{enter}"), "Key {enter}");

        assert_eq!(data_letter("q"), "Q");
        assert_eq!(data_letter("space"), "SPACE");
    }

    /// Test 3: Virtual key normalization
    #[test]
    fn test_normalize_virtual_key() {
        let key = normalize_virtual_key("Q").unwrap();
        assert_eq!(key.value, 'q');
        assert_eq!(key.label, "Q");

        let space = normalize_virtual_key("space").unwrap();
        assert_eq!(space.value, ' ');
        assert_eq!(space.label, "Space");

        assert_eq!(normalize_virtual_key("{bksp}"), None);
        assert_eq!(normalize_virtual_key("7"), None);
    }

    /// Test 4: Flash keys from typed characters
    #[test]
    fn test_flash_key_for_char() {
        assert_eq!(FlashKey::for_char('a'), Some(FlashKey::Letter('A')));
        assert_eq!(FlashKey::for_char('A'), Some(FlashKey::Letter('A')));
        assert_eq!(FlashKey::for_char(' '), Some(FlashKey::Space));
        assert_eq!(FlashKey::for_char('3'), None);
        assert_eq!(FlashKey::for_char('ß'), None);
    }

    /// Test 5: Flash key selectors
    #[test]
    fn test_flash_key_selector() {
        assert_eq!(
            FlashKey::Letter('A').selector(),
            ".hg-button[data-letter=\"A\"]"
        );
        assert_eq!(FlashKey::Space.selector(), ".hg-button[data-letter=\"SPACE\"]");
    }
}
