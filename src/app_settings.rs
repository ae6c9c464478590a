// SPDX-License-Identifier: GPL-3.0-only

//! Centralized application settings and constants.
//!
//! DOM identifiers and class names form the contract with the page markup;
//! the timing and spacing defaults seed [`crate::config::Tuning`].

// ============================================================================
// Page Contract
// ============================================================================

/// Marker class carried by every letter row that should be fitted.
pub const LETTER_ROW_SELECTOR: &str = ".letter-row";

/// Id of the touch keyboard panel container.
pub const PANEL_ID: &str = "gameTouchControls";

/// Id of the label element inside the panel.
pub const LABEL_ID: &str = "gameTouchLabel";

/// Wrapper around the keyboard mount, looked up inside the panel.
pub const KEYBOARD_WRAPPER_SELECTOR: &str = "[data-virtual-keyboard]";

/// Render root of the keyboard widget, looked up inside the panel.
pub const KEYBOARD_ROOT_SELECTOR: &str = "[data-keyboard-root]";

/// Container the keyboard widget is constructed into.
pub const KEYBOARD_CONTAINER_SELECTOR: &str = ".simple-keyboard";

/// Close control inside the panel.
pub const CLOSE_SELECTOR: &str = "[data-touch-close]";

/// Fallback padding target when a connection supplies none.
pub const DEFAULT_PADDING_TARGET_SELECTOR: &str = ".game-shell";

/// Class on rendered keyboard buttons.
pub const BUTTON_CLASS: &str = "hg-button";

/// Class toggled on a button while it is flashing.
pub const FLASHING_CLASS: &str = "is-flashing";

/// Selector matching every flashing button.
pub const FLASHING_SELECTOR: &str = ".hg-button.is-flashing";

/// Class marking the panel as revealed (drives the CSS transition).
pub const ACTIVE_CLASS: &str = "is-active";

/// Class hiding an element.
pub const HIDDEN_CLASS: &str = "hidden";

/// Body class present while the keyboard is open.
pub const BODY_OPEN_CLASS: &str = "game-touch-keyboard-open";

/// Theme classes handed to the keyboard widget.
pub const KEYBOARD_THEME: &str = "hg-theme-default game-touch-keyboard";

/// Label shown when a connection provides an empty one.
pub const DEFAULT_LABEL: &str = "Tap letters to play";

/// Default QWERTY letter layout, one string per row.
pub const DEFAULT_LAYOUT: [&str; 3] = ["Q W E R T Y U I O P", "A S D F G H J K L", "Z X C V B N M"];

// ============================================================================
// Tuning Defaults
// ============================================================================

/// Lowest a reduced letter gap may go, as a fraction of the base gap.
pub const MIN_GAP_RATIO: f64 = 0.4;

/// Delay before the panel DOM is fully hidden after a hide, in milliseconds.
pub const HIDE_DELAY_MS: u32 = 360;

/// Duration of a key flash in milliseconds.
pub const FLASH_DURATION_MS: u32 = 180;

/// Delay after reveal before padding and visibility are re-checked.
pub const SETTLE_DELAY_MS: u32 = 200;

/// Extra bottom padding reserved beyond the panel height, in pixels.
pub const PADDING_MARGIN_PX: f64 = 36.0;

/// An anchor counts as covered when its bottom is within this many pixels of the panel top.
pub const COVER_THRESHOLD_PX: f64 = 12.0;

/// Extra distance scrolled past the panel top when uncovering an anchor.
pub const SCROLL_EXTRA_PX: f64 = 24.0;
