// SPDX-License-Identifier: GPL-3.0-only

//! Letter keyboard layouts and widget configuration.
//!
//! A layout is a list of rows, each a whitespace-separated list of button
//! names. Layouts arrive either as a bare row list or as a named table with
//! a `default` entry, the shape the keyboard widget itself uses:
//!
//! ```json
//! ["Q W E R T Y U I O P", "A S D F G H J K L", "Z X C V B N M"]
//! { "default": ["A B C", "space"] }
//! ```
//!
//! [`KeyboardConfig::from_layout`] turns a layout into everything the widget
//! needs: the layout table, display labels and per-button attributes
//! (`aria-label`, `data-letter`).

pub mod keys;

pub use keys::{
    FlashKey, NormalizedKey, aria_label, data_letter, display_label, is_letter_key, is_space_key,
    normalize_virtual_key,
};

use crate::app_settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Layout Data Structures
// ============================================================================

/// Rows of button names making up the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyLayout {
    /// Bare list of rows
    Rows(Vec<String>),
    /// Named table; only the `default` layer is used
    Named { default: Vec<String> },
}

impl Default for KeyLayout {
    fn default() -> Self {
        KeyLayout::Rows(
            app_settings::DEFAULT_LAYOUT
                .iter()
                .map(|row| row.to_string())
                .collect(),
        )
    }
}

impl KeyLayout {
    /// Creates a layout from row strings.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyLayout::Rows(rows.into_iter().map(Into::into).collect())
    }

    /// The row strings.
    pub fn rows(&self) -> &[String] {
        match self {
            KeyLayout::Rows(rows) => rows,
            KeyLayout::Named { default } => default,
        }
    }

    /// Every button name, in row order.
    pub fn keys(&self) -> Vec<String> {
        compute_keys(self.rows())
    }
}

/// Splits rows into button names.
pub fn compute_keys(rows: &[String]) -> Vec<String> {
    rows.iter()
        .flat_map(|row| row.split_whitespace())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Widget Configuration
// ============================================================================

/// Layout table in the widget's shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutTable {
    pub default: Vec<String>,
}

/// One attribute applied to one button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonAttribute {
    pub attribute: String,
    pub value: String,
    pub button: String,
}

/// Options handed to the keyboard widget.
///
/// Serializes with the widget's camel-case option names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardConfig {
    pub layout: LayoutTable,
    /// Button name to visible label
    pub display: BTreeMap<String, String>,
    pub merge_display: bool,
    pub button_attributes: Vec<ButtonAttribute>,
    pub theme: String,
    pub use_button_tag: bool,
    pub prevent_mouse_down_default: bool,
}

impl KeyboardConfig {
    /// Builds the widget configuration for a layout.
    pub fn from_layout(layout: &KeyLayout) -> Self {
        let keys = layout.keys();

        let display = keys
            .iter()
            .map(|key| (key.clone(), display_label(key)))
            .collect();

        let button_attributes = keys
            .iter()
            .flat_map(|key| {
                [
                    ButtonAttribute {
                        attribute: "aria-label".to_string(),
                        value: aria_label(key),
                        button: key.clone(),
                    },
                    ButtonAttribute {
                        attribute: "data-letter".to_string(),
                        value: data_letter(key),
                        button: key.clone(),
                    },
                ]
            })
            .collect();

        Self {
            layout: LayoutTable {
                default: layout.rows().to_vec(),
            },
            display,
            merge_display: true,
            button_attributes,
            theme: app_settings::KEYBOARD_THEME.to_string(),
            use_button_tag: true,
            prevent_mouse_down_default: true,
        }
    }

    /// Attributes configured for one button, in declaration order.
    pub fn attributes_for<'a>(&'a self, button: &'a str) -> impl Iterator<Item = &'a ButtonAttribute> {
        self.button_attributes
            .iter()
            .filter(move |attr| attr.button == button)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
