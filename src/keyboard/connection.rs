// SPDX-License-Identifier: GPL-3.0-only

//! Connections: the callers of the touch keyboard.
//!
//! Each game screen that wants letter input attaches once and receives a
//! [`ConnectionId`]. The connection's [`ConnectionOptions`] carry what the
//! panel shows while that connection is active (label, layout, theme) and
//! where key presses and visibility changes are reported.
//!
//! Options are changed with an [`OptionsPatch`]: every field left `None`
//! keeps its current value. Patches without callbacks can be deserialized
//! from JSON:
//!
//! ```json
//! { "label": "Spell the word", "layout": ["A B C", "space"] }
//! ```

use super::theme::ThemeOverrides;
use crate::app_settings;
use crate::layout::KeyLayout;
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;

/// Identity of an attached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "touch-keyboard-{}", self.0)
    }
}

// ============================================================================
// Key Press Metadata
// ============================================================================

/// Where a key press came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputSource {
    /// A button of the on-screen keyboard
    Virtual,
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Virtual => write!(f, "virtual"),
        }
    }
}

/// Extra information passed with every forwarded key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPressMeta {
    pub source: InputSource,
    /// Button name as the widget reported it
    pub original: String,
}

// ============================================================================
// Options
// ============================================================================

/// Receives `(character, meta)` for each forwarded key press.
pub type KeyPressFn = Rc<dyn Fn(char, &KeyPressMeta)>;

/// Visibility notification.
pub type NotifyFn = Rc<dyn Fn()>;

/// Resolves an element on demand (padding target, viewport anchor).
pub type TargetFn<E> = Rc<dyn Fn() -> Option<E>>;

/// Everything the panel knows about one connection.
#[derive(Clone)]
pub struct ConnectionOptions<E> {
    /// Name used in logs instead of the numeric id
    pub name: Option<String>,
    pub label: String,
    pub layout: KeyLayout,
    pub theme: Option<ThemeOverrides>,
    pub on_key_press: Option<KeyPressFn>,
    pub on_show: Option<NotifyFn>,
    pub on_hide: Option<NotifyFn>,
    /// Element receiving bottom padding while the panel is open
    pub padding_target: Option<TargetFn<E>>,
    /// Element kept above the panel
    pub viewport_target: Option<TargetFn<E>>,
}

impl<E> Default for ConnectionOptions<E> {
    fn default() -> Self {
        Self {
            name: None,
            label: app_settings::DEFAULT_LABEL.to_string(),
            layout: KeyLayout::default(),
            theme: None,
            on_key_press: None,
            on_show: None,
            on_hide: None,
            padding_target: None,
            viewport_target: None,
        }
    }
}

impl<E> fmt::Debug for ConnectionOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("layout", &self.layout)
            .field("theme", &self.theme)
            .field("on_key_press", &self.on_key_press.is_some())
            .field("on_show", &self.on_show.is_some())
            .field("on_hide", &self.on_hide.is_some())
            .field("padding_target", &self.padding_target.is_some())
            .field("viewport_target", &self.viewport_target.is_some())
            .finish()
    }
}

impl<E> ConnectionOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn layout(mut self, layout: KeyLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn theme(mut self, theme: ThemeOverrides) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn on_key_press(mut self, callback: impl Fn(char, &KeyPressMeta) + 'static) -> Self {
        self.on_key_press = Some(Rc::new(callback));
        self
    }

    pub fn on_show(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_show = Some(Rc::new(callback));
        self
    }

    pub fn on_hide(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_hide = Some(Rc::new(callback));
        self
    }

    pub fn padding_target(mut self, target: impl Fn() -> Option<E> + 'static) -> Self {
        self.padding_target = Some(Rc::new(target));
        self
    }

    pub fn viewport_target(mut self, target: impl Fn() -> Option<E> + 'static) -> Self {
        self.viewport_target = Some(Rc::new(target));
        self
    }

    /// Overwrites every field the patch sets.
    pub fn apply(&mut self, patch: OptionsPatch<E>) {
        let OptionsPatch {
            name,
            label,
            layout,
            theme,
            on_key_press,
            on_show,
            on_hide,
            padding_target,
            viewport_target,
        } = patch;

        if name.is_some() {
            self.name = name;
        }
        if let Some(label) = label {
            self.label = label;
        }
        if let Some(layout) = layout {
            self.layout = layout;
        }
        if theme.is_some() {
            self.theme = theme;
        }
        if on_key_press.is_some() {
            self.on_key_press = on_key_press;
        }
        if on_show.is_some() {
            self.on_show = on_show;
        }
        if on_hide.is_some() {
            self.on_hide = on_hide;
        }
        if padding_target.is_some() {
            self.padding_target = padding_target;
        }
        if viewport_target.is_some() {
            self.viewport_target = viewport_target;
        }
    }

    /// Label shown on the panel, falling back to the default for blank text.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            app_settings::DEFAULT_LABEL
        } else {
            &self.label
        }
    }
}

/// Partial update of [`ConnectionOptions`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = ""))]
pub struct OptionsPatch<E> {
    pub name: Option<String>,
    pub label: Option<String>,
    pub layout: Option<KeyLayout>,
    pub theme: Option<ThemeOverrides>,
    #[serde(skip)]
    pub on_key_press: Option<KeyPressFn>,
    #[serde(skip)]
    pub on_show: Option<NotifyFn>,
    #[serde(skip)]
    pub on_hide: Option<NotifyFn>,
    #[serde(skip)]
    pub padding_target: Option<TargetFn<E>>,
    #[serde(skip)]
    pub viewport_target: Option<TargetFn<E>>,
}

impl<E> Default for OptionsPatch<E> {
    fn default() -> Self {
        Self {
            name: None,
            label: None,
            layout: None,
            theme: None,
            on_key_press: None,
            on_show: None,
            on_hide: None,
            padding_target: None,
            viewport_target: None,
        }
    }
}

impl<E> fmt::Debug for OptionsPatch<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("layout", &self.layout)
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl<E> OptionsPatch<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_layout(mut self, layout: KeyLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_theme(mut self, theme: ThemeOverrides) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_viewport_target(mut self, target: impl Fn() -> Option<E> + 'static) -> Self {
        self.viewport_target = Some(Rc::new(target));
        self
    }

    pub fn with_on_key_press(mut self, callback: impl Fn(char, &KeyPressMeta) + 'static) -> Self {
        self.on_key_press = Some(Rc::new(callback));
        self
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Test 1: Defaults
    #[test]
    fn test_default_options() {
        let options: ConnectionOptions<u32> = ConnectionOptions::new();
        assert_eq!(options.label, "Tap letters to play");
        assert_eq!(options.layout, KeyLayout::default());
        assert!(options.theme.is_none());
        assert!(options.on_key_press.is_none());
    }

    /// Test 2: Patches only overwrite what they set
    #[test]
    fn test_apply_patch() {
        let mut options: ConnectionOptions<u32> = ConnectionOptions::new()
            .name("board")
            .label("Guess");

        options.apply(OptionsPatch::new().with_layout(KeyLayout::from_rows(["A B"])));
        assert_eq!(options.label, "Guess");
        assert_eq!(options.name.as_deref(), Some("board"));
        assert_eq!(options.layout.keys(), vec!["A", "B"]);

        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        options.apply(OptionsPatch::new().with_on_key_press(move |_, _| counter.set(counter.get() + 1)));
        let callback = options.on_key_press.clone().unwrap();
        callback(
            'a',
            &KeyPressMeta {
                source: InputSource::Virtual,
                original: "A".to_string(),
            },
        );
        assert_eq!(hits.get(), 1);
    }

    /// Test 3: Patches deserialize from JSON
    #[test]
    fn test_patch_from_json() {
        let patch: OptionsPatch<u32> = serde_json::from_str(
            r##"{ "label": "Spell it", "layout": { "default": ["X Y"] }, "theme": { "--key-bg": "#222" } }"##,
        )
        .unwrap();

        assert_eq!(patch.label.as_deref(), Some("Spell it"));
        assert_eq!(patch.layout.as_ref().map(KeyLayout::keys), Some(vec!["X".to_string(), "Y".to_string()]));
        assert!(patch.theme.is_some());
        assert!(patch.on_show.is_none());
    }

    /// Test 4: Blank labels fall back to the default text
    #[test]
    fn test_display_label() {
        let options: ConnectionOptions<u32> = ConnectionOptions::new().label("  ");
        assert_eq!(options.display_label(), "Tap letters to play");
        let options: ConnectionOptions<u32> = ConnectionOptions::new().label("Play");
        assert_eq!(options.display_label(), "Play");
    }

    /// Test 5: Connection ids and sources print for logs
    #[test]
    fn test_display_impls() {
        assert_eq!(ConnectionId(7).to_string(), "touch-keyboard-7");
        assert_eq!(InputSource::Virtual.to_string(), "virtual");
    }
}
