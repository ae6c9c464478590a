// SPDX-License-Identifier: GPL-3.0-only

//! Panel theming through inline style properties.
//!
//! A theme is a map of style properties (usually CSS custom properties such
//! as `--touch-key-bg`) to values. A `null` value removes the property.
//! [`AppliedTheme`] remembers every property it set on the panel so that a
//! later theme, or none at all, leaves no stale values behind.

use crate::host::Host;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Style property overrides; `None` removes the property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeOverrides(BTreeMap<String, Option<String>>);

impl ThemeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property value.
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(property.into(), Some(value.into()));
        self
    }

    /// Marks a property for removal.
    pub fn without(mut self, property: impl Into<String>) -> Self {
        self.0.insert(property.into(), None);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0
            .iter()
            .map(|(property, value)| (property.as_str(), value.as_deref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ThemeOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}

/// Properties currently set on the panel by a theme.
#[derive(Debug, Clone, Default)]
pub struct AppliedTheme {
    properties: Vec<String>,
}

impl AppliedTheme {
    /// Applies `theme` to `element`, removing properties set by the previous
    /// theme that the new one does not set.
    pub fn apply<H: Host>(&mut self, host: &mut H, element: &H::Element, theme: Option<&ThemeOverrides>) {
        let mut applied = Vec::new();

        if let Some(theme) = theme {
            for (property, value) in theme.iter() {
                if property.is_empty() {
                    continue;
                }
                match value {
                    Some(value) => {
                        host.set_style(element, property, value);
                        applied.push(property.to_string());
                    }
                    None => host.remove_style(element, property),
                }
            }
        }

        for stale in self.properties.iter().filter(|p| !applied.contains(p)) {
            host.remove_style(element, stale);
        }

        tracing::trace!("Theme applied: {} properties", applied.len());
        self.properties = applied;
    }

    /// Removes every applied property.
    pub fn revert<H: Host>(&mut self, host: &mut H, element: &H::Element) {
        for property in self.properties.drain(..) {
            host.remove_style(element, &property);
        }
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    /// Test 1: Applying tracks set properties and honours removals
    #[test]
    fn test_apply_theme() {
        let (mut host, page) = MemoryHost::game_page();
        host.set_style(&page.panel, "--key-border", "1px");

        let theme = ThemeOverrides::new()
            .with("--key-bg", "#111")
            .with("--key-fg", "#eee")
            .without("--key-border")
            .with("", "ignored");

        let mut applied = AppliedTheme::default();
        applied.apply(&mut host, &page.panel, Some(&theme));

        assert_eq!(host.style(page.panel, "--key-bg"), Some("#111"));
        assert_eq!(host.style(page.panel, "--key-fg"), Some("#eee"));
        assert_eq!(host.style(page.panel, "--key-border"), None);
        assert_eq!(applied.properties(), ["--key-bg", "--key-fg"]);
    }

    /// Test 2: A new theme removes properties the old one set
    #[test]
    fn test_theme_diff() {
        let (mut host, page) = MemoryHost::game_page();
        let mut applied = AppliedTheme::default();

        let first: ThemeOverrides = [("--a", "1"), ("--b", "2")].into_iter().collect();
        applied.apply(&mut host, &page.panel, Some(&first));

        let second: ThemeOverrides = [("--b", "3")].into_iter().collect();
        applied.apply(&mut host, &page.panel, Some(&second));

        assert_eq!(host.style(page.panel, "--a"), None);
        assert_eq!(host.style(page.panel, "--b"), Some("3"));
        assert_eq!(applied.properties(), ["--b"]);

        applied.apply(&mut host, &page.panel, None);
        assert_eq!(host.style(page.panel, "--b"), None);
        assert!(applied.properties().is_empty());
    }

    /// Test 3: Revert clears everything
    #[test]
    fn test_revert() {
        let (mut host, page) = MemoryHost::game_page();
        let mut applied = AppliedTheme::default();
        let theme: ThemeOverrides = [("--a", "1")].into_iter().collect();
        applied.apply(&mut host, &page.panel, Some(&theme));

        applied.revert(&mut host, &page.panel);
        assert_eq!(host.style(page.panel, "--a"), None);
        assert!(applied.properties().is_empty());
    }

    /// Test 4: Null values deserialize as removals
    #[test]
    fn test_theme_json() {
        let theme: ThemeOverrides =
            serde_json::from_str(r##"{ "--key-bg": "#000", "--key-fg": null }"##).unwrap();
        let entries: Vec<_> = theme.iter().collect();
        assert_eq!(entries, vec![("--key-bg", Some("#000")), ("--key-fg", None)]);
    }
}
