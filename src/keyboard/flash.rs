// SPDX-License-Identifier: GPL-3.0-only

//! Key flash bookkeeping.
//!
//! Typing a letter briefly highlights its button. Each [`FlashKey`] has at
//! most one pending un-flash timer: flashing the same key again cancels the
//! old timer before starting a new one.

use crate::app_settings;
use crate::host::{Host, Task, TimerId};
use crate::layout::FlashKey;
use std::collections::HashMap;

/// Pending un-flash timers keyed by button.
#[derive(Debug)]
pub struct FlashTimers<E> {
    timers: HashMap<FlashKey, (TimerId, E)>,
}

impl<E> Default for FlashTimers<E> {
    fn default() -> Self {
        Self {
            timers: HashMap::new(),
        }
    }
}

impl<E: Clone> FlashTimers<E> {
    /// Highlights `button` for `duration_ms`.
    ///
    /// Returns `true` when an in-flight flash of the same key was replaced.
    pub fn start<H: Host<Element = E>>(
        &mut self,
        host: &mut H,
        key: FlashKey,
        button: E,
        duration_ms: u32,
    ) -> bool {
        let replaced = match self.timers.remove(&key) {
            Some((timer, previous)) => {
                host.clear_timeout(timer);
                host.remove_class(&previous, app_settings::FLASHING_CLASS);
                true
            }
            None => false,
        };

        host.add_class(&button, app_settings::FLASHING_CLASS);
        let timer = host.set_timeout(duration_ms, Task::Unflash(key));
        self.timers.insert(key, (timer, button));
        replaced
    }

    /// Ends the flash of `key` after its timer fired.
    pub fn expire<H: Host<Element = E>>(&mut self, host: &mut H, key: FlashKey) {
        if let Some((_, button)) = self.timers.remove(&key) {
            host.remove_class(&button, app_settings::FLASHING_CLASS);
        }
    }

    /// Cancels every pending timer and removes the highlight.
    pub fn clear_all<H: Host<Element = E>>(&mut self, host: &mut H) {
        for (_, (timer, button)) in self.timers.drain() {
            host.clear_timeout(timer);
            host.remove_class(&button, app_settings::FLASHING_CLASS);
        }
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn contains(&self, key: FlashKey) -> bool {
        self.timers.contains_key(&key)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    /// Test 1: Re-flashing a key replaces its timer
    #[test]
    fn test_single_timer_per_key() {
        let mut host = MemoryHost::new();
        let body = host.body().unwrap();
        let button = host.append(body, "button");
        let mut flashes = FlashTimers::default();

        assert!(!flashes.start(&mut host, FlashKey::Letter('A'), button, 180));
        assert!(flashes.start(&mut host, FlashKey::Letter('A'), button, 180));

        assert_eq!(flashes.len(), 1);
        assert_eq!(host.pending_timers(), 1);
        assert!(host.has_class(button, "is-flashing"));
    }

    /// Test 2: Expiry removes the highlight
    #[test]
    fn test_expire() {
        let mut host = MemoryHost::new();
        let body = host.body().unwrap();
        let button = host.append(body, "button");
        let mut flashes = FlashTimers::default();

        flashes.start(&mut host, FlashKey::Space, button, 180);
        assert_eq!(host.pop_due_timer(100), None);
        let task = host.pop_due_timer(180).unwrap();
        assert_eq!(task, Task::Unflash(FlashKey::Space));

        flashes.expire(&mut host, FlashKey::Space);
        assert!(!host.has_class(button, "is-flashing"));
        assert!(flashes.is_empty());
    }

    /// Test 3: Clearing cancels every timer
    #[test]
    fn test_clear_all() {
        let mut host = MemoryHost::new();
        let body = host.body().unwrap();
        let a = host.append(body, "button");
        let b = host.append(body, "button");
        let mut flashes = FlashTimers::default();

        flashes.start(&mut host, FlashKey::Letter('A'), a, 180);
        flashes.start(&mut host, FlashKey::Letter('B'), b, 180);
        assert!(flashes.contains(FlashKey::Letter('B')));

        flashes.clear_all(&mut host);
        assert!(flashes.is_empty());
        assert_eq!(host.pending_timers(), 0);
        assert!(!host.has_class(a, "is-flashing"));
        assert!(!host.has_class(b, "is-flashing"));
    }
}
