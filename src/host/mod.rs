// SPDX-License-Identifier: GPL-3.0-only

//! Host environment abstraction.
//!
//! The fitter and the keyboard panel never touch a page directly. Every
//! lookup, measurement, style mutation, timer, animation frame, event
//! subscription and keyboard-widget load goes through the [`Host`] trait, so
//! the same logic drives a real browser ([`web`], wasm32 only) and the
//! in-memory page model used by tests and the simulator ([`memory`]).
//!
//! # Scheduling Model
//!
//! Hosts never call back into the controllers. Anything deferred (timeouts,
//! animation frames, event listeners, observers, keyboard loads) is described
//! by a [`Task`] that the host hands back to the owner of the controllers,
//! which routes it through [`crate::runtime::GameUi::dispatch`].

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::layout::{FlashKey, KeyboardConfig};
use std::fmt;

// ============================================================================
// Handles
// ============================================================================

/// Handle of a scheduled timeout or animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Handle of a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Generation token of a keyboard widget load request.
///
/// Each `show` takes a fresh ticket; a load result whose ticket no longer
/// matches the pending request is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// A bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its origin and size.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

// ============================================================================
// Events and Tasks
// ============================================================================

/// Where an event listener is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTarget<E> {
    Window,
    Document,
    Element(E),
}

/// Page events the controllers subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEvent {
    Resize,
    OrientationChange,
    DomContentLoaded,
    Click,
}

impl DomEvent {
    /// The DOM event type string.
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Resize => "resize",
            DomEvent::OrientationChange => "orientationchange",
            DomEvent::DomContentLoaded => "DOMContentLoaded",
            DomEvent::Click => "click",
        }
    }
}

/// Deferred work handed back by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Geometry may have changed; request a coalesced reflow.
    ScheduleReflow,
    /// The document structure changed.
    DomMutated,
    /// The coalesced reflow frame arrived.
    Reflow,
    /// Second measurement pass for rows fitted in the previous frame.
    SettleRows,
    /// The document finished loading.
    DocumentReady,
    /// Animation frame after activation: start the reveal transition.
    PanelReveal { epoch: u64 },
    /// Settle timer after reveal: re-run padding, visibility and fitting.
    PanelSettle { epoch: u64 },
    /// Window resized or rotated while the panel is visible.
    PanelViewportChanged,
    /// Close transition finished: hide the panel DOM.
    FinishHide,
    /// A key flash expired.
    Unflash(FlashKey),
    /// A keyboard widget load finished.
    KeyboardLoaded { ticket: LoadTicket, available: bool },
    /// A button of the on-screen keyboard was pressed.
    VirtualKeyPress(String),
    /// The panel's close control was activated.
    CloseRequested,
}

// ============================================================================
// Host Trait
// ============================================================================

/// Capabilities the fitter and the keyboard panel need from their page.
///
/// Lookups return `None` or empty results when nothing matches;
/// measurements of elements that are not laid out return zero. Mutations of
/// detached or unknown elements are ignored.
pub trait Host {
    /// Handle to a page element.
    type Element: Clone + PartialEq + fmt::Debug;

    // ---- lookup -----------------------------------------------------------

    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// First descendant of `scope` (or of the document) matching a CSS selector.
    fn query_selector(&self, scope: Option<&Self::Element>, selector: &str)
    -> Option<Self::Element>;

    /// All descendants of `scope` (or of the document) matching a CSS selector.
    fn query_selector_all(&self, scope: Option<&Self::Element>, selector: &str)
    -> Vec<Self::Element>;

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Number of element children.
    fn child_count(&self, element: &Self::Element) -> usize;

    fn body(&self) -> Option<Self::Element>;

    /// `false` while the document is still loading.
    fn document_ready(&self) -> bool;

    /// Touch events, touch points or a coarse pointer are available.
    fn is_touch_device(&self) -> bool;

    // ---- geometry ---------------------------------------------------------

    fn bounding_rect(&self, element: &Self::Element) -> Rect;

    /// Natural content width, unaffected by transforms.
    fn scroll_width(&self, element: &Self::Element) -> f64;

    fn offset_height(&self, element: &Self::Element) -> f64;

    /// Computed inter-item gap in pixels.
    fn computed_gap(&self, element: &Self::Element) -> f64;

    // ---- mutation ---------------------------------------------------------

    fn set_style(&mut self, element: &Self::Element, property: &str, value: &str);

    fn remove_style(&mut self, element: &Self::Element, property: &str);

    fn add_class(&mut self, element: &Self::Element, class: &str);

    fn remove_class(&mut self, element: &Self::Element, class: &str);

    fn set_attribute(&mut self, element: &Self::Element, name: &str, value: &str);

    fn set_text(&mut self, element: &Self::Element, text: &str);

    /// Smoothly scrolls the window vertically.
    fn scroll_by(&mut self, dy: f64);

    // ---- scheduling -------------------------------------------------------

    fn set_timeout(&mut self, delay_ms: u32, task: Task) -> TimerId;

    fn clear_timeout(&mut self, timer: TimerId);

    fn request_animation_frame(&mut self, task: Task) -> TimerId;

    fn cancel_animation_frame(&mut self, frame: TimerId);

    // ---- events and observation -------------------------------------------

    fn listen(&mut self, target: EventTarget<Self::Element>, event: DomEvent, task: Task)
    -> ListenerId;

    fn unlisten(&mut self, listener: ListenerId);

    /// Whether per-element size observation is available.
    fn supports_size_observation(&self) -> bool;

    /// Delivers `task` whenever `element` changes size.
    fn observe_size(&mut self, element: &Self::Element, task: Task);

    /// Stops size observation of `element`.
    fn unobserve_size(&mut self, element: &Self::Element);

    /// Delivers `task` on any child-list change in the document subtree.
    fn observe_mutations(&mut self, task: Task);

    /// Stops all size and mutation observation.
    fn disconnect_observers(&mut self);

    // ---- keyboard widget --------------------------------------------------

    /// Starts loading the keyboard widget; completion is reported with
    /// [`Task::KeyboardLoaded`] carrying the same ticket.
    fn load_keyboard(&mut self, ticket: LoadTicket);

    /// Applies layout, display labels and button attributes to the widget.
    fn configure_keyboard(&mut self, config: &KeyboardConfig);
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Test 1: Rect edges
    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(10.0, 500.0, 300.0, 260.0);
        assert_eq!(rect.bottom(), 760.0);
        assert_eq!(rect.right(), 310.0);
    }

    /// Test 2: DOM event names
    #[test]
    fn test_event_names() {
        assert_eq!(DomEvent::Resize.name(), "resize");
        assert_eq!(DomEvent::OrientationChange.name(), "orientationchange");
        assert_eq!(DomEvent::DomContentLoaded.name(), "DOMContentLoaded");
        assert_eq!(DomEvent::Click.name(), "click");
    }
}
