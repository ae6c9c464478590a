// SPDX-License-Identifier: GPL-3.0-only

//! Touch keyboard panel controller.
//!
//! [`TouchKeyboard`] owns the bottom panel (`#gameTouchControls`) and the
//! keyboard widget inside it. Any number of connections may be attached, but
//! at most one is active: showing a second connection hides the first, then
//! loads the widget for the new one.
//!
//! # State Machine
//!
//! ```text
//!            show(c)               load ok (ticket current)
//!  Hidden ───────────▶ Pending(c) ─────────────────────────▶ Active(c)
//!    ▲                   │  load failed / stale / hide           │
//!    └───────────────────┘                                       │
//!    ▲                               hide()                      │
//!    └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `show` takes a fresh [`LoadTicket`]. A load result is applied only
//! when its ticket still matches the pending request, so a newer `show` or a
//! `hide` while pending silently discards the older load.
//!
//! # Visibility Sequence
//!
//! Activation unhides the panel DOM immediately, adds `is-active` on the next
//! animation frame (so the CSS transition runs), reserves bottom padding, and
//! after the settle delay re-runs padding, the viewport check and fitting.
//! Deactivation reverses the styling at once and fully hides the DOM after
//! the hide delay, once the close transition has finished.
//!
//! # Fitting Requests
//!
//! The panel changes the space available to letter rows. Instead of calling
//! the fitter itself it raises a flag that the owner collects with
//! [`TouchKeyboard::take_refit_request`].

use super::connection::{ConnectionId, ConnectionOptions, InputSource, KeyPressMeta, OptionsPatch};
use super::flash::FlashTimers;
use super::theme::{AppliedTheme, ThemeOverrides};
use crate::app_settings;
use crate::config::Tuning;
use crate::fit::sizing::format_px;
use crate::host::{DomEvent, EventTarget, Host, ListenerId, LoadTicket, Task, TimerId};
use crate::layout::{FlashKey, KeyboardConfig, normalize_virtual_key};
use std::collections::BTreeMap;

// ============================================================================
// State
// ============================================================================

/// Observable lifecycle phase of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    Hidden,
    /// Waiting for the keyboard widget to load for this connection
    Pending(ConnectionId),
    Active(ConnectionId),
}

/// Page elements the panel works with, resolved once at install.
#[derive(Debug, Clone)]
struct PanelAnchors<E> {
    panel: E,
    label: Option<E>,
    wrapper: Option<E>,
    root: Option<E>,
    container: Option<E>,
    close: Option<E>,
}

impl<E> PanelAnchors<E> {
    fn widget_ready(&self) -> bool {
        self.wrapper.is_some() && self.root.is_some() && self.container.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingShow {
    connection: ConnectionId,
    ticket: LoadTicket,
}

/// The on-screen keyboard panel.
#[derive(Debug)]
pub struct TouchKeyboard<E> {
    tuning: Tuning,
    touch: bool,
    installed: bool,
    anchors: Option<PanelAnchors<E>>,
    close_listener: Option<ListenerId>,

    connections: BTreeMap<ConnectionId, ConnectionOptions<E>>,
    next_connection: u64,
    active: Option<ConnectionId>,
    pending: Option<PendingShow>,
    next_ticket: u64,

    visible: bool,
    /// Bumped on every activation and deactivation; reveal and settle
    /// callbacks from an older epoch are ignored
    epoch: u64,
    hide_timer: Option<TimerId>,
    settle_timer: Option<TimerId>,
    viewport_listeners: Vec<ListenerId>,
    padding_target: Option<E>,
    theme: AppliedTheme,
    flashes: FlashTimers<E>,
    refit_requested: bool,
}

impl<E: Clone + PartialEq + std::fmt::Debug> TouchKeyboard<E> {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            touch: false,
            installed: false,
            anchors: None,
            close_listener: None,
            connections: BTreeMap::new(),
            next_connection: 1,
            active: None,
            pending: None,
            next_ticket: 1,
            visible: false,
            epoch: 0,
            hide_timer: None,
            settle_timer: None,
            viewport_listeners: Vec::new(),
            padding_target: None,
            theme: AppliedTheme::default(),
            flashes: FlashTimers::default(),
            refit_requested: false,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Detects touch support and resolves the panel elements.
    ///
    /// Without a panel element every operation stays a no-op.
    pub fn install<H: Host<Element = E>>(&mut self, host: &mut H) {
        if self.installed {
            return;
        }
        self.installed = true;
        self.touch = host.is_touch_device();

        let Some(panel) = host.element_by_id(app_settings::PANEL_ID) else {
            tracing::warn!(
                "Touch keyboard panel #{} not found; keyboard disabled",
                app_settings::PANEL_ID
            );
            return;
        };

        let scoped = |selector: &str| host.query_selector(Some(&panel), selector);
        let anchors = PanelAnchors {
            label: host.element_by_id(app_settings::LABEL_ID),
            wrapper: scoped(app_settings::KEYBOARD_WRAPPER_SELECTOR),
            root: scoped(app_settings::KEYBOARD_ROOT_SELECTOR),
            container: scoped(app_settings::KEYBOARD_CONTAINER_SELECTOR),
            close: scoped(app_settings::CLOSE_SELECTOR),
            panel,
        };

        if !anchors.widget_ready() {
            tracing::warn!("Touch keyboard widget markup incomplete; show will abort");
        }

        if let Some(close) = &anchors.close {
            self.close_listener = Some(host.listen(
                EventTarget::Element(close.clone()),
                DomEvent::Click,
                Task::CloseRequested,
            ));
        }

        self.anchors = Some(anchors);
        tracing::info!("Touch keyboard installed (touch device: {})", self.touch);
    }

    /// Hides the panel immediately, cancels every timer and listener and
    /// forgets all connections.
    pub fn destroy<H: Host<Element = E>>(&mut self, host: &mut H) {
        self.hide_connection(host, None);
        if self.hide_timer.is_some() {
            self.finish_hide(host);
        }
        if let Some(listener) = self.close_listener.take() {
            host.unlisten(listener);
        }
        if let Some(anchors) = &self.anchors {
            self.theme.revert(host, &anchors.panel);
        }
        self.flashes.clear_all(host);
        self.pending = None;
        self.active = None;
        self.connections.clear();
        self.anchors = None;
        self.installed = false;
        tracing::info!("Touch keyboard destroyed");
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// Registers a connection.
    pub fn attach(&mut self, options: ConnectionOptions<E>) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        tracing::debug!("Attached {}", describe(id, &options));
        self.connections.insert(id, options);
        id
    }

    pub fn options(&self, id: ConnectionId) -> Option<&ConnectionOptions<E>> {
        self.connections.get(&id)
    }

    pub fn is_touch_device(&self) -> bool {
        self.touch
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn active(&self) -> Option<ConnectionId> {
        self.active
    }

    pub fn phase(&self) -> PanelPhase {
        match (self.active, self.pending) {
            (_, Some(pending)) => PanelPhase::Pending(pending.connection),
            (Some(active), None) => PanelPhase::Active(active),
            (None, None) => PanelPhase::Hidden,
        }
    }

    /// Number of keys with a flash in progress.
    pub fn flashing_keys(&self) -> usize {
        self.flashes.len()
    }

    /// `true` once since the last call if letter rows should be refitted.
    pub fn take_refit_request(&mut self) -> bool {
        std::mem::take(&mut self.refit_requested)
    }

    // ========================================================================
    // Show / Hide
    // ========================================================================

    /// Requests the keyboard for `id`.
    ///
    /// The active connection, if different, is hidden first. Label and theme
    /// update at once; the panel opens when the widget load for this request
    /// completes.
    pub fn show<H: Host<Element = E>>(&mut self, host: &mut H, id: ConnectionId, patch: OptionsPatch<E>) {
        if !self.touch {
            tracing::trace!("Not a touch device; show ignored");
            return;
        }
        let Some(anchors) = self.anchors.clone() else {
            return;
        };
        let Some(options) = self.connections.get_mut(&id) else {
            tracing::warn!("show for unknown {}", id);
            return;
        };
        options.apply(patch);

        if let Some(active) = self.active.filter(|active| *active != id) {
            self.hide_connection(host, Some(active));
        }

        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some(PendingShow { connection: id, ticket });

        self.apply_label(host, &anchors, id);
        self.apply_theme(host, &anchors, id);

        if !anchors.widget_ready() {
            tracing::warn!("Keyboard widget markup missing; show aborted");
            self.pending = None;
            return;
        }

        tracing::debug!("Loading keyboard for {} (ticket {})", self.describe(id), ticket);
        host.load_keyboard(ticket);
    }

    /// Hides the keyboard if `id` owns it. Cancels a pending show of `id`.
    pub fn hide<H: Host<Element = E>>(&mut self, host: &mut H, id: ConnectionId) -> bool {
        self.hide_connection(host, Some(id))
    }

    /// Hides the keyboard whichever connection owns it.
    pub fn hide_any<H: Host<Element = E>>(&mut self, host: &mut H) -> bool {
        self.hide_connection(host, None)
    }

    fn hide_connection<H: Host<Element = E>>(&mut self, host: &mut H, who: Option<ConnectionId>) -> bool {
        if self.anchors.is_none() {
            return false;
        }

        if let Some(pending) = self.pending {
            if who.is_none_or(|who| who == pending.connection) {
                tracing::debug!("Cancelled pending show (ticket {})", pending.ticket);
                self.pending = None;
            }
        }

        if let (Some(who), Some(active)) = (who, self.active) {
            if who != active {
                return false;
            }
        }

        if !self.visible {
            if who.is_some() && self.active == who {
                self.active = None;
            }
            return false;
        }

        let active = self.active.take();
        self.pending = None;
        self.deactivate(host, active);
        true
    }

    // ========================================================================
    // Live Updates
    // ========================================================================

    pub fn set_label<H: Host<Element = E>>(&mut self, host: &mut H, id: ConnectionId, label: impl Into<String>) {
        if let Some(options) = self.connections.get_mut(&id) {
            options.label = label.into();
            self.refresh_active(host, id);
        }
    }

    pub fn set_theme<H: Host<Element = E>>(
        &mut self,
        host: &mut H,
        id: ConnectionId,
        theme: Option<ThemeOverrides>,
    ) {
        if let Some(options) = self.connections.get_mut(&id) {
            options.theme = theme;
            self.refresh_active(host, id);
        }
    }

    /// Merges `patch` into the connection's options.
    pub fn update<H: Host<Element = E>>(&mut self, host: &mut H, id: ConnectionId, patch: OptionsPatch<E>) {
        if let Some(options) = self.connections.get_mut(&id) {
            options.apply(patch);
            self.refresh_active(host, id);
        }
    }

    fn refresh_active<H: Host<Element = E>>(&mut self, host: &mut H, id: ConnectionId) {
        if self.active != Some(id) {
            return;
        }
        let Some(anchors) = self.anchors.clone() else {
            return;
        };
        self.apply_label(host, &anchors, id);
        self.apply_theme(host, &anchors, id);
        self.configure_keyboard(host, &anchors, id);
        self.update_padding(host, &anchors, Some(id));
    }

    // ========================================================================
    // Flashing and Viewport
    // ========================================================================

    /// Highlights the button for `c` while the panel is visible.
    ///
    /// Letters match case-insensitively and `' '` is the space button; other
    /// characters are ignored.
    pub fn flash_key<H: Host<Element = E>>(&mut self, host: &mut H, c: char) -> bool {
        if !self.visible {
            return false;
        }
        let Some(wrapper) = self.anchors.as_ref().and_then(|a| a.wrapper.clone()) else {
            return false;
        };
        let Some(key) = FlashKey::for_char(c) else {
            return false;
        };
        let Some(button) = host.query_selector(Some(&wrapper), &key.selector()) else {
            return false;
        };
        self.flashes
            .start(host, key, button, self.tuning.flash_duration_ms);
        true
    }

    /// Scrolls `anchor`, or the connection's viewport target, above the panel.
    ///
    /// Returns the scroll distance when a scroll was needed.
    pub fn ensure_visible<H: Host<Element = E>>(
        &mut self,
        host: &mut H,
        id: Option<ConnectionId>,
        anchor: Option<&E>,
    ) -> Option<f64> {
        if !self.visible {
            return None;
        }
        let panel = self.anchors.as_ref()?.panel.clone();
        let anchor = match anchor {
            Some(anchor) => anchor.clone(),
            None => id
                .and_then(|id| self.connections.get(&id))
                .and_then(|options| options.viewport_target.as_ref())
                .and_then(|target| target())?,
        };

        let anchor_rect = host.bounding_rect(&anchor);
        let panel_rect = host.bounding_rect(&panel);
        if anchor_rect.bottom() > panel_rect.top - self.tuning.cover_threshold_px {
            let offset = anchor_rect.bottom() - panel_rect.top + self.tuning.scroll_extra_px;
            host.scroll_by(offset);
            tracing::trace!("Scrolled {}px to uncover anchor", offset);
            return Some(offset);
        }
        None
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Handles a panel task. Returns `false` for tasks it does not own.
    pub fn handle<H: Host<Element = E>>(&mut self, host: &mut H, task: &Task) -> bool {
        match task {
            Task::KeyboardLoaded { ticket, available } => {
                self.keyboard_loaded(host, *ticket, *available);
            }
            Task::PanelReveal { epoch } => {
                if *epoch == self.epoch && self.visible {
                    self.reveal(host);
                }
            }
            Task::PanelSettle { epoch } => {
                if *epoch == self.epoch && self.visible {
                    self.settle_timer = None;
                    self.settle(host);
                }
            }
            Task::PanelViewportChanged => {
                if let (true, Some(anchors)) = (self.visible, self.anchors.clone()) {
                    self.update_padding(host, &anchors, self.active);
                    self.ensure_visible(host, self.active, None);
                }
            }
            Task::FinishHide => {
                self.hide_timer = None;
                self.finish_hide(host);
            }
            Task::Unflash(key) => {
                self.flashes.expire(host, *key);
            }
            Task::VirtualKeyPress(button) => {
                self.virtual_key_press(host, button);
            }
            Task::CloseRequested => {
                self.hide_any(host);
            }
            _ => return false,
        }
        true
    }

    fn keyboard_loaded<H: Host<Element = E>>(&mut self, host: &mut H, ticket: LoadTicket, available: bool) {
        let Some(pending) = self.pending.filter(|pending| pending.ticket == ticket) else {
            tracing::debug!("Discarded stale keyboard load (ticket {})", ticket);
            return;
        };
        self.pending = None;

        if !available {
            tracing::warn!("Keyboard widget unavailable; {} not shown", self.describe(pending.connection));
            return;
        }
        let Some(anchors) = self.anchors.clone() else {
            return;
        };

        let id = pending.connection;
        self.configure_keyboard(host, &anchors, id);
        self.active = Some(id);
        self.activate(host, &anchors);
        tracing::debug!("Keyboard active for {}", self.describe(id));

        if let Some(on_show) = self.connections.get(&id).and_then(|o| o.on_show.clone()) {
            on_show();
        }
    }

    fn virtual_key_press<H: Host<Element = E>>(&mut self, host: &mut H, button: &str) {
        let Some(active) = self.active else {
            return;
        };
        let Some(key) = normalize_virtual_key(button) else {
            tracing::trace!("Ignored button {:?}", button);
            return;
        };
        if let Some(on_key_press) = self
            .connections
            .get(&active)
            .and_then(|options| options.on_key_press.clone())
        {
            let meta = KeyPressMeta {
                source: InputSource::Virtual,
                original: button.to_string(),
            };
            on_key_press(key.value, &meta);
        }
        self.flash_key(host, key.value);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn activate<H: Host<Element = E>>(&mut self, host: &mut H, anchors: &PanelAnchors<E>) {
        if let Some(timer) = self.hide_timer.take() {
            host.clear_timeout(timer);
        }
        self.visible = true;
        self.epoch += 1;

        reveal_element(host, &anchors.panel);
        if let Some(wrapper) = &anchors.wrapper {
            reveal_element(host, wrapper);
        }
        if let Some(body) = host.body() {
            host.add_class(&body, app_settings::BODY_OPEN_CLASS);
        }

        host.request_animation_frame(Task::PanelReveal { epoch: self.epoch });

        for listener in self.viewport_listeners.drain(..) {
            host.unlisten(listener);
        }
        for event in [DomEvent::Resize, DomEvent::OrientationChange] {
            self.viewport_listeners.push(host.listen(
                EventTarget::Window,
                event,
                Task::PanelViewportChanged,
            ));
        }
    }

    fn reveal<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(anchors) = self.anchors.clone() else {
            return;
        };
        host.add_class(&anchors.panel, app_settings::ACTIVE_CLASS);
        self.update_padding(host, &anchors, self.active);
        if let Some(timer) = self.settle_timer.take() {
            host.clear_timeout(timer);
        }
        self.settle_timer = Some(host.set_timeout(
            self.tuning.settle_delay_ms,
            Task::PanelSettle { epoch: self.epoch },
        ));
    }

    fn settle<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(anchors) = self.anchors.clone() else {
            return;
        };
        self.update_padding(host, &anchors, self.active);
        self.ensure_visible(host, self.active, None);
        self.refit_requested = true;
    }

    fn deactivate<H: Host<Element = E>>(&mut self, host: &mut H, previous: Option<ConnectionId>) {
        let Some(anchors) = self.anchors.clone() else {
            return;
        };
        self.visible = false;
        self.epoch += 1;

        host.set_attribute(&anchors.panel, "aria-hidden", "true");
        host.remove_class(&anchors.panel, app_settings::ACTIVE_CLASS);
        if let Some(body) = host.body() {
            host.remove_class(&body, app_settings::BODY_OPEN_CLASS);
        }
        for listener in self.viewport_listeners.drain(..) {
            host.unlisten(listener);
        }
        if let Some(timer) = self.settle_timer.take() {
            host.clear_timeout(timer);
        }

        self.flashes.clear_all(host);
        clear_flash_classes(host, &anchors);
        self.release_padding(host);
        self.refit_requested = true;

        if let Some(timer) = self.hide_timer.take() {
            host.clear_timeout(timer);
        }
        self.hide_timer = Some(host.set_timeout(self.tuning.hide_delay_ms, Task::FinishHide));

        if let Some(id) = previous {
            tracing::debug!("Keyboard hidden for {}", self.describe(id));
        }
        if let Some(on_hide) = previous
            .and_then(|id| self.connections.get(&id))
            .and_then(|options| options.on_hide.clone())
        {
            on_hide();
        }
    }

    fn finish_hide<H: Host<Element = E>>(&mut self, host: &mut H) {
        if let Some(timer) = self.hide_timer.take() {
            host.clear_timeout(timer);
        }
        if self.visible {
            return;
        }
        let Some(anchors) = &self.anchors else {
            return;
        };
        if let Some(wrapper) = &anchors.wrapper {
            host.add_class(wrapper, app_settings::HIDDEN_CLASS);
            host.set_style(wrapper, "display", "none");
            host.set_attribute(wrapper, "aria-hidden", "true");
        }
        host.add_class(&anchors.panel, app_settings::HIDDEN_CLASS);
        host.set_style(&anchors.panel, "display", "none");
    }

    fn apply_label<H: Host<Element = E>>(&self, host: &mut H, anchors: &PanelAnchors<E>, id: ConnectionId) {
        if let (Some(label), Some(options)) = (&anchors.label, self.connections.get(&id)) {
            host.set_text(label, options.display_label());
        }
    }

    fn apply_theme<H: Host<Element = E>>(&mut self, host: &mut H, anchors: &PanelAnchors<E>, id: ConnectionId) {
        let theme = self
            .connections
            .get(&id)
            .and_then(|options| options.theme.as_ref());
        self.theme.apply(host, &anchors.panel, theme);
    }

    fn configure_keyboard<H: Host<Element = E>>(
        &self,
        host: &mut H,
        anchors: &PanelAnchors<E>,
        id: ConnectionId,
    ) {
        let Some(options) = self.connections.get(&id) else {
            return;
        };
        let config = KeyboardConfig::from_layout(&options.layout);
        host.configure_keyboard(&config);
        clear_flash_classes(host, anchors);
    }

    fn update_padding<H: Host<Element = E>>(
        &mut self,
        host: &mut H,
        anchors: &PanelAnchors<E>,
        id: Option<ConnectionId>,
    ) {
        if !self.visible {
            return;
        }
        let target = id
            .and_then(|id| self.connections.get(&id))
            .and_then(|options| options.padding_target.as_ref())
            .and_then(|target| target())
            .or_else(|| host.query_selector(None, app_settings::DEFAULT_PADDING_TARGET_SELECTOR));

        if self.padding_target.is_some() && self.padding_target != target {
            self.release_padding(host);
        }
        self.padding_target = target.clone();
        let Some(target) = target else {
            return;
        };

        let height = host.offset_height(&anchors.panel).round();
        if height > 0.0 {
            let padding = format_px(height + self.tuning.padding_margin_px);
            host.set_style(&target, "padding-bottom", &padding);
        } else {
            host.remove_style(&target, "padding-bottom");
        }
    }

    fn release_padding<H: Host<Element = E>>(&mut self, host: &mut H) {
        if let Some(target) = self.padding_target.take() {
            host.remove_style(&target, "padding-bottom");
        }
    }

    fn describe(&self, id: ConnectionId) -> String {
        match self.connections.get(&id) {
            Some(options) => describe(id, options),
            None => id.to_string(),
        }
    }
}

fn describe<E>(id: ConnectionId, options: &ConnectionOptions<E>) -> String {
    match &options.name {
        Some(name) => format!("{} ({})", name, id),
        None => id.to_string(),
    }
}

fn reveal_element<H: Host>(host: &mut H, element: &H::Element) {
    host.remove_class(element, app_settings::HIDDEN_CLASS);
    host.remove_style(element, "display");
    host.set_attribute(element, "aria-hidden", "false");
}

fn clear_flash_classes<H: Host>(host: &mut H, anchors: &PanelAnchors<H::Element>) {
    let Some(wrapper) = &anchors.wrapper else {
        return;
    };
    for button in host.query_selector_all(Some(wrapper), app_settings::FLASHING_SELECTOR) {
        host.remove_class(&button, app_settings::FLASHING_CLASS);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;
    use crate::host::memory::{GamePage, MemoryHost, NodeId};
    use crate::layout::KeyLayout;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (MemoryHost, GamePage, TouchKeyboard<NodeId>) {
        let (mut host, page) = MemoryHost::game_page();
        let mut keyboard = TouchKeyboard::new(Tuning::default());
        keyboard.install(&mut host);
        (host, page, keyboard)
    }

    /// Delivers ready callbacks and animation frames until idle.
    fn pump(host: &mut MemoryHost, keyboard: &mut TouchKeyboard<NodeId>) {
        while !host.is_idle() {
            for task in host.take_ready() {
                keyboard.handle(host, &task);
            }
            for task in host.take_frames() {
                keyboard.handle(host, &task);
            }
        }
    }

    /// Fires every timeout due within `ms` of the current time.
    fn advance(host: &mut MemoryHost, keyboard: &mut TouchKeyboard<NodeId>, ms: u64) {
        let until = host.now() + ms;
        while let Some(task) = host.pop_due_timer(until) {
            keyboard.handle(host, &task);
            pump(host, keyboard);
        }
        host.set_now(until);
    }

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn recording(name: &str, events: &Rc<RefCell<Vec<String>>>) -> ConnectionOptions<NodeId> {
        let shown = events.clone();
        let hidden = events.clone();
        let shown_name = format!("{} shown", name);
        let hidden_name = format!("{} hidden", name);
        ConnectionOptions::new()
            .name(name)
            .on_show(move || shown.borrow_mut().push(shown_name.clone()))
            .on_hide(move || hidden.borrow_mut().push(hidden_name.clone()))
    }

    /// Test 1: Show opens the panel once the widget loads
    #[test]
    fn test_show_activates_after_load() {
        let (mut host, page, mut keyboard) = setup();
        let events = log();
        let id = keyboard.attach(recording("a", &events).label("Play"));

        keyboard.show(&mut host, id, OptionsPatch::new());
        assert_eq!(keyboard.phase(), PanelPhase::Pending(id));
        assert_eq!(host.text(page.label), "Play");
        assert!(!keyboard.is_visible());

        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Active(id));
        assert!(keyboard.is_visible());
        assert!(!host.has_class(page.panel, "hidden"));
        assert!(!host.has_class(page.wrapper, "hidden"));
        assert_eq!(host.attribute(page.panel, "aria-hidden"), Some("false"));
        assert!(host.has_class(page.panel, "is-active"));
        assert!(host.has_class(host.body().unwrap(), "game-touch-keyboard-open"));
        assert_eq!(host.style(page.shell, "padding-bottom"), Some("296px"));
        assert_eq!(*events.borrow(), vec!["a shown"]);
    }

    /// Test 2: Non-touch devices ignore show
    #[test]
    fn test_show_ignored_without_touch() {
        let (mut host, page) = MemoryHost::game_page();
        host.set_touch_device(false);
        let mut keyboard = TouchKeyboard::new(Tuning::default());
        keyboard.install(&mut host);
        let id = keyboard.attach(ConnectionOptions::new().label("Play"));

        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert_eq!(host.loads_started(), 0);
        assert_eq!(host.text(page.label), "");
        assert!(host.has_class(page.panel, "hidden"));
    }

    /// Test 3: Missing panel markup disables the keyboard
    #[test]
    fn test_missing_panel() {
        let mut host = MemoryHost::new();
        let mut keyboard = TouchKeyboard::new(Tuning::default());
        keyboard.install(&mut host);
        let id = keyboard.attach(ConnectionOptions::new());

        keyboard.show(&mut host, id, OptionsPatch::new());
        assert_eq!(host.loads_started(), 0);
        assert!(!keyboard.hide(&mut host, id));
        assert!(!keyboard.flash_key(&mut host, 'a'));
    }

    /// Test 4: A failed widget load aborts quietly
    #[test]
    fn test_unavailable_widget() {
        let (mut host, page, mut keyboard) = setup();
        host.set_keyboard_available(false);
        let events = log();
        let id = keyboard.attach(recording("a", &events));

        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert!(host.has_class(page.panel, "hidden"));
        assert!(events.borrow().is_empty());
    }

    /// Test 5: Hide runs the close sequence, then hides the DOM later
    #[test]
    fn test_hide_sequence() {
        let (mut host, page, mut keyboard) = setup();
        let events = log();
        let id = keyboard.attach(recording("a", &events));
        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);
        keyboard.take_refit_request();

        assert!(keyboard.hide(&mut host, id));

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert_eq!(host.attribute(page.panel, "aria-hidden"), Some("true"));
        assert!(!host.has_class(page.panel, "is-active"));
        assert!(!host.has_class(host.body().unwrap(), "game-touch-keyboard-open"));
        assert_eq!(host.style(page.shell, "padding-bottom"), None);
        assert_eq!(host.listener_count(DomEvent::Resize), 0);
        assert!(keyboard.take_refit_request());
        assert_eq!(*events.borrow(), vec!["a shown", "a hidden"]);

        // Still in the DOM until the close transition ends
        assert!(!host.has_class(page.panel, "hidden"));
        advance(&mut host, &mut keyboard, 359);
        assert!(!host.has_class(page.panel, "hidden"));
        advance(&mut host, &mut keyboard, 1);
        assert!(host.has_class(page.panel, "hidden"));
        assert_eq!(host.style(page.panel, "display"), Some("none"));
        assert_eq!(host.style(page.wrapper, "display"), Some("none"));
        assert_eq!(host.attribute(page.wrapper, "aria-hidden"), Some("true"));
    }

    /// Test 6: Hiding an inactive connection is a no-op
    #[test]
    fn test_hide_inactive_connection() {
        let (mut host, _page, mut keyboard) = setup();
        let events = log();
        let a = keyboard.attach(recording("a", &events));
        let b = keyboard.attach(recording("b", &events));

        assert!(!keyboard.hide(&mut host, a));
        assert!(!keyboard.hide_any(&mut host));

        keyboard.show(&mut host, a, OptionsPatch::new());
        pump(&mut host, &mut keyboard);
        assert!(!keyboard.hide(&mut host, b));

        assert_eq!(keyboard.phase(), PanelPhase::Active(a));
        assert_eq!(*events.borrow(), vec!["a shown"]);
    }

    /// Test 7: A second show pre-empts the first
    #[test]
    fn test_show_preempts_active() {
        let (mut host, _page, mut keyboard) = setup();
        let events = log();
        let a = keyboard.attach(recording("a", &events));
        let b = keyboard.attach(recording("b", &events));

        keyboard.show(&mut host, a, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        keyboard.show(&mut host, b, OptionsPatch::new());
        assert_eq!(keyboard.phase(), PanelPhase::Pending(b));
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Active(b));
        assert_eq!(*events.borrow(), vec!["a shown", "a hidden", "b shown"]);

        // Re-activation cancelled the delayed hide
        advance(&mut host, &mut keyboard, 1000);
        assert!(keyboard.is_visible());
        assert_eq!(host.listener_count(DomEvent::Resize), 1);
    }

    /// Test 8: Stale loads are discarded
    #[test]
    fn test_stale_load_discarded() {
        let (mut host, _page, mut keyboard) = setup();
        let events = log();
        let a = keyboard.attach(recording("a", &events));
        let b = keyboard.attach(recording("b", &events));

        keyboard.show(&mut host, a, OptionsPatch::new());
        keyboard.show(&mut host, b, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Active(b));
        assert_eq!(*events.borrow(), vec!["b shown"]);
    }

    /// Test 9: Hide during a pending load cancels it
    #[test]
    fn test_hide_while_pending() {
        let (mut host, page, mut keyboard) = setup();
        let events = log();
        let a = keyboard.attach(recording("a", &events));

        keyboard.show(&mut host, a, OptionsPatch::new());
        assert!(!keyboard.hide(&mut host, a));
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert!(host.has_class(page.panel, "hidden"));
        assert!(events.borrow().is_empty());
    }

    /// Test 10: Flashing requires a visible panel and replaces timers
    #[test]
    fn test_flash_key() {
        let (mut host, page, mut keyboard) = setup();
        let id = keyboard.attach(ConnectionOptions::new());
        assert!(!keyboard.flash_key(&mut host, 'a'));

        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);
        let timers = host.pending_timers();

        assert!(keyboard.flash_key(&mut host, 'q'));
        assert!(keyboard.flash_key(&mut host, 'Q'));
        assert_eq!(keyboard.flashing_keys(), 1);
        assert_eq!(host.pending_timers(), timers + 1);
        assert!(!keyboard.flash_key(&mut host, '7'));
        assert!(!keyboard.flash_key(&mut host, ' '));

        let q = host
            .query_selector(Some(&page.wrapper), ".hg-button[data-letter=\"Q\"]")
            .unwrap();
        assert!(host.has_class(q, "is-flashing"));
        advance(&mut host, &mut keyboard, 180);
        assert!(!host.has_class(q, "is-flashing"));
        assert_eq!(keyboard.flashing_keys(), 0);
    }

    /// Test 11: Virtual presses reach the active connection and flash
    #[test]
    fn test_virtual_key_press() {
        let (mut host, page, mut keyboard) = setup();
        let typed = Rc::new(RefCell::new(Vec::new()));
        let sink = typed.clone();
        let id = keyboard.attach(
            ConnectionOptions::new()
                .layout(KeyLayout::from_rows(["A B", "space {bksp}"]))
                .on_key_press(move |c, meta| sink.borrow_mut().push((c, meta.original.clone()))),
        );
        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        for button in ["A", "space", "{bksp}"] {
            host.tap_key(button);
        }
        pump(&mut host, &mut keyboard);

        assert_eq!(
            *typed.borrow(),
            vec![('a', "A".to_string()), (' ', "space".to_string())]
        );
        let space = host
            .query_selector(Some(&page.wrapper), ".hg-button[data-letter=\"SPACE\"]")
            .unwrap();
        assert!(host.has_class(space, "is-flashing"));
        assert_eq!(keyboard.flashing_keys(), 2);
    }

    /// Test 12: Live updates reach the active panel only
    #[test]
    fn test_live_updates() {
        let (mut host, page, mut keyboard) = setup();
        let a = keyboard.attach(ConnectionOptions::new().label("A"));
        let b = keyboard.attach(ConnectionOptions::new().label("B"));
        keyboard.show(&mut host, a, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        keyboard.set_label(&mut host, b, "ignored");
        assert_eq!(host.text(page.label), "A");

        keyboard.set_label(&mut host, a, "");
        assert_eq!(host.text(page.label), "Tap letters to play");

        let theme = ThemeOverrides::new().with("--touch-key-bg", "#123");
        keyboard.set_theme(&mut host, a, Some(theme));
        assert_eq!(host.style(page.panel, "--touch-key-bg"), Some("#123"));
        keyboard.set_theme(&mut host, a, None);
        assert_eq!(host.style(page.panel, "--touch-key-bg"), None);

        keyboard.update(
            &mut host,
            a,
            OptionsPatch::new().with_layout(KeyLayout::from_rows(["X Y Z"])),
        );
        assert_eq!(host.query_selector_all(Some(&page.wrapper), ".hg-button").len(), 3);
        assert_eq!(keyboard.options(b).map(|o| o.label.as_str()), Some("ignored"));
    }

    /// Test 13: Covered anchors are scrolled into view
    #[test]
    fn test_ensure_visible() {
        let (mut host, page, mut keyboard) = setup();
        let anchor = host.append(page.shell, "div");
        host.set_rect(anchor, Rect::new(0.0, 440.0, 360.0, 80.0));
        let target = anchor;
        let id = keyboard.attach(ConnectionOptions::new().viewport_target(move || Some(target)));

        assert_eq!(keyboard.ensure_visible(&mut host, Some(id), None), None);

        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        // bottom 520 > 500 - 12: scroll 520 - 500 + 24
        assert_eq!(keyboard.ensure_visible(&mut host, Some(id), None), Some(44.0));

        let clear = host.append(page.shell, "div");
        host.set_rect(clear, Rect::new(0.0, 100.0, 360.0, 40.0));
        assert_eq!(keyboard.ensure_visible(&mut host, Some(id), Some(&clear)), None);

        // The settle timer runs the same check
        advance(&mut host, &mut keyboard, 200);
        assert_eq!(host.scrolls(), [44.0, 44.0]);
        assert!(keyboard.take_refit_request());
    }

    /// Test 14: The close control hides the active connection
    #[test]
    fn test_close_control() {
        let (mut host, page, mut keyboard) = setup();
        let events = log();
        let id = keyboard.attach(recording("a", &events));
        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        host.fire_event(EventTarget::Element(page.close), DomEvent::Click);
        pump(&mut host, &mut keyboard);

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert_eq!(*events.borrow(), vec!["a shown", "a hidden"]);
    }

    /// Test 15: Viewport changes refresh padding while visible
    #[test]
    fn test_viewport_change_updates_padding() {
        let (mut host, page, mut keyboard) = setup();
        let id = keyboard.attach(ConnectionOptions::new());
        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);

        host.set_height(page.panel, 300.4);
        host.fire_event(EventTarget::Window, DomEvent::Resize);
        pump(&mut host, &mut keyboard);
        assert_eq!(host.style(page.shell, "padding-bottom"), Some("336px"));
    }

    /// Test 16: Destroy tears everything down
    #[test]
    fn test_destroy() {
        let (mut host, page, mut keyboard) = setup();
        let id = keyboard.attach(
            ConnectionOptions::new().theme(ThemeOverrides::new().with("--a", "1")),
        );
        keyboard.show(&mut host, id, OptionsPatch::new());
        pump(&mut host, &mut keyboard);
        keyboard.flash_key(&mut host, 'a');

        keyboard.destroy(&mut host);

        assert_eq!(keyboard.phase(), PanelPhase::Hidden);
        assert!(host.has_class(page.panel, "hidden"));
        assert_eq!(host.style(page.panel, "--a"), None);
        assert_eq!(host.listener_count(DomEvent::Click), 0);
        assert_eq!(host.listener_count(DomEvent::Resize), 0);
        assert_eq!(host.pending_timers(), 0);
        assert!(keyboard.options(id).is_none());
    }

    /// Test 17: Show overrides can bring a theme and a viewport anchor
    #[test]
    fn test_show_patch_theme_and_anchor() {
        let (mut host, page, mut keyboard) = setup();
        let anchor = host.append(page.shell, "div");
        host.set_rect(anchor, Rect::new(0.0, 470.0, 360.0, 40.0));
        let id = keyboard.attach(ConnectionOptions::new());

        keyboard.show(
            &mut host,
            id,
            OptionsPatch::new()
                .with_theme(ThemeOverrides::new().with("--touch-key-bg", "#1f2933"))
                .with_viewport_target(move || Some(anchor)),
        );
        assert_eq!(host.style(page.panel, "--touch-key-bg"), Some("#1f2933"));
        pump(&mut host, &mut keyboard);
        advance(&mut host, &mut keyboard, 200);

        // bottom 510 > 500 - 12: scroll 510 - 500 + 24
        assert_eq!(host.scrolls(), [34.0]);
        assert!(keyboard.options(id).is_some_and(|o| o.viewport_target.is_some()));
    }
}
