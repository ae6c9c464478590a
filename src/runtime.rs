// SPDX-License-Identifier: GPL-3.0-only

//! Task routing between a host and the controllers.
//!
//! [`GameUi`] owns a [`Host`], the [`LetterFitter`] and the
//! [`TouchKeyboard`]. Whatever the host delivers later (timers, frames,
//! events, observer callbacks, widget loads) comes back as a [`Task`] and is
//! passed to [`GameUi::dispatch`], much like an application `update` routing
//! its messages.
//!
//! Keyboard operations go through a [`KeyboardConnection`], a short-lived
//! handle bound to one attached connection:
//!
//! ```rust,ignore
//! let (host, _page) = MemoryHost::game_page();
//! let mut ui = GameUi::install(host, Tuning::default());
//! let board = ui.attach(ConnectionOptions::new().label("Play"));
//! ui.connection(board).show(OptionsPatch::new());
//! ui.flush();
//! ```
//!
//! Callers whose callbacks need to reach back into the UI (a word game
//! hiding the keyboard from `on_key_press`, say) share it through a
//! [`SharedUi`], which holds callbacks back until the UI is released.

use crate::config::Tuning;
use crate::fit::{FitOutcome, LetterFitter};
use crate::host::memory::MemoryHost;
use crate::host::{Host, Task};
use crate::keyboard::{
    ConnectionId, ConnectionOptions, KeyPressMeta, OptionsPatch, PanelPhase, ThemeOverrides,
    TouchKeyboard,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Upper bound on delivery rounds in one [`GameUi::flush`].
const MAX_FLUSH_ROUNDS: usize = 64;

/// The fitter and the keyboard panel running on one host.
pub struct GameUi<H: Host> {
    host: H,
    fitter: LetterFitter<H::Element>,
    keyboard: TouchKeyboard<H::Element>,
}

impl<H: Host> GameUi<H> {
    /// Creates the controllers without touching the page.
    pub fn new(host: H, tuning: Tuning) -> Self {
        Self {
            fitter: LetterFitter::new(&tuning),
            keyboard: TouchKeyboard::new(tuning),
            host,
        }
    }

    /// Creates the controllers and installs both on the page.
    pub fn install(host: H, tuning: Tuning) -> Self {
        let mut ui = Self::new(host, tuning);
        ui.fitter.install(&mut ui.host);
        ui.keyboard.install(&mut ui.host);
        ui
    }

    /// Routes a task delivered by the host.
    pub fn dispatch(&mut self, task: Task) {
        let handled =
            self.fitter.handle(&mut self.host, &task) || self.keyboard.handle(&mut self.host, &task);
        if !handled {
            tracing::trace!("Unrouted task {:?}", task);
        }
        self.sync_fit();
    }

    /// Removes every listener, observer and timer and hides the panel.
    pub fn destroy(&mut self) {
        self.keyboard.destroy(&mut self.host);
        self.fitter.uninstall(&mut self.host);
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    pub fn attach(&mut self, options: ConnectionOptions<H::Element>) -> ConnectionId {
        self.keyboard.attach(options)
    }

    /// Handle for operating one connection.
    pub fn connection(&mut self, id: ConnectionId) -> KeyboardConnection<'_, H> {
        KeyboardConnection { ui: self, id }
    }

    /// Hides the keyboard whichever connection owns it.
    pub fn hide_keyboard(&mut self) -> bool {
        let hidden = self.keyboard.hide_any(&mut self.host);
        self.sync_fit();
        hidden
    }

    /// Flashes a key on the visible keyboard.
    pub fn flash_key(&mut self, c: char) -> bool {
        self.keyboard.flash_key(&mut self.host, c)
    }

    pub fn is_touch_device(&self) -> bool {
        self.keyboard.is_touch_device()
    }

    pub fn phase(&self) -> PanelPhase {
        self.keyboard.phase()
    }

    pub fn keyboard(&self) -> &TouchKeyboard<H::Element> {
        &self.keyboard
    }

    // ========================================================================
    // Fitting
    // ========================================================================

    pub fn fit_all_letter_rows(&mut self) -> usize {
        self.fitter.fit_all_letter_rows(&mut self.host)
    }

    pub fn fit_letters_for(&mut self, row: &H::Element) -> FitOutcome {
        self.fitter.fit_letters_for(&mut self.host, row)
    }

    pub fn fitter(&self) -> &LetterFitter<H::Element> {
        &self.fitter
    }

    // ========================================================================
    // Host Access
    // ========================================================================

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn sync_fit(&mut self) {
        if self.keyboard.take_refit_request() {
            self.fitter.fit_all_letter_rows(&mut self.host);
        }
    }
}

impl GameUi<MemoryHost> {
    /// Delivers ready callbacks and animation frames until the page is idle.
    ///
    /// Returns the number of tasks dispatched.
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_ROUNDS {
            if self.host.is_idle() {
                return delivered;
            }
            for task in self.host.take_ready() {
                self.dispatch(task);
                delivered += 1;
            }
            delivered += self.run_frame();
        }
        tracing::warn!("Page still busy after {} delivery rounds", MAX_FLUSH_ROUNDS);
        delivered
    }

    /// Runs the animation frames requested so far.
    pub fn run_frame(&mut self) -> usize {
        let frames = self.host.take_frames();
        let count = frames.len();
        for task in frames {
            self.dispatch(task);
        }
        count
    }

    /// Moves the virtual clock forward by `ms`, firing due timeouts in order
    /// and flushing after each.
    pub fn advance(&mut self, ms: u64) {
        self.flush();
        let until = self.host.now() + ms;
        while let Some(task) = self.host.pop_due_timer(until) {
            self.dispatch(task);
            self.flush();
        }
        self.host.set_now(until);
    }
}

// ============================================================================
// Shared Access
// ============================================================================

/// The UI was already borrowed by an enclosing [`SharedUi::with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiBusy;

impl fmt::Display for UiBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameUi is busy dispatching")
    }
}

impl std::error::Error for UiBusy {}

type Deferred = Box<dyn FnOnce()>;

/// A [`GameUi`] shared between its owner and the connection callbacks.
///
/// Callbacks wrapped with [`SharedUi::defer_key_press`] or
/// [`SharedUi::defer_notify`] never run while the UI is borrowed. They are
/// queued and run in order when the borrow that raised them ends, so they
/// are free to call [`SharedUi::with`] themselves.
pub struct SharedUi<H: Host> {
    ui: RefCell<GameUi<H>>,
    deferred: RefCell<VecDeque<Deferred>>,
}

impl<H: Host + 'static> SharedUi<H> {
    pub fn new(ui: GameUi<H>) -> Rc<Self> {
        Rc::new(Self {
            ui: RefCell::new(ui),
            deferred: RefCell::new(VecDeque::new()),
        })
    }

    /// Runs `f` on the UI, then every callback raised meanwhile.
    pub fn with<T>(&self, f: impl FnOnce(&mut GameUi<H>) -> T) -> Result<T, UiBusy> {
        let result = {
            let mut ui = self.ui.try_borrow_mut().map_err(|_| UiBusy)?;
            f(&mut ui)
        };
        self.run_deferred();
        Ok(result)
    }

    /// Queues `callback` until the UI is released.
    pub fn defer(&self, callback: impl FnOnce() + 'static) {
        self.deferred.borrow_mut().push_back(Box::new(callback));
    }

    /// Number of callbacks waiting for the UI to be released.
    pub fn deferred_len(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Wraps a key press callback so it runs after the UI is released.
    pub fn defer_key_press<F>(self: &Rc<Self>, callback: F) -> impl Fn(char, &KeyPressMeta) + use<H, F>
    where
        F: Fn(char, &KeyPressMeta) + 'static,
    {
        let shared = Rc::downgrade(self);
        let callback = Rc::new(callback);
        move |c, meta| {
            if let Some(shared) = shared.upgrade() {
                let callback = callback.clone();
                let meta = meta.clone();
                shared.defer(move || callback(c, &meta));
            }
        }
    }

    /// Wraps a show or hide notification so it runs after the UI is
    /// released.
    pub fn defer_notify<F>(self: &Rc<Self>, callback: F) -> impl Fn() + use<H, F>
    where
        F: Fn() + 'static,
    {
        let shared = Rc::downgrade(self);
        let callback = Rc::new(callback);
        move || {
            if let Some(shared) = shared.upgrade() {
                let callback = callback.clone();
                shared.defer(move || callback());
            }
        }
    }

    fn run_deferred(&self) {
        loop {
            let next = self.deferred.borrow_mut().pop_front();
            let Some(callback) = next else {
                break;
            };
            callback();
        }
    }
}

// ============================================================================
// Connection Handle
// ============================================================================

/// Operations of one attached connection.
pub struct KeyboardConnection<'a, H: Host> {
    ui: &'a mut GameUi<H>,
    id: ConnectionId,
}

impl<H: Host> KeyboardConnection<'_, H> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_touch_device(&self) -> bool {
        self.ui.keyboard.is_touch_device()
    }

    /// Shows the keyboard for this connection after merging `patch`.
    pub fn show(&mut self, patch: OptionsPatch<H::Element>) {
        self.ui.keyboard.show(&mut self.ui.host, self.id, patch);
        self.ui.sync_fit();
    }

    /// Hides the keyboard if this connection owns it.
    pub fn hide(&mut self) -> bool {
        let hidden = self.ui.keyboard.hide(&mut self.ui.host, self.id);
        self.ui.sync_fit();
        hidden
    }

    pub fn flash_key(&mut self, c: char) -> bool {
        self.ui.keyboard.flash_key(&mut self.ui.host, c)
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.ui.keyboard.set_label(&mut self.ui.host, self.id, label);
    }

    pub fn set_theme(&mut self, theme: Option<ThemeOverrides>) {
        self.ui.keyboard.set_theme(&mut self.ui.host, self.id, theme);
    }

    pub fn update(&mut self, patch: OptionsPatch<H::Element>) {
        self.ui.keyboard.update(&mut self.ui.host, self.id, patch);
    }

    /// Scrolls `anchor`, or the connection's viewport target, above the
    /// panel.
    pub fn ensure_visible(&mut self, anchor: Option<&H::Element>) -> Option<f64> {
        self.ui
            .keyboard
            .ensure_visible(&mut self.ui.host, Some(self.id), anchor)
    }
}
