// SPDX-License-Identifier: GPL-3.0-only

//! Browser host on `web-sys` and `gloo`.
//!
//! [`WebHost`] implements [`Host`] against the live document. Deferred work
//! is delivered through an unbounded channel: every gloo timeout, animation
//! frame, event listener and observer callback sends a [`Delivery`], and a
//! `spawn_local` loop feeds them to [`GameUi::dispatch`]. The handles are
//! stored in maps keyed by [`TimerId`]/[`ListenerId`]; dropping a handle
//! cancels it, so `clear_timeout` and `unlisten` are a map removal.
//!
//! The keyboard widget comes from `window.SimpleKeyboardLoader.load()`, a
//! promise resolving to the widget constructor. The widget is created once
//! in the panel's `.simple-keyboard` container and reconfigured with
//! `setOptions` afterwards.
//!
//! [`GameUiHandle`] is the JavaScript-facing facade.

use super::{DomEvent, EventTarget, Host, ListenerId, LoadTicket, Rect, Task, TimerId};
use crate::app_settings;
use crate::config::Tuning;
use crate::fit::sizing::parse_pixels;
use crate::keyboard::{ConnectionId, ConnectionOptions, OptionsPatch, ThemeOverrides};
use crate::layout::KeyboardConfig;
use crate::runtime::{GameUi, SharedUi};
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use gloo::timers::callback::Timeout;
use js_sys::{Array, Function, Object, Promise, Reflect};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    CssStyleDeclaration, Document, Element, HtmlElement, MutationObserver, MutationObserverInit,
    ResizeObserver, ResizeObserverEntry, ScrollBehavior, ScrollToOptions, Window,
};

// ============================================================================
// Deliveries
// ============================================================================

/// A task handed back by the browser.
#[derive(Debug)]
pub struct Delivery {
    /// Timeout or frame that produced the task, released before dispatch
    pub timer: Option<TimerId>,
    pub task: Task,
}

impl Delivery {
    fn task(task: Task) -> Self {
        Self { timer: None, task }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why the keyboard widget could not be loaded or configured.
#[derive(Debug)]
pub enum LoadError {
    /// The panel has no `.simple-keyboard` container
    MissingContainer,
    /// `window.SimpleKeyboardLoader` is not defined
    MissingLoader,
    /// The loader resolved to nothing
    NoConstructor,
    /// The configuration could not be serialized
    Config(serde_json::Error),
    /// A JavaScript exception
    Js(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::MissingContainer => write!(f, "keyboard container not found"),
            LoadError::MissingLoader => write!(f, "SimpleKeyboardLoader is not defined"),
            LoadError::NoConstructor => write!(f, "keyboard loader resolved to nothing"),
            LoadError::Config(e) => write!(f, "keyboard options: {}", e),
            LoadError::Js(message) => write!(f, "JavaScript error: {}", message),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JsValue> for LoadError {
    fn from(value: JsValue) -> Self {
        LoadError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Config(e)
    }
}

// ============================================================================
// Web Host
// ============================================================================

type ResizeCallback = Closure<dyn FnMut(Array)>;
type MutationCallback = Closure<dyn FnMut(Array, MutationObserver)>;

/// [`Host`] backed by the live browser document.
pub struct WebHost {
    window: Window,
    document: Document,
    sender: UnboundedSender<Delivery>,
    next_handle: u64,
    timeouts: HashMap<TimerId, Timeout>,
    frames: HashMap<TimerId, AnimationFrame>,
    listeners: HashMap<ListenerId, EventListener>,
    size_targets: Rc<RefCell<Vec<(Element, Task)>>>,
    resize_observer: Option<(ResizeObserver, ResizeCallback)>,
    mutation_observer: Option<(MutationObserver, MutationCallback)>,
    keyboard: Rc<RefCell<Option<JsValue>>>,
    key_press: Closure<dyn FnMut(JsValue)>,
}

impl WebHost {
    /// Creates a host for the current window. Deliveries go to `sender`.
    pub fn new(sender: UnboundedSender<Delivery>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let key_sender = sender.clone();
        let key_press = Closure::<dyn FnMut(JsValue)>::new(move |button: JsValue| {
            if let Some(button) = button.as_string() {
                let _ = key_sender.unbounded_send(Delivery::task(Task::VirtualKeyPress(button)));
            }
        });

        Ok(Self {
            window,
            document,
            sender,
            next_handle: 1,
            timeouts: HashMap::new(),
            frames: HashMap::new(),
            listeners: HashMap::new(),
            size_targets: Rc::new(RefCell::new(Vec::new())),
            resize_observer: None,
            mutation_observer: None,
            keyboard: Rc::new(RefCell::new(None)),
            key_press,
        })
    }

    /// Forgets a timeout or frame handle after it fired.
    pub fn release(&mut self, timer: TimerId) {
        self.timeouts.remove(&timer);
        self.frames.remove(&timer);
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn style_of(element: &Element) -> Option<CssStyleDeclaration> {
        element.dyn_ref::<HtmlElement>().map(HtmlElement::style)
    }

    fn key_press_fn(&self) -> Function {
        self.key_press.as_ref().unchecked_ref::<Function>().clone()
    }

    fn keyboard_options(&self, config: &KeyboardConfig) -> Result<JsValue, LoadError> {
        let json = serde_json::to_string(config)?;
        let options = js_sys::JSON::parse(&json)?;
        Reflect::set(&options, &"onKeyPress".into(), &self.key_press_fn())?;
        Ok(options)
    }

    fn set_keyboard_options(&self, config: &KeyboardConfig) -> Result<(), LoadError> {
        let Some(keyboard) = self.keyboard.borrow().clone() else {
            return Ok(());
        };
        let options = self.keyboard_options(config)?;
        let set_options = Reflect::get(&keyboard, &"setOptions".into())?.dyn_into::<Function>()?;
        set_options.call1(&keyboard, &options)?;
        Ok(())
    }
}

impl Host for WebHost {
    type Element = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_selector(&self, scope: Option<&Element>, selector: &str) -> Option<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector(selector),
            None => self.document.query_selector(selector),
        };
        found.ok().flatten()
    }

    fn query_selector_all(&self, scope: Option<&Element>, selector: &str) -> Vec<Element> {
        let found = match scope {
            Some(scope) => scope.query_selector_all(selector),
            None => self.document.query_selector_all(selector),
        };
        let Ok(list) = found else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn child_count(&self, element: &Element) -> usize {
        element.child_element_count() as usize
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Into::into)
    }

    fn document_ready(&self) -> bool {
        self.document.ready_state() != "loading"
    }

    fn is_touch_device(&self) -> bool {
        let touch_events = Reflect::has(&self.window, &"ontouchstart".into()).unwrap_or(false);
        let touch_points = self.window.navigator().max_touch_points() > 0;
        let coarse_pointer = self
            .window
            .match_media("(pointer: coarse)")
            .ok()
            .flatten()
            .is_some_and(|query| query.matches());
        touch_events || touch_points || coarse_pointer
    }

    fn bounding_rect(&self, element: &Element) -> Rect {
        let rect = element.get_bounding_client_rect();
        Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn scroll_width(&self, element: &Element) -> f64 {
        f64::from(element.scroll_width())
    }

    fn offset_height(&self, element: &Element) -> f64 {
        element
            .dyn_ref::<HtmlElement>()
            .map(|html| f64::from(html.offset_height()))
            .unwrap_or(0.0)
    }

    fn computed_gap(&self, element: &Element) -> f64 {
        self.window
            .get_computed_style(element)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("column-gap").ok())
            .and_then(|value| parse_pixels(&value))
            .unwrap_or(0.0)
    }

    fn set_style(&mut self, element: &Element, property: &str, value: &str) {
        if let Some(style) = Self::style_of(element) {
            let _ = style.set_property(property, value);
        }
    }

    fn remove_style(&mut self, element: &Element, property: &str) {
        if let Some(style) = Self::style_of(element) {
            let _ = style.remove_property(property);
        }
    }

    fn add_class(&mut self, element: &Element, class: &str) {
        let _ = element.class_list().add_1(class);
    }

    fn remove_class(&mut self, element: &Element, class: &str) {
        let _ = element.class_list().remove_1(class);
    }

    fn set_attribute(&mut self, element: &Element, name: &str, value: &str) {
        let _ = element.set_attribute(name, value);
    }

    fn set_text(&mut self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn scroll_by(&mut self, dy: f64) {
        let options = ScrollToOptions::new();
        options.set_top(dy);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_by_with_scroll_to_options(&options);
    }

    fn set_timeout(&mut self, delay_ms: u32, task: Task) -> TimerId {
        let id = TimerId(self.next_handle());
        let sender = self.sender.clone();
        let timeout = Timeout::new(delay_ms, move || {
            let _ = sender.unbounded_send(Delivery {
                timer: Some(id),
                task,
            });
        });
        self.timeouts.insert(id, timeout);
        id
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        self.timeouts.remove(&timer);
    }

    fn request_animation_frame(&mut self, task: Task) -> TimerId {
        let id = TimerId(self.next_handle());
        let sender = self.sender.clone();
        let frame = request_animation_frame(move |_timestamp| {
            let _ = sender.unbounded_send(Delivery {
                timer: Some(id),
                task,
            });
        });
        self.frames.insert(id, frame);
        id
    }

    fn cancel_animation_frame(&mut self, frame: TimerId) {
        self.frames.remove(&frame);
    }

    fn listen(&mut self, target: EventTarget<Element>, event: DomEvent, task: Task) -> ListenerId {
        let id = ListenerId(self.next_handle());
        let sender = self.sender.clone();
        let callback = move |_: &web_sys::Event| {
            let _ = sender.unbounded_send(Delivery::task(task.clone()));
        };
        let listener = match &target {
            EventTarget::Window => EventListener::new(&self.window, event.name(), callback),
            EventTarget::Document => EventListener::new(&self.document, event.name(), callback),
            EventTarget::Element(element) => EventListener::new(element, event.name(), callback),
        };
        self.listeners.insert(id, listener);
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn supports_size_observation(&self) -> bool {
        Reflect::has(&self.window, &"ResizeObserver".into()).unwrap_or(false)
    }

    fn observe_size(&mut self, element: &Element, task: Task) {
        if !self.supports_size_observation() {
            return;
        }
        if self.resize_observer.is_none() {
            let targets = self.size_targets.clone();
            let sender = self.sender.clone();
            let callback = Closure::<dyn FnMut(Array)>::new(move |entries: Array| {
                let targets = targets.borrow();
                let mut sent: Vec<&Task> = Vec::new();
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<ResizeObserverEntry>() else {
                        continue;
                    };
                    let target = entry.target();
                    for (element, task) in targets.iter() {
                        if *element == target && !sent.contains(&task) {
                            let _ = sender.unbounded_send(Delivery::task(task.clone()));
                            sent.push(task);
                        }
                    }
                }
            });
            match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
                Ok(observer) => self.resize_observer = Some((observer, callback)),
                Err(e) => {
                    tracing::warn!("ResizeObserver unavailable: {:?}", e);
                    return;
                }
            }
        }
        if let Some((observer, _)) = &self.resize_observer {
            let mut targets = self.size_targets.borrow_mut();
            if !targets.iter().any(|(observed, _)| observed == element) {
                observer.observe(element);
                targets.push((element.clone(), task));
            }
        }
    }

    fn unobserve_size(&mut self, element: &Element) {
        if let Some((observer, _)) = &self.resize_observer {
            observer.unobserve(element);
        }
        self.size_targets
            .borrow_mut()
            .retain(|(observed, _)| observed != element);
    }

    fn observe_mutations(&mut self, task: Task) {
        let Some(root) = self.document.document_element() else {
            return;
        };
        let sender = self.sender.clone();
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(
            move |_records: Array, _observer: MutationObserver| {
                let _ = sender.unbounded_send(Delivery::task(task.clone()));
            },
        );
        let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                tracing::warn!("MutationObserver unavailable: {:?}", e);
                return;
            }
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if observer.observe_with_options(&root, &init).is_ok() {
            if let Some((previous, _)) = self.mutation_observer.replace((observer, callback)) {
                previous.disconnect();
            }
        }
    }

    fn disconnect_observers(&mut self) {
        if let Some((observer, _)) = self.resize_observer.take() {
            observer.disconnect();
        }
        if let Some((observer, _)) = self.mutation_observer.take() {
            observer.disconnect();
        }
        self.size_targets.borrow_mut().clear();
    }

    fn load_keyboard(&mut self, ticket: LoadTicket) {
        let selector = format!(
            "#{} {}",
            app_settings::PANEL_ID,
            app_settings::KEYBOARD_CONTAINER_SELECTOR
        );
        let container = self.query_selector(None, &selector);
        let window = self.window.clone();
        let slot = self.keyboard.clone();
        let sender = self.sender.clone();
        let initial = self.keyboard_options(&KeyboardConfig::from_layout(&Default::default()));

        spawn_local(async move {
            let result = match initial {
                Ok(options) => create_keyboard(window, container, slot, options).await,
                Err(e) => Err(e),
            };
            let available = match result {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Keyboard load {} failed: {}", ticket, e);
                    false
                }
            };
            let _ = sender.unbounded_send(Delivery::task(Task::KeyboardLoaded { ticket, available }));
        });
    }

    fn configure_keyboard(&mut self, config: &KeyboardConfig) {
        if let Err(e) = self.set_keyboard_options(config) {
            tracing::warn!("Keyboard configuration failed: {}", e);
        }
    }
}

/// Resolves the widget constructor and creates the widget once.
async fn create_keyboard(
    window: Window,
    container: Option<Element>,
    slot: Rc<RefCell<Option<JsValue>>>,
    options: JsValue,
) -> Result<(), LoadError> {
    let container = container.ok_or(LoadError::MissingContainer)?;

    let loader = Reflect::get(&window, &"SimpleKeyboardLoader".into())?;
    if loader.is_undefined() || loader.is_null() {
        return Err(LoadError::MissingLoader);
    }
    let load = Reflect::get(&loader, &"load".into())?.dyn_into::<Function>()?;
    let promise = load.call0(&loader)?.dyn_into::<Promise>()?;
    let constructor = JsFuture::from(promise).await?;
    if constructor.is_undefined() || constructor.is_null() {
        return Err(LoadError::NoConstructor);
    }
    let constructor = constructor.dyn_into::<Function>()?;

    if slot.borrow().is_none() {
        let args = Array::of2(&container, &options);
        let keyboard = Reflect::construct(&constructor, &args)?;
        slot.replace(Some(keyboard));
    }
    Ok(())
}

// ============================================================================
// JavaScript Facade
// ============================================================================

/// Page-level entry point exported to JavaScript.
///
/// Connection callbacks run after the call or delivery that raised them has
/// released the UI, so they may call back into the handle freely.
///
/// ```js
/// const ui = new GameUiHandle();
/// const id = ui.attach('{"label":"Play"}', (ch, meta) => game.type(ch), null, null,
///                      null, () => document.querySelector('.board'));
/// ui.show(id, null);
/// ```
#[wasm_bindgen]
pub struct GameUiHandle {
    shared: Rc<SharedUi<WebHost>>,
}

#[wasm_bindgen]
impl GameUiHandle {
    /// Installs the fitter and the keyboard on the current page.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<GameUiHandle, JsValue> {
        console_error_panic_hook::set_once();

        let tuning = match tuning_json {
            Some(json) => Tuning::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => Tuning::default(),
        };
        let (sender, receiver) = unbounded();
        let host = WebHost::new(sender)?;
        let shared = SharedUi::new(GameUi::install(host, tuning));
        spawn_local(dispatch_loop(Rc::downgrade(&shared), receiver));
        Ok(Self { shared })
    }

    /// Attaches a connection. `options_json` may set `name`, `label`,
    /// `layout` and `theme`. `padding_target` and `viewport_target` are
    /// called with no arguments and should return an element or `null`.
    pub fn attach(
        &self,
        options_json: Option<String>,
        on_key_press: Option<Function>,
        on_show: Option<Function>,
        on_hide: Option<Function>,
        padding_target: Option<Function>,
        viewport_target: Option<Function>,
    ) -> Result<u32, JsValue> {
        let mut options = ConnectionOptions::new();
        options.apply(parse_patch(options_json)?);

        if let Some(callback) = on_key_press {
            options = options.on_key_press(self.shared.defer_key_press(move |c, meta| {
                let meta_object = Object::new();
                let source = meta.source.to_string();
                let _ = Reflect::set(&meta_object, &"source".into(), &source.as_str().into());
                let _ = Reflect::set(&meta_object, &"original".into(), &meta.original.as_str().into());
                report_callback("onKeyPress", callback.call2(&JsValue::NULL, &c.to_string().into(), &meta_object));
            }));
        }
        if let Some(callback) = on_show {
            options = options.on_show(self.shared.defer_notify(move || {
                report_callback("onShow", callback.call0(&JsValue::NULL));
            }));
        }
        if let Some(callback) = on_hide {
            options = options.on_hide(self.shared.defer_notify(move || {
                report_callback("onHide", callback.call0(&JsValue::NULL));
            }));
        }
        if let Some(target) = padding_target {
            options = options.padding_target(move || element_from(&target));
        }
        if let Some(target) = viewport_target {
            options = options.viewport_target(move || element_from(&target));
        }

        let id = self.with(|ui| ui.attach(options))?;
        u32::try_from(id.0).map_err(|_| JsValue::from_str("connection id overflow"))
    }

    pub fn show(&self, id: u32, overrides_json: Option<String>) -> Result<(), JsValue> {
        let patch = parse_patch(overrides_json)?;
        self.with(|ui| ui.connection(connection_id(id)).show(patch))
    }

    pub fn hide(&self, id: u32) -> Result<bool, JsValue> {
        self.with(|ui| ui.connection(connection_id(id)).hide())
    }

    pub fn update(&self, id: u32, overrides_json: Option<String>) -> Result<(), JsValue> {
        let patch = parse_patch(overrides_json)?;
        self.with(|ui| ui.connection(connection_id(id)).update(patch))
    }

    pub fn set_label(&self, id: u32, label: String) -> Result<(), JsValue> {
        self.with(|ui| ui.connection(connection_id(id)).set_label(label))
    }

    /// Replaces the theme overrides. `null` removes every override.
    pub fn set_theme(&self, id: u32, theme_json: Option<String>) -> Result<(), JsValue> {
        let theme = match theme_json {
            Some(json) => Some(
                serde_json::from_str::<ThemeOverrides>(&json)
                    .map_err(|e| JsValue::from_str(&format!("invalid theme: {}", e)))?,
            ),
            None => None,
        };
        self.with(|ui| ui.connection(connection_id(id)).set_theme(theme))
    }

    /// Scrolls `anchor`, or the connection's viewport target, above the panel.
    pub fn ensure_visible(&self, id: u32, anchor: Option<Element>) -> Result<(), JsValue> {
        self.with(|ui| {
            ui.connection(connection_id(id)).ensure_visible(anchor.as_ref());
        })
    }

    pub fn hide_keyboard(&self) -> Result<bool, JsValue> {
        self.with(|ui| ui.hide_keyboard())
    }

    /// Flashes the key for the first character of `key`.
    pub fn flash_key(&self, key: &str) -> Result<bool, JsValue> {
        let Some(c) = key.chars().next() else {
            return Ok(false);
        };
        self.with(|ui| ui.flash_key(c))
    }

    pub fn fit_all_letter_rows(&self) -> Result<u32, JsValue> {
        let rows = self.with(|ui| ui.fit_all_letter_rows())?;
        Ok(u32::try_from(rows).unwrap_or(u32::MAX))
    }

    pub fn is_touch_device(&self) -> Result<bool, JsValue> {
        self.with(|ui| ui.is_touch_device())
    }

    pub fn destroy(&self) -> Result<(), JsValue> {
        self.with(|ui| ui.destroy())
    }

    fn with<T>(&self, f: impl FnOnce(&mut GameUi<WebHost>) -> T) -> Result<T, JsValue> {
        self.shared
            .with(f)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

fn connection_id(id: u32) -> ConnectionId {
    ConnectionId(u64::from(id))
}

fn element_from(target: &Function) -> Option<Element> {
    target
        .call0(&JsValue::NULL)
        .ok()
        .and_then(|value| value.dyn_into::<Element>().ok())
}

fn report_callback(name: &str, result: Result<JsValue, JsValue>) {
    if let Err(e) = result {
        tracing::warn!("{} callback threw: {:?}", name, e);
    }
}

fn parse_patch(json: Option<String>) -> Result<OptionsPatch<Element>, JsValue> {
    match json {
        Some(json) => {
            serde_json::from_str(&json).map_err(|e| JsValue::from_str(&format!("invalid options: {}", e)))
        }
        None => Ok(OptionsPatch::new()),
    }
}

/// Routes deliveries to the UI until the handle is dropped.
async fn dispatch_loop(shared: Weak<SharedUi<WebHost>>, mut receiver: UnboundedReceiver<Delivery>) {
    while let Some(delivery) = receiver.next().await {
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let Delivery { timer, task } = delivery;
        let dispatched = shared.with(|ui| {
            if let Some(timer) = timer {
                ui.host_mut().release(timer);
            }
            ui.dispatch(task);
        });
        if let Err(e) = dispatched {
            tracing::warn!("Dropped delivery: {}", e);
        }
    }
    tracing::debug!("Dispatch loop ended");
}

// ============================================================================
// Browser Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn host() -> (WebHost, Element) {
        let (sender, _receiver) = unbounded();
        let host = WebHost::new(sender).unwrap();
        let body = host.body().unwrap();
        let board = host.document.create_element("div").unwrap();
        body.append_child(&board).unwrap();
        (host, board)
    }

    /// Test 1: Scoped queries return every match in document order
    #[wasm_bindgen_test]
    fn test_query_selector_all() {
        let (host, board) = host();
        board.set_inner_html(
            r#"<div class="letter-row"><span>A</span></div><p></p><div class="letter-row"></div>"#,
        );

        let rows = host.query_selector_all(Some(&board), ".letter-row");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text_content().as_deref(), Some("A"));
        assert!(host.query_selector_all(Some(&board), "[data-missing]").is_empty());
        assert!(host.query_selector_all(Some(&board), "!!").is_empty());
        board.remove();
    }

    /// Test 2: The computed column gap is read in pixels
    #[wasm_bindgen_test]
    fn test_computed_gap() {
        let (mut host, board) = host();
        board.set_inner_html(r#"<div class="letter-row" style="display: flex"></div>"#);
        let row = host.query_selector(Some(&board), ".letter-row").unwrap();

        host.set_style(&row, "column-gap", "6px");
        assert_eq!(host.computed_gap(&row), 6.0);
        host.remove_style(&row, "column-gap");
        assert_eq!(host.computed_gap(&row), 0.0);
        board.remove();
    }

    /// Test 3: Unobserved elements are forgotten
    #[wasm_bindgen_test]
    fn test_unobserve_size() {
        let (mut host, board) = host();
        host.observe_size(&board, Task::ScheduleReflow);
        host.observe_size(&board, Task::ScheduleReflow);
        assert_eq!(host.size_targets.borrow().len(), 1);

        host.unobserve_size(&board);
        assert!(host.size_targets.borrow().is_empty());
        board.remove();
    }
}
