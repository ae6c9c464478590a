// SPDX-License-Identifier: GPL-3.0-only

//! In-memory page model implementing [`Host`].
//!
//! `MemoryHost` keeps a small element tree with classes, attributes, inline
//! styles and explicit geometry, a virtual clock for timeouts and animation
//! frames, event listeners, size and mutation observers, and an emulated
//! keyboard widget that renders `button.hg-button` elements from a
//! [`KeyboardConfig`].
//!
//! # Layout Model
//!
//! Geometry is deliberately simple:
//!
//! - an element's bounding rect is whatever [`MemoryHost::set_rect`] gave it
//!   (all zero while it or an ancestor is hidden);
//! - a leaf's natural width is set with [`MemoryHost::set_natural_width`];
//! - a parent's natural width is the sum of its visible children plus the
//!   computed `column-gap` between each pair.
//!
//! Transforms never change the natural width, exactly like `scrollWidth`;
//! [`MemoryHost::rendered_width`] applies the scale for assertions.
//!
//! # Driving
//!
//! Nothing runs on its own. Callbacks land in a ready queue
//! ([`MemoryHost::take_ready`]), frames wait for [`MemoryHost::take_frames`],
//! and timeouts fire through [`MemoryHost::pop_due_timer`].
//! [`crate::runtime::GameUi`] wraps these into `flush`, `run_frame` and
//! `advance`.

use super::{DomEvent, EventTarget, Host, ListenerId, LoadTicket, Rect, Task, TimerId};
use crate::app_settings;
use crate::fit::sizing::{parse_pixels, parse_scale};
use crate::layout::KeyboardConfig;
use std::collections::{BTreeMap, VecDeque};

/// Handle of an element in a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    rect: Rect,
    natural_width: f64,
    base_gap: f64,
    height: f64,
}

/// Elements of the standard game page built by [`MemoryHost::game_page`].
#[derive(Debug, Clone, Copy)]
pub struct GamePage {
    /// `main.game-shell`, the default padding target
    pub shell: NodeId,
    /// `#gameTouchControls`
    pub panel: NodeId,
    /// `#gameTouchLabel`
    pub label: NodeId,
    /// `[data-touch-close]`
    pub close: NodeId,
    /// `[data-virtual-keyboard]`
    pub wrapper: NodeId,
    /// `[data-keyboard-root]`
    pub root: NodeId,
    /// `.simple-keyboard`
    pub container: NodeId,
}

/// In-memory [`Host`] for tests and headless runs.
#[derive(Debug)]
pub struct MemoryHost {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    loading: bool,
    touch: bool,
    size_observation: bool,
    keyboard_available: bool,
    keyboard_config: Option<KeyboardConfig>,
    loads_started: usize,
    now: u64,
    next_handle: u64,
    timers: BTreeMap<(u64, u64), (TimerId, Task)>,
    frames: Vec<(TimerId, Task)>,
    listeners: BTreeMap<ListenerId, (EventTarget<NodeId>, DomEvent, Task)>,
    size_observed: Vec<(NodeId, Task)>,
    mutation_task: Option<Task>,
    ready: VecDeque<Task>,
    scroll_y: f64,
    scrolls: Vec<f64>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates an empty document (`html > body`) on a touch device with the
    /// keyboard widget available and size observation supported.
    pub fn new() -> Self {
        let mut host = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            loading: false,
            touch: true,
            size_observation: true,
            keyboard_available: true,
            keyboard_config: None,
            loads_started: 0,
            now: 0,
            next_handle: 1,
            timers: BTreeMap::new(),
            frames: Vec::new(),
            listeners: BTreeMap::new(),
            size_observed: Vec::new(),
            mutation_task: None,
            ready: VecDeque::new(),
            scroll_y: 0.0,
            scrolls: Vec::new(),
        };
        host.root = host.create_element("html");
        host.body = host.create_element("body");
        host.nodes[host.body.0].parent = Some(host.root);
        host.nodes[host.root.0].children.push(host.body);
        host
    }

    /// Builds a 360x760 game page with a `.game-shell` and the touch panel
    /// markup. The panel starts hidden and occupies the bottom 260px once
    /// shown.
    pub fn game_page() -> (Self, GamePage) {
        let mut host = Self::new();
        let body = host.body;
        host.set_rect(body, Rect::new(0.0, 0.0, 360.0, 760.0));

        let shell = host.append(body, "main");
        host.add_class(&shell, "game-shell");
        host.set_rect(shell, Rect::new(0.0, 0.0, 360.0, 760.0));

        let panel = host.append(body, "section");
        host.set_id(panel, app_settings::PANEL_ID);
        host.add_class(&panel, app_settings::HIDDEN_CLASS);
        host.set_attribute(&panel, "aria-hidden", "true");
        host.set_rect(panel, Rect::new(0.0, 500.0, 360.0, 260.0));
        host.set_height(panel, 260.0);

        let label = host.append(panel, "p");
        host.set_id(label, app_settings::LABEL_ID);

        let close = host.append(panel, "button");
        host.set_attribute(&close, "data-touch-close", "");

        let wrapper = host.append(panel, "div");
        host.set_attribute(&wrapper, "data-virtual-keyboard", "");
        host.add_class(&wrapper, app_settings::HIDDEN_CLASS);

        let root = host.append(wrapper, "div");
        host.set_attribute(&root, "data-keyboard-root", "");

        let container = host.append(root, "div");
        host.add_class(&container, "simple-keyboard");

        // Building the page is not a mutation anyone observes.
        host.ready.clear();

        let page = GamePage {
            shell,
            panel,
            label,
            close,
            wrapper,
            root,
            container,
        };
        (host, page)
    }

    // ========================================================================
    // Building the Tree
    // ========================================================================

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_ascii_lowercase(),
            ..Node::default()
        });
        id
    }

    /// Creates an element and appends it to `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let child = self.create_element(tag);
        self.append_child(parent, child);
        child
    }

    /// Moves `child` under `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.record_mutation();
    }

    /// Removes an element from the tree.
    pub fn remove(&mut self, node: NodeId) {
        self.detach(node);
        self.record_mutation();
    }

    /// Appends a `.letter-row` with one span per letter.
    pub fn letter_row(&mut self, parent: NodeId, letters: &str, glyph_width: f64, gap: f64) -> NodeId {
        let row = self.append(parent, "div");
        self.add_class(&row, "letter-row");
        self.set_base_gap(row, gap);
        for letter in letters.chars() {
            let span = self.append(row, "span");
            self.nodes[span.0].text = letter.to_string();
            self.set_natural_width(span, glyph_width);
        }
        row
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.nodes[node.0].id = Some(id.to_string());
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].rect = rect;
    }

    /// Sets the intrinsic width of a leaf element.
    pub fn set_natural_width(&mut self, node: NodeId, width: f64) {
        self.nodes[node.0].natural_width = width;
    }

    /// Sets the stylesheet `column-gap` of an element.
    pub fn set_base_gap(&mut self, node: NodeId, gap: f64) {
        self.nodes[node.0].base_gap = gap;
    }

    /// Sets the layout height reported by `offset_height` while displayed.
    pub fn set_height(&mut self, node: NodeId, height: f64) {
        self.nodes[node.0].height = height;
    }

    /// Changes an element's width and notifies size observers.
    pub fn resize(&mut self, node: NodeId, width: f64) {
        self.nodes[node.0].rect.width = width;
        let tasks: Vec<Task> = self
            .size_observed
            .iter()
            .filter(|(observed, _)| *observed == node)
            .map(|(_, task)| task.clone())
            .collect();
        for task in tasks {
            self.push_ready(task);
        }
    }

    // ========================================================================
    // Environment Switches
    // ========================================================================

    pub fn set_touch_device(&mut self, touch: bool) {
        self.touch = touch;
    }

    pub fn set_size_observation(&mut self, supported: bool) {
        self.size_observation = supported;
    }

    /// Makes keyboard loads succeed or fail.
    pub fn set_keyboard_available(&mut self, available: bool) {
        self.keyboard_available = available;
    }

    /// Marks the document as still loading.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Ends loading and fires `DOMContentLoaded`.
    pub fn finish_loading(&mut self) {
        self.loading = false;
        self.fire_event(EventTarget::Document, DomEvent::DomContentLoaded);
    }

    /// Fires an event at every matching listener.
    pub fn fire_event(&mut self, target: EventTarget<NodeId>, event: DomEvent) {
        let tasks: Vec<Task> = self
            .listeners
            .values()
            .filter(|(t, e, _)| *t == target && *e == event)
            .map(|(_, _, task)| task.clone())
            .collect();
        for task in tasks {
            self.ready.push_back(task);
        }
    }

    /// Presses a rendered keyboard button. Ignored until the widget exists.
    pub fn tap_key(&mut self, button: &str) {
        if self.keyboard_config.is_some() {
            self.ready.push_back(Task::VirtualKeyPress(button.to_string()));
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.nodes[node.0].style.get(property).map(String::as_str)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    /// Natural width multiplied by the element's scale transform.
    pub fn rendered_width(&self, node: NodeId) -> f64 {
        let scale = self
            .style(node, "transform")
            .and_then(parse_scale)
            .unwrap_or(1.0);
        self.scroll_width(&node) * scale
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of listeners registered for an event type.
    pub fn listener_count(&self, event: DomEvent) -> usize {
        self.listeners
            .values()
            .filter(|(_, e, _)| *e == event)
            .count()
    }

    /// Number of elements under size observation.
    pub fn observed_count(&self) -> usize {
        self.size_observed.len()
    }

    pub fn observes_mutations(&self) -> bool {
        self.mutation_task.is_some()
    }

    /// Every `scroll_by` distance, in call order.
    pub fn scrolls(&self) -> &[f64] {
        &self.scrolls
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    /// Configuration of the emulated keyboard widget, once created.
    pub fn keyboard_config(&self) -> Option<&KeyboardConfig> {
        self.keyboard_config.as_ref()
    }

    pub fn loads_started(&self) -> usize {
        self.loads_started
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Takes every delivered callback (events, observers, keyboard loads).
    pub fn take_ready(&mut self) -> Vec<Task> {
        self.ready.drain(..).collect()
    }

    /// Takes the tasks of every requested animation frame.
    pub fn take_frames(&mut self) -> Vec<Task> {
        self.frames.drain(..).map(|(_, task)| task).collect()
    }

    /// Removes the earliest timeout due at or before `until`, moving the
    /// clock to its due time.
    pub fn pop_due_timer(&mut self, until: u64) -> Option<Task> {
        let key = *self.timers.keys().next()?;
        if key.0 > until {
            return None;
        }
        let (_, task) = self.timers.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(task)
    }

    /// Moves the clock forward without firing anything.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// `true` when no callback or frame is waiting.
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.frames.is_empty()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn push_ready(&mut self, task: Task) {
        if !self.ready.contains(&task) {
            self.ready.push_back(task);
        }
    }

    fn record_mutation(&mut self) {
        if let Some(task) = self.mutation_task.clone() {
            self.push_ready(task);
        }
    }

    fn is_displayed(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id.0];
            if n.style.get("display").is_some_and(|d| d == "none")
                || n.classes.iter().any(|c| c == app_settings::HIDDEN_CLASS)
            {
                return false;
            }
            current = n.parent;
        }
        true
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn matches(&self, node: NodeId, selector: &CompoundSelector) -> bool {
        let n = &self.nodes[node.0];
        if selector.tag.as_deref().is_some_and(|tag| !n.tag.eq_ignore_ascii_case(tag)) {
            return false;
        }
        if selector.id.is_some() && n.id != selector.id {
            return false;
        }
        if !selector
            .classes
            .iter()
            .all(|class| n.classes.contains(class))
        {
            return false;
        }
        selector.attributes.iter().all(|(name, value)| {
            match (n.attributes.get(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }

    fn render_keyboard(&mut self, config: &KeyboardConfig) {
        let Some(container) = self.query_selector(None, app_settings::KEYBOARD_CONTAINER_SELECTOR)
        else {
            return;
        };
        for child in self.nodes[container.0].children.clone() {
            self.detach(child);
        }
        for row in &config.layout.default {
            let row_el = self.append(container, "div");
            self.add_class(&row_el, "hg-row");
            for key in row.split_whitespace() {
                let button = self.append(row_el, "button");
                self.add_class(&button, app_settings::BUTTON_CLASS);
                self.set_attribute(&button, "data-skbtn", key);
                let label = config.display.get(key).cloned().unwrap_or_else(|| key.to_string());
                self.set_text(&button, &label);
                let attributes: Vec<(String, String)> = config
                    .attributes_for(key)
                    .map(|attr| (attr.attribute.clone(), attr.value.clone()))
                    .collect();
                for (name, value) in attributes {
                    self.set_attribute(&button, &name, &value);
                }
            }
        }
        self.record_mutation();
    }
}

impl Host for MemoryHost {
    type Element = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|node| self.nodes[node.0].id.as_deref() == Some(id))
    }

    fn query_selector(&self, scope: Option<&NodeId>, selector: &str) -> Option<NodeId> {
        let compound = CompoundSelector::parse(selector)?;
        let scope = scope.copied().unwrap_or(self.root);
        self.descendants(scope)
            .into_iter()
            .find(|node| self.matches(*node, &compound))
    }

    fn query_selector_all(&self, scope: Option<&NodeId>, selector: &str) -> Vec<NodeId> {
        let Some(compound) = CompoundSelector::parse(selector) else {
            return Vec::new();
        };
        let scope = scope.copied().unwrap_or(self.root);
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(*node, &compound))
            .collect()
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.nodes[element.0].parent
    }

    fn child_count(&self, element: &NodeId) -> usize {
        self.nodes[element.0].children.len()
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn document_ready(&self) -> bool {
        !self.loading
    }

    fn is_touch_device(&self) -> bool {
        self.touch
    }

    fn bounding_rect(&self, element: &NodeId) -> Rect {
        if self.is_displayed(*element) {
            self.nodes[element.0].rect
        } else {
            Rect::default()
        }
    }

    fn scroll_width(&self, element: &NodeId) -> f64 {
        if !self.is_displayed(*element) {
            return 0.0;
        }
        let node = &self.nodes[element.0];
        let children: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|c| self.is_displayed(*c))
            .collect();
        if children.is_empty() {
            return node.natural_width;
        }
        let content: f64 = children.iter().map(|c| self.scroll_width(c)).sum();
        let gaps = self.computed_gap(element) * (children.len() - 1) as f64;
        (content + gaps).max(node.natural_width)
    }

    fn offset_height(&self, element: &NodeId) -> f64 {
        if self.is_displayed(*element) {
            self.nodes[element.0].height
        } else {
            0.0
        }
    }

    fn computed_gap(&self, element: &NodeId) -> f64 {
        let node = &self.nodes[element.0];
        node.style
            .get("column-gap")
            .and_then(|value| parse_pixels(value))
            .unwrap_or(node.base_gap)
    }

    fn set_style(&mut self, element: &NodeId, property: &str, value: &str) {
        self.nodes[element.0]
            .style
            .insert(property.to_string(), value.to_string());
    }

    fn remove_style(&mut self, element: &NodeId, property: &str) {
        self.nodes[element.0].style.remove(property);
    }

    fn add_class(&mut self, element: &NodeId, class: &str) {
        let classes = &mut self.nodes[element.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, element: &NodeId, class: &str) {
        self.nodes[element.0].classes.retain(|c| c != class);
    }

    fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) {
        self.nodes[element.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_text(&mut self, element: &NodeId, text: &str) {
        self.nodes[element.0].text = text.to_string();
    }

    fn scroll_by(&mut self, dy: f64) {
        self.scroll_y += dy;
        self.scrolls.push(dy);
    }

    fn set_timeout(&mut self, delay_ms: u32, task: Task) -> TimerId {
        let handle = self.next_handle();
        let due = self.now + u64::from(delay_ms);
        self.timers.insert((due, handle), (TimerId(handle), task));
        TimerId(handle)
    }

    fn clear_timeout(&mut self, timer: TimerId) {
        self.timers.retain(|_, (id, _)| *id != timer);
    }

    fn request_animation_frame(&mut self, task: Task) -> TimerId {
        let handle = self.next_handle();
        self.frames.push((TimerId(handle), task));
        TimerId(handle)
    }

    fn cancel_animation_frame(&mut self, frame: TimerId) {
        self.frames.retain(|(id, _)| *id != frame);
    }

    fn listen(&mut self, target: EventTarget<NodeId>, event: DomEvent, task: Task) -> ListenerId {
        let id = ListenerId(self.next_handle());
        self.listeners.insert(id, (target, event, task));
        id
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn supports_size_observation(&self) -> bool {
        self.size_observation
    }

    fn observe_size(&mut self, element: &NodeId, task: Task) {
        if !self.size_observation {
            return;
        }
        if !self.size_observed.iter().any(|(node, _)| node == element) {
            self.size_observed.push((*element, task));
        }
    }

    fn unobserve_size(&mut self, element: &NodeId) {
        self.size_observed.retain(|(node, _)| node != element);
    }

    fn observe_mutations(&mut self, task: Task) {
        self.mutation_task = Some(task);
    }

    fn disconnect_observers(&mut self) {
        self.size_observed.clear();
        self.mutation_task = None;
    }

    fn load_keyboard(&mut self, ticket: LoadTicket) {
        self.loads_started += 1;
        let available = self.keyboard_available;
        self.ready.push_back(Task::KeyboardLoaded { ticket, available });
    }

    fn configure_keyboard(&mut self, config: &KeyboardConfig) {
        self.render_keyboard(config);
        self.keyboard_config = Some(config.clone());
    }
}

// ============================================================================
// Selector Matching
// ============================================================================

/// A single compound selector: `tag#id.class[attr][attr="value"]`.
///
/// Combinators and pseudo-classes are not supported; queries are always
/// scoped to descendants instead.
#[derive(Debug, Clone, Default, PartialEq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl CompoundSelector {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let mut selector = CompoundSelector::default();
        let mut rest = input;

        let tag_end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
        if tag_end > 0 {
            selector.tag = Some(rest[..tag_end].to_string());
        }
        rest = &rest[tag_end..];

        while let Some(marker) = rest.chars().next() {
            rest = &rest[marker.len_utf8()..];
            match marker {
                '.' | '#' => {
                    let end = rest.find(['.', '#', '[']).unwrap_or(rest.len());
                    let name = &rest[..end];
                    if name.is_empty() {
                        return None;
                    }
                    if marker == '.' {
                        selector.classes.push(name.to_string());
                    } else {
                        selector.id = Some(name.to_string());
                    }
                    rest = &rest[end..];
                }
                '[' => {
                    let end = rest.find(']')?;
                    let body = &rest[..end];
                    let attribute = match body.split_once('=') {
                        Some((name, value)) => {
                            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                            (name.trim().to_string(), Some(value.to_string()))
                        }
                        None => (body.trim().to_string(), None),
                    };
                    selector.attributes.push(attribute);
                    rest = &rest[end + 1..];
                }
                _ => return None,
            }
        }

        Some(selector)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::KeyLayout;

    /// Test 1: Selector parsing
    #[test]
    fn test_selector_parsing() {
        let sel = CompoundSelector::parse(".hg-button[data-letter=\"A\"]").unwrap();
        assert_eq!(sel.tag, None);
        assert_eq!(sel.classes, vec!["hg-button"]);
        assert_eq!(
            sel.attributes,
            vec![("data-letter".to_string(), Some("A".to_string()))]
        );

        let sel = CompoundSelector::parse("button#go.big[data-x]").unwrap();
        assert_eq!(sel.tag.as_deref(), Some("button"));
        assert_eq!(sel.id.as_deref(), Some("go"));
        assert_eq!(sel.classes, vec!["big"]);
        assert_eq!(sel.attributes, vec![("data-x".to_string(), None)]);

        assert!(CompoundSelector::parse("").is_none());
        assert!(CompoundSelector::parse(".").is_none());
        assert!(CompoundSelector::parse("[open").is_none());
    }

    /// Test 2: Game page lookups
    #[test]
    fn test_game_page_lookup() {
        let (host, page) = MemoryHost::game_page();

        assert_eq!(host.element_by_id("gameTouchControls"), Some(page.panel));
        assert_eq!(host.element_by_id("gameTouchLabel"), Some(page.label));
        assert_eq!(
            host.query_selector(Some(&page.panel), "[data-virtual-keyboard]"),
            Some(page.wrapper)
        );
        assert_eq!(
            host.query_selector(Some(&page.panel), ".simple-keyboard"),
            Some(page.container)
        );
        assert_eq!(host.query_selector(None, ".game-shell"), Some(page.shell));
        assert!(host.query_selector(Some(&page.label), ".game-shell").is_none());
    }

    /// Test 3: Row width follows children and gap overrides
    #[test]
    fn test_row_measurement() {
        let mut host = MemoryHost::new();
        let body = host.body;
        let row = host.letter_row(body, "HELLO", 46.0, 8.0);

        // 5 * 46 + 4 * 8
        assert_eq!(host.scroll_width(&row), 262.0);
        assert_eq!(host.child_count(&row), 5);

        host.set_style(&row, "column-gap", "2px");
        assert_eq!(host.scroll_width(&row), 238.0);

        host.set_style(&row, "transform", "scale(0.5)");
        assert_eq!(host.scroll_width(&row), 238.0);
        assert_eq!(host.rendered_width(row), 119.0);
    }

    /// Test 4: Hidden elements measure as zero
    #[test]
    fn test_hidden_elements_have_no_geometry() {
        let (mut host, page) = MemoryHost::game_page();
        assert_eq!(host.offset_height(&page.panel), 0.0);
        assert_eq!(host.bounding_rect(&page.panel), Rect::default());

        host.remove_class(&page.panel, "hidden");
        assert_eq!(host.offset_height(&page.panel), 260.0);
        assert_eq!(host.bounding_rect(&page.panel).top, 500.0);

        host.set_style(&page.panel, "display", "none");
        assert_eq!(host.offset_height(&page.panel), 0.0);
    }

    /// Test 5: Timers fire in due order and can be cleared
    #[test]
    fn test_timer_ordering() {
        let mut host = MemoryHost::new();
        let late = host.set_timeout(300, Task::FinishHide);
        host.set_timeout(100, Task::Reflow);
        host.set_timeout(100, Task::SettleRows);
        assert_eq!(host.pending_timers(), 3);

        assert_eq!(host.pop_due_timer(50), None);
        assert_eq!(host.pop_due_timer(200), Some(Task::Reflow));
        assert_eq!(host.pop_due_timer(200), Some(Task::SettleRows));
        assert_eq!(host.now(), 100);

        host.clear_timeout(late);
        assert_eq!(host.pop_due_timer(1000), None);
        assert_eq!(host.pending_timers(), 0);
    }

    /// Test 6: Mutation observation coalesces into one delivery
    #[test]
    fn test_mutation_observation() {
        let mut host = MemoryHost::new();
        let body = host.body;
        host.append(body, "div");
        assert!(host.take_ready().is_empty());

        host.observe_mutations(Task::DomMutated);
        host.append(body, "div");
        host.append(body, "div");
        assert_eq!(host.take_ready(), vec![Task::DomMutated]);

        host.disconnect_observers();
        host.append(body, "div");
        assert!(host.take_ready().is_empty());
    }

    /// Test 7: Size observation only when supported
    #[test]
    fn test_size_observation() {
        let mut host = MemoryHost::new();
        let body = host.body;
        let el = host.append(body, "div");

        host.observe_size(&el, Task::ScheduleReflow);
        host.observe_size(&el, Task::ScheduleReflow);
        assert_eq!(host.observed_count(), 1);
        host.resize(el, 120.0);
        assert_eq!(host.take_ready(), vec![Task::ScheduleReflow]);

        host.unobserve_size(&el);
        assert_eq!(host.observed_count(), 0);
        host.resize(el, 80.0);
        assert!(host.take_ready().is_empty());

        let mut legacy = MemoryHost::new();
        legacy.set_size_observation(false);
        let body = legacy.body;
        let el = legacy.append(body, "div");
        legacy.observe_size(&el, Task::ScheduleReflow);
        assert_eq!(legacy.observed_count(), 0);
    }

    /// Test 8: Keyboard widget renders buttons with attributes
    #[test]
    fn test_keyboard_rendering() {
        let (mut host, page) = MemoryHost::game_page();
        let config = KeyboardConfig::from_layout(&KeyLayout::from_rows(["A B", "space"]));
        host.configure_keyboard(&config);

        let buttons = host.query_selector_all(Some(&page.wrapper), ".hg-button");
        assert_eq!(buttons.len(), 3);

        let a = host
            .query_selector(Some(&page.wrapper), ".hg-button[data-letter=\"A\"]")
            .unwrap();
        assert_eq!(host.attribute(a, "aria-label"), Some("Letter A"));
        assert_eq!(host.text(a), "A");

        let space = host
            .query_selector(Some(&page.wrapper), ".hg-button[data-letter=\"SPACE\"]")
            .unwrap();
        assert_eq!(host.text(space), "Space");

        // Reconfiguring replaces the buttons
        host.configure_keyboard(&KeyboardConfig::from_layout(&KeyLayout::from_rows(["Z"])));
        assert_eq!(host.query_selector_all(Some(&page.wrapper), ".hg-button").len(), 1);
    }

    /// Test 9: Listeners receive fired events
    #[test]
    fn test_event_listeners() {
        let (mut host, page) = MemoryHost::game_page();
        let id = host.listen(EventTarget::Element(page.close), DomEvent::Click, Task::CloseRequested);
        host.listen(EventTarget::Window, DomEvent::Resize, Task::ScheduleReflow);
        assert_eq!(host.listener_count(DomEvent::Click), 1);

        host.fire_event(EventTarget::Element(page.close), DomEvent::Click);
        host.fire_event(EventTarget::Element(page.label), DomEvent::Click);
        assert_eq!(host.take_ready(), vec![Task::CloseRequested]);

        host.unlisten(id);
        host.fire_event(EventTarget::Element(page.close), DomEvent::Click);
        assert!(host.take_ready().is_empty());
    }
}
