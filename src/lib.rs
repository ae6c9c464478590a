// SPDX-License-Identifier: GPL-3.0-only

//! Letterkeys - Letter-row fitting and a touch keyboard for word games
//!
//! This crate provides the two page-level helpers a browser word game needs
//! on phones and tablets.
//!
//! # Architecture
//!
//! 1. **Letter fitting** (`fit`): every `.letter-row` is kept inside its
//!    container, first by tightening the gap between letters and then by
//!    scaling the row down uniformly.
//!
//! 2. **Touch keyboard** (`keyboard`): a bottom panel with an on-screen
//!    letter keyboard. Game screens attach as connections; at most one owns
//!    the keyboard at a time and receives its key presses.
//!
//! Neither touches the page directly. All page access goes through the
//! `host::Host` trait, implemented for browsers on wasm32 and by an
//! in-memory page model everywhere else. `runtime::GameUi` owns a host and
//! both controllers and routes the deferred work the host hands back.
//!
//! # Modules
//!
//! - `app_settings`: Page contract (ids, selectors, classes) and defaults
//! - `config`: Tuning parameters with JSON loading
//! - `fit`: Letter-row fitting
//! - `host`: Host abstraction, in-memory host and browser host
//! - `keyboard`: Touch keyboard panel and connections
//! - `layout`: Keyboard layouts and widget configuration
//! - `runtime`: Task routing and connection handles

pub mod app_settings;
pub mod config;
pub mod fit;
pub mod host;
pub mod keyboard;
pub mod layout;
pub mod runtime;

pub use config::{ConfigError, Tuning};
pub use host::{Host, Task};
pub use keyboard::{ConnectionId, ConnectionOptions, KeyPressMeta, OptionsPatch, PanelPhase};
pub use runtime::{GameUi, KeyboardConnection, SharedUi, UiBusy};

// ============================================================================
// Integration Tests
// ============================================================================
