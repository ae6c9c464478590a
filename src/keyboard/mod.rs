// SPDX-License-Identifier: GPL-3.0-only

//! On-screen touch keyboard.
//!
//! - [`connection`]: per-caller options, patches and key press metadata
//! - [`theme`]: style property overrides applied to the panel
//! - [`flash`]: per-key highlight timers
//! - [`panel`]: [`TouchKeyboard`], the controller tying them together

pub mod connection;
pub mod flash;
pub mod panel;
pub mod theme;

pub use connection::{
    ConnectionId, ConnectionOptions, InputSource, KeyPressFn, KeyPressMeta, NotifyFn, OptionsPatch,
    TargetFn,
};
pub use flash::FlashTimers;
pub use panel::{PanelPhase, TouchKeyboard};
pub use theme::{AppliedTheme, ThemeOverrides};
