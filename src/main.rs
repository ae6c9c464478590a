// SPDX-License-Identifier: GPL-3.0-only

//! Letterkeys Simulator
//!
//! Runs a scripted game session on the in-memory page: a narrow board is
//! fitted, the touch keyboard opens, a word is typed on it, the viewport
//! rotates, and the keyboard closes again. Every step is logged.
//!
//! ```text
//! letterkeys-sim [TUNING.json]
//! RUST_LOG=letterkeys=debug letterkeys-sim
//! ```

use letterkeys::config::Tuning;
use letterkeys::host::memory::{MemoryHost, NodeId};
use letterkeys::host::{DomEvent, EventTarget, Host, Rect};
use letterkeys::keyboard::{ConnectionOptions, OptionsPatch, ThemeOverrides};
use letterkeys::runtime::GameUi;
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("letterkeys=info")),
        )
        .init();

    let tuning = match std::env::args().nth(1) {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                tracing::error!("Failed to load tuning: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };
    tracing::info!("Tuning: {:?}", tuning);

    run_session(tuning);
    ExitCode::SUCCESS
}

fn run_session(tuning: Tuning) {
    let (mut host, page) = MemoryHost::game_page();
    let board = host.append(page.shell, "div");
    host.set_rect(board, Rect::new(16.0, 120.0, 200.0, 64.0));
    let guess = host.letter_row(board, "CRANE", 43.6, 8.0);
    let answer = host.letter_row(board, "LETTERKEYS", 30.0, 8.0);

    let settle_delay = u64::from(tuning.settle_delay_ms);
    let mut ui = GameUi::install(host, tuning);
    ui.flush();
    report_row(&ui, "guess", guess);
    report_row(&ui, "answer", answer);

    let typed = Rc::new(RefCell::new(String::new()));
    let sink = typed.clone();
    let anchor = board;
    let id = ui.attach(
        ConnectionOptions::new()
            .name("board")
            .label("Type your guess")
            .on_key_press(move |c, meta| {
                tracing::info!("Key {:?} from {} button {:?}", c, meta.source, meta.original);
                sink.borrow_mut().push(c);
            })
            .on_show(|| tracing::info!("Keyboard shown"))
            .on_hide(|| tracing::info!("Keyboard hidden")),
    );

    // The board only becomes the viewport anchor once play starts
    ui.connection(id).show(
        OptionsPatch::new()
            .with_theme(ThemeOverrides::new().with("--touch-key-bg", "#1f2933"))
            .with_viewport_target(move || Some(anchor)),
    );
    ui.advance(settle_delay);
    tracing::info!(
        "Panel label {:?}, shell padding {:?}",
        ui.host().text(page.label),
        ui.host().style(page.shell, "padding-bottom")
    );

    for button in ["S", "L", "A", "T", "E", "{bksp}", "space"] {
        ui.host_mut().tap_key(button);
        ui.advance(60);
    }
    tracing::info!("Typed {:?}", typed.borrow());

    // Rotate to landscape
    ui.host_mut().resize(board, 320.0);
    ui.host_mut().set_height(page.panel, 200.0);
    ui.host_mut()
        .fire_event(EventTarget::Window, DomEvent::OrientationChange);
    ui.flush();
    report_row(&ui, "guess", guess);
    report_row(&ui, "answer", answer);
    tracing::info!(
        "Shell padding after rotation {:?}",
        ui.host().style(page.shell, "padding-bottom")
    );

    ui.host_mut()
        .fire_event(EventTarget::Element(page.close), DomEvent::Click);
    ui.advance(1000);
    tracing::info!(
        "Panel hidden: {}, scrolled {:?}",
        ui.host().has_class(page.panel, "hidden"),
        ui.host().scrolls()
    );

    ui.destroy();
}

fn report_row(ui: &GameUi<MemoryHost>, name: &str, row: NodeId) {
    let host = ui.host();
    tracing::info!(
        "Row {}: natural {:.1}px, rendered {:.1}px, gap {:.1}px, transform {}",
        name,
        host.scroll_width(&row),
        host.rendered_width(row),
        host.computed_gap(&row),
        host.style(row, "transform").unwrap_or("none")
    );
}
