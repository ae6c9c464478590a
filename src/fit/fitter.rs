// SPDX-License-Identifier: GPL-3.0-only

//! Letter-row fitting controller.
//!
//! [`LetterFitter`] keeps every `.letter-row` inside its container. It owns
//! no page state of its own beyond bookkeeping: the debounced reflow frame,
//! the rows waiting for their settle pass, and which elements are under size
//! observation.
//!
//! # Reactivity
//!
//! After [`LetterFitter::install`], the following all end in
//! [`Task::ScheduleReflow`], which requests at most one animation frame at a
//! time:
//!
//! - window `resize` and `orientationchange`;
//! - size changes of observed rows and their parents;
//! - child-list mutations anywhere in the document ([`Task::DomMutated`]),
//!   which also pick up newly inserted rows for size observation.

use super::sizing::{format_px, format_scale, plan_gap, scale_for};
use crate::app_settings;
use crate::config::Tuning;
use crate::host::{DomEvent, EventTarget, Host, ListenerId, Task, TimerId};

/// Result of fitting one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// The row has no container or nothing to measure.
    Skipped,
    /// The row was measured and its transform applied.
    Fitted {
        /// Applied scale, 1.0 when the row fits
        scale: f64,
        /// Reduced gap in pixels, when one was applied
        gap: Option<f64>,
    },
}

/// Keeps letter rows within their containers.
#[derive(Debug)]
pub struct LetterFitter<E> {
    min_gap_ratio: f64,
    /// Debounced reflow frame; further requests are absorbed while set
    reflow_frame: Option<TimerId>,
    /// Rows fitted since the last settle pass
    settle_queue: Vec<E>,
    settle_frame: Option<TimerId>,
    observed: Vec<E>,
    listeners: Vec<ListenerId>,
    installed: bool,
}

impl<E: Clone + PartialEq> LetterFitter<E> {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            min_gap_ratio: tuning.min_gap_ratio,
            reflow_frame: None,
            settle_queue: Vec::new(),
            settle_frame: None,
            observed: Vec::new(),
            listeners: Vec::new(),
            installed: false,
        }
    }

    /// Subscribes to geometry changes and fits every row once the document
    /// is ready. Installing twice is a no-op.
    pub fn install<H: Host<Element = E>>(&mut self, host: &mut H) {
        if self.installed {
            return;
        }
        self.installed = true;

        self.listeners.push(host.listen(
            EventTarget::Window,
            DomEvent::Resize,
            Task::ScheduleReflow,
        ));
        self.listeners.push(host.listen(
            EventTarget::Window,
            DomEvent::OrientationChange,
            Task::ScheduleReflow,
        ));

        self.observe_rows(host);
        host.observe_mutations(Task::DomMutated);

        if host.document_ready() {
            self.fit_all_letter_rows(host);
        } else {
            self.listeners.push(host.listen(
                EventTarget::Document,
                DomEvent::DomContentLoaded,
                Task::DocumentReady,
            ));
        }

        tracing::info!(
            "Letter fitter installed (size observation: {})",
            host.supports_size_observation()
        );
    }

    /// Removes listeners and observers and cancels pending frames.
    pub fn uninstall<H: Host<Element = E>>(&mut self, host: &mut H) {
        if !self.installed {
            return;
        }
        for listener in self.listeners.drain(..) {
            host.unlisten(listener);
        }
        host.disconnect_observers();
        self.observed.clear();
        if let Some(frame) = self.reflow_frame.take() {
            host.cancel_animation_frame(frame);
        }
        if let Some(frame) = self.settle_frame.take() {
            host.cancel_animation_frame(frame);
        }
        self.settle_queue.clear();
        self.installed = false;
        tracing::debug!("Letter fitter uninstalled");
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// `true` while a reflow frame is scheduled.
    pub fn reflow_pending(&self) -> bool {
        self.reflow_frame.is_some()
    }

    // ========================================================================
    // Fitting
    // ========================================================================

    /// Fits one row to its parent's width.
    ///
    /// Any previous transform and gap override is cleared first, so fitting
    /// a stable layout repeatedly converges to the same result.
    pub fn fit_letters_for<H: Host<Element = E>>(&mut self, host: &mut H, row: &E) -> FitOutcome {
        host.set_style(row, "transform", "none");
        host.set_style(row, "white-space", "nowrap");
        host.remove_style(row, "column-gap");

        let Some(container) = host.parent(row) else {
            return FitOutcome::Skipped;
        };

        let available = host.bounding_rect(&container).width;
        let mut actual = host.scroll_width(row);
        if available <= 0.0 || actual <= 0.0 {
            return FitOutcome::Skipped;
        }

        let children = host.child_count(row);
        let base_gap = host.computed_gap(row);
        let gap = plan_gap(available, actual, children, base_gap, self.min_gap_ratio);
        if let Some(gap) = gap {
            host.set_style(row, "column-gap", &format_px(gap));
            actual = host.scroll_width(row);
        }

        let scale = self.apply_scale(host, row, available, actual);
        self.queue_settle(host, row);

        FitOutcome::Fitted { scale, gap }
    }

    /// Fits every `.letter-row` in the document.
    pub fn fit_all_letter_rows<H: Host<Element = E>>(&mut self, host: &mut H) -> usize {
        let rows = host.query_selector_all(None, app_settings::LETTER_ROW_SELECTOR);
        for row in &rows {
            self.fit_letters_for(host, row);
        }
        rows.len()
    }

    /// Requests a reflow on the next animation frame.
    ///
    /// Returns `false` when the request was absorbed by an already scheduled
    /// frame.
    pub fn schedule_reflow<H: Host<Element = E>>(&mut self, host: &mut H) -> bool {
        if self.reflow_frame.is_some() {
            tracing::trace!("Reflow already scheduled");
            return false;
        }
        self.reflow_frame = Some(host.request_animation_frame(Task::Reflow));
        true
    }

    /// Handles a fitter task. Returns `false` for tasks it does not own.
    pub fn handle<H: Host<Element = E>>(&mut self, host: &mut H, task: &Task) -> bool {
        match task {
            Task::ScheduleReflow => {
                self.schedule_reflow(host);
            }
            Task::DomMutated => {
                self.observe_rows(host);
                self.schedule_reflow(host);
            }
            Task::Reflow => {
                self.reflow_frame = None;
                let rows = self.fit_all_letter_rows(host);
                tracing::debug!("Reflowed {} letter rows", rows);
            }
            Task::SettleRows => {
                self.settle_frame = None;
                self.settle(host);
            }
            Task::DocumentReady => {
                self.fit_all_letter_rows(host);
            }
            _ => return false,
        }
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn apply_scale<H: Host<Element = E>>(
        &self,
        host: &mut H,
        row: &E,
        available: f64,
        actual: f64,
    ) -> f64 {
        let scale = scale_for(available, actual);
        if scale < 1.0 {
            host.set_style(row, "transform", &format_scale(scale));
        } else {
            host.set_style(row, "transform", "none");
        }
        scale
    }

    fn queue_settle<H: Host<Element = E>>(&mut self, host: &mut H, row: &E) {
        if !self.settle_queue.contains(row) {
            self.settle_queue.push(row.clone());
        }
        if self.settle_frame.is_none() {
            self.settle_frame = Some(host.request_animation_frame(Task::SettleRows));
        }
    }

    /// Re-measures rows fitted last frame, keeping their gap, and corrects
    /// the scale if fonts or layout shifted in between.
    fn settle<H: Host<Element = E>>(&mut self, host: &mut H) {
        for row in std::mem::take(&mut self.settle_queue) {
            let Some(container) = host.parent(&row) else {
                continue;
            };
            let available = host.bounding_rect(&container).width;
            let actual = host.scroll_width(&row);
            if available <= 0.0 || actual <= 0.0 {
                continue;
            }
            self.apply_scale(host, &row, available, actual);
        }
    }

    /// Brings size observation in line with the rows currently in the
    /// document: new rows and parents are observed, departed ones released.
    fn observe_rows<H: Host<Element = E>>(&mut self, host: &mut H) {
        if !host.supports_size_observation() {
            return;
        }
        let mut live: Vec<E> = Vec::new();
        for row in host.query_selector_all(None, app_settings::LETTER_ROW_SELECTOR) {
            let parent = host.parent(&row);
            for target in std::iter::once(row).chain(parent) {
                if !live.contains(&target) {
                    live.push(target);
                }
            }
        }

        let before = self.observed.len();
        self.observed.retain(|target| {
            let keep = live.contains(target);
            if !keep {
                host.unobserve_size(target);
            }
            keep
        });
        let released = before - self.observed.len();
        if released > 0 {
            tracing::trace!("Released {} detached elements from size observation", released);
        }

        for target in live {
            if !self.observed.contains(&target) {
                host.observe_size(&target, Task::ScheduleReflow);
                self.observed.push(target);
            }
        }
    }

    /// Number of elements the fitter keeps under size observation.
    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
