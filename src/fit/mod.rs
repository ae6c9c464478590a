// SPDX-License-Identifier: GPL-3.0-only

//! Letter-row fitting.
//!
//! Word rows are drawn as a flex row of letter tiles. On narrow screens a
//! long word would overflow its container; fitting first tightens the gap
//! between tiles and then scales the whole row down uniformly.
//!
//! - [`sizing`]: the pure calculations
//! - [`fitter`]: [`LetterFitter`], which measures rows through a
//!   [`crate::host::Host`] and keeps them fitted as the page changes

pub mod fitter;
pub mod sizing;

pub use fitter::{FitOutcome, LetterFitter};
pub use sizing::{plan_gap, scale_for};
