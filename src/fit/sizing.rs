// SPDX-License-Identifier: GPL-3.0-only

//! Sizing calculations for letter-row fitting.
//!
//! # Fitting Steps
//!
//! A row that overflows its container first gives up inter-letter gap, then
//! shrinks uniformly:
//!
//! 1. `overflow = actual - available` is spread over the `children - 1` gaps,
//!    but a gap never drops below `min_gap_ratio` of its base value
//!    ([`plan_gap`]).
//! 2. After re-measuring, `scale = min(1, available / actual)`
//!    ([`scale_for`]).
//!
//! ```rust,ignore
//! // 5 letters, 8px gap, 250px natural width in a 200px container
//! let gap = plan_gap(200.0, 250.0, 5, 8.0, 0.4);   // Some(3.2)
//! let scale = scale_for(200.0, 230.8);              // ~0.8666
//! ```

// ============================================================================
// Public API
// ============================================================================

/// Computes the reduced gap for an overflowing row.
///
/// # Arguments
///
/// * `available` - Container width in pixels
/// * `actual` - Natural row width in pixels
/// * `children` - Number of items in the row
/// * `base_gap` - Current gap between items
/// * `min_gap_ratio` - Floor of the result as a fraction of `base_gap`
///
/// # Returns
///
/// `Some(gap)` when the row overflows, has at least two items and a positive
/// gap to give up; `None` otherwise.
pub fn plan_gap(
    available: f64,
    actual: f64,
    children: usize,
    base_gap: f64,
    min_gap_ratio: f64,
) -> Option<f64> {
    if children < 2 || actual <= available || base_gap <= 0.0 {
        return None;
    }

    let overflow = actual - available;
    let per_gap = overflow / (children - 1) as f64;
    let floor = base_gap * min_gap_ratio;

    Some((base_gap - per_gap).max(floor))
}

/// Uniform scale that makes `actual` fit into `available`, never above 1.
///
/// Returns 1.0 when either width is not positive.
pub fn scale_for(available: f64, actual: f64) -> f64 {
    if available <= 0.0 || actual <= 0.0 {
        return 1.0;
    }
    (available / actual).min(1.0)
}

/// Formats a pixel length for a style property.
pub fn format_px(value: f64) -> String {
    format!("{}px", value)
}

/// Formats a uniform scale transform.
pub fn format_scale(scale: f64) -> String {
    format!("scale({})", scale)
}

/// Parses a pixel string (e.g., "20px") to extract the numeric value.
///
/// The "px" suffix is optional; whitespace is tolerated around the value.
/// Negative and malformed values yield `None`.
///
/// ```rust,ignore
/// assert_eq!(parse_pixels("20px"), Some(20.0));
/// assert_eq!(parse_pixels("15.5px"), Some(15.5));
/// assert_eq!(parse_pixels("30"), Some(30.0));
/// assert_eq!(parse_pixels("normal"), None);
/// ```
pub fn parse_pixels(pixel_str: &str) -> Option<f64> {
    let trimmed = pixel_str.trim();

    let number_part = if trimmed.to_ascii_lowercase().ends_with("px") {
        &trimmed[..trimmed.len() - 2]
    } else {
        trimmed
    };

    number_part
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Parses a `scale(s)` transform. `none` and an empty string are scale 1.
pub fn parse_scale(transform: &str) -> Option<f64> {
    let trimmed = transform.trim();
    if trimmed.is_empty() || trimmed == "none" {
        return Some(1.0);
    }
    trimmed
        .strip_prefix("scale(")?
        .strip_suffix(')')?
        .trim()
        .parse::<f64>()
        .ok()
}

// ============================================================================
// Unit Tests
// ============================================================================
