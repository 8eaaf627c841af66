//! Stamp placement geometry.
//!
//! A placement request names a stamp asset, a zero-indexed page, an anchor
//! (or explicit custom coordinates) and a scale factor. This module turns
//! those into a rectangle in PDF point space, origin at the lower-left of
//! the page as PDF content streams expect. All functions here are pure;
//! the compositing itself lives in [`super::compose`].

use serde::{Deserialize, Serialize};

use crate::config;

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

/// Named anchor positions plus the explicit-coordinates escape hatch.
///
/// Serialized as the kebab-case strings the placement editor sends
/// (`"top-left"`, `"bottom-center"`, `"custom"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StampPosition {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Custom,
}

impl StampPosition {
    pub fn is_custom(&self) -> bool {
        matches!(self, StampPosition::Custom)
    }
}

/// One stamp placement as requested by the placement editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampPlacement {
    /// Name of the stamp record whose image gets composited.
    pub stamp_name: String,
    /// Zero-indexed target page.
    pub page_number: usize,
    pub position: StampPosition,
    /// Horizontal center in PDF points, only meaningful for `Custom`.
    #[serde(default)]
    pub x: Option<f32>,
    /// Vertical center in PDF points, only meaningful for `Custom`.
    #[serde(default)]
    pub y: Option<f32>,
    /// Fraction of the stamp's native pixel size; defaults when omitted.
    #[serde(default)]
    pub scale: Option<f32>,
}

impl StampPlacement {
    /// Requested scale, falling back to the configured default when the
    /// editor did not send one. A zero or negative scale passes through
    /// and surfaces later as a placement failure.
    pub fn effective_scale(&self) -> f32 {
        self.scale.unwrap_or(config::DEFAULT_STAMP_SCALE)
    }

    /// Custom center coordinates when both were provided.
    pub fn custom_center(&self) -> Option<(f32, f32)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

/// Where a stamp lands on a page: lower-left corner plus size, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

// ═══════════════════════════════════════════════════════════════════════════
// Geometry
// ═══════════════════════════════════════════════════════════════════════════

/// Stamp size in points after scaling its native pixel dimensions.
pub fn scaled_size(native_width: u32, native_height: u32, scale: f32) -> (f32, f32) {
    (native_width as f32 * scale, native_height as f32 * scale)
}

/// Lower-left origin for a named anchor, measured against the page box with
/// the fixed anchor margin. Returns `None` for `Custom`, which carries its
/// own coordinates.
pub fn anchor_origin(
    position: StampPosition,
    page_width: f32,
    page_height: f32,
    stamp_width: f32,
    stamp_height: f32,
) -> Option<(f32, f32)> {
    let margin = config::STAMP_ANCHOR_MARGIN;
    let left = margin;
    let right = page_width - margin - stamp_width;
    let center_x = (page_width - stamp_width) / 2.0;
    let bottom = margin;
    let top = page_height - margin - stamp_height;
    let center_y = (page_height - stamp_height) / 2.0;

    let origin = match position {
        StampPosition::TopLeft => (left, top),
        StampPosition::TopCenter => (center_x, top),
        StampPosition::TopRight => (right, top),
        StampPosition::CenterLeft => (left, center_y),
        StampPosition::CenterRight => (right, center_y),
        StampPosition::BottomLeft => (left, bottom),
        StampPosition::BottomCenter => (center_x, bottom),
        StampPosition::BottomRight => (right, bottom),
        StampPosition::Custom => return None,
    };
    Some(origin)
}

/// Lower-left origin for an explicit center point, clamped so the stamp
/// stays inside the page box. A stamp larger than the page pins to the
/// lower-left corner.
pub fn custom_origin(
    center_x: f32,
    center_y: f32,
    page_width: f32,
    page_height: f32,
    stamp_width: f32,
    stamp_height: f32,
) -> (f32, f32) {
    let x = (center_x - stamp_width / 2.0)
        .min(page_width - stamp_width)
        .max(0.0);
    let y = (center_y - stamp_height / 2.0)
        .min(page_height - stamp_height)
        .max(0.0);
    (x, y)
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
