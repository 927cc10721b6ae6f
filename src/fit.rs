//! # Box Fitting
//!
//! Pure scaling math for images. Two policies live here because photos and
//! letterhead logos genuinely behave differently: a photo always scales to
//! fill its cell region, while a logo keeps its native size unless it
//! crosses a hard cap. Both preserve aspect ratio exactly and never
//! upscale.
//!
//! All inputs are unit-agnostic. Callers decide what a unit means
//! (millimeters for the canvas target, pixels for the flow target); the
//! math only cares that a constraint and the resulting box share one unit.

use serde::{Deserialize, Serialize};

/// Fallback box for images whose intrinsic dimensions are unknown or
/// non-positive, so a broken upload degrades to a fixed 16:9 frame
/// instead of failing the whole generation.
pub const FALLBACK_WIDTH: f64 = 240.0;
pub const FALLBACK_HEIGHT: f64 = 135.0;

/// Maximum width/height an image may occupy before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxConstraint {
    pub max_width: f64,
    pub max_height: f64,
}

impl BoxConstraint {
    pub fn new(max_width: f64, max_height: f64) -> Self {
        Self {
            max_width,
            max_height,
        }
    }
}

/// The fitted result: final display dimensions, aspect ratio preserved up
/// to half-up rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledBox {
    pub width: f64,
    pub height: f64,
}

/// Fit an image into a bounding region.
///
/// `scale = min(maxW/pw, maxH/ph, 1)`; the `1` cap guarantees the image is
/// never enlarged past native resolution. Dimensions round half-up, which
/// makes the function idempotent: feeding a result back in returns it
/// unchanged.
pub fn fit_box(
    pixel_width: Option<u32>,
    pixel_height: Option<u32>,
    constraint: BoxConstraint,
) -> ScaledBox {
    let (pw, ph) = match (pixel_width, pixel_height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as f64, h as f64),
        _ => {
            return ScaledBox {
                width: FALLBACK_WIDTH,
                height: FALLBACK_HEIGHT,
            }
        }
    };

    let scale = (constraint.max_width / pw)
        .min(constraint.max_height / ph)
        .min(1.0)
        .max(0.0); // degenerate constraints clamp to a zero box
    ScaledBox {
        width: (pw * scale).round(),
        height: (ph * scale).round(),
    }
}

/// Fit a letterhead logo against two independent hard caps.
///
/// Unlike [`fit_box`], each axis only contributes a ratio when the native
/// dimension actually exceeds its cap; a logo within both caps keeps its
/// native size exactly. Unknown dimensions fall back to a
/// `fallback × fallback` square.
pub fn fit_logo_box(
    pixel_width: Option<u32>,
    pixel_height: Option<u32>,
    cap_width: f64,
    cap_height: f64,
    fallback: f64,
) -> ScaledBox {
    let (pw, ph) = match (pixel_width, pixel_height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as f64, h as f64),
        _ => {
            return ScaledBox {
                width: fallback,
                height: fallback,
            }
        }
    };

    let width_ratio = if pw > cap_width { cap_width / pw } else { 1.0 };
    let height_ratio = if ph > cap_height {
        cap_height / ph
    } else {
        1.0
    };
    let ratio = width_ratio.min(height_ratio);

    if ratio >= 1.0 {
        // Native size preferred whenever it fits under both caps.
        ScaledBox {
            width: pw,
            height: ph,
        }
    } else {
        ScaledBox {
            width: (pw * ratio).round(),
            height: (ph * ratio).round(),
        }
    }
}
