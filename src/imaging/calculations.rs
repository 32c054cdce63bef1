//! Pure resolution functions for output dimensions and quality.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Dimensions, ParameterBundle, Quality};
use crate::config::Policy;

/// Convert a CSS-pixel length to device pixels. Never below 1.
fn device_pixels(css: u32, dpr: f64) -> u32 {
    (css as f64 * dpr).round().max(1.0) as u32
}

/// Derive the missing axis from a known one using the source aspect ratio.
fn fill_axis(known: u32, known_source: u32, other_source: u32) -> u32 {
    ((known as f64 * other_source as f64 / known_source as f64).round() as u32).max(1)
}

/// Scale a native length by a factor in (0, 1]. Never below 1.
fn scale_axis(length: u32, factor: f64) -> u32 {
    ((length as f64 * factor).round() as u32).max(1)
}

/// Shrink `(width, height)` proportionally until it fits inside `source`.
///
/// The binding axis lands exactly on the source edge; the other axis keeps
/// the requested aspect ratio.
fn clamp_to_source(width: u32, height: u32, source: Dimensions) -> (u32, u32) {
    if width <= source.width && height <= source.height {
        return (width, height);
    }

    let factor = (source.width as f64 / width as f64).min(source.height as f64 / height as f64);
    (
        ((width as f64 * factor).round() as u32).clamp(1, source.width),
        ((height as f64 * factor).round() as u32).clamp(1, source.height),
    )
}

/// Resolve the output size for a source image.
///
/// - nothing requested: native size, shrunk by `policy.save_data_scale` when
///   save-data is on
/// - one axis requested: scaled by DPR, the other axis follows the source
///   aspect ratio
/// - both requested: both scaled by DPR, used as given
///
/// The result never exceeds the source on either axis. Returns `None` when
/// the source has a zero dimension.
///
/// # Examples
/// ```
/// # use hintpress::config::Policy;
/// # use hintpress::imaging::{Dimensions, ParameterBundle, resolve_dimensions};
/// let bundle = ParameterBundle { width: Some(50), ..Default::default() };
/// let dims = resolve_dimensions(&bundle, Dimensions::new(200, 100), &Policy::default());
/// assert_eq!(dims, Some(Dimensions::new(50, 25)));
/// ```
pub fn resolve_dimensions(
    bundle: &ParameterBundle,
    source: Dimensions,
    policy: &Policy,
) -> Option<Dimensions> {
    if source.width == 0 || source.height == 0 {
        return None;
    }

    let (width, height) = match (bundle.width, bundle.height) {
        (None, None) if bundle.save_data => (
            scale_axis(source.width, policy.save_data_scale),
            scale_axis(source.height, policy.save_data_scale),
        ),
        (None, None) => (source.width, source.height),
        (Some(w), None) => {
            let w = device_pixels(w, bundle.dpr);
            (w, fill_axis(w, source.width, source.height))
        }
        (None, Some(h)) => {
            let h = device_pixels(h, bundle.dpr);
            (fill_axis(h, source.height, source.width), h)
        }
        (Some(w), Some(h)) => (device_pixels(w, bundle.dpr), device_pixels(h, bundle.dpr)),
    };

    let (width, height) = clamp_to_source(width, height, source);
    Some(Dimensions::new(width, height))
}

/// Quality implied by the downlink alone: the first tier whose bound is
/// above the downlink, or `policy.fast_quality` past the last tier.
pub fn downlink_quality(downlink: f64, policy: &Policy) -> u32 {
    policy
        .downlink_tiers
        .iter()
        .find(|tier| downlink < tier.below_mbps)
        .map_or(policy.fast_quality, |tier| tier.quality)
}

/// Resolve the output quality.
///
/// An explicit quality always wins. Otherwise the downlink tier decides,
/// capped at `policy.save_data_ceiling` when save-data is on.
///
/// # Examples
/// ```
/// # use hintpress::config::Policy;
/// # use hintpress::imaging::{ParameterBundle, resolve_quality};
/// let bundle = ParameterBundle {
///     quality: Some(77),
///     downlink: 100.0,
///     save_data: true,
///     ..Default::default()
/// };
/// assert_eq!(resolve_quality(&bundle, &Policy::default()).value(), 77);
/// ```
pub fn resolve_quality(bundle: &ParameterBundle, policy: &Policy) -> Quality {
    if let Some(explicit) = bundle.quality {
        return Quality::new(explicit);
    }

    let inferred = downlink_quality(bundle.downlink, policy);
    if bundle.save_data {
        Quality::new(inferred.min(policy.save_data_ceiling))
    } else {
        Quality::new(inferred)
    }
}
