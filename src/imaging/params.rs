//! Parameter types for the resolution engine.
//!
//! These structs describe *what* to produce, not *how* to produce it. The
//! [`ParameterBundle`] is the engine's only input besides the decoded image;
//! the [`ResolvedPlan`] is its only output and the contract handed to the
//! codec dispatcher in [`operations`](super::operations).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`Dimensions`]: A width/height pair in device pixels.
//! - [`ParameterBundle`]: Explicit request plus client hints (DPR, downlink, save-data).
//! - [`ResolvedPlan`]: Fully resolved target size, quality and format.

use super::format::OutputFormat;
use serde::Serialize;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Default device pixel ratio: one CSS pixel per device pixel.
pub const DEFAULT_DPR: f64 = 1.0;

/// Default downlink estimate in Mbps (a 2G-class connection).
pub const DEFAULT_DOWNLINK: f64 = 0.384;

/// Everything a caller knows about the delivery context for one image.
///
/// Built once per invocation and read-only afterwards. `None` means "not
/// requested, infer it"; there is no sentinel zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBundle {
    /// Explicit target MIME type or format name.
    pub mime_type: Option<String>,
    /// Explicit quality. Wins over every hint.
    pub quality: Option<u32>,
    /// Requested width in CSS pixels.
    pub width: Option<u32>,
    /// Requested height in CSS pixels.
    pub height: Option<u32>,
    /// Device pixel ratio applied to requested dimensions.
    pub dpr: f64,
    /// Estimated network downlink in Mbps.
    pub downlink: f64,
    /// Client asked to minimise transferred bytes.
    pub save_data: bool,
}

impl Default for ParameterBundle {
    fn default() -> Self {
        Self {
            mime_type: None,
            quality: None,
            width: None,
            height: None,
            dpr: DEFAULT_DPR,
            downlink: DEFAULT_DOWNLINK,
            save_data: false,
        }
    }
}

impl ParameterBundle {
    /// Check that the hint values are usable. Returns a message naming the
    /// offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dpr.is_finite() || self.dpr <= 0.0 {
            return Err(format!("dpr must be a positive number, got {}", self.dpr));
        }
        if !self.downlink.is_finite() || self.downlink <= 0.0 {
            return Err(format!(
                "downlink must be a positive number, got {}",
                self.downlink
            ));
        }
        Ok(())
    }
}

/// The engine's resolved output settings. Every field is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPlan {
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
    #[serde(rename = "mime")]
    pub format: OutputFormat,
}

impl ResolvedPlan {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}
