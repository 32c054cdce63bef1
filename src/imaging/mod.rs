//! Image resolution and re-encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (content-sniffed) |
//! | **Resize** | `resize_exact`, Lanczos3 by default |
//! | **Encode JPEG/PNG/GIF/BMP/TIFF** | `image` crate codecs |
//! | **Encode WebP** | `webp` (libwebp, lossy) |
//!
//! The module is split into:
//! - **Parameters**: [`ParameterBundle`] in, [`ResolvedPlan`] out
//! - **Calculations**: pure dimension and quality resolvers (unit testable)
//! - **Format**: [`OutputFormat`] naming and the format selector
//! - **Backend**: [`FormatEncoder`] trait + [`CodecRegistry`]
//! - **Operations**: plan, encode, and the end-to-end pipeline

pub mod backend;
mod calculations;
mod format;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, CodecRegistry, FormatEncoder, SourceImage};
pub use calculations::{downlink_quality, resolve_dimensions, resolve_quality};
pub use format::{FormatError, FormatOrigin, OutputFormat, select_format};
pub use operations::{OptimizeError, decode, encode, optimize, plan, render};
pub use params::{DEFAULT_DOWNLINK, DEFAULT_DPR, Dimensions, ParameterBundle, Quality, ResolvedPlan};
