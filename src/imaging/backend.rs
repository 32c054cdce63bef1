//! Codec capability registry and shared backend types.
//!
//! The [`FormatEncoder`] trait is the encoder boundary: one implementation
//! per output format, taking an already-resized image and a quality value.
//! [`CodecRegistry`] maps each [`OutputFormat`] to its encoder, so "can we
//! produce this format" is a lookup, not a matter of what got linked in.
//!
//! The production encoders live in
//! [`rust_backend`](super::rust_backend); [`CodecRegistry::standard`]
//! registers all of them.

use super::format::OutputFormat;
use super::params::{Dimensions, Quality};
use image::DynamicImage;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded image plus the format name the decoder detected.
///
/// Owned by the caller; the engine only reads it.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    pub format_name: String,
}

impl SourceImage {
    pub fn new(image: DynamicImage, format_name: impl Into<String>) -> Self {
        Self {
            image,
            format_name: format_name.into(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }
}

/// Encoder for a single output format.
///
/// Implementations must be stateless across calls so one registry can serve
/// concurrent requests.
pub trait FormatEncoder: Send + Sync {
    /// The format this encoder produces.
    fn format(&self) -> OutputFormat;

    /// Encode `image` into a complete byte stream. Encoders whose format has
    /// no quality knob ignore `quality`.
    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError>;
}

/// Explicit mapping from output format to encoder.
#[derive(Default)]
pub struct CodecRegistry {
    encoders: HashMap<OutputFormat, Box<dyn FormatEncoder>>,
}

impl CodecRegistry {
    /// An empty registry. Nothing is encodable until encoders are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every encoder this crate ships.
    pub fn standard() -> Self {
        super::rust_backend::standard_encoders()
            .into_iter()
            .fold(Self::new(), |registry, encoder| registry.with(encoder))
    }

    /// Register an encoder, replacing any previous one for the same format.
    pub fn register(&mut self, encoder: Box<dyn FormatEncoder>) {
        self.encoders.insert(encoder.format(), encoder);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, encoder: Box<dyn FormatEncoder>) -> Self {
        self.register(encoder);
        self
    }

    pub fn supports(&self, format: OutputFormat) -> bool {
        self.encoders.contains_key(&format)
    }

    pub fn encoder(&self, format: OutputFormat) -> Option<&dyn FormatEncoder> {
        self.encoders.get(&format).map(|e| e.as_ref())
    }

    /// Registered formats in [`OutputFormat::ALL`] order.
    pub fn formats(&self) -> Vec<OutputFormat> {
        OutputFormat::ALL
            .into_iter()
            .filter(|f| self.supports(*f))
            .collect()
    }
}
