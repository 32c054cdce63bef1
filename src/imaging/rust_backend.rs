//! Pure Rust decoding, resizing and encoding, plus libwebp for lossy WebP.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `image::DynamicImage::resize_exact`, filter from [`Policy`](crate::config::Policy) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG, BMP, TIFF | `image::DynamicImage::write_to` |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (single frame) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy with quality) |

use super::backend::{BackendError, FormatEncoder, SourceImage};
use super::format::OutputFormat;
use super::params::{Dimensions, Quality};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Frame, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::io::Cursor;

/// Decode an image from memory, sniffing the container from its content.
pub fn decode(bytes: &[u8]) -> Result<SourceImage, BackendError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)?;
    let format = reader
        .format()
        .ok_or_else(|| BackendError::Decode("unrecognized image container".into()))?;
    let image = reader
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(SourceImage::new(image, format_name(format)))
}

/// Short name for a detected container, matching [`OutputFormat::name`]
/// where the format is one we know.
fn format_name(format: ImageFormat) -> String {
    OutputFormat::ALL
        .into_iter()
        .find(|f| f.to_image_format() == format)
        .map(|f| f.name().to_string())
        .unwrap_or_else(|| format!("{format:?}").to_lowercase())
}

/// Resize to exact target dimensions. Borrows the input unchanged when the
/// target already matches.
pub fn resize(
    image: &DynamicImage,
    target: Dimensions,
    filter: FilterType,
) -> Cow<'_, DynamicImage> {
    if image.width() == target.width && image.height() == target.height {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(image.resize_exact(target.width, target.height, filter))
    }
}

/// Every encoder this crate ships, one per [`OutputFormat`].
pub(crate) fn standard_encoders() -> Vec<Box<dyn FormatEncoder>> {
    vec![
        Box::new(JpegCodec),
        Box::new(LosslessCodec(OutputFormat::Png)),
        Box::new(GifCodec),
        Box::new(LosslessCodec(OutputFormat::Bmp)),
        Box::new(LosslessCodec(OutputFormat::Tiff)),
        Box::new(WebPCodec),
    ]
}

fn encode_failed(format: OutputFormat) -> impl Fn(image::ImageError) -> BackendError {
    move |e| BackendError::Encode(format!("{} encode failed: {e}", format.name()))
}

/// Reduce to 8-bit RGB or RGBA, keeping alpha when present.
fn eight_bit(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        other if other.color().has_alpha() => {
            Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8()))
        }
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Pixel layouts PNG stores natively; everything else goes through [`eight_bit`].
fn png_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => Cow::Borrowed(image),
        other => eight_bit(other),
    }
}

/// JPEG with quality. Alpha is dropped; grayscale stays grayscale.
struct JpegCodec;

impl FormatEncoder for JpegCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let opaque = match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => Cow::Borrowed(image),
            other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
        };
        let mut buf = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
        opaque
            .write_with_encoder(encoder)
            .map_err(encode_failed(OutputFormat::Jpeg))?;
        Ok(buf)
    }
}

/// Formats written through `DynamicImage::write_to`: PNG, BMP, TIFF.
/// None of them has a quality setting.
struct LosslessCodec(OutputFormat);

impl FormatEncoder for LosslessCodec {
    fn format(&self) -> OutputFormat {
        self.0
    }

    fn encode(&self, image: &DynamicImage, _quality: Quality) -> Result<Vec<u8>, BackendError> {
        let storable = match self.0 {
            OutputFormat::Png => png_compatible(image),
            _ => eight_bit(image),
        };
        let mut cursor = Cursor::new(Vec::new());
        storable
            .write_to(&mut cursor, self.0.to_image_format())
            .map_err(encode_failed(self.0))?;
        Ok(cursor.into_inner())
    }
}

/// Single-frame GIF. The encoder quantizes to a 256-color palette itself.
struct GifCodec;

impl FormatEncoder for GifCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::Gif
    }

    fn encode(&self, image: &DynamicImage, _quality: Quality) -> Result<Vec<u8>, BackendError> {
        let mut buf = Vec::new();
        {
            // The trailer is written when the encoder drops.
            let mut encoder = GifEncoder::new(&mut buf);
            encoder
                .encode_frame(Frame::new(image.to_rgba8()))
                .map_err(encode_failed(OutputFormat::Gif))?;
        }
        Ok(buf)
    }
}

/// Lossy WebP through libwebp.
struct WebPCodec;

impl FormatEncoder for WebPCodec {
    fn format(&self) -> OutputFormat {
        OutputFormat::WebP
    }

    fn encode(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
        let (width, height) = (image.width(), image.height());
        let quality = quality.value() as f32;

        let encoded = match &*eight_bit(image) {
            DynamicImage::ImageRgba8(rgba) => {
                webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
            }
            other => {
                let rgb = other.to_rgb8();
                webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
            }
        };

        encoded
            .map(|memory| memory.to_vec())
            .map_err(|e| BackendError::Encode(format!("webp encode failed: {e:?}")))
    }
}
