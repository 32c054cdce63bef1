//! Output formats and the format selector.
//!
//! Format strings come from three places with three different spellings:
//! users pass MIME types (`image/webp`), output paths carry extensions
//! (`.jpg`), and the decoder reports a bare name (`jpeg`). [`OutputFormat::parse`]
//! accepts all of them.
//!
//! Selection order, first present candidate wins:
//!
//! 1. explicit MIME from the [`ParameterBundle`](super::params::ParameterBundle)
//! 2. extension of the output path
//! 3. format the decoder detected in the source
//!
//! An explicit MIME the registry cannot encode is an error rather than a
//! fall-through. An output extension that isn't an image format falls through
//! to the source format.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Every format the engine knows how to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Tiff,
    WebP,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Gif,
        OutputFormat::Bmp,
        OutputFormat::Tiff,
        OutputFormat::WebP,
    ];

    /// Canonical MIME type.
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Bmp => "image/bmp",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Short lowercase name, as decoders report it.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::WebP => "webp",
        }
    }

    /// Whether the codec has a quality knob. Lossless-only formats ignore it.
    pub fn supports_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::WebP)
    }

    /// Parse a MIME type, alias MIME, format name or file extension.
    ///
    /// Case-insensitive; MIME parameters (`; q=0.8`) are ignored.
    ///
    /// ```
    /// # use hintpress::imaging::OutputFormat;
    /// assert_eq!(OutputFormat::parse("image/jpeg"), Some(OutputFormat::Jpeg));
    /// assert_eq!(OutputFormat::parse("JPG"), Some(OutputFormat::Jpeg));
    /// assert_eq!(OutputFormat::parse("image/x-ms-bmp"), Some(OutputFormat::Bmp));
    /// assert_eq!(OutputFormat::parse("image/svg+xml"), None);
    /// ```
    pub fn parse(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let subtype = essence.strip_prefix("image/").unwrap_or(&essence);
        let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);

        match subtype {
            "jpeg" | "jpg" | "jpe" | "pjpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "bmp" | "ms-bmp" | "dib" => Some(OutputFormat::Bmp),
            "tiff" | "tif" => Some(OutputFormat::Tiff),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Format implied by a path's extension, if it names an image format.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            OutputFormat::Jpeg => image::ImageFormat::Jpeg,
            OutputFormat::Png => image::ImageFormat::Png,
            OutputFormat::Gif => image::ImageFormat::Gif,
            OutputFormat::Bmp => image::ImageFormat::Bmp,
            OutputFormat::Tiff => image::ImageFormat::Tiff,
            OutputFormat::WebP => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl Serialize for OutputFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("requested format '{0}' cannot be encoded")]
    Unsupported(String),
    #[error("no encodable output format (source format '{0}')")]
    Unresolved(String),
}

/// Which precedence level decided the output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOrigin {
    Explicit,
    OutputExtension,
    Source,
}

impl fmt::Display for FormatOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FormatOrigin::Explicit => "requested",
            FormatOrigin::OutputExtension => "output extension",
            FormatOrigin::Source => "source",
        })
    }
}

/// Pick the output format.
///
/// `is_encodable` is the registry's capability query, so the same rules
/// apply to narrower registries.
pub fn select_format(
    explicit: Option<&str>,
    target: Option<&Path>,
    source_format: &str,
    is_encodable: impl Fn(OutputFormat) -> bool,
) -> Result<(OutputFormat, FormatOrigin), FormatError> {
    if let Some(requested) = explicit.map(str::trim).filter(|m| !m.is_empty()) {
        return OutputFormat::parse(requested)
            .filter(|&f| is_encodable(f))
            .map(|f| (f, FormatOrigin::Explicit))
            .ok_or_else(|| FormatError::Unsupported(requested.to_string()));
    }

    if let Some(format) = target
        .and_then(OutputFormat::from_path)
        .filter(|&f| is_encodable(f))
    {
        return Ok((format, FormatOrigin::OutputExtension));
    }

    OutputFormat::parse(source_format)
        .filter(|&f| is_encodable(f))
        .map(|f| (f, FormatOrigin::Source))
        .ok_or_else(|| FormatError::Unresolved(source_format.to_string()))
}
