//! High-level operations.
//!
//! These functions combine the pure resolvers with the codec registry:
//! [`plan`] turns a parameter bundle and a source description into a
//! [`ResolvedPlan`], [`render`] carries a plan out into bytes, [`encode`]
//! writes those bytes to a sink, and [`optimize`] runs decode → plan →
//! encode in one call.
//!
//! Every failure aborts immediately. Encoded bytes are produced in full
//! before anything is written, so a failed encode never reaches the sink.

use super::backend::{BackendError, CodecRegistry, SourceImage};
use super::calculations::{resolve_dimensions, resolve_quality};
use super::format::{FormatError, select_format};
use super::params::{Dimensions, ParameterBundle, Quality, ResolvedPlan};
use super::rust_backend;
use crate::config::{ConfigError, Policy};
use image::DynamicImage;
use log::{debug, info};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error(transparent)]
    UnresolvedFormat(#[from] FormatError),
    #[error("Invalid image: {width}x{height} has a zero dimension")]
    InvalidImage { width: u32, height: u32 },
    #[error("Error encoding image: {0}")]
    Encode(String),
    #[error("Could not write output: {0}")]
    Write(#[source] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OptimizeError>;

/// Decode input bytes into a [`SourceImage`].
pub fn decode(bytes: &[u8]) -> Result<SourceImage> {
    if bytes.is_empty() {
        return Err(OptimizeError::InvalidInput("input is empty".into()));
    }
    rust_backend::decode(bytes).map_err(|e| match e {
        BackendError::Decode(msg) | BackendError::Encode(msg) => OptimizeError::Decode(msg),
        BackendError::Io(err) => OptimizeError::Decode(err.to_string()),
    })
}

/// Resolve size, quality and format for one output.
///
/// Pure: the same inputs always give the same plan. `target` is the output
/// path, used only for its extension.
pub fn plan(
    bundle: &ParameterBundle,
    source: Dimensions,
    source_format: &str,
    target: Option<&Path>,
    registry: &CodecRegistry,
    policy: &Policy,
) -> Result<ResolvedPlan> {
    bundle.validate().map_err(OptimizeError::InvalidParameter)?;
    policy.validate()?;

    let dims = resolve_dimensions(bundle, source, policy).ok_or(OptimizeError::InvalidImage {
        width: source.width,
        height: source.height,
    })?;

    let (format, origin) = select_format(
        bundle.mime_type.as_deref(),
        target,
        source_format,
        |f| registry.supports(f),
    )?;
    debug!("format {format} from {origin}");

    let quality = resolve_quality(bundle, policy);
    match bundle.quality {
        Some(_) => debug!("quality {} requested", quality.value()),
        None => debug!(
            "quality {} from downlink {} Mbps (save-data: {})",
            quality.value(),
            bundle.downlink,
            bundle.save_data
        ),
    }

    let plan = ResolvedPlan {
        width: dims.width,
        height: dims.height,
        quality,
        format,
    };
    info!(
        "plan: {}x{} → {}x{} {} q{}",
        source.width,
        source.height,
        plan.width,
        plan.height,
        plan.mime(),
        plan.quality.value()
    );
    Ok(plan)
}

/// Resize `source` to the plan's dimensions and encode it with the
/// registered encoder, returning the complete encoded stream.
///
/// Quality is re-clamped to 1-100 and only matters to formats that use it.
pub fn render(
    source: &DynamicImage,
    plan: &ResolvedPlan,
    registry: &CodecRegistry,
    policy: &Policy,
) -> Result<Vec<u8>> {
    let encoder = registry
        .encoder(plan.format)
        .ok_or_else(|| FormatError::Unsupported(plan.mime().to_string()))?;

    let resized = rust_backend::resize(source, plan.dimensions(), policy.resize_filter);
    if let Cow::Borrowed(_) = resized {
        debug!("native size kept, skipping resize");
    }

    let bytes = encoder
        .encode(&resized, Quality::new(plan.quality.value()))
        .map_err(|e| OptimizeError::Encode(e.to_string()))?;
    debug!("encoded {} bytes as {}", bytes.len(), plan.mime());
    Ok(bytes)
}

/// [`render`] the plan, then write the whole stream to `sink`.
///
/// Nothing is written if resizing or encoding fails.
pub fn encode(
    sink: &mut impl Write,
    source: &DynamicImage,
    plan: &ResolvedPlan,
    registry: &CodecRegistry,
    policy: &Policy,
) -> Result<()> {
    let bytes = render(source, plan, registry, policy)?;
    sink.write_all(&bytes).map_err(OptimizeError::Write)?;
    sink.flush().map_err(OptimizeError::Write)
}

/// Decode, plan and encode in one pass. Returns the plan that was applied.
pub fn optimize(
    input: &[u8],
    bundle: &ParameterBundle,
    target: Option<&Path>,
    sink: &mut impl Write,
    registry: &CodecRegistry,
    policy: &Policy,
) -> Result<ResolvedPlan> {
    let source = decode(input)?;
    let plan = plan(
        bundle,
        source.dimensions(),
        &source.format_name,
        target,
        registry,
        policy,
    )?;
    encode(sink, &source.image, &plan, registry, policy)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::OutputFormat;
    use crate::imaging::backend::FormatEncoder;
    use crate::imaging::backend::tests::{MockEncoder, RecordedEncode};
    use std::sync::Arc;

    /// Registry entry that forwards to a shared mock so the test can
    /// inspect calls after handing the encoder to the registry.
    struct Shared(Arc<MockEncoder>);

    impl FormatEncoder for Shared {
        fn format(&self) -> OutputFormat {
            self.0.format
        }

        fn encode(
            &self,
            image: &DynamicImage,
            quality: Quality,
        ) -> std::result::Result<Vec<u8>, BackendError> {
            self.0.encode(image, quality)
        }
    }

    fn mock_registry(mocks: &[Arc<MockEncoder>]) -> CodecRegistry {
        mocks.iter().fold(CodecRegistry::new(), |registry, mock| {
            registry.with(Box::new(Shared(Arc::clone(mock))))
        })
    }

    fn plan_for(
        bundle: &ParameterBundle,
        source: (u32, u32),
        source_format: &str,
        target: Option<&str>,
    ) -> Result<ResolvedPlan> {
        plan(
            bundle,
            source.into(),
            source_format,
            target.map(Path::new),
            &CodecRegistry::standard(),
            &Policy::default(),
        )
    }

    // =========================================================================
    // plan
    // =========================================================================

    #[test]
    fn plan_defaults_keep_native_size_and_source_format() {
        let plan = plan_for(&ParameterBundle::default(), (640, 480), "png", None).unwrap();
        assert_eq!(
            plan,
            ResolvedPlan {
                width: 640,
                height: 480,
                quality: Quality::new(40),
                format: OutputFormat::Png,
            }
        );
    }

    #[test]
    fn plan_square_width_request() {
        let bundle = ParameterBundle {
            width: Some(50),
            ..Default::default()
        };
        let plan = plan_for(&bundle, (100, 100), "jpeg", None).unwrap();
        assert_eq!((plan.width, plan.height), (50, 50));
    }

    #[test]
    fn plan_format_precedence() {
        let explicit = ParameterBundle {
            mime_type: Some("image/png".into()),
            ..Default::default()
        };
        let plan = plan_for(&explicit, (10, 10), "gif", Some("out.jpg")).unwrap();
        assert_eq!(plan.format, OutputFormat::Png);

        let inferred = ParameterBundle::default();
        let plan = plan_for(&inferred, (10, 10), "gif", Some("out.jpg")).unwrap();
        assert_eq!(plan.format, OutputFormat::Jpeg);

        let plan = plan_for(&inferred, (10, 10), "gif", None).unwrap();
        assert_eq!(plan.format, OutputFormat::Gif);
    }

    #[test]
    fn plan_zero_width_source_is_invalid_image() {
        let err = plan_for(&ParameterBundle::default(), (0, 10), "png", None).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::InvalidImage {
                width: 0,
                height: 10
            }
        ));
    }

    #[test]
    fn plan_unknown_source_format_is_unresolved() {
        let err = plan_for(&ParameterBundle::default(), (10, 10), "unknown", None).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::UnresolvedFormat(FormatError::Unresolved(_))
        ));
    }

    #[test]
    fn plan_rejects_bad_hints() {
        let bundle = ParameterBundle {
            dpr: 0.0,
            ..Default::default()
        };
        let err = plan_for(&bundle, (10, 10), "png", None).unwrap_err();
        assert!(matches!(err, OptimizeError::InvalidParameter(_)));
    }

    #[test]
    fn plan_rejects_invalid_policy() {
        let policy = Policy {
            save_data_scale: 0.0,
            ..Policy::default()
        };
        let err = plan(
            &ParameterBundle::default(),
            Dimensions::new(10, 10),
            "png",
            None,
            &CodecRegistry::standard(),
            &policy,
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::Config(_)));
    }

    #[test]
    fn plan_respects_registry_capabilities() {
        let registry = mock_registry(&[Arc::new(MockEncoder::new(OutputFormat::Png))]);
        let err = plan(
            &ParameterBundle::default(),
            Dimensions::new(10, 10),
            "jpeg",
            None,
            &registry,
            &Policy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::UnresolvedFormat(_)));
    }

    // =========================================================================
    // encode
    // =========================================================================

    #[test]
    fn encode_resizes_then_writes_encoder_output() {
        let mock = Arc::new(MockEncoder::new(OutputFormat::Jpeg));
        let registry = mock_registry(&[Arc::clone(&mock)]);
        let plan = ResolvedPlan {
            width: 50,
            height: 25,
            quality: Quality::new(60),
            format: OutputFormat::Jpeg,
        };

        let mut sink = Vec::new();
        encode(
            &mut sink,
            &DynamicImage::new_rgb8(200, 100),
            &plan,
            &registry,
            &Policy::default(),
        )
        .unwrap();

        assert_eq!(sink, b"jpeg");
        assert_eq!(
            mock.get_calls(),
            vec![RecordedEncode {
                width: 50,
                height: 25,
                quality: 60
            }]
        );
    }

    #[test]
    fn encode_failure_writes_nothing() {
        let mock = Arc::new(MockEncoder::failing(OutputFormat::Png));
        let registry = mock_registry(&[mock]);
        let plan = ResolvedPlan {
            width: 4,
            height: 4,
            quality: Quality::new(60),
            format: OutputFormat::Png,
        };

        let mut sink = Vec::new();
        let err = encode(
            &mut sink,
            &DynamicImage::new_rgb8(4, 4),
            &plan,
            &registry,
            &Policy::default(),
        )
        .unwrap_err();

        assert!(matches!(err, OptimizeError::Encode(_)));
        assert!(sink.is_empty());
    }

    #[test]
    fn encode_unregistered_format_is_unresolved() {
        let plan = ResolvedPlan {
            width: 4,
            height: 4,
            quality: Quality::new(60),
            format: OutputFormat::Tiff,
        };
        let err = encode(
            &mut Vec::new(),
            &DynamicImage::new_rgb8(4, 4),
            &plan,
            &CodecRegistry::new(),
            &Policy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::UnresolvedFormat(_)));
    }

    #[test]
    fn render_reclamps_hand_built_quality() {
        let mock = Arc::new(MockEncoder::new(OutputFormat::WebP));
        let registry = mock_registry(&[Arc::clone(&mock)]);
        let plan = ResolvedPlan {
            width: 4,
            height: 4,
            quality: Quality(0),
            format: OutputFormat::WebP,
        };

        let bytes = render(
            &DynamicImage::new_rgb8(4, 4),
            &plan,
            &registry,
            &Policy::default(),
        )
        .unwrap();

        assert_eq!(bytes, b"webp");
        assert_eq!(mock.get_calls()[0].quality, 1);
    }

    /// Sink that rejects every write.
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn encode_sink_failure_is_write_error() {
        let registry = mock_registry(&[Arc::new(MockEncoder::new(OutputFormat::Gif))]);
        let plan = ResolvedPlan {
            width: 4,
            height: 4,
            quality: Quality::new(60),
            format: OutputFormat::Gif,
        };
        let err = encode(
            &mut BrokenSink,
            &DynamicImage::new_rgb8(4, 4),
            &plan,
            &registry,
            &Policy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, OptimizeError::Write(_)));
        assert!(err.to_string().contains("disk full"));
    }

    // =========================================================================
    // decode / optimize
    // =========================================================================

    #[test]
    fn decode_empty_input_is_invalid_input() {
        assert!(matches!(decode(&[]), Err(OptimizeError::InvalidInput(_))));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        assert!(matches!(
            decode(b"GIF89a but not really"),
            Err(OptimizeError::Decode(_))
        ));
    }

    #[test]
    fn optimize_bad_input_never_reaches_encoder() {
        let mock = Arc::new(MockEncoder::new(OutputFormat::Png));
        let registry = mock_registry(&[Arc::clone(&mock)]);
        let mut sink = Vec::new();
        let result = optimize(
            b"nope",
            &ParameterBundle::default(),
            None,
            &mut sink,
            &registry,
            &Policy::default(),
        );
        assert!(result.is_err());
        assert!(mock.get_calls().is_empty());
        assert!(sink.is_empty());
    }
}
