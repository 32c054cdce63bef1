//! # Hintpress
//!
//! Re-encode one image for one delivery context. Given a source image and
//! what is known about the client (requested size, device pixel ratio,
//! network downlink, save-data preference, explicit format or quality), pick
//! concrete output dimensions, quality and format, then resize and encode.
//!
//! # Architecture: Resolve, Then Encode
//!
//! ```text
//! bytes ──decode──▶ SourceImage ─┐
//!                                ├─ plan ──▶ ResolvedPlan ──encode──▶ sink
//! ParameterBundle ───────────────┘
//! ```
//!
//! Resolution is pure: [`imaging::plan`] is a function of the parameter
//! bundle, the source's size and format, and the output path's extension.
//! No hidden state, no I/O. Only [`imaging::encode`] touches pixels and the
//! sink, and it encodes fully before writing anything.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Parameter types, resolvers, format selection, codec registry, pipeline |
//! | [`config`] | [`Policy`](config::Policy): quality tiers, save-data constants, resize filter |
//! | [`output`] | Human-readable plan rendering for `--dry-run` |
//!
//! # Design Decisions
//!
//! ## Unset Means `None`
//!
//! Every optional request field in [`imaging::ParameterBundle`] is an
//! `Option`. The command line still treats `0` and `""` as unset, but the
//! library never guesses from a sentinel.
//!
//! ## Explicit Codec Registry
//!
//! Encoders are registered in an [`imaging::CodecRegistry`] rather than
//! discovered from whatever happens to be linked. Format selection asks the
//! registry, so a narrower registry narrows what can be resolved.
//!
//! ## Never Upscale
//!
//! Requested sizes are clamped to the source. A request for more pixels than
//! exist is served at native resolution with the requested aspect ratio.
//!
//! # Example
//!
//! ```no_run
//! use hintpress::config::Policy;
//! use hintpress::imaging::{CodecRegistry, ParameterBundle, optimize};
//!
//! let input = std::fs::read("photo.jpg")?;
//! let bundle = ParameterBundle {
//!     width: Some(400),
//!     dpr: 2.0,
//!     downlink: 1.2,
//!     mime_type: Some("image/webp".into()),
//!     ..Default::default()
//! };
//! let mut out = Vec::new();
//! let plan = optimize(&input, &bundle, None, &mut out, &CodecRegistry::standard(), &Policy::default())?;
//! println!("{}x{} at q{}", plan.width, plan.height, plan.quality.value());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod imaging;
pub mod output;
