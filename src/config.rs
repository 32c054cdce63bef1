//! Resolution policy.
//!
//! Every tunable number the engine uses lives in [`Policy`]: the downlink
//! quality tiers, the save-data ceiling and downscale factor, and the
//! resampling filter. The defaults are the shipped behavior; callers
//! embedding the library can construct their own and check it with
//! [`Policy::validate`].
//!
//! ## Default tiers
//!
//! ```text
//! downlink (Mbps)   quality
//! < 0.5             40
//! < 1.5             60
//! < 5.0             75
//! otherwise         85
//! save-data         min(tier, 50)
//! ```
//!
//! The tier boundaries follow the Client Hints effective connection types
//! loosely. They are policy, not a protocol contract.

use image::imageops::FilterType;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Policy validation error: {0}")]
    Validation(String),
}

/// One step of the downlink → quality table.
///
/// Applies to any downlink strictly below `below_mbps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownlinkTier {
    pub below_mbps: f64,
    pub quality: u32,
}

impl DownlinkTier {
    pub const fn new(below_mbps: f64, quality: u32) -> Self {
        Self {
            below_mbps,
            quality,
        }
    }
}

/// Tunable constants for dimension and quality resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Ascending downlink tiers.
    pub downlink_tiers: Vec<DownlinkTier>,
    /// Quality when the downlink is above every tier.
    pub fast_quality: u32,
    /// Upper bound on inferred quality when save-data is on.
    pub save_data_ceiling: u32,
    /// Native-size scale factor under save-data when no size was requested.
    pub save_data_scale: f64,
    /// Resampling filter for the resize step.
    pub resize_filter: FilterType,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            downlink_tiers: vec![
                DownlinkTier::new(0.5, 40),
                DownlinkTier::new(1.5, 60),
                DownlinkTier::new(5.0, 75),
            ],
            fast_quality: 85,
            save_data_ceiling: 50,
            save_data_scale: 0.8,
            resize_filter: FilterType::Lanczos3,
        }
    }
}

impl Policy {
    /// Validate the tables: tiers must be strictly ascending in downlink and
    /// non-decreasing in quality, so quality never drops as the network gets
    /// faster.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |q: u32| (1..=100).contains(&q);

        let mut previous: Option<DownlinkTier> = None;
        for tier in &self.downlink_tiers {
            if !tier.below_mbps.is_finite() || tier.below_mbps <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "downlink tier bound must be positive, got {}",
                    tier.below_mbps
                )));
            }
            if !in_range(tier.quality) {
                return Err(ConfigError::Validation(format!(
                    "tier quality must be 1-100, got {}",
                    tier.quality
                )));
            }
            if let Some(prev) = previous {
                if tier.below_mbps <= prev.below_mbps {
                    return Err(ConfigError::Validation(
                        "downlink tiers must be strictly ascending".into(),
                    ));
                }
                if tier.quality < prev.quality {
                    return Err(ConfigError::Validation(
                        "tier quality must not decrease as downlink grows".into(),
                    ));
                }
            }
            previous = Some(*tier);
        }

        if !in_range(self.fast_quality) {
            return Err(ConfigError::Validation(
                "fast_quality must be 1-100".into(),
            ));
        }
        if previous.is_some_and(|last| self.fast_quality < last.quality) {
            return Err(ConfigError::Validation(
                "fast_quality must not be below the last tier".into(),
            ));
        }
        if !in_range(self.save_data_ceiling) {
            return Err(ConfigError::Validation(
                "save_data_ceiling must be 1-100".into(),
            ));
        }
        if !(self.save_data_scale > 0.0 && self.save_data_scale <= 1.0) {
            return Err(ConfigError::Validation(
                "save_data_scale must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}
