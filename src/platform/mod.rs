//! Platform adapters — power gate, hardware features, quirk probes.
//!
//! Extracts every host-specific interaction the proximity coordinator
//! needs into three small traits. The host backends bind them to sysfs
//! nodes and Android system properties; tests substitute recording
//! fakes. The daemon composes one [`PlatformSet`] at startup and hands
//! it to the coordinator.

pub mod feature;
pub mod power;
pub mod property;
pub mod quirk;
pub mod sysfs;

#[cfg(test)]
pub mod fake;

use std::path::PathBuf;

pub use feature::{Feature, FeatureService};
pub use power::{PowerGate, ProximityLock, ReleaseFlags};
pub use quirk::QuirkPlatform;

/// Errors returned by platform adapters.
///
/// The coordinator never recovers from these; they are surfaced to the
/// caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Proximity lock operation failed (e.g. control node write error).
    #[error("power: {0}")]
    Power(String),

    /// Hardware feature read or write failed.
    #[error("feature {feature}: {reason}")]
    Feature { feature: Feature, reason: String },

    /// System property query or update failed.
    #[error("property: {0}")]
    Property(String),
}

/// A composed set of platform adapters.
///
/// Constructed once at startup and moved into the coordinator. Only
/// one adapter per concern is active at runtime.
pub struct PlatformSet {
    /// Provides the proximity-gated screen-off lock.
    pub power: Box<dyn PowerGate>,

    /// Reads and writes optional hardware features (tap-to-wake).
    pub features: Box<dyn FeatureService>,

    /// Identifies quirk hardware and triggers sensor recalibration.
    pub quirk: Box<dyn QuirkPlatform>,
}

/// Host backend configuration, assembled from CLI flags in `main.rs`.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Proximity blanking control node.
    pub proximity_node: PathBuf,
    /// Tap-to-wake control node.
    pub tap_to_wake_node: PathBuf,
    /// Property whose non-empty value marks the quirk hardware family.
    pub quirk_property: String,
    /// Property that starts a named init service when written.
    pub control_property: String,
    /// Name of the sensor recalibration service.
    pub recalibration_service: String,
    /// Tag attached to the proximity lock.
    pub lock_tag: String,
}

impl PlatformSet {
    /// Bind the adapters to the host: sysfs for the power gate and
    /// tap-to-wake, system properties for the quirk path.
    pub fn host(config: &PlatformConfig) -> Self {
        Self {
            power: Box::new(sysfs::SysfsPowerGate::new(config.proximity_node.clone())),
            features: Box::new(sysfs::SysfsFeatureService::new(
                config.tap_to_wake_node.clone(),
            )),
            quirk: Box::new(property::PropertyQuirk::new(
                config.quirk_property.clone(),
                config.control_property.clone(),
                config.recalibration_service.clone(),
            )),
        }
    }
}
