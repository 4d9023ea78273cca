//! sysfs host backends for the power gate and hardware features.
//!
//! Proximity blanking node contract (written by the in-call daemon,
//! implemented by the display/touch driver):
//!
//! | value | meaning                                              |
//! |-------|------------------------------------------------------|
//! | `1`   | engage: blank the panel while the sensor reports near |
//! | `0`   | release: unblank immediately                          |
//! | `2`   | release once the sensor reports far                   |
//!
//! Feature nodes hold a single integer: `0` off, anything else on.

use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};

use super::{Feature, FeatureService, PlatformError, PowerGate, ProximityLock, ReleaseFlags};

/// Default proximity blanking control node.
pub const DEFAULT_PROXIMITY_NODE: &str = "/sys/class/sensors/proximity/blank_on_near";

/// Default tap-to-wake (double-tap) control node.
pub const DEFAULT_TAP_TO_WAKE_NODE: &str = "/sys/android_touch/doubletap2wake";

const ENGAGE: &str = "1";
const RELEASE_IMMEDIATE: &str = "0";
const RELEASE_ON_FAR: &str = "2";

fn node_accessible(path: &Path, mode: AccessFlags) -> bool {
    match access(path, mode) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "sysfs node not accessible");
            false
        }
    }
}

/// Power gate backed by a proximity blanking control node.
pub struct SysfsPowerGate {
    node: PathBuf,
}

impl SysfsPowerGate {
    pub fn new(node: PathBuf) -> Self {
        Self { node }
    }
}

impl PowerGate for SysfsPowerGate {
    fn is_proximity_lock_supported(&self) -> bool {
        node_accessible(&self.node, AccessFlags::W_OK)
    }

    fn create_proximity_lock(&self, tag: &str) -> Result<Box<dyn ProximityLock>, PlatformError> {
        Ok(Box::new(SysfsProximityLock {
            node: self.node.clone(),
            tag: tag.to_string(),
            held: false,
        }))
    }
}

/// Lock handle for [`SysfsPowerGate`]. Held state is tracked here; the
/// node itself is write-only from our side.
struct SysfsProximityLock {
    node: PathBuf,
    tag: String,
    held: bool,
}

impl SysfsProximityLock {
    fn write(&self, value: &str) -> Result<(), PlatformError> {
        fs::write(&self.node, value).map_err(|e| {
            PlatformError::Power(format!(
                "{}: write {value} to {}: {e}",
                self.tag,
                self.node.display()
            ))
        })
    }
}

impl ProximityLock for SysfsProximityLock {
    fn acquire(&mut self) -> Result<(), PlatformError> {
        self.write(ENGAGE)?;
        self.held = true;
        Ok(())
    }

    fn release(&mut self, flags: ReleaseFlags) -> Result<(), PlatformError> {
        let value = if flags.wait_for_no_proximity() {
            RELEASE_ON_FAR
        } else {
            RELEASE_IMMEDIATE
        };
        self.write(value)?;
        self.held = false;
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.held
    }
}

/// Feature service backed by one sysfs node per feature.
pub struct SysfsFeatureService {
    tap_to_wake: PathBuf,
}

impl SysfsFeatureService {
    pub fn new(tap_to_wake: PathBuf) -> Self {
        Self { tap_to_wake }
    }

    fn node(&self, feature: Feature) -> &Path {
        match feature {
            Feature::TapToWake => &self.tap_to_wake,
        }
    }
}

impl FeatureService for SysfsFeatureService {
    fn is_supported(&self, feature: Feature) -> bool {
        node_accessible(self.node(feature), AccessFlags::R_OK | AccessFlags::W_OK)
    }

    fn get(&self, feature: Feature) -> Result<bool, PlatformError> {
        let path = self.node(feature);
        let raw = fs::read_to_string(path).map_err(|e| PlatformError::Feature {
            feature,
            reason: format!("read {}: {e}", path.display()),
        })?;
        parse_toggle(&raw).ok_or_else(|| PlatformError::Feature {
            feature,
            reason: format!("unexpected value {:?} in {}", raw.trim(), path.display()),
        })
    }

    fn set(&self, feature: Feature, enabled: bool) -> Result<(), PlatformError> {
        let path = self.node(feature);
        let value = if enabled { "1" } else { "0" };
        fs::write(path, value).map_err(|e| PlatformError::Feature {
            feature,
            reason: format!("write {value} to {}: {e}", path.display()),
        })
    }
}

/// Parse a toggle node's contents. Some drivers append a description
/// after the value (`"1 (enabled)"`), so only the first token counts.
fn parse_toggle(raw: &str) -> Option<bool> {
    let token = raw.split_whitespace().next()?;
    token.parse::<i64>().ok().map(|v| v != 0)
}
