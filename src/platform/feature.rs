//! FeatureService trait — optional hardware feature toggles.

use std::fmt;

use super::PlatformError;

/// Hardware features the coordinator knows how to toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Wake the screen on a physical tap.
    TapToWake,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::TapToWake => "tap-to-wake",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads and writes optional device features.
///
/// Support may change between queries (e.g. a touch controller that
/// disappears after suspend), so callers re-check `is_supported`
/// before every `get`/`set`.
pub trait FeatureService: Send {
    fn is_supported(&self, feature: Feature) -> bool;

    /// Current value. Only valid when `is_supported(feature)` is true.
    fn get(&self, feature: Feature) -> Result<bool, PlatformError>;

    /// Update the value. Only valid when `is_supported(feature)` is true.
    fn set(&self, feature: Feature, enabled: bool) -> Result<(), PlatformError>;
}
