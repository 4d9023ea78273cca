//! PowerGate trait — proximity-gated screen-off lock.

use std::fmt;

use super::PlatformError;

/// Flags passed to [`ProximityLock::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReleaseFlags(u32);

impl ReleaseFlags {
    /// Release immediately; the screen may come on at once.
    pub const NONE: Self = Self(0);

    /// Defer the release until the sensor no longer reports an object near.
    pub const WAIT_FOR_NO_PROXIMITY: Self = Self(1);

    /// Flags for a release that does or does not turn the screen on at once.
    pub fn for_screen_on(screen_on_immediately: bool) -> Self {
        if screen_on_immediately {
            Self::NONE
        } else {
            Self::WAIT_FOR_NO_PROXIMITY
        }
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn wait_for_no_proximity(self) -> bool {
        self.contains(Self::WAIT_FOR_NO_PROXIMITY)
    }
}

impl fmt::Display for ReleaseFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wait_for_no_proximity() {
            f.write_str("wait_for_no_proximity")
        } else {
            f.write_str("immediate")
        }
    }
}

/// Platform facility that turns the screen off while the proximity
/// sensor reports an object near the device.
///
/// `Send` is required because the daemon loop owns the coordinator
/// inside a tokio task.
pub trait PowerGate: Send {
    /// Whether the platform provides a proximity-gated screen-off lock.
    fn is_proximity_lock_supported(&self) -> bool;

    /// Create a lock handle tagged with `tag`.
    ///
    /// Only valid when [`is_proximity_lock_supported`] returned true.
    ///
    /// [`is_proximity_lock_supported`]: PowerGate::is_proximity_lock_supported
    fn create_proximity_lock(&self, tag: &str) -> Result<Box<dyn ProximityLock>, PlatformError>;
}

/// Handle to one proximity lock.
///
/// Acquire and release are not reference counted; the owner must not
/// acquire a held lock or release an unheld one.
pub trait ProximityLock: Send {
    /// Begin the proximity-gated screen-off policy.
    fn acquire(&mut self) -> Result<(), PlatformError>;

    /// End the policy.
    fn release(&mut self, flags: ReleaseFlags) -> Result<(), PlatformError>;

    /// Whether the lock is currently held.
    fn is_held(&self) -> bool;
}
