//! Transition results and status snapshots reported by the coordinator.

use std::fmt;

/// What a coordinator request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Lock acquired (and tap-to-wake disabled, if supported).
    Engaged,
    /// Tap-to-wake restored (if it was on) and lock released.
    Released,
    /// turn_on while the lock is held.
    AlreadyEngaged,
    /// turn_off while the lock is not held.
    AlreadyReleased,
    /// turn_on with no active call; rejected.
    NoActiveCalls,
    /// The platform has no proximity lock; nothing to do.
    Unsupported,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Engaged => "engaged",
            Outcome::Released => "released",
            Outcome::AlreadyEngaged => "already_engaged",
            Outcome::AlreadyReleased => "already_released",
            Outcome::NoActiveCalls => "no_active_calls",
            Outcome::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityStatus {
    /// Platform provides a proximity lock.
    pub supported: bool,
    /// Device belongs to the quirk hardware family.
    pub quirk_platform: bool,
    /// Coordinator is in the engaged state.
    pub engaged: bool,
    /// Lock handle reports itself held.
    pub lock_held: bool,
    /// Tap-to-wake value remembered at the last acquire, while engaged.
    pub tap_to_wake_shadow: Option<bool>,
    /// Active calls in the registry.
    pub calls: usize,
}
