//! Proximity coordinator — screen-off-near-ear policy for active calls.
//!
//! Two states: idle (no lock held) and engaged (lock held, tap-to-wake
//! shadowed and disabled). Driven by explicit on/off requests from the
//! in-call audio routing logic and by call removal events; every
//! request is idempotent.
//!
//! Ordering within a transition is visible to the platform and must
//! hold:
//! - turn on: acquire, then disable tap-to-wake.
//! - turn off: restore tap-to-wake, then release.
//! - last call removed: release, then request recalibration.

mod outcome;

pub use outcome::{Outcome, ProximityStatus};

use crate::calls::{Call, CallCount, CallsListener};
use crate::platform::{
    Feature, FeatureService, PlatformError, PlatformSet, ProximityLock, QuirkPlatform,
    ReleaseFlags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    Idle,
    /// `tap_to_wake_shadow` is `Some` only if tap-to-wake was supported
    /// when the lock was acquired.
    Engaged { tap_to_wake_shadow: Option<bool> },
}

/// Governs the proximity lock for the lifetime of the in-call service.
///
/// Owned by a single dispatch loop; no internal synchronization.
pub struct ProximityCoordinator {
    /// `None` when the platform has no proximity lock. Decided once.
    lock: Option<Box<dyn ProximityLock>>,
    features: Box<dyn FeatureService>,
    quirk: Box<dyn QuirkPlatform>,
    quirk_platform: bool,
    state: LockState,
}

impl ProximityCoordinator {
    /// Probe the platform and create the lock handle if supported.
    ///
    /// Capability and quirk probes run exactly once, here.
    pub fn new(platform: PlatformSet, lock_tag: &str) -> Result<Self, PlatformError> {
        let PlatformSet {
            power,
            features,
            quirk,
        } = platform;

        let lock = if power.is_proximity_lock_supported() {
            Some(power.create_proximity_lock(lock_tag)?)
        } else {
            None
        };
        let quirk_platform = quirk.is_quirk_platform();

        tracing::debug!(
            proximity_lock = lock.is_some(),
            quirk_platform,
            tag = lock_tag,
            "proximity coordinator created"
        );

        Ok(Self {
            lock,
            features,
            quirk,
            quirk_platform,
            state: LockState::Idle,
        })
    }

    /// Turn the proximity sensor on: acquire the lock, then disable
    /// tap-to-wake, remembering its previous value.
    ///
    /// Rejected while no call is active. Once the acquire succeeds the
    /// coordinator is engaged even if a tap-to-wake step then fails, so
    /// a later [`turn_off`](Self::turn_off) still releases the lock.
    pub fn turn_on(&mut self, calls: &dyn CallCount) -> Result<Outcome, PlatformError> {
        if calls.current_call_count() == 0 {
            tracing::warn!("asked to turn on proximity sensor without an active call");
            return Ok(Outcome::NoActiveCalls);
        }

        let Some(lock) = self.lock.as_mut() else {
            return Ok(Outcome::Unsupported);
        };

        if matches!(self.state, LockState::Engaged { .. }) {
            tracing::info!("proximity lock already acquired");
            return Ok(Outcome::AlreadyEngaged);
        }

        tracing::info!("acquiring proximity lock");
        lock.acquire()?;
        self.state = LockState::Engaged {
            tap_to_wake_shadow: None,
        };

        if self.features.is_supported(Feature::TapToWake) {
            let was_enabled = self.features.get(Feature::TapToWake)?;
            self.state = LockState::Engaged {
                tap_to_wake_shadow: Some(was_enabled),
            };
            self.features.set(Feature::TapToWake, false)?;
            tracing::debug!(was_enabled, "tap-to-wake disabled for call");
        }

        Ok(Outcome::Engaged)
    }

    /// Turn the proximity sensor off: restore tap-to-wake if it was on,
    /// then release the lock.
    ///
    /// With `screen_on_immediately` false, the platform keeps the screen
    /// off until the sensor reports far. A failed release leaves the
    /// coordinator engaged.
    pub fn turn_off(&mut self, screen_on_immediately: bool) -> Result<Outcome, PlatformError> {
        let Some(lock) = self.lock.as_mut() else {
            return Ok(Outcome::Unsupported);
        };

        let LockState::Engaged { tap_to_wake_shadow } = self.state else {
            tracing::info!("proximity lock already released");
            return Ok(Outcome::AlreadyReleased);
        };

        if self.features.is_supported(Feature::TapToWake) && tap_to_wake_shadow == Some(true) {
            self.features.set(Feature::TapToWake, true)?;
            tracing::debug!("tap-to-wake restored");
        }

        let flags = ReleaseFlags::for_screen_on(screen_on_immediately);
        tracing::info!(%flags, "releasing proximity lock");
        lock.release(flags)?;
        self.state = LockState::Idle;

        Ok(Outcome::Released)
    }

    /// Release the lock before the service exits, so the process never
    /// leaves the screen gated.
    pub fn shutdown(&mut self) -> Result<Outcome, PlatformError> {
        if !self.is_engaged() {
            return Ok(Outcome::AlreadyReleased);
        }
        tracing::info!("shutting down with proximity lock held");
        self.turn_off(true)
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self.state, LockState::Engaged { .. })
    }

    pub fn status(&self, calls: &dyn CallCount) -> ProximityStatus {
        let tap_to_wake_shadow = match self.state {
            LockState::Engaged { tap_to_wake_shadow } => tap_to_wake_shadow,
            LockState::Idle => None,
        };
        ProximityStatus {
            supported: self.lock.is_some(),
            quirk_platform: self.quirk_platform,
            engaged: self.is_engaged(),
            lock_held: self.lock.as_ref().is_some_and(|lock| lock.is_held()),
            tap_to_wake_shadow,
            calls: calls.current_call_count(),
        }
    }
}

impl CallsListener for ProximityCoordinator {
    /// Once the last call is gone, release without waiting for the
    /// sensor and, on quirk hardware, request a recalibration.
    ///
    /// Releasing with the screen on immediately is not always enough to
    /// bring the sensor back on the quirk family, hence the extra
    /// service. Every drain to zero triggers it.
    fn on_call_removed(&mut self, call: &Call, calls: &dyn CallCount) -> Result<(), PlatformError> {
        if calls.current_call_count() > 0 || self.lock.is_none() {
            return Ok(());
        }

        tracing::info!(%call, "all calls removed, resetting proximity sensor");
        self.turn_off(true)?;

        if self.quirk_platform {
            tracing::info!("requesting proximity sensor recalibration");
            self.quirk.request_recalibration();
        }
        Ok(())
    }
}
