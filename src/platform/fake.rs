//! Recording fakes for the platform adapters.
//!
//! All three adapters append to one shared [`Journal`], so tests can
//! assert on the relative order of calls across services.

use std::sync::{Arc, Mutex};

use super::{
    Feature, FeatureService, PlatformError, PlatformSet, PowerGate, ProximityLock, QuirkPlatform,
    ReleaseFlags,
};

/// One observed adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    ProbeProximityLock,
    CreateLock(String),
    Acquire,
    Release { wait_for_no_proximity: bool },
    IsHeld,
    FeatureSupported(Feature),
    FeatureGet(Feature),
    FeatureSet(Feature, bool),
    ProbeQuirk,
    Recalibrate,
}

/// Shared, ordered record of adapter calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Op>>>);

impl Journal {
    fn record(&self, op: Op) {
        self.0.lock().unwrap().push(op);
    }

    /// Drain and return everything recorded so far.
    pub fn take(&self) -> Vec<Op> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    pub fn count(&self, op: &Op) -> usize {
        self.0.lock().unwrap().iter().filter(|o| *o == op).count()
    }
}

/// Injected failures.
#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    pub acquire: bool,
    pub release: bool,
    pub feature_get: bool,
    pub feature_set: bool,
}

#[derive(Debug)]
struct DeviceState {
    /// `None` = tap-to-wake unsupported.
    tap_to_wake: Option<bool>,
    faults: Faults,
}

/// A fake device whose adapters share one journal and one state.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub journal: Journal,
    state: Arc<Mutex<DeviceState>>,
}

impl FakeDevice {
    /// `tap_to_wake`: `None` when the feature is unsupported, otherwise
    /// its initial value.
    pub fn new(tap_to_wake: Option<bool>) -> Self {
        Self {
            journal: Journal::default(),
            state: Arc::new(Mutex::new(DeviceState {
                tap_to_wake,
                faults: Faults::default(),
            })),
        }
    }

    pub fn platform(&self, lock_supported: bool, quirk: bool) -> PlatformSet {
        PlatformSet {
            power: Box::new(FakePowerGate {
                device: self.clone(),
                supported: lock_supported,
            }),
            features: Box::new(FakeFeatures {
                device: self.clone(),
            }),
            quirk: Box::new(FakeQuirk {
                device: self.clone(),
                quirk,
            }),
        }
    }

    /// Current tap-to-wake value, or `None` if unsupported.
    pub fn tap_to_wake(&self) -> Option<bool> {
        self.state.lock().unwrap().tap_to_wake
    }

    pub fn set_tap_to_wake(&self, value: Option<bool>) {
        self.state.lock().unwrap().tap_to_wake = value;
    }

    pub fn inject(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.state.lock().unwrap().faults);
    }

    fn faults(&self) -> Faults {
        self.state.lock().unwrap().faults
    }
}

struct FakePowerGate {
    device: FakeDevice,
    supported: bool,
}

impl PowerGate for FakePowerGate {
    fn is_proximity_lock_supported(&self) -> bool {
        self.device.journal.record(Op::ProbeProximityLock);
        self.supported
    }

    fn create_proximity_lock(&self, tag: &str) -> Result<Box<dyn ProximityLock>, PlatformError> {
        self.device.journal.record(Op::CreateLock(tag.to_string()));
        Ok(Box::new(FakeLock {
            device: self.device.clone(),
            held: false,
        }))
    }
}

struct FakeLock {
    device: FakeDevice,
    held: bool,
}

impl ProximityLock for FakeLock {
    fn acquire(&mut self) -> Result<(), PlatformError> {
        self.device.journal.record(Op::Acquire);
        if self.device.faults().acquire {
            return Err(PlatformError::Power("injected acquire failure".into()));
        }
        self.held = true;
        Ok(())
    }

    fn release(&mut self, flags: ReleaseFlags) -> Result<(), PlatformError> {
        self.device.journal.record(Op::Release {
            wait_for_no_proximity: flags.wait_for_no_proximity(),
        });
        if self.device.faults().release {
            return Err(PlatformError::Power("injected release failure".into()));
        }
        self.held = false;
        Ok(())
    }

    fn is_held(&self) -> bool {
        self.device.journal.record(Op::IsHeld);
        self.held
    }
}

struct FakeFeatures {
    device: FakeDevice,
}

impl FeatureService for FakeFeatures {
    fn is_supported(&self, feature: Feature) -> bool {
        self.device.journal.record(Op::FeatureSupported(feature));
        self.device.tap_to_wake().is_some()
    }

    fn get(&self, feature: Feature) -> Result<bool, PlatformError> {
        self.device.journal.record(Op::FeatureGet(feature));
        if self.device.faults().feature_get {
            return Err(PlatformError::Feature {
                feature,
                reason: "injected read failure".into(),
            });
        }
        self.device.tap_to_wake().ok_or(PlatformError::Feature {
            feature,
            reason: "unsupported".into(),
        })
    }

    fn set(&self, feature: Feature, enabled: bool) -> Result<(), PlatformError> {
        self.device.journal.record(Op::FeatureSet(feature, enabled));
        if self.device.faults().feature_set {
            return Err(PlatformError::Feature {
                feature,
                reason: "injected write failure".into(),
            });
        }
        self.device.set_tap_to_wake(Some(enabled));
        Ok(())
    }
}

struct FakeQuirk {
    device: FakeDevice,
    quirk: bool,
}

impl QuirkPlatform for FakeQuirk {
    fn is_quirk_platform(&self) -> bool {
        self.device.journal.record(Op::ProbeQuirk);
        self.quirk
    }

    fn request_recalibration(&self) {
        self.device.journal.record(Op::Recalibrate);
    }
}
