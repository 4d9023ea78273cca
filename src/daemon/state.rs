//! Daemon state — call registry, coordinator, connection roles.
//!
//! All methods are synchronous state transitions owned by the daemon
//! loop; the only I/O is what the coordinator's platform adapters do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::calls::{Call, CallsListener};
use crate::ipc::protocol::Role;
use crate::platform::PlatformError;
use crate::proximity::{Outcome, ProximityCoordinator, ProximityStatus};

use super::registry::CallRegistry;

/// Unique identifier for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Why a request could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Machine-readable rejection reason (`duplicate_call`, ...).
    #[error("{0}")]
    Rejected(&'static str),
    #[error("platform_failure: {0}")]
    Platform(#[from] PlatformError),
}

/// Everything the daemon loop owns.
pub struct DaemonState {
    registry: CallRegistry,
    coordinator: ProximityCoordinator,
    /// Connected peers; `None` until the handshake completes.
    connections: HashMap<ConnectionId, Option<Role>>,
}

impl DaemonState {
    pub fn new(coordinator: ProximityCoordinator) -> Self {
        Self {
            registry: CallRegistry::new(),
            coordinator,
            connections: HashMap::new(),
        }
    }

    pub fn add_connection(&mut self, id: ConnectionId) {
        self.connections.insert(id, None);
    }

    pub fn set_role(&mut self, id: ConnectionId, role: Role) {
        self.connections.insert(id, Some(role));
    }

    pub fn role(&self, id: ConnectionId) -> Option<Role> {
        self.connections.get(&id).copied().flatten()
    }

    /// Forget a connection and implicitly remove the calls it owned.
    ///
    /// Calls are removed one at a time, each followed by the same
    /// dispatch `call_removed` would trigger, so only the last removal
    /// drains the registry. A crashed in-call process cannot leave the
    /// screen gated. Returns the removed calls.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Vec<Call> {
        self.connections.remove(&id);
        let orphaned = self.registry.owned_by(id);
        for call in &orphaned {
            tracing::info!(%call, conn_id = ?id, "removing call of disconnected peer");
            if self.registry.remove_call(call).is_err() {
                continue;
            }
            if let Err(e) = self.coordinator.on_call_removed(call, &self.registry) {
                tracing::error!(%call, error = %e, "proximity reset failed");
            }
        }
        orphaned
    }

    /// Calls from `script` peers are registered without an owner so they
    /// outlive the one-shot connection that reported them.
    pub fn add_call(&mut self, call: Call, reporter: ConnectionId) -> Result<(), RequestError> {
        let owner = match self.role(reporter) {
            Some(Role::Script) => None,
            _ => Some(reporter),
        };
        self.registry
            .add_call(call.clone(), owner)
            .map_err(RequestError::Rejected)?;
        self.coordinator.on_call_added(&call, &self.registry)?;
        Ok(())
    }

    /// The registry is updated before the coordinator hears about it.
    pub fn remove_call(&mut self, call: Call) -> Result<(), RequestError> {
        self.registry
            .remove_call(&call)
            .map_err(RequestError::Rejected)?;
        self.coordinator.on_call_removed(&call, &self.registry)?;
        Ok(())
    }

    pub fn turn_on(&mut self) -> Result<Outcome, PlatformError> {
        self.coordinator.turn_on(&self.registry)
    }

    pub fn turn_off(&mut self, screen_on_immediately: bool) -> Result<Outcome, PlatformError> {
        self.coordinator.turn_off(screen_on_immediately)
    }

    pub fn status(&self) -> ProximityStatus {
        self.coordinator.status(&self.registry)
    }

    pub fn call_ids(&self) -> Vec<String> {
        self.registry.call_ids()
    }

    pub fn shutdown(&mut self) -> Result<Outcome, PlatformError> {
        self.coordinator.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeDevice, Op};

    fn state(device: &FakeDevice, quirk: bool) -> DaemonState {
        let coordinator =
            ProximityCoordinator::new(device.platform(true, quirk), "test").unwrap();
        device.journal.take();
        DaemonState::new(coordinator)
    }

    #[test]
    fn roles_follow_handshake() {
        let device = FakeDevice::new(None);
        let mut s = state(&device, false);
        let c = ConnectionId::new();
        s.add_connection(c);
        assert_eq!(s.role(c), None);
        s.set_role(c, Role::InCall);
        assert_eq!(s.role(c), Some(Role::InCall));
        s.remove_connection(c);
        assert_eq!(s.role(c), None);
    }

    #[test]
    fn turn_on_sees_registered_calls() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, false);
        let c = ConnectionId::new();

        assert_eq!(s.turn_on().unwrap(), Outcome::NoActiveCalls);
        s.add_call(Call::new("c1"), c).unwrap();
        assert_eq!(s.turn_on().unwrap(), Outcome::Engaged);
        assert!(s.status().engaged);
    }

    #[test]
    fn removing_last_call_releases() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, true);
        let c = ConnectionId::new();

        s.add_call(Call::new("c1"), c).unwrap();
        s.add_call(Call::new("c2"), c).unwrap();
        s.turn_on().unwrap();

        s.remove_call(Call::new("c1")).unwrap();
        assert!(s.status().engaged);

        s.remove_call(Call::new("c2")).unwrap();
        assert!(!s.status().engaged);
        assert_eq!(device.journal.count(&Op::Recalibrate), 1);
    }

    #[test]
    fn rejected_requests_do_not_reach_coordinator() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, true);
        let c = ConnectionId::new();

        s.add_call(Call::new("c1"), c).unwrap();
        let err = s.add_call(Call::new("c1"), c).unwrap_err();
        assert!(matches!(err, RequestError::Rejected("duplicate_call")));

        let err = s.remove_call(Call::new("c9")).unwrap_err();
        assert_eq!(err.to_string(), "call_not_found");
        assert_eq!(device.journal.count(&Op::Recalibrate), 0);
    }

    #[test]
    fn disconnect_removes_owned_calls_and_resets() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, false);
        let in_call = ConnectionId::new();
        let other = ConnectionId::new();
        s.add_connection(in_call);
        s.add_connection(other);

        s.add_call(Call::new("c1"), in_call).unwrap();
        s.turn_on().unwrap();
        device.journal.take();

        assert!(s.remove_connection(other).is_empty());
        assert!(s.status().engaged);

        assert_eq!(s.remove_connection(in_call), vec![Call::new("c1")]);
        assert!(!s.status().engaged);
        assert_eq!(
            device.journal.count(&Op::Release {
                wait_for_no_proximity: false
            }),
            1
        );
    }

    #[test]
    fn disconnect_with_several_calls_drains_once() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, true);
        let in_call = ConnectionId::new();
        s.add_connection(in_call);

        s.add_call(Call::new("a"), in_call).unwrap();
        s.add_call(Call::new("b"), in_call).unwrap();
        s.turn_on().unwrap();
        device.journal.take();

        assert_eq!(
            s.remove_connection(in_call),
            vec![Call::new("a"), Call::new("b")]
        );
        assert!(!s.status().engaged);
        assert_eq!(device.journal.count(&Op::Recalibrate), 1);
        assert_eq!(
            device.journal.count(&Op::Release {
                wait_for_no_proximity: false
            }),
            1
        );
    }

    #[test]
    fn script_calls_outlive_their_connection() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, true);
        let script = ConnectionId::new();
        s.add_connection(script);
        s.set_role(script, Role::Script);

        s.add_call(Call::new("c1"), script).unwrap();
        assert!(s.remove_connection(script).is_empty());
        assert_eq!(s.call_ids(), vec!["c1".to_string()]);
        assert!(device.journal.take().is_empty());

        assert_eq!(s.turn_on().unwrap(), Outcome::Engaged);
    }

    #[test]
    fn platform_failure_is_reported() {
        let device = FakeDevice::new(Some(true));
        let mut s = state(&device, false);
        s.add_call(Call::new("c1"), ConnectionId::new()).unwrap();
        s.turn_on().unwrap();
        device.inject(|f| f.release = true);

        let err = s.remove_call(Call::new("c1")).unwrap_err();
        assert!(err.to_string().starts_with("platform_failure: power:"));
        // Call is gone even though the reset failed.
        assert!(s.call_ids().is_empty());
    }
}
