//! Message dispatch and request handling.
//!
//! Pure dispatch: each handler takes the [`DaemonState`] and returns
//! the response message for the requesting connection.

use crate::calls::Call;
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, ProximityDescriptor, Role, Status};
use crate::platform::PlatformError;
use crate::proximity::Outcome;

use super::state::{ConnectionId, DaemonState, RequestError};

/// Dispatch a request message to the appropriate handler.
///
/// Enforces:
/// - Role-based access: call events and on/off requests are rejected
///   from `monitor` peers (and before the handshake) with `unknown_type`
/// - Server-originated variants → `unknown_type`
pub fn handle_message(
    state: &mut DaemonState,
    request: Message,
    connection_id: ConnectionId,
) -> Message {
    match request {
        Message::Hello { id, version, role } => {
            handle_hello(state, id, version, role, connection_id)
        }
        // -- In-call and script only --
        Message::CallAdded { id, call } => {
            if !may_drive(state, connection_id) {
                return Message::error(id, "unknown_type");
            }
            let result = state.add_call(Call::new(call), connection_id);
            call_event_response(state, id, result)
        }
        Message::CallRemoved { id, call } => {
            if !may_drive(state, connection_id) {
                return Message::error(id, "unknown_type");
            }
            let result = state.remove_call(Call::new(call));
            call_event_response(state, id, result)
        }
        Message::TurnOn { id } => {
            if !may_drive(state, connection_id) {
                return Message::error(id, "unknown_type");
            }
            let result = state.turn_on();
            transition_response(state, id, result)
        }
        Message::TurnOff {
            id,
            screen_on_immediately,
        } => {
            if !may_drive(state, connection_id) {
                return Message::error(id, "unknown_type");
            }
            let result = state.turn_off(screen_on_immediately);
            transition_response(state, id, result)
        }
        // -- Any role --
        Message::GetStatus { id } => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            outcome: None,
            proximity: Some(ProximityDescriptor::from(state.status())),
            calls: Some(state.call_ids()),
        },
        // Server-originated messages should never be sent by peers.
        Message::HelloAck { id, .. } | Message::Response { id, .. } => {
            Message::error(id, "unknown_type")
        }
    }
}

fn handle_hello(
    state: &mut DaemonState,
    id: u32,
    version: u32,
    role: Role,
    connection_id: ConnectionId,
) -> Message {
    if version != PROTOCOL_VERSION {
        return Message::HelloAck {
            id,
            status: Status::Error,
            error: Some("version_mismatch".into()),
        };
    }
    state.set_role(connection_id, role);
    tracing::debug!(conn_id = ?connection_id, ?role, "handshake complete");
    Message::HelloAck {
        id,
        status: Status::Ok,
        error: None,
    }
}

fn may_drive(state: &DaemonState, connection_id: ConnectionId) -> bool {
    matches!(
        state.role(connection_id),
        Some(Role::InCall | Role::Script)
    )
}

fn call_event_response(
    state: &DaemonState,
    id: u32,
    result: Result<(), RequestError>,
) -> Message {
    match result {
        Ok(()) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            outcome: None,
            proximity: Some(ProximityDescriptor::from(state.status())),
            calls: None,
        },
        Err(RequestError::Rejected(reason)) => Message::error(id, reason),
        Err(RequestError::Platform(e)) => platform_failure(id, &e),
    }
}

fn transition_response(
    state: &DaemonState,
    id: u32,
    result: Result<Outcome, PlatformError>,
) -> Message {
    match result {
        Ok(outcome) => Message::Response {
            id,
            status: Status::Ok,
            error: None,
            outcome: Some(outcome.as_str().into()),
            proximity: Some(ProximityDescriptor::from(state.status())),
            calls: None,
        },
        Err(e) => platform_failure(id, &e),
    }
}

fn platform_failure(id: u32, error: &PlatformError) -> Message {
    tracing::error!(id, error = %error, "platform request failed");
    Message::error(id, format!("platform_failure: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{FakeDevice, Op};
    use crate::proximity::ProximityCoordinator;

    fn fresh(device: &FakeDevice) -> (DaemonState, ConnectionId) {
        let coordinator =
            ProximityCoordinator::new(device.platform(true, false), "test").unwrap();
        device.journal.take();
        let mut state = DaemonState::new(coordinator);
        let conn = ConnectionId::new();
        state.add_connection(conn);
        (state, conn)
    }

    fn hello(state: &mut DaemonState, conn: ConnectionId, role: Role) -> Message {
        handle_message(
            state,
            Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION,
                role,
            },
            conn,
        )
    }

    fn error_of(msg: &Message) -> Option<&str> {
        match msg {
            Message::Response {
                status: Status::Error,
                error,
                ..
            } => error.as_deref(),
            _ => None,
        }
    }

    fn outcome_of(msg: &Message) -> Option<&str> {
        match msg {
            Message::Response {
                status: Status::Ok,
                outcome,
                ..
            } => outcome.as_deref(),
            _ => None,
        }
    }

    #[test]
    fn hello_ok() {
        let device = FakeDevice::new(None);
        let (mut s, c) = fresh(&device);
        assert_eq!(
            hello(&mut s, c, Role::InCall),
            Message::HelloAck {
                id: 0,
                status: Status::Ok,
                error: None
            }
        );
        assert_eq!(s.role(c), Some(Role::InCall));
    }

    #[test]
    fn hello_version_mismatch() {
        let device = FakeDevice::new(None);
        let (mut s, c) = fresh(&device);
        let resp = handle_message(
            &mut s,
            Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION + 1,
                role: Role::InCall,
            },
            c,
        );
        assert_eq!(
            resp,
            Message::HelloAck {
                id: 0,
                status: Status::Error,
                error: Some("version_mismatch".into())
            }
        );
        assert_eq!(s.role(c), None);
    }

    #[test]
    fn monitor_cannot_drive_the_sensor() {
        let device = FakeDevice::new(Some(true));
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::Monitor);

        let requests = vec![
            Message::CallAdded {
                id: 1,
                call: "c1".into(),
            },
            Message::CallRemoved {
                id: 2,
                call: "c1".into(),
            },
            Message::TurnOn { id: 3 },
            Message::TurnOff {
                id: 4,
                screen_on_immediately: true,
            },
        ];
        for req in requests {
            let resp = handle_message(&mut s, req, c);
            assert_eq!(error_of(&resp), Some("unknown_type"));
        }
        assert!(device.journal.take().is_empty());
    }

    #[test]
    fn call_flow_engages_and_releases() {
        let device = FakeDevice::new(Some(true));
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::InCall);

        let resp = handle_message(
            &mut s,
            Message::CallAdded {
                id: 1,
                call: "c1".into(),
            },
            c,
        );
        match resp {
            Message::Response {
                status: Status::Ok,
                proximity: Some(p),
                ..
            } => {
                assert_eq!(p.calls, 1);
                assert!(!p.engaged);
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let resp = handle_message(&mut s, Message::TurnOn { id: 2 }, c);
        assert_eq!(outcome_of(&resp), Some("engaged"));
        let resp = handle_message(&mut s, Message::TurnOn { id: 3 }, c);
        assert_eq!(outcome_of(&resp), Some("already_engaged"));

        handle_message(
            &mut s,
            Message::CallRemoved {
                id: 4,
                call: "c1".into(),
            },
            c,
        );
        assert!(!s.status().engaged);
        assert_eq!(
            device.journal.count(&Op::Release {
                wait_for_no_proximity: false
            }),
            1
        );
    }

    #[test]
    fn script_peer_drives_the_sensor() {
        let device = FakeDevice::new(Some(true));
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::Script);

        handle_message(
            &mut s,
            Message::CallAdded {
                id: 1,
                call: "c1".into(),
            },
            c,
        );
        let resp = handle_message(&mut s, Message::TurnOn { id: 2 }, c);
        assert_eq!(outcome_of(&resp), Some("engaged"));
    }

    #[test]
    fn turn_on_without_call_reports_rejection() {
        let device = FakeDevice::new(Some(true));
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::InCall);

        let resp = handle_message(&mut s, Message::TurnOn { id: 1 }, c);
        assert_eq!(outcome_of(&resp), Some("no_active_calls"));
    }

    #[test]
    fn duplicate_and_unknown_calls() {
        let device = FakeDevice::new(None);
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::InCall);

        let add = || Message::CallAdded {
            id: 1,
            call: "c1".into(),
        };
        handle_message(&mut s, add(), c);
        assert_eq!(
            error_of(&handle_message(&mut s, add(), c)),
            Some("duplicate_call")
        );
        let resp = handle_message(
            &mut s,
            Message::CallRemoved {
                id: 2,
                call: "c2".into(),
            },
            c,
        );
        assert_eq!(error_of(&resp), Some("call_not_found"));
    }

    #[test]
    fn platform_failure_echoes_id() {
        let device = FakeDevice::new(Some(true));
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::InCall);
        handle_message(
            &mut s,
            Message::CallAdded {
                id: 1,
                call: "c1".into(),
            },
            c,
        );
        device.inject(|f| f.acquire = true);

        match handle_message(&mut s, Message::TurnOn { id: 7 }, c) {
            Message::Response {
                id,
                status: Status::Error,
                error: Some(reason),
                ..
            } => {
                assert_eq!(id, 7);
                assert!(reason.starts_with("platform_failure: power:"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn status_allowed_for_monitor() {
        let device = FakeDevice::new(Some(true));
        let (mut s, in_call) = fresh(&device);
        hello(&mut s, in_call, Role::InCall);
        handle_message(
            &mut s,
            Message::CallAdded {
                id: 1,
                call: "c1".into(),
            },
            in_call,
        );

        let monitor = ConnectionId::new();
        s.add_connection(monitor);
        hello(&mut s, monitor, Role::Monitor);

        match handle_message(&mut s, Message::GetStatus { id: 5 }, monitor) {
            Message::Response {
                id: 5,
                status: Status::Ok,
                proximity: Some(p),
                calls: Some(calls),
                ..
            } => {
                assert!(p.supported);
                assert_eq!(calls, vec!["c1".to_string()]);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn server_messages_rejected() {
        let device = FakeDevice::new(None);
        let (mut s, c) = fresh(&device);
        hello(&mut s, c, Role::InCall);
        let resp = handle_message(
            &mut s,
            Message::HelloAck {
                id: 3,
                status: Status::Ok,
                error: None,
            },
            c,
        );
        assert_eq!(error_of(&resp), Some("unknown_type"));
    }
}
