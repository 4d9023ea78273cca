//! Wire protocol message types for daemon IPC.
//!
//! All messages are MessagePack-encoded maps with at minimum `type` and
//! `id` fields.

use serde::{Deserialize, Serialize};

use crate::proximity::ProximityStatus;

/// All wire protocol messages.
///
/// Serialized as a tagged union on the `type` field via MessagePack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Message {
    // -- Handshake --
    #[serde(rename = "hello")]
    Hello { id: u32, version: u32, role: Role },

    #[serde(rename = "hello_ack")]
    HelloAck {
        id: u32,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    // -- Call lifecycle (in-call only) --
    #[serde(rename = "call_added")]
    CallAdded { id: u32, call: String },

    #[serde(rename = "call_removed")]
    CallRemoved { id: u32, call: String },

    // -- Proximity requests (in-call only) --
    #[serde(rename = "turn_on")]
    TurnOn { id: u32 },

    #[serde(rename = "turn_off")]
    TurnOff {
        id: u32,
        screen_on_immediately: bool,
    },

    // -- Query --
    #[serde(rename = "status")]
    GetStatus { id: u32 },

    // -- Generic response --
    #[serde(rename = "response")]
    Response {
        id: u32,
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Transition result for turn_on / turn_off.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        proximity: Option<ProximityDescriptor>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        calls: Option<Vec<String>>,
    },
}

impl Message {
    /// Error response echoing the request id.
    pub fn error(id: u32, reason: impl Into<String>) -> Self {
        Message::Response {
            id,
            status: Status::Error,
            error: Some(reason.into()),
            outcome: None,
            proximity: None,
            calls: None,
        }
    }
}

/// Peer role in the handshake.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The in-call logic: reports calls and drives the sensor. Its calls
    /// are dropped when the connection closes.
    InCall,
    /// One-shot tool acting for the in-call logic. Same requests as
    /// `InCall`, but its calls stay until removed explicitly.
    Script,
    /// Read-only observer.
    Monitor,
}

/// Response status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Coordinator snapshot returned in responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProximityDescriptor {
    pub supported: bool,
    pub quirk_platform: bool,
    pub engaged: bool,
    pub lock_held: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap_to_wake_shadow: Option<bool>,
    pub calls: u32,
}

impl From<ProximityStatus> for ProximityDescriptor {
    fn from(s: ProximityStatus) -> Self {
        Self {
            supported: s.supported,
            quirk_platform: s.quirk_platform,
            engaged: s.engaged,
            lock_held: s.lock_held,
            tap_to_wake_shadow: s.tap_to_wake_shadow,
            calls: u32::try_from(s.calls).unwrap_or(u32::MAX),
        }
    }
}

/// Protocol version.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum payload size (64 KiB). Requests carry only call ids.
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// Minimal envelope for extracting `{type, id}` from unknown messages.
///
/// Used by the daemon as a fallback when [`Message`] deserialization
/// fails (e.g., unknown `type` tag), so the error response can echo the
/// request `id`.
#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    /// Consumed by serde for structural matching; not read by daemon code.
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub msg_type: String,
    pub id: u32,
}
