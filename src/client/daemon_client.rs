//! Daemon client for the CLI client.
//!
//! Connects to the daemon as `Role::Script` (or `Role::Monitor` for
//! read-only queries), performs the handshake, and issues one request
//! per method call.

use std::path::Path;

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::ipc::codec::LengthPrefixedCodec;
use crate::ipc::protocol::{Message, PROTOCOL_VERSION, ProximityDescriptor, Role, Status};

use super::ClientError;

/// Result of an on/off request.
pub struct Transition {
    pub outcome: String,
    pub proximity: Option<ProximityDescriptor>,
}

/// Result of a status query.
pub struct StatusReport {
    pub proximity: ProximityDescriptor,
    pub calls: Vec<String>,
}

/// Fields of a successful response.
struct Reply {
    outcome: Option<String>,
    proximity: Option<ProximityDescriptor>,
    calls: Option<Vec<String>>,
}

pub struct DaemonClient {
    framed: Framed<UnixStream, LengthPrefixedCodec>,
    next_id: u32,
}

impl DaemonClient {
    /// Connect to the daemon at `socket_path` and perform the handshake.
    pub async fn connect(socket_path: &Path, role: Role) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            ClientError::Daemon(format!("connect {}: {e}", socket_path.display()))
        })?;
        let mut framed = Framed::new(stream, LengthPrefixedCodec::new());

        framed
            .send(Message::Hello {
                id: 0,
                version: PROTOCOL_VERSION,
                role,
            })
            .await
            .map_err(|e| ClientError::Daemon(format!("send hello: {e}")))?;

        match framed.next().await {
            Some(Ok(Message::HelloAck {
                status: Status::Ok, ..
            })) => {}
            Some(Ok(Message::HelloAck {
                status: Status::Error,
                error,
                ..
            })) => {
                return Err(ClientError::Daemon(format!(
                    "handshake rejected: {}",
                    error.unwrap_or_default()
                )));
            }
            other => {
                return Err(ClientError::Daemon(format!(
                    "unexpected handshake response: {other:?}"
                )));
            }
        }

        Ok(Self {
            framed,
            next_id: 1, // 0 = Hello
        })
    }

    pub async fn call_added(&mut self, call: &str) -> Result<Option<ProximityDescriptor>, ClientError> {
        let id = self.take_id();
        let reply = self
            .request(
                "call_added",
                Message::CallAdded {
                    id,
                    call: call.to_string(),
                },
            )
            .await?;
        Ok(reply.proximity)
    }

    pub async fn call_removed(
        &mut self,
        call: &str,
    ) -> Result<Option<ProximityDescriptor>, ClientError> {
        let id = self.take_id();
        let reply = self
            .request(
                "call_removed",
                Message::CallRemoved {
                    id,
                    call: call.to_string(),
                },
            )
            .await?;
        Ok(reply.proximity)
    }

    pub async fn turn_on(&mut self) -> Result<Transition, ClientError> {
        let id = self.take_id();
        let reply = self.request("turn_on", Message::TurnOn { id }).await?;
        transition(reply)
    }

    pub async fn turn_off(&mut self, screen_on_immediately: bool) -> Result<Transition, ClientError> {
        let id = self.take_id();
        let reply = self
            .request(
                "turn_off",
                Message::TurnOff {
                    id,
                    screen_on_immediately,
                },
            )
            .await?;
        transition(reply)
    }

    pub async fn status(&mut self) -> Result<StatusReport, ClientError> {
        let id = self.take_id();
        let reply = self.request("status", Message::GetStatus { id }).await?;
        let proximity = reply
            .proximity
            .ok_or_else(|| ClientError::Daemon("status response missing proximity".into()))?;
        Ok(StatusReport {
            proximity,
            calls: reply.calls.unwrap_or_default(),
        })
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Send `msg` and wait for the matching response.
    async fn request(&mut self, op: &str, msg: Message) -> Result<Reply, ClientError> {
        self.framed
            .send(msg)
            .await
            .map_err(|e| ClientError::Daemon(format!("send {op}: {e}")))?;

        match self.framed.next().await {
            Some(Ok(Message::Response {
                status: Status::Ok,
                outcome,
                proximity,
                calls,
                ..
            })) => Ok(Reply {
                outcome,
                proximity,
                calls,
            }),
            Some(Ok(Message::Response { error, .. })) => Err(ClientError::Daemon(format!(
                "{op} failed: {}",
                error.unwrap_or_default()
            ))),
            other => Err(ClientError::Daemon(format!(
                "unexpected {op} response: {other:?}"
            ))),
        }
    }
}

fn transition(reply: Reply) -> Result<Transition, ClientError> {
    let outcome = reply
        .outcome
        .ok_or_else(|| ClientError::Daemon("response missing outcome".into()))?;
    Ok(Transition {
        outcome,
        proximity: reply.proximity,
    })
}
