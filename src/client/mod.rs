//! CLI client for daemon operations.
//!
//! One-shot commands that connect to the daemon, perform a single
//! request, print the result, and exit. Lets a shell script stand in
//! for the in-call logic.

mod daemon_client;
mod format;

use std::path::PathBuf;

use crate::cli::ClientAction;
use crate::ipc::protocol::Role;
use daemon_client::DaemonClient;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no socket path: pass --socket or set $XDG_RUNTIME_DIR")]
    NoRuntimeDir,
    #[error("daemon: {0}")]
    Daemon(String),
}

/// Run the client command.
///
/// Called from `main.rs` for `Command::Client`.
pub async fn run(socket: Option<PathBuf>, action: ClientAction) -> Result<(), ClientError> {
    let socket_path = crate::ipc::socket_path(socket).ok_or(ClientError::NoRuntimeDir)?;
    let mut daemon = DaemonClient::connect(&socket_path, role_for(&action)).await?;

    match action {
        ClientAction::CallAdded { call } => {
            let proximity = daemon.call_added(&call).await?;
            format::print_call_event("added", &call, proximity.as_ref());
        }
        ClientAction::CallRemoved { call } => {
            let proximity = daemon.call_removed(&call).await?;
            format::print_call_event("removed", &call, proximity.as_ref());
        }
        ClientAction::On => {
            let result = daemon.turn_on().await?;
            format::print_transition(&result);
        }
        ClientAction::Off { wait_for_far } => {
            let result = daemon.turn_off(!wait_for_far).await?;
            format::print_transition(&result);
        }
        ClientAction::Status => {
            let report = daemon.status().await?;
            format::print_status(&report);
        }
    }

    Ok(())
}

/// Status queries connect read-only. Everything else connects as a
/// script, so a reported call survives this process exiting.
fn role_for(action: &ClientAction) -> Role {
    match action {
        ClientAction::Status => Role::Monitor,
        _ => Role::Script,
    }
}
