//! Proximity daemon — call registry and coordinator behind a socket.
//!
//! The in-call logic connects over a Unix domain socket, reports call
//! additions and removals, and asks for the proximity sensor to be
//! turned on or off.
//!
//! Architecture: channel-based actor. A single daemon loop owns all
//! mutable state ([`state::DaemonState`]), which makes it the one
//! dispatch thread the coordinator requires. Per-connection tasks
//! forward requests via an mpsc channel and wait on a oneshot reply.

mod connection;
mod handler;
pub mod registry;
pub mod state;

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use connection::{DaemonCommand, DisconnectNotice};
use state::{ConnectionId, DaemonState};

use crate::platform::{PlatformConfig, PlatformError, PlatformSet};
use crate::proximity::ProximityCoordinator;

/// Daemon startup/runtime errors.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("no socket path: pass --socket or set $XDG_RUNTIME_DIR")]
    NoRuntimeDir,
    #[error("daemon already running at {0}")]
    AlreadyRunning(PathBuf),
    #[error("failed to create directory {path}: {source}")]
    MkdirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the daemon until SIGTERM or SIGINT.
///
/// Probes the host platform once, binds the socket, and serves
/// requests. On shutdown the proximity lock is released if held and
/// the socket file is removed.
///
/// # Errors
///
/// Returns `DaemonError` if no socket path can be resolved, the bind
/// fails, another daemon is already running, or lock creation fails.
pub async fn run(socket: Option<PathBuf>, config: PlatformConfig) -> Result<(), DaemonError> {
    let socket_path = crate::ipc::socket_path(socket).ok_or(DaemonError::NoRuntimeDir)?;

    let coordinator = ProximityCoordinator::new(PlatformSet::host(&config), &config.lock_tag)?;
    let mut state = DaemonState::new(coordinator);

    let listener = bind_socket(&socket_path).await?;
    tracing::info!(path = %socket_path.display(), "daemon listening");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        }
    };

    serve(listener, &mut state, shutdown).await;

    if let Err(e) = state.shutdown() {
        tracing::error!(error = %e, "failed to release proximity lock on shutdown");
    }

    if let Err(e) = std::fs::remove_file(&socket_path) {
        tracing::warn!(error = %e, path = %socket_path.display(), "failed to remove socket");
    }

    tracing::info!("daemon stopped");
    Ok(())
}

/// Accept connections and dispatch requests until `shutdown` resolves.
async fn serve(listener: UnixListener, state: &mut DaemonState, shutdown: impl Future<Output = ()>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<DaemonCommand>();
    let (disconnect_tx, mut disconnect_rx) = mpsc::unbounded_channel::<DisconnectNotice>();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // -- New connection --
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        accept_connection(stream, state, &cmd_tx, &disconnect_tx);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                }
            }

            // -- Request from connection task --
            Some(cmd) = cmd_rx.recv() => {
                let response = handler::handle_message(state, cmd.request, cmd.connection_id);
                let _ = cmd.response_tx.send(response);
            }

            // -- Connection disconnected --
            Some(notice) = disconnect_rx.recv() => {
                let conn_id = notice.connection_id;
                let orphaned = state.remove_connection(conn_id);
                tracing::debug!(?conn_id, orphaned_calls = orphaned.len(), "connection cleaned up");
            }

            () = &mut shutdown => break,
        }
    }
}

/// Register a new connection and spawn its handler task.
fn accept_connection(
    stream: UnixStream,
    state: &mut DaemonState,
    cmd_tx: &mpsc::UnboundedSender<DaemonCommand>,
    disconnect_tx: &mpsc::UnboundedSender<DisconnectNotice>,
) {
    let conn_id = ConnectionId::new();
    state.add_connection(conn_id);
    connection::spawn_connection(stream, conn_id, cmd_tx.clone(), disconnect_tx.clone());
    tracing::debug!(?conn_id, "accepted connection");
}

// -- Socket setup --

/// Create the socket directory and bind the Unix listener.
///
/// Handles stale socket detection: if EADDRINUSE, attempts to connect
/// to the existing socket. If the connection succeeds, another daemon
/// is running. If it fails, the socket is stale and is removed.
async fn bind_socket(path: &Path) -> Result<UnixListener, DaemonError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| DaemonError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700)).map_err(
            |e| DaemonError::MkdirFailed {
                path: parent.to_path_buf(),
                source: e,
            },
        )?;
    }

    let bind_failed = |e| DaemonError::BindFailed {
        path: path.to_path_buf(),
        source: e,
    };

    match UnixListener::bind(path) {
        Ok(listener) => Ok(listener),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            if UnixStream::connect(path).await.is_ok() {
                return Err(DaemonError::AlreadyRunning(path.to_path_buf()));
            }
            tracing::info!(path = %path.display(), "removing stale socket");
            std::fs::remove_file(path).map_err(bind_failed)?;
            UnixListener::bind(path).map_err(bind_failed)
        }
        Err(e) => Err(bind_failed(e)),
    }
}
