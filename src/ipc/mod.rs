//! IPC codec and wire protocol — MessagePack framing between the
//! in-call logic and the daemon.

pub mod codec;
pub mod protocol;

use std::path::PathBuf;

/// Resolve the daemon socket: an explicit path wins, otherwise
/// `$XDG_RUNTIME_DIR/proxd/proxd.sock`.
pub fn socket_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("proxd").join("proxd.sock"))
    })
}
