use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::platform::{property, sysfs};

#[derive(Parser)]
#[command(name = "proxd", about = "In-call proximity sensor coordinator")]
pub struct Cli {
    /// Daemon socket (default: $XDG_RUNTIME_DIR/proxd/proxd.sock)
    #[arg(long, global = true)]
    pub socket: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the proximity daemon
    Daemon {
        /// Proximity blanking control node
        #[arg(long, default_value = sysfs::DEFAULT_PROXIMITY_NODE)]
        proximity_node: PathBuf,

        /// Tap-to-wake control node
        #[arg(long, default_value = sysfs::DEFAULT_TAP_TO_WAKE_NODE)]
        tap_to_wake_node: PathBuf,

        /// Property identifying the recalibration-quirk hardware
        #[arg(long, default_value = property::DEFAULT_QUIRK_PROPERTY)]
        quirk_property: String,

        /// Property used to start init services
        #[arg(long, default_value = property::DEFAULT_CONTROL_PROPERTY)]
        control_property: String,

        /// Service that recalibrates the proximity sensor
        #[arg(long, default_value = property::DEFAULT_RECALIBRATION_SERVICE)]
        recalibration_service: String,

        /// Tag attached to the proximity lock
        #[arg(long, default_value = "proxd")]
        lock_tag: String,
    },

    /// Send a single request to a running daemon
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Report a new call
    CallAdded {
        /// Call identifier
        call: String,
    },

    /// Report that a call ended
    CallRemoved {
        /// Call identifier
        call: String,
    },

    /// Turn the proximity sensor on
    On,

    /// Turn the proximity sensor off
    Off {
        /// Keep the screen blanked until the sensor reports far
        #[arg(long)]
        wait_for_far: bool,
    },

    /// Show coordinator state and registered calls
    Status,
}
