//! Android system-property backend for the quirk path.
//!
//! Reads the platform identity with `getprop` and starts init services
//! by writing their name to the control property with `setprop`. Same
//! mechanism the init `ctl.start` contract exposes to shell tools.

use std::process::{Command, Stdio};

use super::{PlatformError, QuirkPlatform};

/// Property that is non-empty on the quirk hardware family.
pub const DEFAULT_QUIRK_PROPERTY: &str = "ro.mediatek.platform";

/// Writing a service name here asks init to start it.
pub const DEFAULT_CONTROL_PROPERTY: &str = "ctl.start";

/// Init service that re-characterizes the proximity sensor.
pub const DEFAULT_RECALIBRATION_SERVICE: &str = "ps_calibrate";

/// Quirk adapter backed by `getprop` / `setprop`.
pub struct PropertyQuirk {
    quirk_property: String,
    control_property: String,
    service: String,
    getprop: String,
    setprop: String,
}

impl PropertyQuirk {
    pub fn new(quirk_property: String, control_property: String, service: String) -> Self {
        Self {
            quirk_property,
            control_property,
            service,
            getprop: "getprop".into(),
            setprop: "setprop".into(),
        }
    }

    /// Override the property tools (used by tests on hosts without them).
    #[cfg(test)]
    fn with_tools(mut self, getprop: &str, setprop: &str) -> Self {
        self.getprop = getprop.into();
        self.setprop = setprop.into();
        self
    }

    fn read_property(&self, name: &str) -> Result<String, PlatformError> {
        let output = Command::new(&self.getprop)
            .arg(name)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| PlatformError::Property(format!("failed to spawn {}: {e}", self.getprop)))?;

        if !output.status.success() {
            return Err(PlatformError::Property(format!(
                "{} {name} exited with status {}",
                self.getprop, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn write_property(&self, name: &str, value: &str) -> Result<(), PlatformError> {
        let status = Command::new(&self.setprop)
            .args([name, value])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| PlatformError::Property(format!("failed to spawn {}: {e}", self.setprop)))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlatformError::Property(format!(
                "{} {name} {value} exited with status {status}",
                self.setprop
            )))
        }
    }
}

impl QuirkPlatform for PropertyQuirk {
    fn is_quirk_platform(&self) -> bool {
        match self.read_property(&self.quirk_property) {
            Ok(value) => {
                tracing::debug!(property = %self.quirk_property, %value, "platform identity");
                !value.is_empty()
            }
            Err(e) => {
                tracing::debug!(error = %e, "platform identity unavailable, assuming no quirks");
                false
            }
        }
    }

    fn request_recalibration(&self) {
        // init starts the service asynchronously; setprop returns as soon
        // as the property is queued.
        if let Err(e) = self.write_property(&self.control_property, &self.service) {
            tracing::warn!(service = %self.service, error = %e, "recalibration request failed");
        }
    }
}
