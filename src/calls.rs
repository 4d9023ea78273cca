//! Call registry port — lifecycle callbacks from the in-call logic.
//!
//! The registry notifies [`CallsListener`]s after it has updated its
//! table, and listeners query the remaining call count through
//! [`CallCount`].

use std::fmt;

use crate::platform::PlatformError;

/// An active call, identified by the in-call logic's call id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Call {
    id: String,
}

impl Call {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Read side of the call registry.
pub trait CallCount {
    fn current_call_count(&self) -> usize;
}

impl CallCount for usize {
    fn current_call_count(&self) -> usize {
        *self
    }
}

/// Call lifecycle listener. Every method defaults to a no-op, so a
/// listener overrides only the events it cares about.
///
/// `calls` reflects the registry after the change: on removal, the
/// removed call is no longer counted.
pub trait CallsListener {
    fn on_call_added(&mut self, _call: &Call, _calls: &dyn CallCount) -> Result<(), PlatformError> {
        Ok(())
    }

    fn on_call_removed(
        &mut self,
        _call: &Call,
        _calls: &dyn CallCount,
    ) -> Result<(), PlatformError> {
        Ok(())
    }
}
