//! QuirkPlatform trait — hardware families that need sensor recalibration.

/// Identifies quirk hardware and requests proximity recalibration.
pub trait QuirkPlatform: Send {
    /// Whether this device belongs to the quirk-affected hardware family.
    ///
    /// Queried once by the coordinator at construction.
    fn is_quirk_platform(&self) -> bool;

    /// Ask the platform to start the recalibration service.
    ///
    /// Fire-and-forget: returns before the service runs, and delivery
    /// failures are logged by the adapter rather than reported. Safe to
    /// call repeatedly.
    fn request_recalibration(&self);
}
