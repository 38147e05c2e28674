//! Wall-clock time helper.

/// Returns the current wall-clock time as milliseconds since UNIX_EPOCH.
///
/// Returns `None` if the system clock is in an invalid state (e.g., before
/// UNIX_EPOCH due to NTP adjustments, VM snapshots, or misconfigured clocks).
///
/// Use this ONLY for timestamps that travel over the wire and may be compared
/// across machines. For local elapsed-time measurements, prefer
/// `web_time::Instant`, which is guaranteed monotonic.
pub(crate) fn millis_since_epoch() -> Option<u64> {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(duration) => Some(duration.as_millis() as u64),
        Err(_) => {
            // System time is before UNIX_EPOCH; can happen after NTP moves the
            // clock backwards or a VM resumes with stale time.
            tracing::warn!("system clock is before UNIX_EPOCH, input timestamps unavailable");
            None
        }
    }
}
