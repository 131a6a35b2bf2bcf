#![forbid(unsafe_code)]

//! Log targets and timestamp helper shared by the engine's tracing events.

/// Candidate scanning.
pub const TARGET_SCAN: &str = "ssvep.scan";
/// Cleanse and apply.
pub const TARGET_DECORATE: &str = "ssvep.decorate";
/// Inactivity rotation.
pub const TARGET_ROTATE: &str = "ssvep.rotate";
/// Scheduling, load and accessibility.
pub const TARGET_ENGINE: &str = "ssvep.engine";
/// Browser binding.
pub const TARGET_WEB: &str = "ssvep.web";

/// Local wall-clock time, formatted for diagnostics only.
#[must_use]
pub fn local_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}
