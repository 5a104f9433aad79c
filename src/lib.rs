/// Crop Registry - provenance tracking for agricultural crop batches
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `crop-registry-core`: Registry state machine, models, snapshots
/// - `crop-registry-cli`: Reference host binary operating on a snapshot file

/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
