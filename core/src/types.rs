//! Shared primitive types used across the entire simulation.

/// Per-cell coin serial. Assigned at generation time, never reused
/// within a cell.
pub type Serial = u32;

/// Opaque handle for an active geolocation subscription.
pub type WatchId = u64;

/// A continuous position sample, degrees latitude / longitude.
pub type LatLng = (f64, f64);
