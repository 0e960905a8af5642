//! Parameters for the motion profile control module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion profile control parameters.
///
/// Loaded from `params/mp_ctrl.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct Params {
    /// Number of points which must be buffered in each executor before the
    /// output is enabled. The count must be strictly greater than this value.
    pub min_points_in_exec: u32,

    /// Number of control cycles the executors are given to make progress
    /// before a no-progress event is raised.
    pub loop_timeout_cycles: i32,

    /// Period of the control frame carrying points down into each device.
    /// Should be no more than half the smallest point duration in use.
    ///
    /// Units: milliseconds
    pub control_frame_period_ms: u32,

    /// Index of the closed loop gain slot the executors shall run profiles
    /// with.
    pub profile_slot: u8,

    /// Conversion factor from linear distance travelled by a channel to
    /// output shaft revolutions.
    ///
    /// Units: revolutions/metre
    pub dist_m_to_rev: f64,

    /// Number of sensor units in one output shaft revolution.
    pub sensor_units_per_rev: f64,
}
