//! # Trajectory executor interface
//!
//! The drivetrain carries one trajectory executor per side. Each executor
//! owns a large top (transfer) buffer fed by the executive and a small
//! bottom (execution) buffer inside the device, and plays buffered points
//! out through its own closed loop.
//!
//! The streaming controller in `drive_exec` only relies on the operations
//! defined by [`ProfileExecutor`], so the real devices can be swapped for
//! simulated ones without touching the control logic.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use super::point::TrajectoryPoint;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Capability contract for an on-drivetrain trajectory executor.
///
/// The primary output call (`set`) is deliberately excluded. The streaming
/// controller deduces an output value and the owning executive applies it to
/// the concrete devices every cycle.
pub trait ProfileExecutor {
    /// Enqueue a point into the executor's top buffer.
    ///
    /// Non-blocking. Returns [`PushError::TopBufferFull`] if the buffer
    /// cannot accept the point.
    fn push_point(&mut self, point: &TrajectoryPoint) -> Result<(), PushError>;

    /// Discard all trajectory points buffered in the executor.
    ///
    /// The effect is visible to any `read_status` call made after this
    /// returns.
    fn clear_buffer(&mut self);

    /// Overwrite `status` with the executor's current status.
    ///
    /// Idempotent, safe to call every control cycle.
    fn read_status(&self, status: &mut ExecutorStatus);

    /// Get the telemetry of the currently executing point.
    fn active_point(&self) -> ActivePoint;

    /// Set the period of the control frame which carries buffered points
    /// down into the device.
    ///
    /// Units: milliseconds
    fn set_frame_period_ms(&mut self, period_ms: u32);

    /// Get the control mode the executor is currently commanded in.
    fn control_mode(&self) -> ControlMode;

    /// Clear the executor's latched underrun flag.
    fn clear_has_underrun(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Status of a trajectory executor and its buffers.
///
/// One long-lived instance is kept per channel and overwritten on every
/// poll rather than reallocated.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ExecutorStatus {
    /// Number of points waiting in the top (transfer) buffer
    pub top_buffer_cnt: u32,

    /// Number of points in the bottom (execution) buffer
    pub btm_buffer_cnt: u32,

    /// True if the executor is currently executing a point
    pub active_point_valid: bool,

    /// True if the active point is flagged as the last of the profile
    pub is_last: bool,

    /// True if the executor is starved of points right now
    pub is_underrun: bool,

    /// Latched underrun flag. Set by the executor on any underrun and only
    /// cleared by [`ProfileExecutor::clear_has_underrun`].
    pub has_underrun: bool,
}

/// Telemetry of the currently executing trajectory point.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ActivePoint {
    /// Target position of the active point.
    ///
    /// Units: sensor units
    pub position: f64,

    /// Target velocity of the active point.
    ///
    /// Units: sensor units/100 ms
    pub velocity: f64,

    /// Heading of the active point.
    ///
    /// Units: degrees
    pub heading_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Control modes an executor can be commanded in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ControlMode {
    /// Open loop percent-output drive
    PercentOutput,

    /// On-device motion profile execution
    MotionProfile,
}

/// Output value applied to an executor while in `MotionProfile` mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProfileOutput {
    /// Neutral output, playback disabled
    Disable,

    /// Execute buffered points
    Enable,

    /// Servo the last active point's position
    Hold,
}

/// A demand for an executor's primary control call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Demand {
    /// Open loop throttle in [-1.0, +1.0]
    PercentOutput(f64),

    /// Motion profile output value
    MotionProfile(ProfileOutput),
}

/// Errors which can occur when pushing a point to an executor.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("The executor's top buffer is full")]
    TopBufferFull,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ControlMode {
    fn default() -> Self {
        ControlMode::PercentOutput
    }
}

impl Default for ProfileOutput {
    fn default() -> Self {
        ProfileOutput::Disable
    }
}

impl Demand {
    /// Get the control mode this demand commands the executor into.
    pub fn mode(&self) -> ControlMode {
        match self {
            Demand::PercentOutput(_) => ControlMode::PercentOutput,
            Demand::MotionProfile(_) => ControlMode::MotionProfile,
        }
    }
}
