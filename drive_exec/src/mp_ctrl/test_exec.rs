//! Scripted executor and fixtures used by the module's tests

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use exec_if::eqpt::{
    exec::{ActivePoint, ControlMode, ExecutorStatus, ProfileExecutor, PushError},
    point::TrajectoryPoint,
};

use super::Params;
use crate::profile::{DriveProfile, TrajSegment};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scripted in-memory executor.
///
/// Tests set the status fields directly to walk the controller through
/// device conditions which are hard to produce on demand with the full
/// simulator.
pub(crate) struct TestExec {
    /// Status returned by `read_status`
    pub status: ExecutorStatus,

    /// Active point telemetry returned by `active_point`
    pub active: ActivePoint,

    /// Control mode reported to the controller
    pub mode: ControlMode,

    /// All points pushed since the last clear
    pub pushed: Vec<TrajectoryPoint>,

    /// Number of times the buffer has been cleared
    pub num_clears: u32,

    /// Frame period configured by the controller, if any
    pub frame_period_ms: Option<u32>,

    /// If set, pushes are rejected once this many points are held
    pub reject_after: Option<usize>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TestExec {
    pub fn new() -> Self {
        Self {
            status: ExecutorStatus::default(),
            active: ActivePoint::default(),
            mode: ControlMode::MotionProfile,
            pushed: vec![],
            num_clears: 0,
            frame_period_ms: None,
            reject_after: None,
        }
    }
}

impl ProfileExecutor for TestExec {
    fn push_point(&mut self, point: &TrajectoryPoint) -> Result<(), PushError> {
        if let Some(limit) = self.reject_after {
            if self.pushed.len() >= limit {
                return Err(PushError::TopBufferFull);
            }
        }

        self.pushed.push(*point);
        Ok(())
    }

    fn clear_buffer(&mut self) {
        self.pushed.clear();
        self.num_clears += 1;
    }

    fn read_status(&self, status: &mut ExecutorStatus) {
        *status = self.status;
    }

    fn active_point(&self) -> ActivePoint {
        self.active
    }

    fn set_frame_period_ms(&mut self, period_ms: u32) {
        self.frame_period_ms = Some(period_ms);
    }

    fn control_mode(&self) -> ControlMode {
        self.mode
    }

    fn clear_has_underrun(&mut self) {
        self.status.has_underrun = false;
    }
}

// ---------------------------------------------------------------------------
// FIXTURES
// ---------------------------------------------------------------------------

/// Parameters used by the module's tests.
pub(crate) fn test_params() -> Params {
    Params {
        min_points_in_exec: 5,
        loop_timeout_cycles: 10,
        control_frame_period_ms: 25,
        profile_slot: 0,
        dist_m_to_rev: 2.006,
        sensor_units_per_rev: 4096.0,
    }
}

/// Build an `n` segment straight line profile with 50 ms sampling.
pub(crate) fn test_profile(n: usize) -> DriveProfile {
    let segs: Vec<TrajSegment> = (0..n)
        .map(|i| TrajSegment {
            position_m: 0.05 * i as f64,
            velocity_ms: 1.0,
            heading_deg: 0.0,
            dt_s: 0.05,
        })
        .collect();

    DriveProfile::new(segs.clone(), segs).unwrap()
}
