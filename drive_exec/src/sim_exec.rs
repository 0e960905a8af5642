//! # Simulated trajectory executor
//!
//! Stands in for one drivetrain device so the executive can run without
//! hardware attached. The simulation keeps the same two-buffer shape as the
//! real executor: points pushed by the controller land in a large top
//! buffer, a periodic service call moves them down into a small bottom
//! buffer, and playback consumes the bottom buffer one point duration at a
//! time.
//!
//! The executive drives the simulation with three calls per control cycle:
//! [`SimExecutor::set`] to apply the demand, [`SimExecutor::service`] in
//! place of the device's transfer frame, and [`SimExecutor::step`] to
//! advance playback time.
//!
//! Cloning a [`SimExecutor`] clones a handle to the same underlying device,
//! so the streaming controller can own one handle while the executive keeps
//! another for demands and servicing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

// Internal
use exec_if::eqpt::exec::{
    ActivePoint, ControlMode, Demand, ExecutorStatus, ProfileExecutor, ProfileOutput, PushError,
};
use exec_if::eqpt::point::TrajectoryPoint;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters sizing the simulated executor.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SimExecParams {
    /// Capacity of the top (transfer) buffer.
    ///
    /// Units: points
    pub top_buffer_capacity: usize,

    /// Capacity of the bottom (execution) buffer.
    ///
    /// Units: points
    pub btm_buffer_capacity: usize,

    /// Maximum number of points moved from the top to the bottom buffer by
    /// one service call.
    ///
    /// Units: points
    pub points_per_service: usize,
}

/// Handle to a simulated executor.
#[derive(Clone)]
pub struct SimExecutor {
    inner: Arc<Mutex<SimInner>>,
}

/// The simulated device itself.
struct SimInner {
    params: SimExecParams,

    /// Top (transfer) buffer, fed by `push_point`
    top: VecDeque<TrajectoryPoint>,

    /// Bottom (execution) buffer, fed by `service`
    btm: VecDeque<TrajectoryPoint>,

    /// The point currently being played out
    active: Option<TrajectoryPoint>,

    /// Playback time left on the active point.
    ///
    /// Units: milliseconds
    active_remaining_ms: u32,

    /// Demand last applied by the executive
    demand: Demand,

    /// Period of the simulated transfer frame.
    ///
    /// Units: milliseconds
    frame_period_ms: u32,

    /// True while playback is starved of points
    is_underrun: bool,

    /// Latched underrun flag, cleared by `clear_has_underrun` only
    has_underrun: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimExecutor {
    /// Create a new simulated executor.
    ///
    /// The device starts in `PercentOutput` mode with zero throttle and
    /// empty buffers.
    pub fn new(params: SimExecParams) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                params,
                top: VecDeque::with_capacity(params.top_buffer_capacity),
                btm: VecDeque::with_capacity(params.btm_buffer_capacity),
                active: None,
                active_remaining_ms: 0,
                demand: Demand::PercentOutput(0.0),
                frame_period_ms: 0,
                is_underrun: false,
                has_underrun: false,
            })),
        }
    }

    /// Apply a demand to the device, as the real executive's primary
    /// control call would.
    ///
    /// Commanding a mode other than `MotionProfile` halts playback
    /// immediately, matching the real device dropping its closed loop when
    /// the mode changes.
    pub fn set(&self, demand: Demand) {
        let mut inner = self.lock();

        if demand.mode() != ControlMode::MotionProfile {
            inner.active = None;
            inner.active_remaining_ms = 0;
            inner.is_underrun = false;
        }

        inner.demand = demand;
    }

    /// Run one transfer frame, moving points from the top buffer down into
    /// the bottom buffer.
    pub fn service(&self) {
        let mut inner = self.lock();

        for _ in 0..inner.params.points_per_service {
            if inner.btm.len() >= inner.params.btm_buffer_capacity {
                break;
            }

            match inner.top.pop_front() {
                Some(point) => inner.btm.push_back(point),
                None => break,
            }
        }
    }

    /// Advance playback by `dt_ms` milliseconds.
    ///
    /// Only acts while the demand is `MotionProfile(Enable)`. `Disable`
    /// drops the active point, `Hold` keeps servoing it without consuming
    /// time. Starvation mid profile sets both underrun flags, finishing the
    /// last point does not.
    pub fn step(&self, dt_ms: u32) {
        let mut inner = self.lock();

        let output = match inner.demand {
            Demand::MotionProfile(output) => output,
            Demand::PercentOutput(_) => return,
        };

        match output {
            ProfileOutput::Disable => {
                inner.active = None;
                inner.active_remaining_ms = 0;
                inner.is_underrun = false;
                return;
            }
            ProfileOutput::Hold => {
                inner.is_underrun = false;
                return;
            }
            ProfileOutput::Enable => (),
        }

        let mut budget_ms = dt_ms;
        let mut starved = false;

        while budget_ms > 0 {
            // Active point exhausted, advance unless it is the profile's
            // last, which holds until the demand changes
            if inner.active_remaining_ms == 0 {
                let on_last = match inner.active {
                    Some(ref p) => p.is_last,
                    None => false,
                };

                if on_last {
                    break;
                }

                match inner.btm.pop_front() {
                    Some(point) => {
                        inner.active_remaining_ms = point.duration.as_ms();
                        inner.active = Some(point);
                    }
                    None => {
                        starved = true;
                        break;
                    }
                }

                continue;
            }

            let consumed = budget_ms.min(inner.active_remaining_ms);
            inner.active_remaining_ms -= consumed;
            budget_ms -= consumed;
        }

        inner.is_underrun = starved;
        if starved {
            inner.has_underrun = true;
        }
    }

    /// Get the demand last applied to the device.
    pub fn demand(&self) -> Demand {
        self.lock().demand
    }

    /// Get the configured transfer frame period in milliseconds.
    pub fn frame_period_ms(&self) -> u32 {
        self.lock().frame_period_ms
    }

    // A poisoned lock means a panic elsewhere, the device state itself is
    // still usable.
    fn lock(&self) -> MutexGuard<SimInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ProfileExecutor for SimExecutor {
    fn push_point(&mut self, point: &TrajectoryPoint) -> Result<(), PushError> {
        let mut inner = self.lock();

        if inner.top.len() >= inner.params.top_buffer_capacity {
            return Err(PushError::TopBufferFull);
        }

        inner.top.push_back(*point);
        Ok(())
    }

    fn clear_buffer(&mut self) {
        let mut inner = self.lock();
        inner.top.clear();
        inner.btm.clear();
        inner.is_underrun = false;
    }

    fn read_status(&self, status: &mut ExecutorStatus) {
        let inner = self.lock();

        status.top_buffer_cnt = inner.top.len() as u32;
        status.btm_buffer_cnt = inner.btm.len() as u32;
        status.active_point_valid = inner.active.is_some();
        status.is_last = match inner.active {
            Some(ref p) => p.is_last,
            None => false,
        };
        status.is_underrun = inner.is_underrun;
        status.has_underrun = inner.has_underrun;
    }

    fn active_point(&self) -> ActivePoint {
        let inner = self.lock();

        match inner.active {
            Some(ref p) => ActivePoint {
                position: p.position,
                velocity: p.velocity,
                heading_deg: p.heading_deg,
            },
            None => ActivePoint::default(),
        }
    }

    fn set_frame_period_ms(&mut self, period_ms: u32) {
        self.lock().frame_period_ms = period_ms;
    }

    fn control_mode(&self) -> ControlMode {
        self.lock().demand.mode()
    }

    fn clear_has_underrun(&mut self) {
        self.lock().has_underrun = false;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use exec_if::eqpt::point::PointDuration;

    fn sim() -> SimExecutor {
        SimExecutor::new(SimExecParams {
            top_buffer_capacity: 8,
            btm_buffer_capacity: 4,
            points_per_service: 2,
        })
    }

    fn point(position: f64, duration: PointDuration, is_last: bool) -> TrajectoryPoint {
        TrajectoryPoint {
            position,
            velocity: 0.5,
            heading_deg: 0.0,
            profile_slot: 0,
            duration,
            zero_pos: false,
            is_last,
        }
    }

    fn status_of(sim: &SimExecutor) -> ExecutorStatus {
        let mut status = ExecutorStatus::default();
        sim.read_status(&mut status);
        status
    }

    #[test]
    fn test_push_respects_top_capacity() {
        let mut sim = sim();

        for i in 0..8 {
            sim.push_point(&point(i as f64, PointDuration::Ms20, false))
                .unwrap();
        }

        assert!(matches!(
            sim.push_point(&point(9.0, PointDuration::Ms20, false)),
            Err(PushError::TopBufferFull)
        ));
        assert_eq!(status_of(&sim).top_buffer_cnt, 8);
    }

    #[test]
    fn test_service_moves_points_down() {
        let mut sim = sim();

        for i in 0..8 {
            sim.push_point(&point(i as f64, PointDuration::Ms20, false))
                .unwrap();
        }

        // Two points per service call
        sim.service();
        let status = status_of(&sim);
        assert_eq!(status.top_buffer_cnt, 6);
        assert_eq!(status.btm_buffer_cnt, 2);

        // The bottom buffer fills to capacity and no further
        sim.service();
        sim.service();
        sim.service();
        let status = status_of(&sim);
        assert_eq!(status.top_buffer_cnt, 4);
        assert_eq!(status.btm_buffer_cnt, 4);
    }

    #[test]
    fn test_step_plays_points_in_order() {
        let mut sim = sim();

        sim.push_point(&point(1.0, PointDuration::Ms20, false)).unwrap();
        sim.push_point(&point(2.0, PointDuration::Ms20, false)).unwrap();
        sim.push_point(&point(3.0, PointDuration::Ms20, true)).unwrap();
        sim.service();
        sim.service();

        sim.set(Demand::MotionProfile(ProfileOutput::Enable));

        // First cycle pops the first point and consumes its whole duration
        sim.step(20);
        assert_eq!(sim.active_point().position, 1.0);

        sim.step(20);
        assert_eq!(sim.active_point().position, 2.0);

        sim.step(20);
        let status = status_of(&sim);
        assert_eq!(sim.active_point().position, 3.0);
        assert!(status.active_point_valid);
        assert!(status.is_last);
        assert!(!status.is_underrun);
    }

    #[test]
    fn test_last_point_holds_without_underrun() {
        let mut sim = sim();

        sim.push_point(&point(1.0, PointDuration::Ms20, false)).unwrap();
        sim.push_point(&point(2.0, PointDuration::Ms20, true)).unwrap();
        sim.service();

        sim.set(Demand::MotionProfile(ProfileOutput::Enable));

        // Run well past the end of the profile
        for _ in 0..10 {
            sim.step(20);
        }

        let status = status_of(&sim);
        assert!(status.is_last);
        assert!(!status.is_underrun);
        assert!(!status.has_underrun);
        assert_eq!(sim.active_point().position, 2.0);
    }

    #[test]
    fn test_starvation_latches_underrun() {
        let mut sim = sim();

        sim.push_point(&point(1.0, PointDuration::Ms20, false)).unwrap();
        sim.service();
        sim.set(Demand::MotionProfile(ProfileOutput::Enable));

        // The only point is not flagged last, running past it starves the
        // device
        sim.step(20);
        sim.step(20);

        let status = status_of(&sim);
        assert!(status.is_underrun);
        assert!(status.has_underrun);

        // Disabling ends the live underrun but the latched flag stays
        sim.set(Demand::MotionProfile(ProfileOutput::Disable));
        sim.step(20);
        let status = status_of(&sim);
        assert!(!status.is_underrun);
        assert!(status.has_underrun);

        sim.clear_has_underrun();
        assert!(!status_of(&sim).has_underrun);
    }

    #[test]
    fn test_mode_change_halts_playback() {
        let mut sim = sim();

        sim.push_point(&point(1.0, PointDuration::Ms50, false)).unwrap();
        sim.service();
        sim.set(Demand::MotionProfile(ProfileOutput::Enable));
        sim.step(20);

        assert_eq!(sim.control_mode(), ControlMode::MotionProfile);
        assert!(status_of(&sim).active_point_valid);

        sim.set(Demand::PercentOutput(0.3));

        assert_eq!(sim.control_mode(), ControlMode::PercentOutput);
        assert!(!status_of(&sim).active_point_valid);
    }

    #[test]
    fn test_clear_buffer_empties_both_buffers() {
        let mut sim = sim();

        for i in 0..6 {
            sim.push_point(&point(i as f64, PointDuration::Ms20, false))
                .unwrap();
        }
        sim.service();

        sim.clear_buffer();

        let status = status_of(&sim);
        assert_eq!(status.top_buffer_cnt, 0);
        assert_eq!(status.btm_buffer_cnt, 0);
    }

    #[test]
    fn test_clones_share_the_device() {
        let mut sim = sim();
        let handle = sim.clone();

        sim.push_point(&point(1.0, PointDuration::Ms20, false)).unwrap();

        assert_eq!(status_of(&handle).top_buffer_cnt, 1);
    }
}
