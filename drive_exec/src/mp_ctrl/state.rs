//! Implementations for the MpCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace, warn};
use serde::Serialize;

// Internal
use super::{start_filling, ExecTelemetry, LoopTimeout, MpCtrlError, Params, TimeoutEvent};
use crate::profile::{Channel, DriveProfile, NUM_CHANNELS};
use exec_if::eqpt::exec::{ControlMode, ProfileExecutor, ProfileOutput};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::{get_elapsed_seconds, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion profile control module state
pub struct MpCtrl<E: ProfileExecutor> {
    pub(crate) params: Params,

    /// The executors streamed into, indexed by [`Channel`]
    execs: [E; NUM_CHANNELS],

    /// Executing mode of the streaming state machine
    mode: MpCtrlMode,

    /// Stall countdown, armed whenever the machine is waiting on the devices
    loop_timeout: LoopTimeout,

    /// Set by a start request, consumed by the idle mode
    start_pending: bool,

    /// Output value the executive shall apply to both devices
    output: ProfileOutput,

    /// The profile to stream on the next start
    profile: Option<DriveProfile>,

    /// Per channel device telemetry, overwritten by the poll each cycle
    telem: ExecTelemetry,

    report: StatusReport,

    /// Total number of underrun notifications raised this session
    num_underruns: u64,

    arch_report: Archiver,
    arch_telem: Archiver,
}

/// Initialisation data for MpCtrl.
pub struct InitData<E> {
    /// Path to the parameter file, relative to the params directory
    pub params_path: &'static str,

    /// The executors to stream into, indexed by [`Channel`]
    pub execs: [E; NUM_CHANNELS],
}

/// Input data to motion profile control.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputData {
    /// True if the operator requested a profile start this cycle. The
    /// request latches inside the module until it can be serviced.
    pub start_profile: bool,
}

/// Status report for MpCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// Mode of the state machine at the end of the cycle
    pub mode: MpCtrlMode,

    /// True if a buffer underrun notification was raised this cycle
    pub underrun_notified: bool,

    /// True if the stall timeout expired this cycle
    pub no_progress: bool,

    /// True if a fill this cycle stopped early due to a rejected point
    pub fill_truncated: bool,

    /// True if a fill this cycle substituted an unsupported point duration
    pub duration_substituted: bool,

    /// Number of points pushed per channel by a fill this cycle
    pub points_filled: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of MpCtrl. Each mode is handled by a
/// `mode_xyz` function.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum MpCtrlMode {
    /// Nothing streaming, waiting for a start request
    Idle,

    /// Devices buffering points with the output disabled
    Filling,

    /// Buffered points executing on the devices
    Streaming,
}

impl Default for MpCtrlMode {
    fn default() -> Self {
        MpCtrlMode::Idle
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<E: ProfileExecutor> State for MpCtrl<E> {
    type InitData = InitData<E>;
    type InitError = MpCtrlError;

    type InputData = InputData;
    type OutputData = ProfileOutput;
    type StatusReport = StatusReport;
    type ProcError = MpCtrlError;

    /// Initialise the MpCtrl module.
    ///
    /// Configures the control frame period on both executors and sets up the
    /// module's archivers.
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        // Load the parameters
        let params: Params = match params::load(init_data.params_path) {
            Ok(p) => p,
            Err(e) => return Err(MpCtrlError::ParamLoadError(e)),
        };

        // Configure the rate points transfer down into the devices at
        let mut execs = init_data.execs;
        for exec in execs.iter_mut() {
            exec.set_frame_period_ms(params.control_frame_period_ms);
        }

        // Create the arch folder for mp_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("mp_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        let arch_report = Archiver::from_path(session, "mp_ctrl/status_report.csv").unwrap();
        let arch_telem = Archiver::from_path(session, "mp_ctrl/telemetry.csv").unwrap();

        Ok(Self {
            params,
            execs,
            mode: MpCtrlMode::Idle,
            loop_timeout: LoopTimeout::disarmed(),
            start_pending: false,
            output: ProfileOutput::Disable,
            profile: None,
            telem: ExecTelemetry::default(),
            report: StatusReport::default(),
            num_underruns: 0,
            arch_report,
            arch_telem,
        })
    }

    /// Perform cyclic processing of motion profile control.
    ///
    /// Each cycle polls both devices once, services the stall timeout and
    /// then steps the state machine against that single telemetry snapshot.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Latch any start request
        if input_data.start_profile {
            self.start_pending = true;
        }

        // Poll the devices. All decisions this cycle are made against this
        // snapshot.
        self.telem.poll(&self.execs);

        // Service the stall timeout
        if let TimeoutEvent::Expired = self.loop_timeout.service() {
            warn!("No progress from the executors within the timeout budget, check the devices");
            self.report.no_progress = true;
        }

        // The machine only runs while both devices are commanded in profile
        // mode. If either has left it, drop back to Idle. Buffered points
        // are left in place, the next start clears them.
        let in_profile_mode = self
            .execs
            .iter()
            .all(|e| e.control_mode() == ControlMode::MotionProfile);

        if !in_profile_mode {
            if self.mode != MpCtrlMode::Idle {
                info!("Executors left MotionProfile mode, MpCtrl dropping to Idle");
            }

            self.mode = MpCtrlMode::Idle;
            self.output = ProfileOutput::Disable;
            self.loop_timeout.disarm();
        }
        else {
            match self.mode {
                MpCtrlMode::Idle => self.mode_idle()?,
                MpCtrlMode::Filling => self.mode_filling(),
                MpCtrlMode::Streaming => self.mode_streaming(),
            }
        }

        self.report.mode = self.mode;

        trace!(
            "MpCtrl: mode {:?}, output {:?}, btm counts [{}, {}]",
            self.mode,
            self.output,
            self.telem.channel(Channel::Left).status.btm_buffer_cnt,
            self.telem.channel(Channel::Right).status.btm_buffer_cnt
        );

        Ok((self.output, self.report))
    }
}

impl<E: ProfileExecutor> MpCtrl<E> {
    /// Load the profile to be streamed on the next start request.
    ///
    /// Replaces any previously loaded profile. A stream already executing is
    /// not affected.
    pub fn set_profile(&mut self, profile: DriveProfile) {
        self.profile = Some(profile);
    }

    /// Reset the module, clearing both devices' buffers.
    ///
    /// The executive calls this whenever it stops commanding profile mode,
    /// including continuously while driving open loop. Any pending start
    /// request is discarded and the output returns to `Disable`.
    pub fn reset(&mut self) {
        for exec in self.execs.iter_mut() {
            exec.clear_buffer();
        }

        self.output = ProfileOutput::Disable;
        self.mode = MpCtrlMode::Idle;
        self.loop_timeout.disarm();
        self.start_pending = false;
        self.telem = ExecTelemetry::default();
        self.report = StatusReport::default();
    }

    /// Get the current mode of the streaming state machine.
    pub fn mode(&self) -> MpCtrlMode {
        self.mode
    }

    /// Get the output value the executive shall apply to both devices.
    pub fn output(&self) -> ProfileOutput {
        self.output
    }

    /// Get the latest device telemetry snapshot.
    pub fn telemetry(&self) -> &ExecTelemetry {
        &self.telem
    }

    /// Get the total number of underrun notifications raised this session.
    pub fn num_underruns(&self) -> u64 {
        self.num_underruns
    }

    /// Mode waiting for a start request.
    ///
    /// When one is pending the whole profile is converted and pushed into
    /// both devices within this cycle, and the machine moves to `Filling`.
    fn mode_idle(&mut self) -> Result<(), MpCtrlError> {
        if !self.start_pending {
            return Ok(());
        }

        // Consume the request whether or not it can be serviced
        self.start_pending = false;

        let profile = match self.profile {
            Some(ref p) => p,
            None => return Err(MpCtrlError::NoProfile),
        };

        info!(
            "Profile start accepted, filling both executors with {} points",
            profile.len()
        );

        // Playback stays disabled while the devices buffer
        self.output = ProfileOutput::Disable;

        let fill_report = start_filling(&mut self.execs, profile, &self.params);

        self.report.fill_truncated = fill_report.truncated;
        self.report.duration_substituted = fill_report.duration_substituted;
        self.report.points_filled = fill_report.points_per_channel;

        if fill_report.underrun_notified {
            self.report.underrun_notified = true;
            self.num_underruns += 1;
        }

        self.mode = MpCtrlMode::Filling;
        self.loop_timeout.arm(self.params.loop_timeout_cycles);

        Ok(())
    }

    /// Mode waiting for the devices to buffer enough points.
    ///
    /// The output stays disabled until every channel's bottom buffer count
    /// is strictly above the minimum in a single poll. The stall timeout is
    /// left to decay here, a transfer which never primes the devices is the
    /// main way a broken link shows itself.
    fn mode_filling(&mut self) {
        if self.telem.all_above_min_points(self.params.min_points_in_exec) {
            info!("Executors primed on both channels, enabling playback");

            self.output = ProfileOutput::Enable;
            self.mode = MpCtrlMode::Streaming;
            self.loop_timeout.arm(self.params.loop_timeout_cycles);
        }
    }

    /// Mode with points executing on the devices.
    ///
    /// The timeout is refreshed while both devices are healthy, so it only
    /// decays over cycles with a live underrun. Completion requires both
    /// channels to report a valid active point flagged last in the same
    /// poll.
    fn mode_streaming(&mut self) {
        if !self.telem.any_underrun() {
            self.loop_timeout.arm(self.params.loop_timeout_cycles);
        }

        if self.telem.all_last_point_active() {
            info!("Profile complete on both channels, holding the final point");

            self.output = ProfileOutput::Hold;
            self.mode = MpCtrlMode::Idle;

            // Disarmed so the hold can persist indefinitely
            self.loop_timeout.disarm();
        }
    }

    #[cfg(test)]
    pub(crate) fn test_instance(params: Params, execs: [E; NUM_CHANNELS]) -> Self {
        Self {
            params,
            execs,
            mode: MpCtrlMode::Idle,
            loop_timeout: LoopTimeout::disarmed(),
            start_pending: false,
            output: ProfileOutput::Disable,
            profile: None,
            telem: ExecTelemetry::default(),
            report: StatusReport::default(),
            num_underruns: 0,
            arch_report: Archiver::default(),
            arch_telem: Archiver::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn execs_mut(&mut self) -> &mut [E; NUM_CHANNELS] {
        &mut self.execs
    }
}

impl<E: ProfileExecutor> Archived for MpCtrl<E> {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let time_s = get_elapsed_seconds();

        self.arch_report.serialise(ReportRecord {
            time_s,
            mode: self.report.mode,
            output: self.output,
            underrun_notified: self.report.underrun_notified,
            no_progress: self.report.no_progress,
            fill_truncated: self.report.fill_truncated,
            duration_substituted: self.report.duration_substituted,
            points_filled: self.report.points_filled,
            num_underruns: self.num_underruns,
        })?;

        for channel in Channel::ALL.iter() {
            let telem = self.telem.channel(*channel);

            self.arch_telem.serialise(TelemRecord {
                time_s,
                channel: *channel,
                top_buffer_cnt: telem.status.top_buffer_cnt,
                btm_buffer_cnt: telem.status.btm_buffer_cnt,
                active_point_valid: telem.status.active_point_valid,
                is_last: telem.status.is_last,
                is_underrun: telem.status.is_underrun,
                has_underrun: telem.status.has_underrun,
                position: telem.active.position,
                velocity: telem.active.velocity,
                heading_deg: telem.active.heading_deg,
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ARCHIVE RECORDS
// ---------------------------------------------------------------------------

/// Flat archive record of the cycle status report.
#[derive(Serialize)]
struct ReportRecord {
    time_s: f64,
    mode: MpCtrlMode,
    output: ProfileOutput,
    underrun_notified: bool,
    no_progress: bool,
    fill_truncated: bool,
    duration_substituted: bool,
    points_filled: u32,
    num_underruns: u64,
}

/// Flat archive record of one channel's telemetry.
#[derive(Serialize)]
struct TelemRecord {
    time_s: f64,
    channel: Channel,
    top_buffer_cnt: u32,
    btm_buffer_cnt: u32,
    active_point_valid: bool,
    is_last: bool,
    is_underrun: bool,
    has_underrun: bool,
    position: f64,
    velocity: f64,
    heading_deg: f64,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::test_exec::{test_params, test_profile, TestExec};
    use super::*;
    use crate::sim_exec::{SimExecParams, SimExecutor};
    use exec_if::eqpt::exec::Demand;

    const START: InputData = InputData {
        start_profile: true,
    };
    const NO_INPUT: InputData = InputData {
        start_profile: false,
    };

    /// Build a controller with two scripted executors.
    fn mp() -> MpCtrl<TestExec> {
        MpCtrl::test_instance(test_params(), [TestExec::new(), TestExec::new()])
    }

    /// Set both executors' bottom buffer counts.
    fn set_btm_counts(mp: &mut MpCtrl<TestExec>, left: u32, right: u32) {
        mp.execs_mut()[0].status.btm_buffer_cnt = left;
        mp.execs_mut()[1].status.btm_buffer_cnt = right;
    }

    /// Flag the active point of the given executor as the profile's last.
    fn set_last_active(mp: &mut MpCtrl<TestExec>, index: usize) {
        mp.execs_mut()[index].status.active_point_valid = true;
        mp.execs_mut()[index].status.is_last = true;
    }

    /// Walk a fresh controller into `Streaming` mode.
    fn streaming_mp() -> MpCtrl<TestExec> {
        let mut mp = mp();
        mp.set_profile(test_profile(20));
        mp.proc(&START).unwrap();

        set_btm_counts(&mut mp, 6, 6);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();

        assert_eq!(output, ProfileOutput::Enable);
        assert_eq!(report.mode, MpCtrlMode::Streaming);

        mp
    }

    #[test]
    fn test_idle_without_start() {
        let mut mp = mp();
        mp.set_profile(test_profile(8));

        let (output, report) = mp.proc(&NO_INPUT).unwrap();

        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Idle);
        assert_eq!(mp.execs_mut()[0].pushed.len(), 0);
    }

    #[test]
    fn test_start_without_profile_errors() {
        let mut mp = mp();

        assert!(matches!(mp.proc(&START), Err(MpCtrlError::NoProfile)));

        // The failed request was consumed, the machine keeps running
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Idle);
    }

    #[test]
    fn test_start_fills_and_enters_filling() {
        let mut mp = mp();
        mp.set_profile(test_profile(8));

        let (output, report) = mp.proc(&START).unwrap();

        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Filling);
        assert_eq!(report.points_filled, 8);
        assert_eq!(mp.execs_mut()[0].pushed.len(), 8);
        assert_eq!(mp.execs_mut()[1].pushed.len(), 8);
    }

    #[test]
    fn test_enable_gate_needs_both_channels() {
        let mut mp = mp();
        mp.set_profile(test_profile(20));
        mp.proc(&START).unwrap();

        // One channel over the threshold, one under: output stays disabled
        set_btm_counts(&mut mp, 6, 4);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Filling);

        // Equality is not enough, the count must be strictly greater
        set_btm_counts(&mut mp, 6, 5);
        let (output, _) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Disable);

        set_btm_counts(&mut mp, 6, 6);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Enable);
        assert_eq!(report.mode, MpCtrlMode::Streaming);
    }

    #[test]
    fn test_streaming_not_gated_by_threshold() {
        let mut mp = streaming_mp();

        // Counts naturally fall below the fill threshold as the profile
        // drains, the output must stay enabled
        set_btm_counts(&mut mp, 4, 4);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();

        assert_eq!(output, ProfileOutput::Enable);
        assert_eq!(report.mode, MpCtrlMode::Streaming);
    }

    #[test]
    fn test_hold_requires_both_last() {
        let mut mp = streaming_mp();

        // Left finishes first, streaming continues
        set_last_active(&mut mp, 0);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Enable);
        assert_eq!(report.mode, MpCtrlMode::Streaming);

        // Right catches up, both last in the same poll
        set_last_active(&mut mp, 1);
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Hold);
        assert_eq!(report.mode, MpCtrlMode::Idle);

        // The hold persists while idle, with no stall expiry
        for _ in 0..30 {
            let (output, report) = mp.proc(&NO_INPUT).unwrap();
            assert_eq!(output, ProfileOutput::Hold);
            assert!(!report.no_progress);
        }
    }

    #[test]
    fn test_filling_stall_raises_no_progress_once() {
        let mut mp = mp();
        mp.set_profile(test_profile(20));
        mp.proc(&START).unwrap();

        // Counts never rise: the timeout decays and fires exactly once
        let mut fired = 0;
        for _ in 0..15 {
            let (_, report) = mp.proc(&NO_INPUT).unwrap();
            if report.no_progress {
                fired += 1;
            }
            assert_eq!(report.mode, MpCtrlMode::Filling);
        }

        assert_eq!(fired, 1);
    }

    #[test]
    fn test_streaming_underrun_gates_timeout_refresh() {
        let mut mp = streaming_mp();

        // Healthy streaming refreshes the timeout indefinitely
        for _ in 0..30 {
            let (_, report) = mp.proc(&NO_INPUT).unwrap();
            assert!(!report.no_progress);
        }

        // A live underrun stops the refresh, expiry after the budget
        mp.execs_mut()[1].status.is_underrun = true;
        let mut fired = 0;
        for _ in 0..15 {
            let (_, report) = mp.proc(&NO_INPUT).unwrap();
            if report.no_progress {
                fired += 1;
            }
        }

        assert_eq!(fired, 1);
    }

    #[test]
    fn test_underrun_notified_once_at_next_fill() {
        let mut mp = mp();
        mp.set_profile(test_profile(8));
        mp.proc(&START).unwrap();

        // The device latches an underrun during the stream
        mp.execs_mut()[0].status.has_underrun = true;

        // No notification until the next fill
        let (_, report) = mp.proc(&NO_INPUT).unwrap();
        assert!(!report.underrun_notified);
        assert_eq!(mp.num_underruns(), 0);

        // Restart: notified exactly once, device flag cleared
        mp.reset();
        let (_, report) = mp.proc(&START).unwrap();
        assert!(report.underrun_notified);
        assert!(!mp.execs_mut()[0].status.has_underrun);
        assert_eq!(mp.num_underruns(), 1);

        // A further restart raises nothing new
        mp.reset();
        let (_, report) = mp.proc(&START).unwrap();
        assert!(!report.underrun_notified);
        assert_eq!(mp.num_underruns(), 1);
    }

    #[test]
    fn test_mode_mismatch_drops_to_idle() {
        let mut mp = streaming_mp();

        // One device leaves profile mode
        mp.execs_mut()[1].mode = ControlMode::PercentOutput;
        let (output, report) = mp.proc(&NO_INPUT).unwrap();

        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Idle);

        // Buffered points are untouched by the drop
        assert_eq!(mp.execs_mut()[0].pushed.len(), 20);

        // Back in profile mode the machine stays idle until the next start
        mp.execs_mut()[1].mode = ControlMode::MotionProfile;
        let (_, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(report.mode, MpCtrlMode::Idle);

        // A fresh start clears the stale points and refills
        let (_, report) = mp.proc(&START).unwrap();
        assert_eq!(report.mode, MpCtrlMode::Filling);
        assert_eq!(mp.execs_mut()[0].num_clears, 2);
        assert_eq!(mp.execs_mut()[0].pushed.len(), 20);
    }

    #[test]
    fn test_mode_mismatch_disarms_timeout() {
        let mut mp = streaming_mp();

        // One device leaves profile mode mid stream, dropping the machine
        mp.execs_mut()[1].mode = ControlMode::PercentOutput;
        let (output, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(output, ProfileOutput::Disable);
        assert_eq!(report.mode, MpCtrlMode::Idle);

        // Back in profile mode the machine waits for the next start with the
        // timeout disarmed, so idling well past the budget raises no stall
        mp.execs_mut()[1].mode = ControlMode::MotionProfile;
        for _ in 0..35 {
            let (_, report) = mp.proc(&NO_INPUT).unwrap();
            assert_eq!(report.mode, MpCtrlMode::Idle);
            assert!(!report.no_progress);
        }
    }

    #[test]
    fn test_reset_discards_state_and_pending_start() {
        // From Filling
        let mut mp = mp();
        mp.set_profile(test_profile(20));
        mp.proc(&START).unwrap();

        mp.reset();
        assert_eq!(mp.mode(), MpCtrlMode::Idle);
        assert_eq!(mp.output(), ProfileOutput::Disable);
        assert_eq!(mp.execs_mut()[0].pushed.len(), 0);

        // From Streaming with a start request latched mid-stream
        let mut mp = streaming_mp();
        mp.proc(&START).unwrap();
        mp.reset();

        // The pending request was discarded, nothing fills
        let (_, report) = mp.proc(&NO_INPUT).unwrap();
        assert_eq!(report.mode, MpCtrlMode::Idle);
        assert_eq!(mp.execs_mut()[0].pushed.len(), 0);
    }

    #[test]
    fn test_full_stream_cycle_with_sim() {
        let sim_params = SimExecParams {
            top_buffer_capacity: 128,
            btm_buffer_capacity: 16,
            points_per_service: 4,
        };
        let left = SimExecutor::new(sim_params);
        let right = SimExecutor::new(sim_params);

        let mut mp = MpCtrl::test_instance(test_params(), [left.clone(), right.clone()]);
        mp.set_profile(test_profile(20));

        // Command profile mode on both devices, as the executive would
        left.set(Demand::MotionProfile(ProfileOutput::Disable));
        right.set(Demand::MotionProfile(ProfileOutput::Disable));

        let (mut output, report) = mp.proc(&START).unwrap();
        assert_eq!(report.mode, MpCtrlMode::Filling);
        assert_eq!(report.points_filled, 20);

        // Drive the devices exactly as the executive does: apply the
        // output, service the buffers, advance playback by one cycle
        let mut saw_enable = false;
        let mut held = false;

        for _ in 0..400 {
            left.set(Demand::MotionProfile(output));
            right.set(Demand::MotionProfile(output));
            left.service();
            right.service();
            left.step(20);
            right.step(20);

            let (o, report) = mp.proc(&NO_INPUT).unwrap();
            output = o;

            assert!(!report.no_progress, "stream stalled");

            if output == ProfileOutput::Enable {
                saw_enable = true;
            }
            if output == ProfileOutput::Hold {
                held = true;
                break;
            }
        }

        assert!(saw_enable, "output was never enabled");
        assert!(held, "profile never completed");
        assert_eq!(mp.mode(), MpCtrlMode::Idle);
        assert_eq!(mp.num_underruns(), 0);
    }
}
