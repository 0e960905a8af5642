//! Executor status polling

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use exec_if::eqpt::exec::{ActivePoint, ExecutorStatus, ProfileExecutor};

// Internal
use crate::profile::{Channel, NUM_CHANNELS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Telemetry of a single channel's executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelTelemetry {
    /// Status of the executor and its buffers
    pub status: ExecutorStatus,

    /// The currently executing point
    pub active: ActivePoint,
}

/// Telemetry snapshot of both channels' executors.
///
/// The snapshot is long lived and overwritten in place on every poll, so
/// within one control cycle all decisions are made against the same
/// consistent view of the devices.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecTelemetry {
    channels: [ChannelTelemetry; NUM_CHANNELS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ExecTelemetry {
    /// Poll both executors, overwriting this snapshot.
    ///
    /// Called once per control cycle regardless of mode so that telemetry is
    /// available even while idle.
    pub fn poll<E: ProfileExecutor>(&mut self, execs: &[E; NUM_CHANNELS]) {
        for (i, exec) in execs.iter().enumerate() {
            exec.read_status(&mut self.channels[i].status);
            self.channels[i].active = exec.active_point();
        }
    }

    /// Get the telemetry of the given channel.
    pub fn channel(&self, channel: Channel) -> &ChannelTelemetry {
        &self.channels[channel.index()]
    }

    /// Get the telemetry of all channels, indexed by [`Channel::index`].
    pub fn channels(&self) -> &[ChannelTelemetry; NUM_CHANNELS] {
        &self.channels
    }

    /// True if every channel's bottom buffer count is strictly greater than
    /// the given threshold.
    pub fn all_above_min_points(&self, threshold: u32) -> bool {
        self.channels
            .iter()
            .all(|c| c.status.btm_buffer_cnt > threshold)
    }

    /// True if every channel reports a valid active point flagged as the
    /// last of the profile.
    pub fn all_last_point_active(&self) -> bool {
        self.channels
            .iter()
            .all(|c| c.status.active_point_valid && c.status.is_last)
    }

    /// True if any channel is starved of points right now.
    pub fn any_underrun(&self) -> bool {
        self.channels.iter().any(|c| c.status.is_underrun)
    }

    /// True if any channel's latched underrun flag is set.
    pub fn any_has_underrun(&self) -> bool {
        self.channels.iter().any(|c| c.status.has_underrun)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
