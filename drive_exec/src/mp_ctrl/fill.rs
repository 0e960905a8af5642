//! Profile fill operations
//!
//! Filling converts a drive profile into executor-ready trajectory points
//! and pushes them into both devices' top buffers. The whole profile is
//! pushed in one go, interleaved across the channels, so neither device can
//! run ahead of the other during the transfer.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;

// Internal
use super::Params;
use crate::profile::{DriveProfile, TrajSegment, NUM_CHANNELS};
use exec_if::eqpt::{
    exec::{ExecutorStatus, ProfileExecutor},
    point::{PointDuration, TrajectoryPoint},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Report of a single fill operation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillReport {
    /// True if a latched underrun was found, notified and cleared before
    /// filling
    pub underrun_notified: bool,

    /// True if an executor rejected a point and the fill stopped early
    pub truncated: bool,

    /// True if at least one segment duration had no exact executor code and
    /// the nearest supported duration was substituted
    pub duration_substituted: bool,

    /// Number of complete point indices pushed to every channel
    pub points_per_channel: u32,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Fill both executors' top buffers with the given profile.
///
/// Any latched underrun from a previous stream is notified exactly once here
/// and the devices' flags cleared, so an underrun can never go unreported.
/// Both buffers are then cleared (interrupting a running profile leaves
/// stale points behind) and one converted point per segment is pushed to
/// each channel, left then right per index.
pub fn start_filling<E: ProfileExecutor>(
    execs: &mut [E; NUM_CHANNELS],
    profile: &DriveProfile,
    params: &Params,
) -> FillReport {
    let mut report = FillReport::default();

    // Check for latched underruns from the previous stream
    let mut had_underrun = [false; NUM_CHANNELS];
    let mut status = ExecutorStatus::default();

    for (i, exec) in execs.iter().enumerate() {
        exec.read_status(&mut status);
        had_underrun[i] = status.has_underrun;
    }

    if had_underrun.iter().any(|&u| u) {
        warn!("Executor buffer underrun detected during the previous stream");
        report.underrun_notified = true;

        for (i, exec) in execs.iter_mut().enumerate() {
            if had_underrun[i] {
                exec.clear_has_underrun();
            }
        }
    }

    // Always start from clean buffers
    for exec in execs.iter_mut() {
        exec.clear_buffer();
    }

    let channels = profile.channels();
    let num_segments = profile.len();

    'fill: for i in 0..num_segments {
        for (ch, exec) in execs.iter_mut().enumerate() {
            let point = convert_segment(
                &channels[ch][i],
                i,
                num_segments,
                params,
                &mut report,
            );

            if let Err(e) = exec.push_point(&point) {
                warn!(
                    "Executor {} rejected point {} ({}), fill stopped",
                    ch, i, e
                );
                report.truncated = true;
                break 'fill;
            }
        }

        report.points_per_channel = (i + 1) as u32;
    }

    report
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert one generator segment into an executor-ready trajectory point.
fn convert_segment(
    seg: &TrajSegment,
    index: usize,
    num_segments: usize,
    params: &Params,
    report: &mut FillReport,
) -> TrajectoryPoint {
    // metres -> revolutions -> sensor units
    let position = seg.position_m * params.dist_m_to_rev * params.sensor_units_per_rev;

    // metres/second -> revolutions/minute -> sensor units/100 ms
    let velocity =
        seg.velocity_ms * params.dist_m_to_rev * 60.0 * params.sensor_units_per_rev / 600.0;

    let duration_ms = (seg.dt_s * 1000.0).round() as u32;
    let duration = match PointDuration::from_ms(duration_ms) {
        Some(d) => d,
        None => {
            let nearest = PointDuration::nearest(duration_ms);
            warn!(
                "Segment {} duration of {} ms is not supported by the executor, using {} ms",
                index,
                duration_ms,
                nearest.as_ms()
            );
            report.duration_substituted = true;
            nearest
        }
    };

    TrajectoryPoint {
        position,
        velocity,
        heading_deg: seg.heading_deg,
        profile_slot: params.profile_slot,
        duration,
        // The first point re-zeroes the sensor so profiles are relative
        zero_pos: index == 0,
        is_last: index + 1 == num_segments,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::test_exec::{test_params, test_profile, TestExec};
    use super::*;
    use crate::profile::TrajSegment;

    #[test]
    fn test_fill_counts_and_flags() {
        let mut execs = [TestExec::new(), TestExec::new()];
        let profile = test_profile(5);

        let report = start_filling(&mut execs, &profile, &test_params());

        assert_eq!(report.points_per_channel, 5);
        assert!(!report.truncated);
        assert!(!report.underrun_notified);
        assert!(!report.duration_substituted);

        for exec in execs.iter() {
            assert_eq!(exec.pushed.len(), 5);
            assert_eq!(exec.num_clears, 1);

            // Exactly one zero_pos, on the first point
            assert!(exec.pushed[0].zero_pos);
            assert_eq!(exec.pushed.iter().filter(|p| p.zero_pos).count(), 1);

            // Exactly one is_last, on the final point
            assert!(exec.pushed[4].is_last);
            assert_eq!(exec.pushed.iter().filter(|p| p.is_last).count(), 1);

            // Every point carries the configured gain slot
            assert!(exec.pushed.iter().all(|p| p.profile_slot == 0));
        }
    }

    #[test]
    fn test_conversion_maths() {
        let params = test_params();
        let seg = TrajSegment {
            position_m: 1.0,
            velocity_ms: 0.5,
            heading_deg: 12.5,
            dt_s: 0.05,
        };
        let mut report = FillReport::default();

        let point = convert_segment(&seg, 1, 4, &params, &mut report);

        // 1 m * 2.006 rev/m * 4096 units/rev
        assert!((point.position - 1.0 * 2.006 * 4096.0).abs() < 1e-9);

        // 0.5 m/s * 2.006 rev/m * 60 -> RPM, then * 4096/600 -> units/100ms
        assert!((point.velocity - 0.5 * 2.006 * 60.0 * 4096.0 / 600.0).abs() < 1e-9);

        assert!((point.heading_deg - 12.5).abs() < 1e-9);
        assert_eq!(point.duration, PointDuration::Ms50);
        assert!(!point.zero_pos);
        assert!(!point.is_last);
        assert!(!report.duration_substituted);
    }

    #[test]
    fn test_unsupported_duration_substituted() {
        let mut execs = [TestExec::new(), TestExec::new()];

        // 15 ms sampling has no executor code, nearest (rounding up) is 20 ms
        let segs: Vec<TrajSegment> = (0..3)
            .map(|i| TrajSegment {
                position_m: 0.01 * i as f64,
                velocity_ms: 0.5,
                heading_deg: 0.0,
                dt_s: 0.015,
            })
            .collect();
        let profile = DriveProfile::new(segs.clone(), segs).unwrap();

        let report = start_filling(&mut execs, &profile, &test_params());

        assert!(report.duration_substituted);
        assert!(execs[0]
            .pushed
            .iter()
            .all(|p| p.duration == PointDuration::Ms20));
    }

    #[test]
    fn test_latched_underrun_notified_and_cleared() {
        let mut execs = [TestExec::new(), TestExec::new()];
        execs[0].status.has_underrun = true;

        let report = start_filling(&mut execs, &test_profile(3), &test_params());

        assert!(report.underrun_notified);

        // The flag must be cleared on the flagged device only
        assert!(!execs[0].status.has_underrun);
        assert!(!execs[1].status.has_underrun);
        assert_eq!(execs[0].num_clears, 1);
        assert_eq!(execs[1].num_clears, 1);
    }

    #[test]
    fn test_rejected_push_truncates_fill() {
        let mut execs = [TestExec::new(), TestExec::new()];
        execs[1].reject_after = Some(2);

        let report = start_filling(&mut execs, &test_profile(5), &test_params());

        assert!(report.truncated);

        // Point indices are interleaved left then right, so the left device
        // holds one more point than the right at the moment of rejection
        assert_eq!(execs[0].pushed.len(), 3);
        assert_eq!(execs[1].pushed.len(), 2);
        assert_eq!(report.points_per_channel, 2);
    }
}
