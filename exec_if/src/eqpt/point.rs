//! # Trajectory point definitions
//!
//! A trajectory point is the unit of data streamed into a trajectory
//! executor. Points are expressed in the executor's native unit system, not
//! in the generator's SI units, so all conversions must be done before a
//! point is built.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single executor-ready trajectory point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Target position for this point.
    ///
    /// Units: sensor units
    pub position: f64,

    /// Target velocity for this point.
    ///
    /// Units: sensor units/100 ms
    pub velocity: f64,

    /// Heading at this point. Carried as telemetry only, the executor does
    /// not act on it.
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Index of the closed loop gain slot the executor shall use for this
    /// point.
    pub profile_slot: u8,

    /// Time the executor shall apply this point for.
    pub duration: PointDuration,

    /// If true the executor shall zero its sensor position when this point
    /// begins executing. Set on the first point of a profile only.
    pub zero_pos: bool,

    /// If true this is the final point of the profile.
    pub is_last: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Durations supported by the executor for a single trajectory point.
///
/// The executor firmware only accepts this fixed set of durations, arbitrary
/// millisecond values cannot be used. Use [`PointDuration::nearest`] to get
/// the closest legal value to a requested duration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PointDuration {
    Ms0,
    Ms5,
    Ms10,
    Ms20,
    Ms30,
    Ms40,
    Ms50,
    Ms100,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PointDuration {
    /// All durations the executor supports, in ascending order.
    pub const SUPPORTED: [PointDuration; 8] = [
        PointDuration::Ms0,
        PointDuration::Ms5,
        PointDuration::Ms10,
        PointDuration::Ms20,
        PointDuration::Ms30,
        PointDuration::Ms40,
        PointDuration::Ms50,
        PointDuration::Ms100,
    ];

    /// Get the duration matching the given number of milliseconds exactly,
    /// or `None` if the executor does not support it.
    pub fn from_ms(ms: u32) -> Option<Self> {
        match ms {
            0 => Some(PointDuration::Ms0),
            5 => Some(PointDuration::Ms5),
            10 => Some(PointDuration::Ms10),
            20 => Some(PointDuration::Ms20),
            30 => Some(PointDuration::Ms30),
            40 => Some(PointDuration::Ms40),
            50 => Some(PointDuration::Ms50),
            100 => Some(PointDuration::Ms100),
            _ => None,
        }
    }

    /// Get the number of milliseconds this duration represents.
    pub fn as_ms(&self) -> u32 {
        match self {
            PointDuration::Ms0 => 0,
            PointDuration::Ms5 => 5,
            PointDuration::Ms10 => 10,
            PointDuration::Ms20 => 20,
            PointDuration::Ms30 => 30,
            PointDuration::Ms40 => 40,
            PointDuration::Ms50 => 50,
            PointDuration::Ms100 => 100,
        }
    }

    /// Get the supported duration closest to the given number of
    /// milliseconds.
    ///
    /// Ties are broken upwards, streaming a point for slightly too long is
    /// safer than draining the buffers early.
    pub fn nearest(ms: u32) -> Self {
        let mut best = PointDuration::Ms0;
        let mut best_diff = i64::MAX;

        for d in Self::SUPPORTED.iter() {
            let diff = (d.as_ms() as i64 - ms as i64).abs();
            if diff < best_diff || (diff == best_diff && d.as_ms() > best.as_ms()) {
                best = *d;
                best_diff = diff;
            }
        }

        best
    }
}

impl Default for PointDuration {
    fn default() -> Self {
        PointDuration::Ms0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
