//! # Drive profile
//!
//! A drive profile is the two channel, time sampled trajectory streamed into
//! the drivetrain's trajectory executors by `mp_ctrl`. Profiles are produced
//! offline by a trajectory generator and stored as one CSV file per channel,
//! in SI units. Conversion into executor sensor units happens at fill time,
//! not here.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of drive channels (left and right) on the rover.
pub const NUM_CHANNELS: usize = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single sample of one profile channel.
///
/// Segments are in the generator's unit system (metres, seconds, degrees).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajSegment {
    /// Distance along the channel since the start of the profile.
    ///
    /// Units: metres
    pub position_m: f64,

    /// Velocity of the channel at this sample.
    ///
    /// Units: metres/second
    pub velocity_ms: f64,

    /// Heading of the rover at this sample.
    ///
    /// Units: degrees
    pub heading_deg: f64,

    /// Time slice this sample shall be executed for.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// A complete two channel drive profile.
///
/// Both channels are guaranteed to have the same number of segments, use
/// [`DriveProfile::new`] or [`DriveProfile::from_csv_files`] to build one.
#[derive(Clone, Debug, Serialize)]
pub struct DriveProfile {
    left: Vec<TrajSegment>,
    right: Vec<TrajSegment>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The drive channels of the rover.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum Channel {
    Left,
    Right,
}

/// Errors associated with loading and validating drive profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("The profile has no segments")]
    Empty,

    #[error(
        "The left and right channels have different numbers of segments \
        ({0} and {1})"
    )]
    ChannelLengthMismatch(usize, usize),

    #[error("Segment {1} of the {0:?} channel has a non-positive time slice ({2} s)")]
    InvalidTimeSlice(Channel, usize, f64),

    #[error("Could not read the profile CSV: {0}")]
    CsvError(csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Channel {
    /// All channels, in index order.
    pub const ALL: [Channel; NUM_CHANNELS] = [Channel::Left, Channel::Right];

    /// Get the index of this channel, matching the order of
    /// [`DriveProfile::channels`].
    pub fn index(&self) -> usize {
        match self {
            Channel::Left => 0,
            Channel::Right => 1,
        }
    }
}

impl DriveProfile {
    /// Build a profile from a pair of channel segment vectors.
    ///
    /// The channels must be non-empty, of equal length and have strictly
    /// positive time slices.
    pub fn new(
        left: Vec<TrajSegment>,
        right: Vec<TrajSegment>,
    ) -> Result<Self, ProfileError> {
        if left.is_empty() && right.is_empty() {
            return Err(ProfileError::Empty);
        }

        if left.len() != right.len() {
            return Err(ProfileError::ChannelLengthMismatch(
                left.len(),
                right.len(),
            ));
        }

        for (channel, segments) in Channel::ALL.iter().zip([&left, &right].iter()) {
            for (i, seg) in segments.iter().enumerate() {
                if seg.dt_s <= 0.0 {
                    return Err(ProfileError::InvalidTimeSlice(*channel, i, seg.dt_s));
                }
            }
        }

        Ok(Self { left, right })
    }

    /// Load a profile from a pair of channel CSV files.
    ///
    /// The CSVs must have a header row naming the fields of [`TrajSegment`].
    pub fn from_csv_files<P: AsRef<Path>>(
        left_path: P,
        right_path: P,
    ) -> Result<Self, ProfileError> {
        let left = read_channel_file(left_path)?;
        let right = read_channel_file(right_path)?;

        Self::new(left, right)
    }

    /// Get the number of segments per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True if the profile has no segments.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Get the segments of the given channel.
    pub fn channel(&self, channel: Channel) -> &[TrajSegment] {
        match channel {
            Channel::Left => &self.left,
            Channel::Right => &self.right,
        }
    }

    /// Get both channels' segments, indexed by [`Channel::index`].
    pub fn channels(&self) -> [&[TrajSegment]; NUM_CHANNELS] {
        [&self.left, &self.right]
    }

    /// Get the total duration of the profile.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        self.left.iter().map(|s| s.dt_s).sum()
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Read one channel's segments from a CSV file.
fn read_channel_file<P: AsRef<Path>>(path: P) -> Result<Vec<TrajSegment>, ProfileError> {
    let mut rdr = match csv::Reader::from_path(path) {
        Ok(r) => r,
        Err(e) => return Err(ProfileError::CsvError(e)),
    };

    read_channel(&mut rdr)
}

/// Read one channel's segments from an open CSV reader.
fn read_channel<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<TrajSegment>, ProfileError> {
    let mut segments: Vec<TrajSegment> = vec![];

    for record in rdr.deserialize() {
        match record {
            Ok(s) => segments.push(s),
            Err(e) => return Err(ProfileError::CsvError(e)),
        }
    }

    Ok(segments)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
