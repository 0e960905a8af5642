//! # Drive Executable Parameters
//!
//! This module provides parameters for the drive executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct DriveExecParams {

    /// Path to the left channel profile CSV, relative to the software root
    pub profile_left_csv: String,

    /// Path to the right channel profile CSV, relative to the software root
    pub profile_right_csv: String,

    /// Period between servicings of the executors' buffers.
    ///
    /// Units: seconds
    pub buffer_service_period_s: f64
}
