//! # Data Store

use exec_if::eqpt::exec::{ControlMode, ProfileOutput};
use log::{info, warn};

use crate::mp_ctrl;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the rover has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Elapsed session time at the start of this cycle
    pub elapsed_time_s: f64,

    // Safe mode variables
    /// Determines if the rover is in safe mode.
    pub safe: bool,

    /// Gives the reason for the rover being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Drive demands
    /// Control mode the drive executors are commanded in
    pub drive_mode: ControlMode,

    /// Open loop throttle demand in [-1.0, +1.0]
    pub throttle_demand: f64,

    // MpCtrl
    pub mp_ctrl_input: mp_ctrl::InputData,
    pub mp_ctrl_output: ProfileOutput,
    pub mp_ctrl_status_rpt: mp_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the rover into safe mode with the given cause.
    ///
    /// While safe the exec forces neutral demands on both drive executors
    /// and holds the streaming machine in reset, see the main loop.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        if self.num_cycles % (cycle_frequency_hz as u128) == 0 {
            self.is_1_hz_cycle = true;
        } else {
            self.is_1_hz_cycle = false;
        }

        self.mp_ctrl_input = mp_ctrl::InputData::default();
        self.mp_ctrl_output = ProfileOutput::default();
        self.mp_ctrl_status_rpt = mp_ctrl::StatusReport::default();

        self.elapsed_time_s = util::session::get_elapsed_seconds();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_make_safe_records_cause() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::MakeSafeTc);

        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::MakeSafeTc));
    }

    #[test]
    fn test_make_unsafe_requires_matching_cause() {
        let mut ds = DataStore::default();

        // Unsafe rover accepts any clear
        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());

        ds.make_safe(SafeModeCause::MakeSafeTc);

        assert!(ds.make_unsafe(SafeModeCause::MakeSafeTc).is_ok());
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);
    }
}
