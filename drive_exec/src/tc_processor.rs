//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use drive_lib::data_store::{DataStore, SafeModeCause};
use exec_if::tc::Tc;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum magnitude of an open loop throttle demand.
const MAX_THROTTLE_DEMAND: f64 = 1.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) {
    // Handle different Tcs
    match tc {
        Tc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
        }
        Tc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            ds.make_unsafe(SafeModeCause::MakeSafeTc).ok();
        }
        Tc::SelectMode(mode) => {
            debug!("Recieved SelectMode command: {:?}", mode);
            ds.drive_mode = *mode;
        }
        Tc::StartProfile => {
            debug!("Recieved StartProfile command");
            ds.mp_ctrl_input.start_profile = true;
        }
        Tc::OpenLoopDrive { throttle } => {
            if throttle.abs() > MAX_THROTTLE_DEMAND {
                warn!(
                    "OpenLoopDrive throttle {} is outside [-1.0, +1.0], clamping",
                    throttle
                );
            }

            ds.throttle_demand = throttle.max(-MAX_THROTTLE_DEMAND).min(MAX_THROTTLE_DEMAND);
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
