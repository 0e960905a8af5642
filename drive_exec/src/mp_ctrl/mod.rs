//! # Motion profile control module
//!
//! MpCtrl streams a two channel drive profile into the drivetrain's trajectory executors and
//! supervises playback. The module runs a three mode state machine:
//!
//! - `Idle`: nothing streaming. A start request clears both devices, fills them with the loaded
//!   profile and moves to `Filling`.
//! - `Filling`: output disabled while points transfer into the devices. Once both channels hold
//!   more than the minimum number of points in the same poll the output is enabled and the mode
//!   moves to `Streaming`.
//! - `Streaming`: points are executing. When both channels report a valid active point flagged
//!   as last in the same poll the output becomes `Hold` and the mode returns to `Idle`.
//!
//! The module never calls the executors' primary output. It deduces an output value each cycle
//! and the owning executive shall apply that value to both devices, whatever the mode.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod fill;
mod params;
mod poll;
mod state;
mod supervisor;

#[cfg(test)]
pub(crate) mod test_exec;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use fill::*;
pub use params::*;
pub use poll::*;
pub use state::*;
pub use supervisor::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MpCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum MpCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    /// A start was requested but no profile has been loaded. Load one with
    /// `MpCtrl::set_profile` first.
    #[error("Cannot start a profile as none has been loaded")]
    NoProfile,
}
