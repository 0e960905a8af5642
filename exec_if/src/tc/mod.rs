//! # Telecommand module
//!
//! This module provides the telecommands accepted by the drive executive.
//! TCs are serialised as JSON, both in scripts and on any future command
//! link.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json;
use thiserror::Error;

// Internal
use crate::eqpt::exec::ControlMode;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction to the drive executive from the
/// operator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    /// Command the control mode applied to both executors.
    SelectMode(ControlMode),

    /// Request the loaded motion profile be started. Only acted on while the
    /// executors are in `MotionProfile` mode.
    StartProfile,

    /// Open loop drive demand with a throttle in [-1.0, +1.0]. Only acted on
    /// while the executors are in `PercentOutput` mode.
    OpenLoopDrive {
        throttle: f64,
    },

    /// Put the executive into safe mode
    MakeSafe,

    /// Take the executive out of safe mode
    MakeUnsafe,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
