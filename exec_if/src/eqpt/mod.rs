//! # Equipment module
//!
//! Common definitions for the drivetrain equipment controlled by the drive
//! executive.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Trajectory executor interface definitions
pub mod exec;

/// Trajectory point definitions
pub mod point;
