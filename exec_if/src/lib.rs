//! # Executor interface crate.
//!
//! Provides the common interface between the drive executive and the
//! on-drivetrain trajectory executors.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Definitions for the trajectory executor equipment
pub mod eqpt;

/// Telecommand module
pub mod tc;
