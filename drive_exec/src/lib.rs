//! # Drive executive library.
//!
//! This library allows other crates in the workspace to access items defined inside the drive
//! executive.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executive
pub mod data_store;

/// Motion profile control module - streams profile points into both executors and supervises
/// playback
pub mod mp_ctrl;

/// Executive parameters
pub mod params;

/// Drive profile - the two channel trajectory consumed by motion profile control
pub mod profile;

/// Simulated trajectory executors - stand-in devices for running without hardware
pub mod sim_exec;
