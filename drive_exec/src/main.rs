//! Main drive-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Motion profile control processing
//!         - Demand application to the drive executors
//!         - Simulated equipment stepping
//!         - Archive writing
//!
//! # Modules
//!
//! All modules (e.g. `mp_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use drive_lib::{
    data_store::DataStore,
    mp_ctrl::{self, MpCtrl},
    params::DriveExecParams,
    profile::DriveProfile,
    sim_exec::{SimExecParams, SimExecutor},
};
use exec_if::eqpt::exec::{ControlMode, Demand};

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    archive::Archived,
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    script_interpreter::{PendingTcs, ScriptInterpreter},
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Period of one cycle in whole milliseconds, used to step the simulated
/// devices.
const CYCLE_PERIOD_MS: u32 = 20;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("drive_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Deimos Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: DriveExecParams =
        util::params::load("drive_exec.toml").wrap_err("Could not load drive_exec params")?;

    let sim_params: SimExecParams =
        util::params::load("sim_exec.toml").wrap_err("Could not load sim_exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // The script path is the only argument the exec takes
    let mut tc_source = match args.len() {
        2 => {
            info!("Loading script from \"{}\"", &args[1]);

            // Load the script interpreter
            let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

            // Display some info
            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            TcSource::Script(si)
        }
        _ => {
            return Err(eyre!(
                "Expected the path to a TC script as the only argument, found {} arguments",
                args.len() - 1
            ))
        }
    };

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE EQUIPMENT ----

    // Simulated drive devices, one per channel. Clones of these handles go
    // to MpCtrl, the originals stay with the exec for demands, servicing and
    // stepping.
    let left_exec = SimExecutor::new(sim_params);
    let right_exec = SimExecutor::new(sim_params);

    // ---- INITIALISE MODULES ----

    let mut mp_ctrl = MpCtrl::init(
        mp_ctrl::InitData {
            params_path: "mp_ctrl.toml",
            execs: [left_exec.clone(), right_exec.clone()],
        },
        &session,
    )
    .wrap_err("Failed to initialise MpCtrl")?;
    info!("MpCtrl init complete");

    // ---- LOAD DRIVE PROFILE ----

    let sw_root = host::get_deimos_sw_root().wrap_err("Could not get the software root")?;

    let profile = DriveProfile::from_csv_files(
        sw_root.join(&exec_params.profile_left_csv),
        sw_root.join(&exec_params.profile_right_csv),
    )
    .wrap_err("Failed to load the drive profile")?;

    info!(
        "Drive profile loaded: {} points per channel, {:.02} s duration",
        profile.len(),
        profile.duration_s()
    );

    // Save the loaded profile into the session
    session.save("drive_profile.json", profile.clone());

    mp_ctrl.set_profile(profile);

    info!("Module initialisation complete\n");

    // ---- START BUFFER SERVICING ----

    // The real devices pull points down over their control frame, the
    // simulated ones need servicing from a background thread standing in
    // for the device firmware's notifier.
    let service_period = Duration::from_secs_f64(exec_params.buffer_service_period_s);
    let service_stop = Arc::new(AtomicBool::new(false));

    let service_handle = {
        let left = left_exec.clone();
        let right = right_exec.clone();
        let stop = service_stop.clone();

        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                left.service();
                right.service();
                thread::sleep(service_period);
            }
        })
    };

    info!("Buffer service thread started");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- TELECOMMAND PROCESSING ----

        // Branch depending on the source
        match tc_source {
            // If no source no point in continuing so break
            TcSource::None => raise_error!("No TC source present"),

            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        tc_processor::exec(&mut ds, tc);
                    }
                }
                // Exit if end of script reached
                PendingTcs::EndOfScript => {
                    info!("End of TC script reached, stopping");
                    break;
                }
            },
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        if ds.safe {
            // While safed the streaming machine is held in reset and both
            // devices are commanded neutral
            mp_ctrl.reset();

            left_exec.set(Demand::PercentOutput(0.0));
            right_exec.set(Demand::PercentOutput(0.0));
        } else {
            match ds.drive_mode {
                ControlMode::MotionProfile => {
                    // MpCtrl processing
                    match mp_ctrl.proc(&ds.mp_ctrl_input) {
                        Ok((o, r)) => {
                            ds.mp_ctrl_output = o;
                            ds.mp_ctrl_status_rpt = r;
                        }
                        Err(e) => {
                            // MpCtrl errors usually just mean you sent the wrong TC, so just
                            // issue the warning and continue.
                            warn!("Error during MpCtrl processing: {}", e)
                        }
                    };

                    // The exec applies the deduced output to both devices
                    // every cycle
                    let demand = Demand::MotionProfile(ds.mp_ctrl_output);
                    left_exec.set(demand);
                    right_exec.set(demand);
                }
                ControlMode::PercentOutput => {
                    // Out of profile mode the streaming machine stays reset
                    mp_ctrl.reset();

                    let demand = Demand::PercentOutput(ds.throttle_demand);
                    left_exec.set(demand);
                    right_exec.set(demand);
                }
            }
        }

        // ---- EQUIPMENT SIMULATION ----

        // Advance simulated playback by one cycle
        left_exec.step(CYCLE_PERIOD_MS);
        right_exec.step(CYCLE_PERIOD_MS);

        // ---- WRITE ARCHIVES ----

        match mp_ctrl.write() {
            Ok(_) => (),
            Err(e) => warn!("Could not write MpCtrl archives: {}", e),
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    // Leave the devices in a neutral state
    left_exec.set(Demand::PercentOutput(0.0));
    right_exec.set(Demand::PercentOutput(0.0));

    // Stop the buffer service thread
    service_stop.store(true, Ordering::Relaxed);
    if service_handle.join().is_err() {
        warn!("Buffer service thread panicked");
    }

    // Save a summary of the run into the session
    session.save(
        "run_summary.json",
        RunSummary {
            num_cycles: ds.num_cycles as u64,
            num_underruns: mp_ctrl.num_underruns(),
            final_mode: mp_ctrl.mode(),
        },
    );

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Summary of the run, saved into the session directory at shutdown.
#[derive(Serialize)]
struct RunSummary {
    num_cycles: u64,
    num_underruns: u64,
    final_mode: mp_ctrl::MpCtrlMode,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
#[allow(dead_code)]
enum TcSource {
    None,
    Script(ScriptInterpreter),
}
