//! Main arm-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Servo control processing
//!         - Electronics driver execution
//!
//! # Modules
//!
//! All modules (e.g. `servo_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    data_store::DataStore,
    dems_server::DemsServer,
    elec_driver,
    params::ArmExecParams,
};

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
use std::env;
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
const CYCLE_PERIOD_S: f64 = 0.025;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    // TC source is used to determine whether we're getting TCs from a script
    // or from a client over the network.
    let mut tc_source = TcSource::None;
    let mut use_dems_server = false;

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // If we have a single argument use it as the script path
    if args.len() == 2 {
        info!("Loading script from \"{}\"", &args[1]);

        // Load the script interpreter
        let si = ScriptInterpreter::new(&args[1]).wrap_err("Failed to load script")?;

        // Display some info
        info!(
            "Loaded script lasts {:.02} s and contains {} TCs\n",
            si.get_duration(),
            si.get_num_tcs()
        );

        // Set the interpreter in the source
        tc_source = TcSource::Script(si);
    }
    // If no arguments then setup the demands server
    else if args.len() == 1 {
        info!("No script provided, remote control via the DemsServer will be used\n");
        use_dems_server = true;
    } else {
        return Err(eyre!(
            "Expected either zero or one argument, found {}",
            args.len() - 1
        ));
    }

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.servo_ctrl
        .init(("servo_ctrl.toml", CYCLE_PERIOD_S), &session)
        .wrap_err("Failed to initialise ServoCtrl")?;
    info!("ServoCtrl init complete");

    ds.elec_driver
        .init("elec_driver.toml", &session)
        .wrap_err("Failed to initialise ElecDriver")?;
    info!("ElecDriver init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    if use_dems_server {
        info!("Initialising network");

        tc_source = TcSource::Server(
            DemsServer::new(&exec_params).wrap_err("Failed to initialise the DemsServer")?,
        );

        info!("DemsServer initialised on {}", exec_params.demands_endpoint);
    }

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

            TcSource::Server(ref mut server) => {
                // Get commands until none remain
                while let Some(tc) = server.get_tc() {
                    let response = tc_processor::exec(&mut ds, &tc);

                    // Print warning if couldn't send the response
                    match server.send_response(&response) {
                        Ok(_) => (),
                        Err(e) => warn!("Could not respond to TC: {}", e),
                    }
                }
            }

            TcSource::Script(ref mut si) => match si.get_pending_tcs() {
                PendingTcs::None => (),
                PendingTcs::Some(tc_vec) => {
                    for tc in tc_vec.iter() {
                        // Script TCs have no client to respond to, the response is dropped
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

        // ServoCtrl processing
        match ds.servo_ctrl.proc(&ds.servo_ctrl_input) {
            Ok((o, r)) => {
                ds.servo_ctrl_output = o;
                ds.servo_ctrl_status_rpt = r;

                // Drive the board with the new duties. Skipped when ServoCtrl fails since the
                // board latches its last duties anyway.
                match ds
                    .elec_driver
                    .proc(&elec_driver::InputData { duty: o.duty })
                {
                    Ok(_) => (),
                    Err(e) => warn!("Error during ElecDriver processing: {}", e),
                }
            }
            Err(e) => {
                // ServoCtrl errors usually just mean a client sent bad demands, so just issue
                // the warning and continue.
                warn!("Error during ServoCtrl processing: {}", e)
            }
        };

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.servo_ctrl.write() {
            warn!("Could not write ServoCtrl archives: {}", e);
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
                    cycle_dur.as_secs_f64() - Duration::from_secs_f64(CYCLE_PERIOD_S).as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    session.exit();

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    None,
    Server(DemsServer),
    Script(ScriptInterpreter),
}
