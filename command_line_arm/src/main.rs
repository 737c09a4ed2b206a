//! # Arm command line
//!
//! Interactive prompt which sends telecommands to a running arm exec and prints the responses.
//! Run with the endpoint the exec's demands server is bound to, or no argument for the default.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use comms_if::{
    eqpt::arm::{ArmDems, ArmTm, ServoId},
    net::{zmq, MonitoredSocket, SocketOptions},
    tc::{ArmTc, ArmTcResponse},
};
use rustyline::{error::ReadlineError, DefaultEditor};
use structopt::{clap::AppSettings, StructOpt};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

const HISTORY_PATH: &str = ".arm_cli_history";

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Command line client for the arm exec.
#[derive(StructOpt)]
#[structopt(name = "command_line_arm")]
struct Opt {
    /// Endpoint the arm exec's demands server is bound to
    #[structopt(default_value = "tcp://localhost:5000")]
    endpoint: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Commands accepted at the prompt.
#[derive(StructOpt)]
#[structopt(
    name = "arm",
    no_version,
    global_settings = &[AppSettings::NoBinaryName, AppSettings::DisableVersion]
)]
enum Command {
    /// Demand a new target position for one servo
    #[structopt(name = "dem")]
    Dem {
        /// Name of the servo to move, e.g. wrist_roll
        servo: ServoId,

        /// Target position, normalised to [0, 1] over the servo's safe range
        pos_norm: f64,
    },

    /// Request the current arm state
    #[structopt(name = "state")]
    State,

    /// Halt all motion and enter safe mode
    #[structopt(name = "safe")]
    Safe,

    /// Leave safe mode
    #[structopt(name = "unsafe")]
    Unsafe,

    /// Check the exec is responding
    #[structopt(name = "ping")]
    Ping,

    /// Exit the command line
    #[structopt(name = "exit")]
    Exit,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // Create the zmq context and socket. The options match the other REQ clients talking to the
    // exec, except for a longer recv timeout so a slow reply isn't reported as missing.
    let ctx = zmq::Context::new();

    let socket_options = SocketOptions {
        connect_timeout: 1000,
        heartbeat_ivl: 500,
        heartbeat_ttl: 1000,
        heartbeat_timeout: 1000,
        linger: 1,
        recv_timeout: 1000,
        send_timeout: 10,
        req_correlate: true,
        req_relaxed: true,
        ..Default::default()
    };

    println!("Connecting to the arm exec on {}", opt.endpoint);

    let socket = MonitoredSocket::new(&ctx, zmq::REQ, socket_options, &opt.endpoint)
        .wrap_err("Failed to connect to the arm exec")?;

    println!("Connected, type \"help\" for the command list");

    let mut rl = DefaultEditor::new().wrap_err("Failed to create the line editor")?;
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No history detected");
    }

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                rl.add_history_entry(line.as_str()).ok();

                let command = match Command::from_iter_safe(line.split_whitespace()) {
                    Ok(c) => c,
                    Err(e) => {
                        println!("{}", e.message);
                        continue;
                    }
                };

                let tc = match command {
                    Command::Dem { servo, pos_norm } => ArmTc::Dems(ArmDems::single(servo, pos_norm)),
                    Command::State => ArmTc::GetState,
                    Command::Safe => ArmTc::MakeSafe,
                    Command::Unsafe => ArmTc::MakeUnsafe,
                    Command::Ping => ArmTc::Ping,
                    Command::Exit => break,
                };

                if let Err(e) = send_tc(&socket, &tc) {
                    println!("{}", e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Unhandled Error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_PATH).ok();

    println!("Exiting...");

    Ok(())
}

/// Send a TC to the exec and print the response.
fn send_tc(socket: &MonitoredSocket, tc: &ArmTc) -> Result<(), Report> {
    socket
        .send(&tc.to_json(), 0)
        .wrap_err("Could not send the TC")?;

    let msg = socket
        .recv_msg(0)
        .wrap_err("No response from the arm exec")?;

    let response: ArmTcResponse =
        serde_json::from_str(msg.as_str().unwrap_or("")).wrap_err("Could not parse the response")?;

    match response {
        ArmTcResponse::Ok => println!("Ok"),
        ArmTcResponse::CannotExecute => println!("Cannot execute, the arm is in safe mode"),
        ArmTcResponse::Invalid(reason) => println!("Invalid TC: {}", reason),
        ArmTcResponse::State(tm) => print_state(&tm),
        ArmTcResponse::Pong => println!("Pong"),
    }

    Ok(())
}

/// Print a telemetry frame as one line per servo.
fn print_state(tm: &ArmTm) {
    println!(
        "Arm state at {} ({})",
        tm.timestamp,
        if tm.safe { "SAFE" } else { "unsafe" }
    );

    for id in ServoId::ALL.iter() {
        match tm.servos.get(id) {
            Some(servo) => println!(
                "  {:>14}: pos {:.3}  target {:.3}  speed {:+.4}{}",
                id,
                servo.pos_norm,
                servo.target_norm,
                servo.speed_norm,
                if servo.moving { "  moving" } else { "" }
            ),
            None => println!("  {:>14}: no telemetry", id),
        }
    }
}
