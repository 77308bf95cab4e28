//! # GPIO PWM Controller
//!
//! Talks to a running `gpwm_hal` over its control socket.
//!
//! ```bash
//! gpwm_ctl start     # start the 2 Hz waveform
//! gpwm_ctl stop      # stop and drive the pin low
//! gpwm_ctl status    # print the status line
//! gpwm_ctl toggle    # start if stopped, stop if running
//! gpwm_ctl debug     # dump registers to the daemon log
//! gpwm_ctl state     # print the sensed pin level
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand};
use gpwm_common::client::ControlClient;
use gpwm_common::consts::{
    CMD_DEBUG, CMD_START, CMD_STOP, CONTROL_RAW_STATE, DEFAULT_SOCKET_PATH, PWM_PIN,
};
use gpwm_common::error::PwmResult;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// GPIO60 PWM Controller
#[derive(Parser, Debug)]
#[command(name = "gpwm_ctl")]
#[command(version)]
#[command(about = "GPIO60 PWM Controller")]
struct Args {
    /// Control socket of the running daemon
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Socket timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Start 2Hz PWM on GPIO60
    Start,
    /// Stop PWM output
    Stop,
    /// Check current status
    Status,
    /// Toggle PWM state
    Toggle,
    /// Dump register states (daemon log)
    Debug,
    /// Read current GPIO state
    State,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut client = match ControlClient::connect(&args.socket, Duration::from_millis(args.timeout_ms)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to open {}: {}", args.socket.display(), e);
            eprintln!("Make sure the daemon is running:");
            eprintln!("  # gpwm_hal --socket {}", args.socket.display());
            std::process::exit(1);
        }
    };

    if let Err(e) = execute(&mut client, args.command) {
        eprintln!("{:?} failed: {}", args.command, e);
        std::process::exit(1);
    }
}

fn execute(client: &mut ControlClient, command: Command) -> PwmResult<()> {
    debug!("Executing {:?}", command);
    match command {
        Command::Start => {
            client.write(&[CMD_START])?;
            println!("2Hz PWM started on GPIO{PWM_PIN}");
        }
        Command::Stop => {
            client.write(&[CMD_STOP])?;
            println!("PWM stopped on GPIO{PWM_PIN}");
        }
        Command::Status => {
            print!("{}", client.read_status()?);
        }
        Command::Toggle => {
            // Read-then-write: another client may act in between.
            if client.read_status()?.contains("Running") {
                client.write(&[CMD_STOP])?;
                println!("PWM stopped");
            } else {
                client.write(&[CMD_START])?;
                println!("2Hz PWM started");
            }
        }
        Command::Debug => {
            client.write(&[CMD_DEBUG])?;
            println!("Debug command sent. Check the gpwm_hal log output");
        }
        Command::State => {
            let state = client.control(CONTROL_RAW_STATE)?;
            println!(
                "GPIO{PWM_PIN} current state: {}",
                if state != 0 { "HIGH" } else { "LOW" }
            );
        }
    }
    Ok(())
}
