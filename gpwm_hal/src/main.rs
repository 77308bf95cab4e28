//! # GPIO PWM HAL Binary
//!
//! Maps the GPIO registers, starts the waveform task and serves the control
//! socket until SIGINT/SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Real hardware (needs access to /dev/mem)
//! gpwm_hal --config /etc/gpwm/gpwm.toml
//!
//! # Simulated registers, verbose logging
//! gpwm_hal -s -v --socket /tmp/gpwm.sock
//! ```

#![deny(warnings)]

use clap::Parser;
use gpwm_common::config::{LogLevel, PwmConfig};
use gpwm_common::consts::{BACKEND_SIMULATION, DEFAULT_CONFIG_PATH};
use gpwm_common::error::PwmError;
use gpwm_hal::{BackendRegistry, ControlServer, PwmCore};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/// GPIO PWM HAL - software square wave on a memory-mapped GPIO line
#[derive(Parser, Debug)]
#[command(name = "gpwm_hal")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Software PWM on a memory-mapped GPIO line")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulation backend
    #[arg(short = 's', long)]
    simulate: bool,

    /// Control socket path (overrides the configuration)
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

/// How often the main thread checks for a shutdown signal.
const SIGNAL_POLL: Duration = Duration::from_millis(200);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match PwmConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };

    setup_tracing(&args, config.shared.log_level);

    if let Err(e) = run(args, config) {
        error!("gpwm_hal startup failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: Args, mut config: PwmConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    if args.simulate {
        info!("Simulation mode enabled");
        config.device.backend = BACKEND_SIMULATION.to_string();
    }
    if let Some(socket) = args.socket {
        config.control.socket_path = socket;
    }
    config.validate().map_err(PwmError::from)?;

    let registry = BackendRegistry::with_builtin();
    let mapper = registry.create(&config.device.backend, &config.device)?;
    info!("Using register backend '{}'", mapper.name());

    let core = PwmCore::on_load(mapper.as_ref())?;

    let mut server = match ControlServer::bind(
        &config.control.socket_path,
        core.control(),
        config.control.io_timeout(),
    ) {
        Ok(server) => server,
        Err(e) => {
            core.on_unload();
            return Err(e.into());
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            running.store(false, Ordering::SeqCst);
        })?;
    }

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(SIGNAL_POLL);
    }

    // The server holds control surfaces; close it before unmapping.
    server.shutdown();
    drop(server);
    info!("Waveform ran {} cycles", core.cycles());
    core.on_unload();

    info!("gpwm_hal shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        configured.as_directive()
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(
            directive
                .parse::<Directive>()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
