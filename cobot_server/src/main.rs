//! # Cobot Server Binary
//!
//! Websocket server exposing one robotic arm through a text command language.
//!
//! # Usage
//!
//! ```bash
//! # Simulated arm on the default port
//! cobot_server --simulate
//!
//! # Real arm over its serial link (built with `--features serial`)
//! cobot_server --config /etc/cobot/server.toml --driver mycobot
//!
//! # Verbose JSON logs on another port
//! cobot_server -s -v --json --port 9000
//! ```

use clap::Parser;
use cobot_common::config::ConfigLoader;
use cobot_common::consts::DEFAULT_CONFIG_PATH;
use cobot_hal::DriverRegistry;
use cobot_hal::drivers::simulation;
use cobot_server::config::ServerConfig;
use cobot_server::error::ServerError;
use cobot_server::handler::ConnectionHandler;
use cobot_server::session::DeviceSession;
use cobot_server::transport;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cobot Server - websocket text-command front end for a single robotic arm
#[derive(Parser, Debug)]
#[command(name = "cobot_server")]
#[command(version)]
#[command(about = "Websocket text-command server for a single robotic arm")]
#[command(long_about = None)]
struct Args {
    /// Path to the TOML configuration file (defaults apply when missing)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Force the simulation driver
    #[arg(short = 's', long)]
    simulate: bool,

    /// Driver to load (overrides `device.driver`)
    #[arg(short, long)]
    driver: Option<String>,

    /// Listen port (overrides `server.port`)
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen address (overrides `server.bind_address`)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet; configure a default one to report the failure.
            setup_tracing(&args, "info");
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };
    setup_tracing(&args, config.shared.log_level.as_str());

    if let Err(e) = run(config) {
        error!("Server startup failed: {}", e);
        std::process::exit(1);
    }
}

/// Load the file and apply CLI overrides.
fn load_config(args: &Args) -> Result<ServerConfig, ServerError> {
    let mut config = ServerConfig::load_or_default(&args.config)?;

    if args.simulate {
        config.device.driver = simulation::DRIVER_NAME.to_string();
    } else if let Some(ref driver) = args.driver {
        config.device.driver = driver.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref bind) = args.bind {
        config.server.bind_address = bind.clone();
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn run(config: ServerConfig) -> Result<(), ServerError> {
    info!(
        "{} v{} starting (driver={}, pose_mode={})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.device.driver,
        config.device.pose_mode
    );

    let registry = DriverRegistry::with_builtin_drivers();
    let driver = registry.open(&config.device)?;
    let session = Arc::new(DeviceSession::new(driver, config.session_settings()));

    let startup = Arc::clone(&session);
    match tokio::task::spawn_blocking(move || startup.startup()).await? {
        Ok(0) => info!("Device ready"),
        Ok(code) => warn!("Device reported fault {} during startup (cleared)", code),
        Err(e) => warn!("Device startup incomplete, serving anyway: {}", e),
    }

    let listener = transport::bind(&config.server.socket_addr()).await?;
    let handler = ConnectionHandler::new(Arc::clone(&session), config.parser());

    tokio::select! {
        () = transport::run(listener, handler) => {}
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received shutdown signal"),
            Err(e) => error!("Unable to listen for shutdown signal: {}", e),
        },
    }

    let closing = Arc::clone(&session);
    if let Err(e) = tokio::task::spawn_blocking(move || closing.shutdown()).await? {
        warn!("Driver shutdown failed: {}", e);
    }

    info!("Cobot server shutdown complete");
    Ok(())
}

/// Setup tracing subscriber from CLI flags and the configured level.
fn setup_tracing(args: &Args, configured: &str) {
    let level = if args.verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
