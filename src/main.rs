// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depth_bridge::backends::depth::SimulatedCamera;
use depth_bridge::constants::{DEFAULT_ENDPOINT, DEFAULT_PROBE_PAYLOAD};
use depth_bridge::errors::{BridgeError, CameraError};
use depth_bridge::{BridgeConfig, bridge, shutdown_channel};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-bridge")]
#[command(about = "Serve depth maps from a stereo depth camera over a request/reply socket")]
#[command(version = env!("GIT_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input or capture mode: an .svo recording, a stream address (A.B.C.D or A.B.C.D:PORT),
    /// or one of HD2K, HD1200, HD1080, HD720, SVGA, VGA
    source: Option<String>,

    /// Config file (default: ~/.config/depth-bridge/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to bind, overriding the config file
    #[arg(short, long)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send requests to a running bridge and summarize the replies
    Probe {
        /// Endpoint of the bridge
        #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// Number of requests to send
        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Request payload
        #[arg(short, long, default_value = DEFAULT_PROBE_PAYLOAD)]
        payload: String,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Config file to read instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depth_bridge=trace, RUST_LOG=warn
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Probe {
            endpoint,
            count,
            payload,
        }) => cli::probe(&endpoint, count, &payload),
        Some(Commands::Config { config }) => cli::print_config(config.as_deref()),
        None => run_bridge(cli.source, cli.config, cli.endpoint),
    }
}

fn run_bridge(
    source: Option<String>,
    config_path: Option<PathBuf>,
    endpoint: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = BridgeConfig::load(config_path.as_deref())?;
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }

    let (trigger, signal) = shutdown_channel();
    trigger.install_ctrlc_handler()?;

    // Everything runs on one thread: the camera, the buffer and the socket
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = rt.block_on(bridge::serve(
        SimulatedCamera::new(),
        &config,
        source.as_deref(),
        signal,
    ));

    match result {
        Ok(_) => Ok(()),
        // Nothing was acquired yet, so exit right away with the provider's code
        Err(BridgeError::Camera(CameraError::Open(code))) => {
            eprintln!("{}", code);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
