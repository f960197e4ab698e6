//! LISY command-line tool
//!
//! Connects to a LISY board, then monitors switches or sends one-shot
//! device commands.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lisy_core::SwitchNumber;
use lisy_hardware::traits::{
    DriverPlatform, DriverPlatformInterface, LightPlatformInterface, LightsPlatform,
    SegmentDisplayPlatform, SegmentDisplayPlatformInterface, SwitchPlatform,
};
use lisy_hardware::types::{DriverConfig, PulseSettings};
use lisy_hardware::{ConnectionKind, LisyConfig, LisyPlatform, PlatformEvent};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

/// LISY pinball controller tool
#[derive(Parser, Debug)]
#[command(name = "lisy")]
#[command(about = "Talk to a LISY System 1 / System 80 board")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port (overrides the config file)
    #[arg(long, conflicts_with = "host")]
    serial: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Network host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Network port of the board
    #[arg(long)]
    network_port: Option<u16>,

    /// Log filter, e.g. "debug" or "lisy_network=trace"
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print switch changes until Ctrl-C
    Monitor,

    /// Print hardware profile and firmware versions
    Info,

    /// Pulse a solenoid
    Pulse {
        /// Solenoid number
        solenoid: String,

        /// Pulse length in milliseconds
        ms: u32,
    },

    /// Switch a lamp on or off
    Lamp {
        /// Lamp number
        number: String,

        state: LampState,
    },

    /// Show text on a segment display
    Display {
        /// Display index
        number: String,

        text: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LampState {
    On,
    Off,
}

impl Args {
    /// Merge the config file with command-line overrides.
    fn lisy_config(&self) -> anyhow::Result<LisyConfig> {
        let mut config = match &self.config {
            Some(path) => LisyConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => LisyConfig::default(),
        };

        if let Some(port) = &self.serial {
            config.connection = ConnectionKind::Serial;
            config.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.baud = baud;
        }
        if let Some(host) = &self.host {
            config.connection = ConnectionKind::Network;
            config.network_host = Some(host.clone());
        }
        if let Some(port) = self.network_port {
            config.network_port = port;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt().with_env_filter(filter).with_target(true).init();

    let config = args.lisy_config()?;
    config.transport().context("no LISY connection configured")?;

    let (mut platform, events) = LisyPlatform::connect(&config)
        .await
        .context("starting LISY platform")?;

    let result = run(&args.command, &platform, events).await;
    platform.shutdown().await?;
    result
}

async fn run(
    command: &Commands,
    platform: &LisyPlatform,
    events: mpsc::Receiver<PlatformEvent>,
) -> anyhow::Result<()> {
    match command {
        Commands::Monitor => monitor(platform, events).await,
        Commands::Info => {
            let firmware = platform.firmware_info().await?;
            println!("Hardware:    {}", platform.profile());
            println!("LISY:        {}", firmware.lisy_version);
            println!("API:         {}", firmware.api_version);
            Ok(())
        }
        Commands::Pulse { solenoid, ms } => {
            let mut coil = platform.configure_driver(solenoid, DriverConfig::default())?;
            coil.pulse(PulseSettings::new(*ms)).await?;
            info!("Pulsed solenoid {} for {}ms", solenoid, ms);
            Ok(())
        }
        Commands::Lamp { number, state } => {
            let mut lamp = platform.configure_light(number, None)?;
            let brightness = if *state == LampState::On { 1.0 } else { 0.0 };
            lamp.set_brightness(brightness).await?;
            Ok(())
        }
        Commands::Display { number, text } => {
            let mut display = platform.configure_segment_display(number)?;
            display.set_text(text).await?;
            Ok(())
        }
    }
}

async fn monitor(
    platform: &LisyPlatform,
    mut events: mpsc::Receiver<PlatformEvent>,
) -> anyhow::Result<()> {
    println!("{}", platform.profile());

    let mut active: Vec<SwitchNumber> = platform
        .hw_switch_states()
        .into_iter()
        .filter_map(|(number, state)| state.then_some(number))
        .collect();
    active.sort();
    let active: Vec<String> = active.iter().map(ToString::to_string).collect();
    println!("Active switches: [{}]", active.join(", "));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down");
                return Ok(());
            }
            event = events.recv() => match event {
                Some(PlatformEvent::SwitchChanged(event)) => {
                    let state = if event.active { "active" } else { "inactive" };
                    println!("switch {:>2} {}", event.number, state);
                }
                Some(PlatformEvent::PollFailed { error }) => {
                    error!("Switch polling stopped: {}", error);
                    bail!("switch polling stopped: {error}");
                }
                Some(other) => info!(?other, "Unhandled event"),
                None => bail!("event channel closed"),
            },
        }
    }
}
