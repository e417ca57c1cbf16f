//! Command-line power control for the Canon SX6000 projector.
//!
//! Run with: sx6000-power --port /dev/ttyUSB0 power --on

use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::debug;
use sx6000_power::{Error, PowerController, SerialConfig, SerialTransport, Timing};

#[derive(Parser)]
#[command(name = "sx6000-power", version)]
#[command(about = "Control Canon SX6000 projector power over RS-232", long_about = None)]
struct Cli {
    /// Serial port the projector is attached to
    #[arg(short, long, env = "SX6000_PORT")]
    port: String,

    /// Serial baud rate
    #[arg(long, default_value_t = SerialConfig::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Maximum number of 5s state polls while waiting for the projector to turn off
    #[arg(
        long,
        default_value_t = Timing::default().max_poll_attempts,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_polls: u32,

    /// Log every exchange with the projector
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the projector on or off
    Power(PowerArgs),

    /// Show the current power state
    Status {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct PowerArgs {
    /// Power on
    #[arg(long)]
    on: bool,

    /// Power off
    #[arg(long)]
    off: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let serial = SerialConfig::new(&cli.port).with_baud_rate(cli.baud);
    let timing = Timing::default().with_max_poll_attempts(cli.max_polls);
    let mut projector = PowerController::serial(serial, timing);

    let result = tokio::select! {
        result = run(&mut projector, &cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            let summary = projector.history().summary();
            debug!(
                "history: {}",
                serde_json::to_string(&summary).unwrap_or_else(|_| format!("{:?}", summary))
            );
            for entry in projector.history().entries() {
                debug!("  {:>8.3}s {:?}", entry.timestamp, entry.event);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(
    projector: &mut PowerController<SerialTransport>,
    command: &Commands,
) -> Result<(), Error> {
    match command {
        Commands::Power(PowerArgs { on: true, .. }) => {
            println!(
                "Turning projector ON (waiting up to {}s for a shutdown to finish)...",
                projector.timing().poll_budget().as_secs()
            );
            let response = projector.power_on().await?;
            println!("{}", capitalize(&response.to_string()));
        }

        Commands::Power(_) => {
            println!("Turning projector OFF...");
            let response = projector.power_off().await?;
            println!("{}", capitalize(&response.to_string()));
        }

        Commands::Status { json } => {
            let reading = projector.read_power().await?;
            if *json {
                let value = serde_json::json!({
                    "port": projector.transport().config().port,
                    "state": reading.state,
                    "raw": reading.raw,
                });
                println!("{}", value);
            } else {
                println!("Power: {}", reading.state);
                println!("Reply: {:?}", reading.raw);
            }
        }
    }
    Ok(())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
