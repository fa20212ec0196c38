//! thermotrace - Serial Setpoint Monitor Binary
//!
//! Polls a serial device for `Z<setpoint>A<actual>` frames, logs every
//! accepted measurement to CSV and prints updates until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use thermotrace::{
    encode_setpoint, is_valid_decimal, list_ports, AcquisitionLoop, AcquisitionUpdate, CsvSink,
    MonitorConfig, SerialTransport, Transport, UpdateObserver, DEFAULT_BAUD_RATE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_READ_TIMEOUT_MS,
};
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "thermotrace")]
#[command(about = "Serial setpoint/process-value monitor with CSV logging")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Serial device path
    #[arg(long, default_value = "/dev/ttyUSB0")]
    device: String,

    /// Serial baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Polling interval in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    interval: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the device and log measurements (default)
    Run(RunArgs),

    /// Send a one-shot setpoint change and exit
    Send(SendArgs),

    /// List detected serial ports
    Ports,
}

#[derive(Args)]
struct RunArgs {
    /// CSV log file path
    #[arg(long, default_value = "measurements.csv")]
    log_file: PathBuf,

    /// Keep only the newest N measurements in memory (unbounded if omitted)
    #[arg(long)]
    retention: Option<usize>,

    /// Stop after this many consecutive persistence failures
    #[arg(long)]
    max_persist_failures: Option<u32>,

    /// Print updates as JSON lines instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SendArgs {
    /// Setpoint value, a non-negative decimal number
    value: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Run(args)) => {
            run_command(&cli, args).await?;
        }
        Some(Commands::Send(args)) => {
            send_command(&cli, args)?;
        }
        Some(Commands::Ports) => {
            ports_command()?;
        }
        None => {
            // Default to the run command
            let args = RunArgs {
                log_file: PathBuf::from("measurements.csv"),
                retention: None,
                max_persist_failures: None,
                json: false,
            };
            run_command(&cli, &args).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Prints each accepted measurement; stands in for the GUI's value labels.
struct ConsoleObserver {
    json: bool,
}

impl UpdateObserver for ConsoleObserver {
    fn on_update(&mut self, update: &AcquisitionUpdate) {
        if self.json {
            match serde_json::to_string(update) {
                Ok(line) => println!("{line}"),
                Err(e) => error!(error = %e, "failed to serialize update"),
            }
        } else {
            println!(
                "{}  setpoint {:>8.2}  actual {:>8.2}  ({} samples)",
                update.measurement.log_time(),
                update.setpoint,
                update.measurement.actual,
                update.history.len()
            );
        }
    }
}

async fn run_command(cli: &Cli, args: &RunArgs) -> anyhow::Result<()> {
    let config = MonitorConfig::new(&cli.device, cli.baud)
        .with_poll_interval_ms(cli.interval)
        .with_log_path(args.log_file.clone())
        .with_retention(args.retention)
        .with_persist_failure_limit(args.max_persist_failures);

    let transport =
        SerialTransport::open(&config.device, config.baud_rate, config.read_timeout())
            .with_context(|| format!("opening serial device {}", cli.device))?;

    let sink = CsvSink::open(&config.log_path)
        .with_context(|| format!("opening log file {}", config.log_path.display()))?;

    info!(
        device = %config.device,
        baud = config.baud_rate,
        interval_ms = config.poll_interval_ms,
        log = %config.log_path.display(),
        "starting monitor"
    );

    let mut acquisition = AcquisitionLoop::new(transport, sink, config);
    acquisition.add_observer(ConsoleObserver { json: args.json });
    let handle = acquisition.spawn()?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    let finished = handle.shutdown().await?;

    println!();
    println!(
        "{} measurement(s) logged to {}",
        finished.series().len(),
        finished.sink().path().display()
    );
    if let Some(latest) = finished.series().latest() {
        println!(
            "last reading: setpoint {:.2}, actual {:.2} at {}",
            latest.setpoint,
            latest.actual,
            latest.log_time()
        );
    }

    Ok(())
}

fn send_command(cli: &Cli, args: &SendArgs) -> anyhow::Result<()> {
    let value = args.value.trim();
    if !is_valid_decimal(value) {
        anyhow::bail!("rejected: {value:?} is not a non-negative decimal number");
    }

    let timeout = Duration::from_millis(DEFAULT_READ_TIMEOUT_MS);
    let mut transport = SerialTransport::open(&cli.device, cli.baud, timeout)
        .with_context(|| format!("opening serial device {}", cli.device))?;
    transport
        .write_line(&encode_setpoint(value))
        .context("writing setpoint frame")?;
    transport.close();

    println!("sent Z{value}");
    Ok(())
}

fn ports_command() -> anyhow::Result<()> {
    let listings = list_ports().context("enumerating serial ports")?;

    if listings.is_empty() {
        println!("no serial ports detected");
        return Ok(());
    }

    for port in listings {
        if port.description.is_empty() {
            println!("{}", port.name);
        } else {
            println!("{}  {}", port.name, port.description);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["thermotrace", "--baud", "115200"]).unwrap();
        assert_eq!(cli.baud, 115200);
    }

    #[test]
    fn test_default_values() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["thermotrace"]).unwrap();
        assert_eq!(cli.baud, DEFAULT_BAUD_RATE);
        assert_eq!(cli.interval, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(cli.device, "/dev/ttyUSB0");
    }

    #[test]
    fn test_send_subcommand_parsing() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["thermotrace", "send", "30"]).unwrap();
        match cli.command {
            Some(Commands::Send(args)) => assert_eq!(args.value, "30"),
            _ => panic!("expected send subcommand"),
        }
    }
}
