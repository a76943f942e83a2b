//! logrelay - run a program and relay its output to the console and syslog
//!
//! Wires together:
//! - Command line parsing
//! - Diagnostics logging (to stderr)
//! - Signal relay, output pipe and child spawn
//! - The supervisor loop, whose result becomes our exit code

mod supervisor;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::ErrorKind;
use logrelay_core::{DualSink, PipeReader, RelayError};
use logrelay_host_linux::{ChildProcess, Facility, LogDestination, OutputPipe, SignalRelay, Syslog};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::supervisor::Supervisor;

/// logrelay - copy a program's output to the console and syslog
#[derive(Parser, Debug)]
#[command(name = "logrelay", version)]
#[command(about = "Run PROGRAM, copying its stdout and stderr line by line to the console and syslog", long_about = None)]
struct Args {
    /// syslog facility: user, daemon or local0-local7
    #[arg(long, env = "LOGRELAY_FACILITY", default_value_t = Facility::User)]
    facility: Facility,

    /// How long to keep reading output after the child exits if the pipe is still open
    #[arg(long, env = "LOGRELAY_DRAIN_TIMEOUT_MS", default_value_t = 250)]
    drain_timeout_ms: u64,

    /// Diagnostics log level (RUST_LOG takes precedence)
    #[arg(long, env = "LOGRELAY_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Name the child's output is logged under (the syslog ident).
    /// May start with '-' unless it spells one of the options above.
    #[arg(value_name = "LOG_NAME", allow_hyphen_values = true)]
    log_name: String,

    /// Program to run, followed by its arguments, passed through verbatim
    #[arg(
        value_name = "PROGRAM [ARGUMENTS]",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

impl Args {
    /// Parse the command line. Help and version exit 0; anything else
    /// that fails to parse is a usage error.
    fn parse_or_usage() -> std::result::Result<Self, RelayError> {
        match Self::try_parse() {
            Ok(args) => Ok(args),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                let _ = e.print();
                std::process::exit(0);
            }
            Err(e) => Err(RelayError::usage(e.render().to_string())),
        }
    }
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // stdout carries the relayed lines, so diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<i32> {
    let destination = LogDestination::new(&args.log_name, args.facility);
    let mut sink = DualSink::new(std::io::stdout(), Syslog::open(&destination));

    // Armed before the child exists so a signal can never hit the default action
    let relay = SignalRelay::install().context("Failed to install signal relay")?;
    let pipe = OutputPipe::new().context("Failed to create output pipe")?;

    let (program, program_args) = match args.command.split_first() {
        Some(split) => split,
        None => return Err(RelayError::usage("PROGRAM is required").into()),
    };

    let child = match ChildProcess::spawn(program, program_args, &pipe) {
        Ok(child) => child,
        Err(e) => {
            let err = RelayError::from(e);
            error!(error = %err, "Spawn failed");
            sink.fault(&err.to_string());
            return Ok(err.exit_code());
        }
    };

    let receiver = pipe
        .into_receiver()
        .context("Failed to register output pipe")?;

    let mut supervisor = Supervisor::new(child, PipeReader::new(receiver), sink)
        .with_signal_relay(relay)
        .with_drain_timeout(Duration::from_millis(args.drain_timeout_ms));

    Ok(supervisor.run().await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Args::parse_or_usage() {
        Ok(args) => args,
        Err(err) => {
            print!("{}", err);
            std::process::exit(err.exit_code());
        }
    };

    init_logging(&args.log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_name = %args.log_name,
        facility = %args.facility,
        "logrelay starting"
    );

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Supervisor failed");
            println!("{:#}", e);
            1
        }
    };

    std::process::exit(code);
}
