mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{BusFlags, Command};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "lxbus",
    version,
    about = "Talk to LX-16A style serial servo buses"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log drained bytes and rejected replies.
    #[arg(long, global = true)]
    bus_verbose: bool,

    /// Log every byte read while parsing a reply.
    #[arg(long, global = true)]
    trace_bytes: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(
        cli.log_format,
        cli.log_level.raised_for(cli.bus_verbose, cli.trace_bytes),
    );

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let flags = BusFlags {
        verbose: cli.bus_verbose,
        trace_bytes: cli.trace_bytes,
    };
    let result = cmd::run(cli.command, format, flags);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
