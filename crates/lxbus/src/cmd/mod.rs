use clap::{Args, Subcommand};
use lxbus_frame::DEFAULT_BAUD_RATE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod port;
pub mod read;
pub mod selftest;
pub mod sniff;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the wire bytes of a command frame.
    Encode(EncodeArgs),
    /// Validate a frame given as hex and print its fields.
    Decode(DecodeArgs),
    /// Send a read request and print the servo reply.
    Read(ReadArgs),
    /// Send a command frame and verify its echo.
    Write(WriteArgs),
    /// Print raw bytes seen on the bus.
    Sniff(SniffArgs),
    /// Exercise the protocol engine against a simulated bus.
    Selftest(SelftestArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Bus diagnostics requested on the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusFlags {
    pub verbose: bool,
    pub trace_bytes: bool,
}

pub fn run(command: Command, format: OutputFormat, flags: BusFlags) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Read(args) => read::run(args, format, flags),
        Command::Write(args) => write::run(args, format, flags),
        Command::Sniff(args) => sniff::run(args, format),
        Command::Selftest(args) => selftest::run(args, format, flags),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial device the bus is attached to (e.g. /dev/ttyUSB0).
    #[arg(env = "LXBUS_PORT")]
    pub port: String,
    /// Bus baud rate.
    #[arg(long, env = "LXBUS_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Drive RTS high while transmitting (RS-485 adapters).
    #[arg(long)]
    pub rts_direction: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Servo id (254 = broadcast).
    #[arg(long)]
    pub id: u8,
    /// Command id.
    #[arg(long, short = 'c')]
    pub command: u8,
    /// Parameter bytes (comma-separated, at most 4).
    #[arg(long, value_delimiter = ',')]
    pub params: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; whitespace, commas and `0x` prefixes are ignored.
    #[arg(required = true)]
    pub hex: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Servo id. 254 accepts a reply from any servo; use it only with a
    /// single servo on the bus.
    #[arg(long)]
    pub id: u8,
    /// Command id.
    #[arg(long, short = 'c')]
    pub command: u8,
    /// Largest number of parameter bytes accepted in the reply.
    #[arg(long, default_value_t = 2)]
    pub len: usize,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Servo id (254 = broadcast).
    #[arg(long)]
    pub id: u8,
    /// Command id.
    #[arg(long, short = 'c')]
    pub command: u8,
    /// Parameter bytes (comma-separated, at most 4).
    #[arg(long, value_delimiter = ',')]
    pub params: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct SniffArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Exit after N bytes.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SelftestArgs {
    /// Id of the simulated servo.
    #[arg(long, default_value_t = 1)]
    pub id: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
