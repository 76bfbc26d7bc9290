use lxbus_frame::MAX_PARAMS;

use crate::cmd::port::open_bus;
use crate::cmd::{BusFlags, ReadArgs};
use crate::exit::{bus_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat, flags: BusFlags) -> CliResult<i32> {
    if args.len > MAX_PARAMS {
        return Err(CliError::new(
            USAGE,
            format!("--len must be at most {MAX_PARAMS}"),
        ));
    }

    let mut bus = open_bus(&args.port, flags)?;
    let mut dest = [0u8; MAX_PARAMS];
    let count = bus
        .read(args.command, &mut dest[..args.len], args.id)
        .map_err(|err| bus_error("read failed", err))?;

    print_reply(args.id, args.command, &dest[..count], format);
    Ok(SUCCESS)
}
