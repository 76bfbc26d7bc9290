use lxbus_frame::Frame;

use crate::cmd::port::open_bus;
use crate::cmd::{BusFlags, WriteArgs};
use crate::exit::{bus_error, frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: WriteArgs, format: OutputFormat, flags: BusFlags) -> CliResult<i32> {
    // Validate before the port is opened.
    let frame = Frame::new(args.id, args.command, args.params)
        .map_err(|err| frame_error("write failed", err))?;
    let wire = frame
        .to_bytes()
        .map_err(|err| frame_error("write failed", err))?;

    let mut bus = open_bus(&args.port, flags)?;
    bus.transmit(frame.command, &frame.params, frame.id)
        .map_err(|err| bus_error("write failed", err))?;

    print_frame(&frame, &wire, format);
    Ok(SUCCESS)
}
