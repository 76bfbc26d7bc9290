use lxbus_frame::Frame;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame =
        Frame::new(args.id, args.command, args.params).map_err(|err| frame_error("encode failed", err))?;
    let wire = frame
        .to_bytes()
        .map_err(|err| frame_error("encode failed", err))?;
    print_frame(&frame, &wire, format);
    Ok(SUCCESS)
}
