use lxbus_transceiver::{Bus, BusConfig};
use lxbus_transport::SerialLink;

use crate::cmd::{BusFlags, PortArgs};
use crate::exit::{bus_error, CliResult};

pub type DynLink = Box<dyn SerialLink>;

/// Open the serial link and wrap it in a bus configured from the command line.
pub fn open_bus(args: &PortArgs, flags: BusFlags) -> CliResult<Bus<DynLink>> {
    let (link, direction) = open(args)?;
    let config = BusConfig {
        baud_rate: args.baud,
        verbose: flags.verbose,
        trace_bytes: flags.trace_bytes,
        ..BusConfig::default()
    };
    let mut bus = Bus::new(link, config).map_err(|err| bus_error("bus setup failed", err))?;
    bus.set_direction_line(direction);
    Ok(bus)
}

/// Open only the serial link.
pub fn open_link(args: &PortArgs) -> CliResult<DynLink> {
    open(args).map(|(link, _)| link)
}

#[cfg(feature = "serial")]
fn open(args: &PortArgs) -> CliResult<(DynLink, Option<lxbus_transceiver::DirectionLine>)> {
    use lxbus_transport::SerialPortLink;

    use crate::exit::transport_error;

    let link = SerialPortLink::open(&args.port, args.baud)
        .map_err(|err| transport_error("open failed", err))?;
    let direction = if args.rts_direction {
        let line = link
            .rts_direction()
            .map_err(|err| transport_error("direction line setup failed", err))?;
        Some(Box::new(line) as lxbus_transceiver::DirectionLine)
    } else {
        None
    };
    Ok((Box::new(link), direction))
}

#[cfg(not(feature = "serial"))]
fn open(args: &PortArgs) -> CliResult<(DynLink, Option<lxbus_transceiver::DirectionLine>)> {
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        format!(
            "cannot open {}: lxbus was built without the `serial` feature",
            args.port
        ),
    ))
}
