use bytes::BytesMut;
use lxbus_frame::{decode_frame, Frame, BROADCAST_ID};
use lxbus_transceiver::{Bus, BusConfig, BusError, ErrorKind};
use lxbus_transport::sim::{Echo, SimClock, SimWire};
use tracing::info;

use crate::cmd::{BusFlags, SelftestArgs};
use crate::exit::{bus_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{hex, print_checks, CheckOutput, OutputFormat};

const POS_READ: u8 = 28;
const MOVE_TIME_WRITE: u8 = 1;
const SIM_POSITION: [u8; 2] = [0xF4, 0x01];
const REFERENCE_FRAME: [u8; 6] = [0x55, 0x55, 0x01, 0x03, 0x1C, 0xDF];

type SimBus = Bus<SimWire, SimClock>;
type CheckResult = Result<String, String>;

pub fn run(args: SelftestArgs, format: OutputFormat, flags: BusFlags) -> CliResult<i32> {
    if args.id == BROADCAST_ID {
        return Err(CliError::new(
            USAGE,
            format!("--id {BROADCAST_ID} is the broadcast id, pick a servo id"),
        ));
    }

    let checks = run_checks(args.id, flags)?;
    let failed = checks.iter().filter(|check| !check.passed).count();
    info!(total = checks.len(), failed, "selftest finished");
    print_checks(&checks, format);

    Ok(if failed == 0 { SUCCESS } else { FAILURE })
}

fn run_checks(servo_id: u8, flags: BusFlags) -> CliResult<Vec<CheckOutput>> {
    let mut bus = sim_bus(servo_id, flags)?;

    let checks = vec![
        check("encode reference frame", encode_reference()),
        check("transmit echo", transmit_echo(&mut bus, servo_id)),
        check("read reply", read_reply(&mut bus, servo_id)),
        check("wildcard read", wildcard_read(&mut bus)),
        check("stale bytes drained", stale_bytes_drained(&mut bus, servo_id)),
        check("collision detected", collision_detected(&mut bus, servo_id)),
        check("silent servo times out", silent_servo(&mut bus, servo_id)),
        check("oversized reply rejected", oversized_reply(&mut bus, servo_id)),
    ];
    Ok(checks)
}

fn check(name: &'static str, result: CheckResult) -> CheckOutput {
    match result {
        Ok(detail) => CheckOutput {
            name,
            passed: true,
            detail,
        },
        Err(detail) => CheckOutput {
            name,
            passed: false,
            detail,
        },
    }
}

/// A bus whose only device answers zero-parameter requests addressed to
/// `servo_id` (or broadcast) with a fixed position.
fn sim_bus(servo_id: u8, flags: BusFlags) -> CliResult<SimBus> {
    let mut wire = SimWire::new();
    wire.set_responder(move |written| {
        let mut src = BytesMut::from(written);
        let request = decode_frame(&mut src).ok().flatten()?;
        if !request.params.is_empty() {
            return None;
        }
        if request.id != servo_id && request.id != BROADCAST_ID {
            return None;
        }
        let reply = Frame::new(servo_id, request.command, SIM_POSITION.to_vec()).ok()?;
        reply.to_bytes().ok().map(|bytes| bytes.to_vec())
    });

    let config = BusConfig {
        verbose: flags.verbose,
        trace_bytes: flags.trace_bytes,
        ..BusConfig::default()
    };
    Bus::with_clock(wire, SimClock::new(), config)
        .map_err(|err| bus_error("simulated bus setup failed", err))
}

fn encode_reference() -> CheckResult {
    let frame = Frame::new(1, POS_READ, Vec::new()).map_err(|err| err.to_string())?;
    let wire = frame.to_bytes().map_err(|err| err.to_string())?;
    if wire.as_ref() == REFERENCE_FRAME {
        Ok(hex(&wire))
    } else {
        Err(format!("got {}, want {}", hex(&wire), hex(&REFERENCE_FRAME)))
    }
}

fn transmit_echo(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    bus.transmit(MOVE_TIME_WRITE, &[0xF4, 0x01, 0xE8, 0x03], servo_id)
        .map_err(|err| err.to_string())?;
    let written = bus.link().last_write().unwrap_or_default();
    Ok(format!("{} bytes verified", written.len()))
}

fn read_reply(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    let mut dest = [0u8; 2];
    let count = bus
        .read(POS_READ, &mut dest, servo_id)
        .map_err(|err| err.to_string())?;
    expect_position(&dest[..count])
}

fn wildcard_read(bus: &mut SimBus) -> CheckResult {
    let mut dest = [0u8; 2];
    let count = bus
        .read(POS_READ, &mut dest, BROADCAST_ID)
        .map_err(|err| err.to_string())?;
    expect_position(&dest[..count])
}

fn stale_bytes_drained(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    let stale = [0x55, 0x12, 0x34];
    bus.link_mut().inject(&stale);
    let before = bus.link().bytes_read();

    let mut dest = [0u8; 2];
    let count = bus
        .read(POS_READ, &mut dest, servo_id)
        .map_err(|err| err.to_string())?;
    expect_position(&dest[..count])?;

    let consumed = bus.link().bytes_read() - before;
    Ok(format!("{} stale bytes discarded, {consumed} read", stale.len()))
}

fn collision_detected(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    bus.link_mut().set_echo(Echo::Corrupt {
        index: 4,
        mask: 0x40,
    });
    let result = bus.transmit(MOVE_TIME_WRITE, &[0xF4, 0x01, 0xE8, 0x03], servo_id);
    bus.link_mut().set_echo(Echo::Faithful);

    match result {
        Err(err) if err.kind() == ErrorKind::BusConflict => Ok(err.to_string()),
        Err(err) => Err(format!("wrong error: {err}")),
        Ok(()) => Err("corrupted echo was accepted".to_string()),
    }
}

fn silent_servo(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    let absent = if servo_id == 0 { 1 } else { 0 };
    let mut dest = [0u8; 2];
    match bus.read(POS_READ, &mut dest, absent) {
        Err(err) if err.kind() == ErrorKind::Timeout => Ok(err.to_string()),
        Err(err) => Err(format!("wrong error: {err}")),
        Ok(count) => Err(format!("unexpected reply: {}", hex(&dest[..count]))),
    }
}

fn oversized_reply(bus: &mut SimBus, servo_id: u8) -> CheckResult {
    let mut dest = [0u8; 1];
    match bus.read(POS_READ, &mut dest, servo_id) {
        Err(err @ BusError::CapacityExceeded { .. }) => {
            if dest == [0] {
                Ok(err.to_string())
            } else {
                Err("destination was written".to_string())
            }
        }
        Err(err) => Err(format!("wrong error: {err}")),
        Ok(count) => Err(format!("unexpected reply: {}", hex(&dest[..count]))),
    }
}

fn expect_position(params: &[u8]) -> CheckResult {
    if params == SIM_POSITION {
        Ok(format!("params {}", hex(params)))
    } else {
        Err(format!(
            "got {}, want {}",
            hex(params),
            hex(&SIM_POSITION)
        ))
    }
}
