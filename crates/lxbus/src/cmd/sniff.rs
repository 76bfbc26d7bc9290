use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lxbus_transport::{Clock, SerialLink, SystemClock, TransportError};
use serde::Serialize;

use crate::cmd::port::open_link;
use crate::cmd::SniffArgs;
use crate::exit::{transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_raw, OutputFormat};

const IDLE_POLL: Duration = Duration::from_micros(500);

#[derive(Serialize)]
struct ByteOutput {
    index: usize,
    elapsed_us: u128,
    byte: u8,
}

pub fn run(args: SniffArgs, format: OutputFormat) -> CliResult<i32> {
    let mut link = open_link(&args.port)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let clock = SystemClock::new();
    capture(&mut link, &clock, &running, args.count, |index, elapsed, byte| {
        print_byte(index, elapsed, byte, format)
    })
    .map_err(|err| transport_error("sniff failed", err))?;

    Ok(SUCCESS)
}

/// Hand every byte seen on `link` to `on_byte` until `running` clears or
/// `count` bytes were seen. Returns the number of bytes seen.
fn capture<L, C, F>(
    link: &mut L,
    clock: &C,
    running: &AtomicBool,
    count: Option<usize>,
    mut on_byte: F,
) -> Result<usize, TransportError>
where
    L: SerialLink + ?Sized,
    C: Clock,
    F: FnMut(usize, Duration, u8),
{
    let start = clock.now();
    let mut seen = 0usize;
    while running.load(Ordering::SeqCst) {
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
        if link.available()? > 0 {
            if let Some(byte) = link.read_byte()? {
                on_byte(seen, clock.now().saturating_sub(start), byte);
                seen += 1;
                continue;
            }
        }
        clock.delay(IDLE_POLL);
    }
    Ok(seen)
}

fn print_byte(index: usize, elapsed: Duration, byte: u8, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ByteOutput {
                index,
                elapsed_us: elapsed.as_micros(),
                byte,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            let marker = if byte == lxbus_frame::HEADER_BYTE {
                " <hdr?>"
            } else {
                ""
            };
            println!(
                "{index:>6}  +{:>10}us  0x{byte:02x}{marker}",
                elapsed.as_micros()
            );
        }
        OutputFormat::Raw => print_raw(&[byte]),
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use lxbus_transport::sim::{SimClock, SimWire};

    use super::*;

    #[test]
    fn capture_stops_after_count() {
        let mut wire = SimWire::new();
        wire.inject(&[0x55, 0x55, 0x01, 0x03]);
        let clock = SimClock::new();
        let running = AtomicBool::new(true);

        let mut bytes = Vec::new();
        let seen = capture(&mut wire, &clock, &running, Some(3), |index, _, byte| {
            bytes.push((index, byte))
        })
        .unwrap();

        assert_eq!(seen, 3);
        assert_eq!(bytes, vec![(0, 0x55), (1, 0x55), (2, 0x01)]);
        assert_eq!(wire.pending(), 1);
    }

    #[test]
    fn capture_stops_when_cleared() {
        let mut wire = SimWire::new();
        wire.inject(&[0x01]);
        let clock = SimClock::new();
        let running = AtomicBool::new(false);

        let seen = capture(&mut wire, &clock, &running, None, |_, _, _| {}).unwrap();

        assert_eq!(seen, 0);
        assert_eq!(wire.pending(), 1);
    }

    #[test]
    fn capture_timestamps_follow_clock() {
        let mut wire = SimWire::new();
        wire.inject(&[0xAA]);
        let clock = SimClock::new();
        clock.advance(Duration::from_millis(5));
        let running = AtomicBool::new(true);

        let mut stamps = Vec::new();
        capture(&mut wire, &clock, &running, Some(1), |_, elapsed, _| {
            stamps.push(elapsed)
        })
        .unwrap();

        assert_eq!(stamps, vec![Duration::ZERO]);
    }
}
