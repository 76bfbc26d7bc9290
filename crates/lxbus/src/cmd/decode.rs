use bytes::BytesMut;
use lxbus_frame::decode_frame;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = parse_hex(&args.hex.join(" "))?;
    let mut buf = BytesMut::from(wire.as_slice());

    let frame = decode_frame(&mut buf)
        .map_err(|err| frame_error("decode failed", err))?
        .ok_or_else(|| {
            CliError::new(
                DATA_INVALID,
                format!("decode failed: incomplete frame ({} bytes)", wire.len()),
            )
        })?;
    if !buf.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("decode failed: {} trailing bytes after frame", buf.len()),
        ));
    }

    print_frame(&frame, &wire, format);
    Ok(SUCCESS)
}

/// Parse hex such as `55 55 01 03 1C DF`, `0x55,0x55,...` or `555501031cdf`.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let tokens: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    let mut digits = String::new();
    for token in &tokens {
        if token.len() == 1 {
            digits.push('0');
        } else if tokens.len() > 1 && token.len() % 2 != 0 {
            return Err(CliError::new(
                USAGE,
                format!("hex group `{token}` has an odd number of digits"),
            ));
        }
        digits.push_str(token);
    }

    if digits.is_empty() {
        return Err(CliError::new(USAGE, "no frame bytes given"));
    }
    if !digits.is_ascii() {
        return Err(CliError::new(USAGE, "hex input contains non-ASCII characters"));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte: {}", &digits[i..i + 2])))
        })
        .collect()
}
