use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use lxbus_frame::{Frame, BROADCAST_ID};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    id: u8,
    broadcast: bool,
    command: u8,
    length: u8,
    params: &'a [u8],
    wire: String,
}

/// Print a frame together with its wire encoding.
pub fn print_frame(frame: &Frame, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                id: frame.id,
                broadcast: frame.id == BROADCAST_ID,
                command: frame.command,
                length: frame.length_byte(),
                params: frame.params.as_ref(),
                wire: hex(wire),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "COMMAND", "LENGTH", "PARAMS", "WIRE"])
                .add_row(vec![
                    id_label(frame.id),
                    frame.command.to_string(),
                    frame.length_byte().to_string(),
                    params_list(frame.params.as_ref()),
                    hex(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} command={} length={} params=[{}] wire={}",
                id_label(frame.id),
                frame.command,
                frame.length_byte(),
                params_list(frame.params.as_ref()),
                hex(wire)
            );
        }
        OutputFormat::Raw => print_raw(wire),
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    id: u8,
    command: u8,
    params: &'a [u8],
}

/// Print the parameters of a servo reply.
pub fn print_reply(id: u8, command: u8, params: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ReplyOutput {
            id,
            command,
            params,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "COMMAND", "PARAMS", "HEX"])
                .add_row(vec![
                    id_label(id),
                    command.to_string(),
                    params_list(params),
                    hex(params),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "id={} command={} params=[{}]",
                id_label(id),
                command,
                params_list(params)
            );
        }
        OutputFormat::Raw => print_raw(params),
    }
}

#[derive(Serialize)]
pub struct CheckOutput {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

pub fn print_checks(checks: &[CheckOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&checks),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHECK", "RESULT", "DETAIL"]);
            for check in checks {
                table.add_row(vec![
                    check.name.to_string(),
                    pass_label(check.passed).to_string(),
                    check.detail.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for check in checks {
                println!(
                    "{:<24} {}  {}",
                    check.name,
                    pass_label(check.passed),
                    check.detail
                );
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase, space-separated hex.
pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn id_label(id: u8) -> String {
    if id == BROADCAST_ID {
        format!("{id} (broadcast)")
    } else {
        id.to_string()
    }
}

fn params_list(params: &[u8]) -> String {
    params
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn pass_label(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_space_separated() {
        assert_eq!(hex(&[0x55, 0x55, 0x01, 0xDF]), "55 55 01 df");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn broadcast_id_is_labelled() {
        assert_eq!(id_label(BROADCAST_ID), "254 (broadcast)");
        assert_eq!(id_label(1), "1");
    }

    #[test]
    fn params_are_decimal() {
        assert_eq!(params_list(&[100, 0]), "100, 0");
    }
}
