use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framelink_wire::Frame;
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
struct FrameOutput {
    index: usize,
    size: usize,
    payload: String,
}

#[derive(Serialize)]
struct ResponseOutput {
    count: usize,
    frames: Vec<FrameOutput>,
}

/// Print one response message, frame by frame in wire order.
pub fn print_response(frames: &[Frame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                count: frames.len(),
                frames: frames
                    .iter()
                    .enumerate()
                    .map(|(index, frame)| FrameOutput {
                        index,
                        size: frame.len(),
                        payload: payload_preview(frame.as_ref()),
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "SIZE", "PAYLOAD"]);
            for (index, frame) in frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    frame.len().to_string(),
                    payload_preview(frame.as_ref()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, frame) in frames.iter().enumerate() {
                println!(
                    "frame={} size={} payload={}",
                    index,
                    frame.len(),
                    payload_preview(frame.as_ref())
                );
            }
        }
        OutputFormat::Raw => {
            for frame in frames {
                print_raw(frame.as_ref());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
