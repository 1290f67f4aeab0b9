use std::path::Path;
use std::time::{Duration, Instant};

use framelink_transport::{Connection, Endpoint, TransportError};
use framelink_wire::{MessageWriter, WireConfig};
use serde::Serialize;

use crate::cmd::{parse_duration, ProbeArgs};
use crate::exit::{transport_error, wire_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PeerCreds {
    uid: u32,
    gid: u32,
    pid: u32,
}

#[derive(Serialize)]
struct ProbeOutput {
    path: String,
    reachable: bool,
    connect_latency_ms: f64,
    peer_credentials: Option<PeerCreds>,
}

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;

    let start = Instant::now();
    let conn = connect_with_retry(&args.path, timeout)?;
    let connect_latency_ms = (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;

    let peer_credentials = conn
        .peer_credentials()
        .map(|(uid, gid, pid)| PeerCreds { uid, gid, pid });

    // Part with a close sentinel so the server goes straight back to accepting.
    let mut writer = MessageWriter::over_connection(conn, WireConfig::default())
        .map_err(|err| wire_error("probe setup failed", err))?;
    writer
        .send_close()
        .map_err(|err| wire_error("close failed", err))?;

    let out = ProbeOutput {
        path: args.path.display().to_string(),
        reachable: true,
        connect_latency_ms,
        peer_credentials,
    };

    print_probe(&out, format);
    Ok(SUCCESS)
}

fn connect_with_retry(path: &Path, timeout: Duration) -> CliResult<Connection> {
    let start = Instant::now();
    loop {
        match Endpoint::connect(path) {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                if !is_retryable_connect_error(&err) {
                    return Err(transport_error("connect failed", err));
                }
                if start.elapsed() >= timeout {
                    return Err(CliError::new(
                        crate::exit::TIMEOUT,
                        format!("connect timed out after {timeout:?}"),
                    ));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

fn is_retryable_connect_error(err: &TransportError) -> bool {
    match err {
        TransportError::Connect { source, .. } => {
            source.kind() == std::io::ErrorKind::NotFound
                || source.kind() == std::io::ErrorKind::ConnectionRefused
        }
        _ => false,
    }
}

fn print_probe(out: &ProbeOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Endpoint Probe:");
            println!("  Path:             {}", out.path);
            println!("  Reachable:        {}", out.reachable);
            println!("  Connect latency:  {:.2}ms", out.connect_latency_ms);
            match &out.peer_credentials {
                Some(c) => println!(
                    "  Peer credentials: uid={} gid={} pid={}",
                    c.uid, c.gid, c.pid
                ),
                None => println!("  Peer credentials: unavailable"),
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect_error(kind: std::io::ErrorKind) -> TransportError {
        TransportError::Connect {
            path: "/tmp/flink-probe-test.sock".into(),
            source: std::io::Error::new(kind, "test"),
        }
    }

    #[test]
    fn absent_socket_is_retryable() {
        assert!(is_retryable_connect_error(&connect_error(
            std::io::ErrorKind::NotFound
        )));
        assert!(is_retryable_connect_error(&connect_error(
            std::io::ErrorKind::ConnectionRefused
        )));
    }

    #[test]
    fn permission_denied_is_not_retryable() {
        assert!(!is_retryable_connect_error(&connect_error(
            std::io::ErrorKind::PermissionDenied
        )));
        assert!(!is_retryable_connect_error(&TransportError::Accept(
            std::io::Error::other("test")
        )));
    }
}
