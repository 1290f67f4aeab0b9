use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use framelink_session::{Handler, HandlerError, Server, SessionError};
use framelink_wire::Frame;

use crate::cmd::{ServeArgs, ServeMode};
use crate::exit::{session_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: ServeArgs, _format: OutputFormat) -> CliResult<i32> {
    let handler = BuiltinHandler::from(args.mode);
    let mut server = Server::bind(&args.path, handler)
        .map_err(|err| session_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut served = 0u64;
    while running.load(Ordering::SeqCst) {
        match server.serve_next() {
            Ok(summary) => {
                tracing::info!(
                    requests = summary.requests,
                    end = ?summary.end,
                    "session ended"
                );
            }
            Err(SessionError::Transport(err)) => {
                // A failed accept after Ctrl-C is the shutdown path.
                if !running.load(Ordering::SeqCst) {
                    return Ok(SUCCESS);
                }
                return Err(transport_error("accept failed", err));
            }
            Err(err) => {
                tracing::warn!(error = %err, "connection failed, accepting next");
            }
        }

        served = served.saturating_add(1);
        if let Some(limit) = args.connections {
            if served >= limit {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)).map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

enum BuiltinHandler {
    Echo,
    Summary,
}

impl From<ServeMode> for BuiltinHandler {
    fn from(mode: ServeMode) -> Self {
        match mode {
            ServeMode::Echo => BuiltinHandler::Echo,
            ServeMode::Summary => BuiltinHandler::Summary,
        }
    }
}

impl Handler for BuiltinHandler {
    fn handle(&mut self, frames: Vec<Frame>) -> Result<Vec<Frame>, HandlerError> {
        match self {
            BuiltinHandler::Echo => Ok(frames),
            BuiltinHandler::Summary => Ok(vec![summarize(&frames)]),
        }
    }
}

fn summarize(frames: &[Frame]) -> Frame {
    let total: usize = frames.iter().map(Frame::len).sum();
    let sizes = frames
        .iter()
        .map(|frame| frame.len().to_string())
        .collect::<Vec<_>>()
        .join(",");
    Frame::new(format!("frames={} bytes={} sizes=[{}]", frames.len(), total, sizes).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_handler_returns_input() {
        let mut handler = BuiltinHandler::Echo;
        let out = handler
            .handle(vec![Frame::new(b"abc".as_ref())])
            .expect("echo should succeed");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), b"abc");
    }

    #[test]
    fn summary_handler_describes_frames() {
        let mut handler = BuiltinHandler::Summary;
        let out = handler
            .handle(vec![
                Frame::new(vec![0u8; 100]),
                Frame::new(Vec::new()),
                Frame::new(vec![0u8; 42]),
            ])
            .expect("summary should succeed");

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref(), b"frames=3 bytes=142 sizes=[100,0,42]");
    }
}
