use std::path::Path;

use framelink_transport::Endpoint;
use framelink_wire::{MessageReader, MessageWriter, Received, WireConfig};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::handler::{Handler, HandlerError};

/// Policy for a connection whose handler call failed.
///
/// Both choices keep the framing intact and never leave the peer blocked
/// on a response that will not come.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnHandlerError {
    /// Send the close sentinel, then drop the connection.
    #[default]
    SendClose,
    /// Drop the connection without a sentinel.
    Disconnect,
}

/// Server behavior configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Wire settings applied to every accepted connection.
    pub wire: WireConfig,
    /// What to do with a connection whose handler call failed.
    pub on_handler_error: OnHandlerError,
}

/// Why a served session ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The client announced the end with the close sentinel.
    CloseSentinel,
    /// The client went away without a sentinel.
    Disconnected,
    /// The handler failed; the connection was ended per policy.
    HandlerError(HandlerError),
}

/// Summary of one served connection.
#[derive(Debug)]
pub struct Served {
    /// Requests answered before the session ended.
    pub requests: u64,
    /// How the session ended.
    pub end: SessionEnd,
}

/// Accepts one connection at a time and runs the receive, handle, respond
/// loop over it.
///
/// Dropping the server drops the endpoint, which removes the socket
/// artifact on every exit path.
pub struct Server<H> {
    endpoint: Endpoint,
    handler: H,
    config: ServerConfig,
}

impl<H: Handler> Server<H> {
    /// Bind the endpoint and prepare to serve with `handler`.
    ///
    /// A stale socket left by a dead server is removed first; a foreign
    /// file at the path is a fatal `EndpointConflict`.
    pub fn bind(path: impl AsRef<Path>, handler: H) -> Result<Self> {
        Self::bind_with_config(path, handler, ServerConfig::default())
    }

    /// Bind with explicit configuration.
    pub fn bind_with_config(
        path: impl AsRef<Path>,
        handler: H,
        config: ServerConfig,
    ) -> Result<Self> {
        let endpoint = Endpoint::bind(path)?;
        info!(path = ?endpoint.path(), "server listening");
        Ok(Self {
            endpoint,
            handler,
            config,
        })
    }

    /// Bound endpoint path.
    pub fn path(&self) -> &Path {
        self.endpoint.path()
    }

    /// Current server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept the next connection and serve it to completion.
    ///
    /// Returns how the session ended and how many requests it answered.
    /// Wire failures on the connection surface as `Err`; the endpoint
    /// stays bound either way, so the caller can accept again.
    pub fn serve_next(&mut self) -> Result<Served> {
        let conn = self.endpoint.accept()?;
        debug!(peer = ?conn, "connection accepted");

        let reader_conn = conn.try_clone()?;
        let mut reader = MessageReader::over_connection(reader_conn, self.config.wire.clone())?;
        let mut writer = MessageWriter::over_connection(conn, self.config.wire.clone())?;

        let mut requests = 0u64;
        loop {
            let frames = match reader.read_message()? {
                Received::Message(frames) => frames,
                Received::Close => {
                    debug!(requests, "client closed session");
                    return Ok(Served {
                        requests,
                        end: SessionEnd::CloseSentinel,
                    });
                }
                Received::Eof => {
                    debug!(requests, "client disconnected without close");
                    return Ok(Served {
                        requests,
                        end: SessionEnd::Disconnected,
                    });
                }
            };

            match self.handler.handle(frames) {
                Ok(response) => {
                    writer.send(&response)?;
                    requests += 1;
                }
                Err(err) => {
                    warn!(error = %err, "handler failed, ending connection");
                    if self.config.on_handler_error == OnHandlerError::SendClose {
                        if let Err(close_err) = writer.send_close() {
                            warn!(
                                error = %close_err,
                                "close after handler failure did not reach peer"
                            );
                        }
                    }
                    return Ok(Served {
                        requests,
                        end: SessionEnd::HandlerError(err),
                    });
                }
            }
        }
    }

    /// Serve connections until accepting fails.
    ///
    /// Wire failures on one connection are logged and survived; the next
    /// client is accepted with clean state. Transport failures end the
    /// loop because the endpoint itself is gone.
    pub fn serve_forever(&mut self) -> Result<()> {
        loop {
            match self.serve_next() {
                Ok(served) => {
                    debug!(requests = served.requests, end = ?served.end, "session ended");
                }
                Err(SessionError::Transport(err)) => return Err(SessionError::Transport(err)),
                Err(err) => {
                    warn!(error = %err, "connection failed, accepting next");
                }
            }
        }
    }
}

impl<H> std::fmt::Debug for Server<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("path", &self.endpoint.path())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
