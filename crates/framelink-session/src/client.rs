use std::path::Path;

use framelink_transport::{Connection, Endpoint};
use framelink_wire::{Frame, MessageReader, MessageWriter, Received, WireConfig};
use tracing::{debug, trace};

use crate::error::{Result, SessionError};

/// Synchronous request/response client over a single connection.
///
/// One exchange at a time: [`request`](Self::request) sends a message and
/// blocks until the full response arrives. Serial use is the caller's
/// contract; `&mut self` rules out interleaving from one owner but nothing
/// polices a second cloned connection.
pub struct Client {
    reader: MessageReader<Connection>,
    writer: MessageWriter<Connection>,
    closed: bool,
}

impl Client {
    /// Connect to a serving endpoint with default configuration.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::connect_with_config(path, WireConfig::default())
    }

    /// Connect with explicit wire configuration.
    pub fn connect_with_config(path: impl AsRef<Path>, config: WireConfig) -> Result<Self> {
        let conn = Endpoint::connect(path.as_ref())?;
        let reader_conn = conn.try_clone()?;

        let reader = MessageReader::over_connection(reader_conn, config.clone())?;
        let writer = MessageWriter::over_connection(conn, config)?;

        debug!(path = ?path.as_ref(), "client connected");
        Ok(Self {
            reader,
            writer,
            closed: false,
        })
    }

    /// Send one request and block until its full response arrives.
    ///
    /// An empty `frames` slice encodes as the close sentinel on the wire
    /// and ends the session; use [`close`](Self::close) when that is the
    /// intent.
    pub fn request(&mut self, frames: &[Frame]) -> Result<Vec<Frame>> {
        self.writer.send(frames)?;

        match self.reader.read_message()? {
            Received::Message(response) => Ok(response),
            Received::Close => {
                self.closed = true;
                Err(SessionError::Disconnected(
                    "server sent close instead of a response".into(),
                ))
            }
            Received::Eof => {
                self.closed = true;
                Err(SessionError::Disconnected(
                    "server went away before responding".into(),
                ))
            }
        }
    }

    /// Announce the end of the session and release the connection.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.writer.send_close()?;
        trace!("client session closed");
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if !self.closed {
            // Best effort; the server may already be gone.
            let _ = self.writer.send_close();
        }
    }
}
