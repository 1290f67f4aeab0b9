use std::io::{ErrorKind, Write};

use bytes::BytesMut;
#[cfg(unix)]
use framelink_transport::Connection;
use tracing::trace;

use crate::codec::{encode_close, encode_message, Frame, WireConfig};
#[cfg(unix)]
use crate::error::transport_to_wire_error;
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete messages to any `Write` stream.
pub struct MessageWriter<T> {
    inner: T,
    buf: BytesMut,
    config: WireConfig,
}

impl<T: Write> MessageWriter<T> {
    /// Create a new message writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Encode and send one message (blocking).
    ///
    /// An empty frame slice encodes as the close sentinel, which the peer
    /// reads as end of session. Call [`send_close`](Self::send_close) when
    /// that is the intent.
    pub fn send(&mut self, frames: &[Frame]) -> Result<()> {
        let total: u64 = frames.iter().map(|frame| frame.len() as u64).sum();
        if total > self.config.max_body_size as u64 {
            return Err(WireError::BodyTooLarge {
                size: total,
                max: self.config.max_body_size,
            });
        }

        self.buf.clear();
        encode_message(frames, &mut self.buf)?;
        self.write_buffer()?;

        trace!(frames = frames.len(), bytes = total, "message sent");
        Ok(())
    }

    /// Send the close sentinel, announcing an orderly end of session.
    pub fn send_close(&mut self) -> Result<()> {
        self.buf.clear();
        encode_close(&mut self.buf);
        self.write_buffer()?;

        trace!("close sentinel sent");
        Ok(())
    }

    fn write_buffer(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

#[cfg(unix)]
impl MessageWriter<Connection> {
    /// Create a message writer over a connection and apply its write timeout.
    pub fn over_connection(conn: Connection, config: WireConfig) -> Result<Self> {
        conn.set_write_timeout(config.write_timeout)
            .map_err(transport_to_wire_error)?;
        Ok(Self::with_config(conn, config))
    }
}
