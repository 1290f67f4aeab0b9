use std::io::{ErrorKind, Read};

use bytes::BytesMut;
#[cfg(unix)]
use framelink_transport::Connection;
use tracing::trace;

use crate::codec::{
    parse_length_list, split_frames, validate_lengths, Frame, Header, WireConfig, HEADER_SIZE,
    LEN_ENTRY_SIZE,
};
#[cfg(unix)]
use crate::error::transport_to_wire_error;
use crate::error::{Result, WireError};

/// Outcome of one blocking receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A complete message: its frames in wire order.
    Message(Vec<Frame>),
    /// The peer sent the close sentinel; the session ended on purpose.
    Close,
    /// The stream ended between messages without a sentinel.
    Eof,
}

impl Received {
    /// True when the session is over, whether announced or not.
    pub fn is_end(&self) -> bool {
        matches!(self, Received::Close | Received::Eof)
    }
}

/// Read exactly `n` bytes from a blocking stream.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first byte.
/// A stream that ends after some but not all bytes is a truncated message.
/// `Interrupted` reads are retried; `n == 0` succeeds without touching the
/// stream.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, n: usize) -> Result<Option<BytesMut>> {
    let mut buf = BytesMut::zeroed(n);
    let mut filled = 0usize;
    while filled < n {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(WireError::TruncatedMessage {
                    expected: n,
                    received: filled,
                })
            }
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(WireError::Io(err)),
        }
    }
    Ok(Some(buf))
}

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get whole messages.
pub struct MessageReader<T> {
    inner: T,
    config: WireConfig,
}

impl<T: Read> MessageReader<T> {
    /// Create a new message reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WireConfig::default())
    }

    /// Create a new message reader with explicit configuration.
    pub fn with_config(inner: T, config: WireConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next message (blocking).
    ///
    /// The body size cap and the length-list consistency check both run
    /// before any body byte is read, so a corrupt header never triggers a
    /// large allocation or a doomed body read.
    pub fn read_message(&mut self) -> Result<Received> {
        let header_bytes = match read_exact_or_eof(&mut self.inner, HEADER_SIZE)? {
            Some(bytes) => bytes,
            None => {
                trace!("stream ended between messages");
                return Ok(Received::Eof);
            }
        };

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&header_bytes);
        let header = Header::parse(&raw);

        if header.is_close() {
            trace!("close sentinel received");
            return Ok(Received::Close);
        }

        if u64::from(header.body_len) > self.config.max_body_size as u64 {
            return Err(WireError::BodyTooLarge {
                size: u64::from(header.body_len),
                max: self.config.max_body_size,
            });
        }

        let list_len = header.frame_count as usize * LEN_ENTRY_SIZE;
        let list =
            read_exact_or_eof(&mut self.inner, list_len)?.ok_or(WireError::TruncatedMessage {
                expected: list_len,
                received: 0,
            })?;
        let lens = parse_length_list(&list);
        validate_lengths(header, &lens)?;

        let body = read_exact_or_eof(&mut self.inner, header.body_len as usize)?.ok_or(
            WireError::TruncatedMessage {
                expected: header.body_len as usize,
                received: 0,
            },
        )?;

        trace!(frames = lens.len(), bytes = body.len(), "message received");
        Ok(Received::Message(split_frames(body.freeze(), &lens)))
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &WireConfig {
        &self.config
    }
}

#[cfg(unix)]
impl MessageReader<Connection> {
    /// Create a message reader over a connection and apply its read timeout.
    pub fn over_connection(conn: Connection, config: WireConfig) -> Result<Self> {
        conn.set_read_timeout(config.read_timeout)
            .map_err(transport_to_wire_error)?;
        Ok(Self::with_config(conn, config))
    }
}
