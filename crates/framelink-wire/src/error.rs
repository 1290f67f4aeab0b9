/// Errors that can occur while framing messages over a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The peer closed the stream in the middle of a message.
    #[error("truncated message (stream ended after {received} of {expected} bytes)")]
    TruncatedMessage { expected: usize, received: usize },

    /// The recorded per-frame lengths do not add up to the declared body
    /// length. The framing is corrupt and the connection cannot be
    /// resynchronized.
    #[error("corrupt framing: length list sums to {sum}, header declares {declared}")]
    LengthMismatch { declared: u32, sum: u64 },

    /// The declared or computed body size exceeds the allowed maximum.
    #[error("message body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: u64, max: usize },

    /// A single frame exceeds the wire format's 32-bit length field.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// More frames than the wire format's 16-bit count field can carry.
    #[error("too many frames in one message ({count}, max {max})")]
    TooManyFrames { count: usize, max: usize },

    /// An I/O error occurred while reading or writing a message.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;

#[cfg(unix)]
pub(crate) fn transport_to_wire_error(err: framelink_transport::TransportError) -> WireError {
    match err {
        framelink_transport::TransportError::Io(io)
        | framelink_transport::TransportError::Accept(io) => WireError::Io(io),
        framelink_transport::TransportError::Bind { source, .. }
        | framelink_transport::TransportError::Connect { source, .. }
        | framelink_transport::TransportError::EndpointConflict { source, .. } => {
            WireError::Io(source)
        }
        other => WireError::Io(std::io::Error::other(other.to_string())),
    }
}
