/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] framelink_transport::TransportError),

    /// Wire-level error.
    #[error("wire error: {0}")]
    Wire(#[from] framelink_wire::WireError),

    /// The peer ended the session while a response was still owed.
    #[error("peer disconnected: {0}")]
    Disconnected(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
