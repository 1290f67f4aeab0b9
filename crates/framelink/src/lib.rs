//! Frame-batch IPC over local stream sockets.
//!
//! framelink moves ordered batches of opaque byte frames between two local
//! processes with a synchronous request/response discipline: the client
//! sends one message, the server answers with one message, until either
//! side hangs up with the close sentinel.
//!
//! # Crate Structure
//!
//! - [`transport`]: filesystem socket endpoint and connection
//! - [`wire`]: message framing over byte streams
//! - [`session`]: client and server sessions

/// Re-export transport types.
pub mod transport {
    pub use framelink_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use framelink_wire::*;
}

/// Re-export session types.
pub mod session {
    pub use framelink_session::*;
}
