//! Local socket transport for framelink.
//!
//! Provides the two OS-facing resources everything else builds on:
//! - [`Endpoint`]: a filesystem-addressed listening socket, created at bind
//!   and removed again when the endpoint is dropped.
//! - [`Connection`]: one accepted or dialed byte stream.
//!
//! This layer moves raw bytes only; message framing lives in
//! `framelink-wire`.

pub mod error;

#[cfg(unix)]
pub mod conn;
#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use conn::Connection;
#[cfg(unix)]
pub use uds::Endpoint;
