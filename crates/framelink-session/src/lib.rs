//! Client and server sessions for framelink.
//!
//! This is the "just works" layer. Bind a server with a handler, connect a
//! client, exchange framed messages until one side closes.

pub mod error;
pub mod handler;

#[cfg(unix)]
pub mod client;
#[cfg(unix)]
pub mod server;

pub use error::{Result, SessionError};
pub use handler::{handler_fn, Handler, HandlerError, HandlerFn};

#[cfg(unix)]
pub use client::Client;
#[cfg(unix)]
pub use server::{OnHandlerError, Served, Server, ServerConfig, SessionEnd};
