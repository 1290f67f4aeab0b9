//! Message framing for framelink.
//!
//! One wire message carries an ordered sequence of opaque byte frames:
//! - A 6-byte header: body length (4B LE) and frame count (2B LE)
//! - One 4-byte little-endian length per frame
//! - The frame bytes, concatenated in order, no padding
//!
//! The zero-frame message (a bare `(0, 0)` header) is reserved as the
//! close sentinel that ends a session. No partial reads, no buffer
//! management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_close, encode_message, Frame, Header, WireConfig, DEFAULT_MAX_BODY, HEADER_SIZE,
    LEN_ENTRY_SIZE,
};
pub use error::{Result, WireError};
pub use reader::{read_exact_or_eof, MessageReader, Received};
pub use writer::MessageWriter;
