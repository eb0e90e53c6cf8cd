//! Frame-level inputs handed to a stream by the connection's codec.
//!
//! The codec owns framing; a stream only sees already-separated frames. What
//! remains here is the part of DATA handling that belongs to the stream:
//! stripping padding and reading END_STREAM.
//!
//! Reference: RFC 9113 Section 6.1

use std::fmt;

use bytes::{Buf, Bytes};

use crate::error::{Error, Result};

/// DATA frame flags.
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    pub const PADDED: u8 = 0x8;
}

/// Multiplexing identifier, allocated by the connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u32);

impl StreamId {
    /// Build from the 31-bit identifier; the reserved bit is cleared.
    pub fn new(id: u32) -> Self {
        StreamId(id & 0x7FFF_FFFF)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_client_initiated(self) -> bool {
        self.0 % 2 == 1
    }
}

impl From<u32> for StreamId {
    fn from(id: u32) -> Self {
        StreamId::new(id)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A received DATA frame, still carrying its padding.
#[derive(Debug, Clone)]
pub struct DataFrame {
    flags: u8,
    payload: Bytes,
}

impl DataFrame {
    /// Unpadded DATA frame.
    pub fn new(payload: impl Into<Bytes>, end_stream: bool) -> Self {
        let flags = if end_stream { flags::END_STREAM } else { 0 };
        Self {
            flags,
            payload: payload.into(),
        }
    }

    /// DATA frame exactly as it came off the wire (flags byte + raw payload).
    pub fn from_parts(flags: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            flags,
            payload: payload.into(),
        }
    }

    pub fn is_end_stream(&self) -> bool {
        self.flags & flags::END_STREAM != 0
    }

    pub fn is_padded(&self) -> bool {
        self.flags & flags::PADDED != 0
    }

    /// Length counted against flow control, padding included.
    pub fn flow_controlled_len(&self) -> usize {
        self.payload.len()
    }

    /// Extract the application data, handling the PADDED flag.
    pub fn unpack(&self) -> Result<Bytes> {
        if !self.is_padded() {
            return Ok(self.payload.clone());
        }

        let mut payload = self.payload.clone();
        if payload.is_empty() {
            return Err(Error::protocol("PADDED DATA frame with no payload"));
        }
        let pad_length = payload.get_u8() as usize;
        if pad_length > payload.len() {
            return Err(Error::protocol(format!(
                "Invalid padding length in DATA frame ({} bytes of padding, {} bytes left)",
                pad_length,
                payload.len()
            )));
        }
        payload.truncate(payload.len() - pad_length);
        Ok(payload)
    }
}
