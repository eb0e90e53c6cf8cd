//! Error types and HTTP/2 wire error codes.
//!
//! Stream-level failures (`Header`, `Internal`) are recovered at the
//! [`Stream`](crate::Stream) boundary and turned into RST_STREAM. Frame-level
//! failures (`Protocol`, `Compression`) mean the peer broke the framing
//! contract and are handed back to the connection layer unchanged.

use std::fmt;
use std::io;
use std::sync::Arc;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP/2 error code carried by RST_STREAM and GOAWAY (RFC 9113 Section 7).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reason(u32);

impl Reason {
    pub const NO_ERROR: Reason = Reason(0x0);
    pub const PROTOCOL_ERROR: Reason = Reason(0x1);
    pub const INTERNAL_ERROR: Reason = Reason(0x2);
    pub const FLOW_CONTROL_ERROR: Reason = Reason(0x3);
    pub const SETTINGS_TIMEOUT: Reason = Reason(0x4);
    pub const STREAM_CLOSED: Reason = Reason(0x5);
    pub const FRAME_SIZE_ERROR: Reason = Reason(0x6);
    pub const REFUSED_STREAM: Reason = Reason(0x7);
    pub const CANCEL: Reason = Reason(0x8);
    pub const COMPRESSION_ERROR: Reason = Reason(0x9);
    pub const CONNECT_ERROR: Reason = Reason(0xa);
    pub const ENHANCE_YOUR_CALM: Reason = Reason(0xb);
    pub const INADEQUATE_SECURITY: Reason = Reason(0xc);
    pub const HTTP_1_1_REQUIRED: Reason = Reason(0xd);

    /// The raw 32-bit code as it appears on the wire.
    pub fn code(self) -> u32 {
        self.0
    }

    fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0x0 => "NO_ERROR",
            0x1 => "PROTOCOL_ERROR",
            0x2 => "INTERNAL_ERROR",
            0x3 => "FLOW_CONTROL_ERROR",
            0x4 => "SETTINGS_TIMEOUT",
            0x5 => "STREAM_CLOSED",
            0x6 => "FRAME_SIZE_ERROR",
            0x7 => "REFUSED_STREAM",
            0x8 => "CANCEL",
            0x9 => "COMPRESSION_ERROR",
            0xa => "CONNECT_ERROR",
            0xb => "ENHANCE_YOUR_CALM",
            0xc => "INADEQUATE_SECURITY",
            0xd => "HTTP_1_1_REQUIRED",
            _ => return None,
        })
    }
}

impl From<u32> for Reason {
    fn from(code: u32) -> Self {
        Reason(code)
    }
}

impl From<Reason> for u32 {
    fn from(reason: Reason) -> Self {
        reason.0
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown error code {:#x}", self.0),
        }
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Reason({})", name),
            None => write!(f, "Reason({:#x})", self.0),
        }
    }
}

/// Errors produced while driving a single stream.
///
/// Cloneable so one close reason can be handed to both body directions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Malformed or out-of-protocol header/trailer field.
    #[error("header error ({reason}): {message}")]
    Header { reason: Reason, message: String },

    /// Frame-level violation detected while unpacking a frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// HPACK header block could not be decoded.
    #[error("compression error: {0}")]
    Compression(String),

    /// Unanticipated failure while moving body data.
    #[error("internal error: {0}")]
    Internal(String),

    /// Stream was reset, by the peer or locally.
    #[error("stream reset: {0}")]
    Reset(Reason),

    /// The underlying connection went away without a clean shutdown.
    #[error("connection lost")]
    ConnectionLost,

    /// IO error from a body producer or consumer.
    #[error("IO error: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl Error {
    /// Create a header validation error carrying PROTOCOL_ERROR.
    pub fn header(message: impl Into<String>) -> Self {
        Self::Header {
            reason: Reason::PROTOCOL_ERROR,
            message: message.into(),
        }
    }

    /// Create a frame-level protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wire code used when this error terminates a stream or connection.
    pub fn reason(&self) -> Reason {
        match self {
            Error::Header { reason, .. } => *reason,
            Error::Protocol(_) => Reason::PROTOCOL_ERROR,
            Error::Compression(_) => Reason::COMPRESSION_ERROR,
            Error::Reset(reason) => *reason,
            Error::Internal(_) | Error::ConnectionLost | Error::Io(_) => Reason::INTERNAL_ERROR,
        }
    }

    /// True for errors that must propagate to the connection layer instead
    /// of being absorbed by a stream reset.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::Compression(_))
    }

    /// True when the stream can no longer put anything on the wire: it was
    /// already reset, or the connection is gone.
    pub fn ends_wire_activity(&self) -> bool {
        matches!(self, Error::Reset(_) | Error::ConnectionLost)
    }
}
