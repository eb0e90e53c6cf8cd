//! Outbound contract: what a stream needs from the connection that carries it.

use bytes::Bytes;

use crate::error::Reason;
use crate::frame::StreamId;

/// Calls a stream makes into its connection.
///
/// The connection owns framing and flow-control accounting. Sends are
/// fire-and-forget from the stream's point of view: the connection queues
/// them, charges the windows, and reports replenishment back through
/// [`Stream::window_updated`](crate::Stream::window_updated).
pub trait Connection: Send + Sync + 'static {
    /// Bytes `stream_id` may send right now, taking both the stream and the
    /// connection window into account. May be zero or negative.
    fn available_window(&self, stream_id: StreamId) -> i32;

    /// Emit one DATA frame. An empty `data` with `end_stream` set closes the
    /// sending side.
    fn send_data(&self, stream_id: StreamId, data: Bytes, end_stream: bool);

    /// Emit RST_STREAM.
    fn send_reset(&self, stream_id: StreamId, reason: Reason);
}
