//! Output scheduling: drain a body onto the wire under flow control.
//!
//! One task per sending stream pulls chunks from the body and emits DATA
//! frames no larger than the space the connection reports. A chunk that does
//! not fit is split; the tail is held back as the single pending remainder
//! and goes out first once the peer opens the window again. The task ends
//! the stream exactly once: END_STREAM on the last DATA frame when the body
//! says it is done, an empty END_STREAM frame otherwise, or RST_STREAM if
//! the body fails.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;

use crate::body::Body;
use crate::connection::Connection;
use crate::error::{Error, Reason, Result};
use crate::frame::StreamId;

/// Handle to a running output task. Owned by the stream.
pub struct OutputScheduler {
    stream_id: StreamId,
    window_updated: Arc<Notify>,
    stop: Option<oneshot::Sender<Option<Error>>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for OutputScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputScheduler")
            .field("stream_id", &self.stream_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl OutputScheduler {
    /// Start sending `body`. Must be called from within a Tokio runtime.
    ///
    /// A `max_frame_size` of zero is treated as one byte per frame.
    pub fn spawn(
        stream_id: StreamId,
        body: Box<dyn Body>,
        connection: Arc<dyn Connection>,
        max_frame_size: u32,
    ) -> Self {
        let window_updated = Arc::new(Notify::new());
        let (stop_tx, stop_rx) = oneshot::channel();

        let pump = Pump {
            stream_id,
            body: Some(body),
            remainder: None,
            connection,
            window_updated: window_updated.clone(),
            max_frame_size: max_frame_size.clamp(1, i32::MAX as u32) as i32,
            sent: 0,
            ended: false,
        };
        tracing::debug!(stream_id = %stream_id, "output task started");
        let task = tokio::spawn(pump.run(stop_rx));

        Self {
            stream_id,
            window_updated,
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// The peer granted more window; `size` is the stream's new window.
    ///
    /// Wakes the task if it is blocked on flow control. With no waiter this
    /// has no effect: the next send re-reads the window from the connection.
    pub fn window_updated(&self, size: u32) {
        tracing::trace!(stream_id = %self.stream_id, size, "window updated");
        self.window_updated.notify_waiters();
    }

    /// True once the task has ended, by exhausting the body or by close.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop sending. The body is closed with `error`, any held remainder is
    /// discarded, and the task has exited when this returns. Only the first
    /// call has an effect.
    pub async fn close(&mut self, error: Option<Error>) {
        let Some(stop) = self.stop.take() else {
            return;
        };
        // Fails only when the task already finished on its own.
        let _ = stop.send(error);

        if let Some(task) = self.task.take() {
            if let Err(join_error) = task.await {
                if join_error.is_panic() {
                    tracing::error!(stream_id = %self.stream_id, "output task panicked");
                }
            }
        }
    }
}

/// Dropping the handle without [`close`](OutputScheduler::close) is treated
/// as connection teardown: the body is closed with
/// [`Error::ConnectionLost`] and nothing more is sent.
impl Drop for OutputScheduler {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(Some(Error::ConnectionLost));
        }
    }
}

enum Outcome {
    Drained(Result<()>),
    Stopped(Option<Error>),
}

/// State owned by the output task.
struct Pump {
    stream_id: StreamId,
    body: Option<Box<dyn Body>>,
    remainder: Option<Bytes>,
    connection: Arc<dyn Connection>,
    window_updated: Arc<Notify>,
    max_frame_size: i32,
    sent: usize,
    /// END_STREAM already went out on a DATA frame.
    ended: bool,
}

impl Pump {
    async fn run(mut self, mut stop: oneshot::Receiver<Option<Error>>) {
        let outcome = tokio::select! {
            biased;
            stopped = &mut stop => Outcome::Stopped(stopped.ok().flatten()),
            result = self.passthrough() => Outcome::Drained(result),
        };

        self.remainder = None;
        match outcome {
            Outcome::Drained(Ok(())) => {
                self.close_body(None);
                self.end_stream();
            }
            Outcome::Drained(Err(error)) => {
                tracing::error!(stream_id = %self.stream_id, error = %error, "body failed while sending");
                self.close_body(Some(error));
                self.connection
                    .send_reset(self.stream_id, Reason::INTERNAL_ERROR);
            }
            Outcome::Stopped(error) => {
                tracing::debug!(stream_id = %self.stream_id, sent = self.sent, "output task cancelled");
                let on_wire = error.as_ref().map_or(true, |e| !e.ends_wire_activity());
                self.close_body(error);
                if on_wire {
                    self.end_stream();
                }
            }
        }
    }

    async fn passthrough(&mut self) -> Result<()> {
        while !self.ended {
            let Some(chunk) = self.read().await? else {
                break;
            };
            if chunk.is_empty() {
                continue;
            }
            let maximum_size = wait_for_window(
                self.connection.as_ref(),
                &self.window_updated,
                self.stream_id,
                self.max_frame_size,
            )
            .await;
            self.send_data(chunk, maximum_size);
        }
        Ok(())
    }

    /// Held remainder first, then the body.
    async fn read(&mut self) -> Result<Option<Bytes>> {
        if let Some(remainder) = self.remainder.take() {
            return Ok(Some(remainder));
        }
        match self.body.as_mut() {
            Some(body) => body.read().await,
            None => Ok(None),
        }
    }

    /// Send up to `maximum_size` bytes of `chunk`; hold back the rest.
    fn send_data(&mut self, mut chunk: Bytes, maximum_size: usize) {
        if chunk.len() > maximum_size {
            self.remainder = Some(chunk.split_off(maximum_size));
        }
        let end_stream =
            self.remainder.is_none() && self.body.as_ref().is_some_and(|b| b.is_end_stream());

        self.sent += chunk.len();
        self.connection.send_data(self.stream_id, chunk, end_stream);
        if end_stream {
            self.ended = true;
            tracing::debug!(stream_id = %self.stream_id, sent = self.sent, "output finished");
        }
    }

    fn end_stream(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        tracing::debug!(stream_id = %self.stream_id, sent = self.sent, "output finished");
        self.connection.send_data(self.stream_id, Bytes::new(), true);
    }

    fn close_body(&mut self, error: Option<Error>) {
        if let Some(mut body) = self.body.take() {
            body.close(error);
        }
    }
}

/// Block until the connection reports room to send, then return how many
/// bytes fit in one frame.
async fn wait_for_window(
    connection: &dyn Connection,
    window_updated: &Notify,
    stream_id: StreamId,
    max_frame_size: i32,
) -> usize {
    loop {
        // Registered before the window is read so an update in between still wakes us.
        let notified = window_updated.notified();
        let available = connection.available_window(stream_id).min(max_frame_size);
        if available > 0 {
            return available as usize;
        }
        tracing::trace!(stream_id = %stream_id, available, "waiting for window update");
        notified.await;
    }
}
