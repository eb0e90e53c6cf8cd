//! Body producer and consumer contracts, plus the channel body used to hand
//! received data to the application.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// A source of body chunks, drained by the output scheduler.
#[async_trait]
pub trait Body: Send + 'static {
    /// Next chunk, or `Ok(None)` once the body is exhausted.
    async fn read(&mut self) -> Result<Option<Bytes>>;

    /// True when the next `read` is known to return `Ok(None)`. Lets the
    /// last DATA frame carry END_STREAM instead of a trailing empty frame.
    fn is_end_stream(&self) -> bool {
        false
    }

    /// Release the body. `error` is set when the exchange was aborted.
    fn close(&mut self, error: Option<Error>);
}

/// A destination for received body chunks, fed by the input assembler.
#[async_trait]
pub trait BodySink: Send + 'static {
    /// Deliver one chunk. May suspend while the consumer is behind.
    async fn write(&mut self, chunk: Bytes) -> Result<()>;

    /// Finish the body. `error` is set when the exchange was aborted.
    fn close(&mut self, error: Option<Error>);
}

type ErrorSlot = Arc<Mutex<Option<Error>>>;

/// Open a bounded body channel holding up to `capacity` chunks.
pub fn channel(capacity: usize) -> (Writable, Incoming) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let error: ErrorSlot = Arc::default();
    (
        Writable {
            tx: Some(tx),
            error: error.clone(),
        },
        Incoming { rx, error },
    )
}

/// Writing half of a body channel.
#[derive(Debug)]
pub struct Writable {
    tx: Option<mpsc::Sender<Bytes>>,
    error: ErrorSlot,
}

impl Writable {
    /// False once closed locally or abandoned by the reader.
    pub fn is_open(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl BodySink for Writable {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        if let Some(tx) = &self.tx {
            // A reader that went away aborted the body; later data is dropped.
            if tx.send(chunk).await.is_err() {
                tracing::trace!("body reader gone, dropping chunk");
                self.tx = None;
            }
        }
        Ok(())
    }

    fn close(&mut self, error: Option<Error>) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        // The slot must be filled before the reader can observe the hang-up.
        if let Some(error) = error {
            if let Ok(mut slot) = self.error.lock() {
                slot.get_or_insert(error);
            }
        }
        drop(tx);
    }
}

/// Reading half of a body channel: the body of a received request/response.
#[derive(Debug)]
pub struct Incoming {
    rx: mpsc::Receiver<Bytes>,
    error: ErrorSlot,
}

impl Incoming {
    /// Read every remaining chunk into one buffer.
    pub async fn read_all(&mut self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.read().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

#[async_trait]
impl Body for Incoming {
    async fn read(&mut self) -> Result<Option<Bytes>> {
        match self.rx.recv().await {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                let error = self.error.lock().ok().and_then(|slot| slot.clone());
                match error {
                    Some(error) => Err(error),
                    None => Ok(None),
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.rx.is_closed()
            && self.rx.is_empty()
            && self.error.lock().map(|slot| slot.is_none()).unwrap_or(false)
    }

    fn close(&mut self, _error: Option<Error>) {
        self.rx.close();
    }
}
