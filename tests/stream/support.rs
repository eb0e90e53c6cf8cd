//! Shared fixtures: a recording connection and scripted bodies.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use h2_stream::{Body, BodySink, Connection, Error, Field, Reason, Result, Stream, StreamId};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Data(Bytes, bool),
    Reset(Reason),
}

pub fn data(bytes: &'static [u8], end_stream: bool) -> Sent {
    Sent::Data(Bytes::from_static(bytes), end_stream)
}

struct Wire {
    window: i32,
    sent: Vec<Sent>,
}

/// Connection double: charges the window on every DATA frame, the way a
/// real connection's accounting would, and records everything sent.
pub struct MockConnection {
    wire: Mutex<Wire>,
}

impl MockConnection {
    pub fn new(window: i32) -> Arc<Self> {
        Arc::new(Self {
            wire: Mutex::new(Wire {
                window,
                sent: Vec::new(),
            }),
        })
    }

    /// Apply a WINDOW_UPDATE increment and return the new window.
    pub fn grant(&self, increment: i32) -> u32 {
        let mut wire = self.wire.lock().unwrap();
        wire.window += increment;
        wire.window.max(0) as u32
    }

    pub fn window(&self) -> i32 {
        self.wire.lock().unwrap().window
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.wire.lock().unwrap().sent.clone()
    }

    pub fn resets(&self) -> Vec<Reason> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Reset(reason) => Some(reason),
                Sent::Data(..) => None,
            })
            .collect()
    }

    /// Concatenation of every DATA payload sent so far.
    pub fn payload(&self) -> Vec<u8> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Data(bytes, _) => Some(bytes.to_vec()),
                Sent::Reset(_) => None,
            })
            .flatten()
            .collect()
    }
}

impl Connection for MockConnection {
    fn available_window(&self, _stream_id: StreamId) -> i32 {
        self.wire.lock().unwrap().window
    }

    fn send_data(&self, _stream_id: StreamId, data: Bytes, end_stream: bool) {
        let mut wire = self.wire.lock().unwrap();
        wire.window -= data.len() as i32;
        wire.sent.push(Sent::Data(data, end_stream));
    }

    fn send_reset(&self, _stream_id: StreamId, reason: Reason) {
        self.wire.lock().unwrap().sent.push(Sent::Reset(reason));
    }
}

pub fn stream(connection: &Arc<MockConnection>) -> Stream {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("h2_stream=trace")
        .with_test_writer()
        .try_init();
    Stream::new(StreamId::new(1), connection.clone())
}

pub fn fields(pairs: &[(&str, &str)]) -> Vec<Field> {
    pairs.iter().map(|&(name, value)| Field::new(name, value)).collect()
}

pub fn request(extra: &[(&str, &str)]) -> Vec<Field> {
    let mut all = fields(&[(":method", "POST"), (":scheme", "https"), (":path", "/")]);
    all.extend(fields(extra));
    all
}

/// Every `close` call a body received, rendered as the error text.
pub type Closes = Arc<Mutex<Vec<Option<String>>>>;

/// Body that yields a fixed script, then either ends or stalls forever.
pub struct ScriptedBody {
    chunks: VecDeque<Result<Bytes>>,
    stall: bool,
    closes: Closes,
}

impl ScriptedBody {
    pub fn new(chunks: &[&'static [u8]]) -> (Self, Closes) {
        let closes = Closes::default();
        let body = Self {
            chunks: chunks.iter().map(|c| Ok(Bytes::from_static(c))).collect(),
            stall: false,
            closes: closes.clone(),
        };
        (body, closes)
    }

    /// After the script runs out, `read` never completes.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn then_fail(mut self, error: Error) -> Self {
        self.chunks.push_back(Err(error));
        self
    }
}

#[async_trait]
impl Body for ScriptedBody {
    async fn read(&mut self) -> Result<Option<Bytes>> {
        match self.chunks.pop_front() {
            Some(chunk) => chunk.map(Some),
            None if self.stall => std::future::pending().await,
            None => Ok(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.chunks.is_empty() && !self.stall
    }

    fn close(&mut self, error: Option<Error>) {
        self.closes
            .lock()
            .unwrap()
            .push(error.map(|e| e.to_string()));
    }
}

/// Sink whose writes always fail with the given error.
pub struct FailingSink {
    pub error: Error,
    pub closes: Closes,
}

#[async_trait]
impl BodySink for FailingSink {
    async fn write(&mut self, _chunk: Bytes) -> Result<()> {
        Err(self.error.clone())
    }

    fn close(&mut self, error: Option<Error>) {
        self.closes
            .lock()
            .unwrap()
            .push(error.map(|e| e.to_string()));
    }
}

/// Let spawned output tasks run until they block.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
