//! One HTTP/2 stream: the calls a connection makes as frames arrive, and the
//! body plumbing behind them.
//!
//! A stream owns its header table, the input assembler for a body being
//! received, and the output scheduler for a body being sent. Header and
//! internal failures end as RST_STREAM here; only frame-level errors reach
//! the caller.

use std::sync::Arc;

use bytes::Bytes;

use crate::body::{self, Body, BodySink, Incoming};
use crate::config::StreamConfig;
use crate::connection::Connection;
use crate::error::{Error, Reason, Result};
use crate::frame::{DataFrame, StreamId};
use crate::headers::{Headers, TrailerNames};
use crate::hpack::{Field, HpackDecoder};
use crate::input::InputAssembler;
use crate::output::OutputScheduler;

/// Where the stream is in its header/trailer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    NoHeaders,
    HasHeaders,
    HasTrailers,
    Closed,
}

/// What an accepted header block means for the request/response layer.
#[derive(Debug)]
pub enum Received {
    /// The initial header block. `body` is present unless `end_stream`.
    Headers {
        end_stream: bool,
        body: Option<Incoming>,
    },
    /// Announced trailers arrived and were merged into the headers; input is complete.
    Trailers,
}

pub struct Stream {
    id: StreamId,
    config: StreamConfig,
    connection: Arc<dyn Connection>,
    state: State,
    headers: Option<Headers>,
    trailer_names: Option<TrailerNames>,
    input: Option<InputAssembler>,
    output: Option<OutputScheduler>,
    body_sent: bool,
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("receiving", &self.input.is_some())
            .field("output", &self.output)
            .finish()
    }
}

impl Stream {
    pub fn new(id: impl Into<StreamId>, connection: Arc<dyn Connection>) -> Self {
        Self::build(id.into(), connection, StreamConfig::default())
    }

    /// Create a stream with settings taken from the connection. Fails if
    /// `config` does not pass [`StreamConfig::validate`].
    pub fn with_config(
        id: impl Into<StreamId>,
        connection: Arc<dyn Connection>,
        config: StreamConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(id.into(), connection, config))
    }

    fn build(id: StreamId, connection: Arc<dyn Connection>, config: StreamConfig) -> Self {
        Self {
            id,
            config,
            connection,
            state: State::NoHeaders,
            headers: None,
            trailer_names: None,
            input: None,
            output: None,
            body_sent: false,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Received headers, including any trailers merged in.
    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    pub fn trailer_names(&self) -> Option<&TrailerNames> {
        self.trailer_names.as_ref()
    }

    /// True while a received body is still being assembled.
    pub fn is_receiving(&self) -> bool {
        self.input.is_some()
    }

    /// Decode an HPACK block with the connection's decoder, then process it
    /// as [`receive_headers`](Self::receive_headers) does.
    ///
    /// A decode failure is a connection error and is returned; the block is
    /// decoded even on a closed stream to keep the shared table in sync.
    pub async fn receive_header_block(
        &mut self,
        decoder: &mut HpackDecoder,
        block: &[u8],
        end_stream: bool,
    ) -> Result<Option<Received>> {
        let fields = decoder.decode(block)?;
        Ok(self.receive_headers(fields, end_stream).await)
    }

    /// Process one decoded header block.
    ///
    /// Returns `None` when the block was rejected, in which case RST_STREAM
    /// with PROTOCOL_ERROR has been sent and the stream is closed, or when
    /// the stream was already closed.
    pub async fn receive_headers(
        &mut self,
        fields: impl IntoIterator<Item = Field>,
        end_stream: bool,
    ) -> Option<Received> {
        let result = match self.state {
            State::Closed => {
                tracing::debug!(stream_id = %self.id, "header block on closed stream ignored");
                return None;
            }
            State::NoHeaders => self.receive_initial_headers(fields, end_stream),
            State::HasHeaders if self.trailer_names.is_some() && end_stream => {
                self.receive_trailing_headers(fields)
            }
            _ => Err(Error::header("Unable to process headers!")),
        };

        match result {
            Ok(received) => Some(received),
            Err(error) => {
                tracing::warn!(stream_id = %self.id, error = %error, "rejecting header block");
                self.reset(error.reason()).await;
                None
            }
        }
    }

    fn receive_initial_headers(
        &mut self,
        fields: impl IntoIterator<Item = Field>,
        end_stream: bool,
    ) -> Result<Received> {
        let mut headers = Headers::new();
        for field in fields {
            if field.is_pseudo() {
                headers.add_pseudo(&field.name, field.value)?;
            } else {
                headers.add(&field.name, field.value)?;
            }
        }

        self.trailer_names = headers.trailer_names();
        self.headers = Some(headers);
        self.state = State::HasHeaders;

        let body = if end_stream {
            None
        } else {
            let (writable, incoming) = body::channel(self.config.input_buffer);
            self.input = Some(InputAssembler::new(writable));
            Some(incoming)
        };

        tracing::debug!(
            stream_id = %self.id,
            end_stream,
            trailers = self.trailer_names.is_some(),
            "headers received"
        );
        Ok(Received::Headers { end_stream, body })
    }

    fn receive_trailing_headers(&mut self, fields: impl IntoIterator<Item = Field>) -> Result<Received> {
        let (Some(headers), Some(declared)) = (self.headers.as_mut(), self.trailer_names.as_ref())
        else {
            return Err(Error::header("Unable to process headers!"));
        };
        headers.add_trailers(declared, fields)?;

        self.state = State::HasTrailers;
        if let Some(input) = self.input.take() {
            input.finish();
        }
        tracing::debug!(stream_id = %self.id, "trailers received");
        Ok(Received::Trailers)
    }

    /// Process one DATA frame and return its unpadded payload for the
    /// connection's flow-control accounting.
    ///
    /// Padding errors are returned. A failure handing the data to the body
    /// consumer resets the stream with INTERNAL_ERROR instead.
    pub async fn process_data(&mut self, frame: DataFrame) -> Result<Bytes> {
        let data = frame.unpack()?;

        if let Err(error) = self.assemble(&data, frame.is_end_stream()).await {
            if error.is_connection_error() {
                return Err(error);
            }
            tracing::error!(stream_id = %self.id, error = %error, "failed to deliver body data");
            self.reset(Reason::INTERNAL_ERROR).await;
        }

        Ok(data)
    }

    async fn assemble(&mut self, data: &Bytes, end_stream: bool) -> Result<()> {
        let Some(input) = self.input.as_mut() else {
            return Ok(());
        };
        input.write(data).await?;

        if end_stream {
            if let Some(input) = self.input.take() {
                input.finish();
            }
        }
        Ok(())
    }

    /// Deliver the rest of the received body to `sink` instead of the
    /// [`Incoming`] handed out with the headers; that channel ends without
    /// further data.
    pub fn set_input_sink(&mut self, sink: impl BodySink) -> Result<()> {
        let Some(previous) = self.input.take() else {
            return Err(Error::internal(format!(
                "stream {} is not receiving a body",
                self.id
            )));
        };
        previous.finish();
        self.input = Some(InputAssembler::new(sink));
        Ok(())
    }

    /// Start sending `body`. The body is drained by a task paced by the
    /// connection's flow-control window, ending with END_STREAM.
    ///
    /// Must be called from within a Tokio runtime, at most once per stream.
    pub fn send_body(&mut self, body: impl Body) -> Result<()> {
        if self.body_sent {
            return Err(Error::internal(format!(
                "body already sent on stream {}",
                self.id
            )));
        }
        if self.is_closed() {
            return Err(Error::Reset(Reason::STREAM_CLOSED));
        }

        self.body_sent = true;
        self.output = Some(OutputScheduler::spawn(
            self.id,
            Box::new(body),
            self.connection.clone(),
            self.config.max_frame_size,
        ));
        Ok(())
    }

    /// The stream's send window changed; `size` is the new window.
    pub fn window_updated(&mut self, size: u32) {
        if self.output.as_ref().is_some_and(OutputScheduler::is_finished) {
            self.output = None;
        }
        if let Some(output) = &self.output {
            output.window_updated(size);
        }
    }

    /// Close the stream. The body being received and the body being sent
    /// are both closed with `error`. Later calls do nothing.
    pub async fn close(&mut self, error: Option<Error>) {
        if self.state == State::Closed {
            return;
        }
        self.state = State::Closed;
        tracing::debug!(stream_id = %self.id, error = ?error, "stream closed");

        if let Some(input) = self.input.take() {
            input.abort(error.clone());
        }
        if let Some(mut output) = self.output.take() {
            output.close(error).await;
        }
    }

    /// Send RST_STREAM and close; nothing else goes on the wire afterwards.
    async fn reset(&mut self, reason: Reason) {
        tracing::debug!(stream_id = %self.id, %reason, "sending RST_STREAM");
        self.connection.send_reset(self.id, reason);
        self.close(Some(Error::Reset(reason))).await;
    }
}
