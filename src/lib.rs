//! h2-stream: the per-stream engine of an HTTP/2 implementation
//!
//! A connection decodes frames and hands each stream's share to a [`Stream`].
//! The stream validates header and trailer blocks, assembles received DATA
//! into a body, and drains a body to the wire under flow control.
//!
//! # Features
//!
//! - **Header validation**: rejects `connection`, misplaced pseudo-headers,
//!   upper-case names and undeclared trailers with RST_STREAM(PROTOCOL_ERROR)
//! - **Flow-controlled output**: one task per stream splits chunks to fit the
//!   window, holds back the remainder, and resumes on WINDOW_UPDATE
//! - **Input assembly**: DATA payloads become an [`Incoming`] body with
//!   backpressure
//! - **Error translation**: stream failures become resets; frame-level
//!   errors propagate to the connection
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use h2_stream::{Connection, DataFrame, Field, Reason, Received, Stream, StreamId};
//!
//! struct Conn;
//!
//! impl Connection for Conn {
//!     fn available_window(&self, _id: StreamId) -> i32 { 65_535 }
//!     fn send_data(&self, id: StreamId, data: Bytes, end_stream: bool) {
//!         println!("DATA on stream {}: {} bytes, end_stream={}", id, data.len(), end_stream);
//!     }
//!     fn send_reset(&self, id: StreamId, reason: Reason) {
//!         println!("RST_STREAM on stream {}: {}", id, reason);
//!     }
//! }
//!
//! # async fn run() -> h2_stream::Result<()> {
//! let mut stream = Stream::new(StreamId::new(1), Arc::new(Conn));
//!
//! let fields = vec![Field::new(":method", "POST"), Field::new(":path", "/upload")];
//! if let Some(Received::Headers { body: Some(mut body), .. }) =
//!     stream.receive_headers(fields, false).await
//! {
//!     stream.process_data(DataFrame::new(&b"hello"[..], true)).await?;
//!     assert_eq!(body.read_all().await?, Bytes::from_static(b"hello"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The stream owns its collaborators outright; the output task reaches back
//! only to the [`Connection`], never to the stream.
//!
//! It does NOT provide:
//! - Frame encoding/decoding (the connection's codec)
//! - Stream id allocation or connection-level settings negotiation
//! - HTTP/1 semantics or TLS

pub mod body;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod headers;
pub mod hpack;
pub mod input;
pub mod output;
pub mod stream;

pub use body::{channel, Body, BodySink, Incoming, Writable};
pub use config::StreamConfig;
pub use connection::Connection;
pub use error::{Error, Reason, Result};
pub use frame::{flags, DataFrame, StreamId};
pub use headers::{Headers, TrailerNames, CONNECTION, TRAILERS};
pub use hpack::{Field, HpackDecoder, HpackEncoder};
pub use input::InputAssembler;
pub use output::OutputScheduler;
pub use stream::{Received, State, Stream};
