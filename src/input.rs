//! Input assembly: received DATA payloads become a sequential body.

use bytes::Bytes;

use crate::body::BodySink;
use crate::error::{Error, Result};

/// Forwards received payloads to a body sink until end of input.
///
/// The owning stream drops the assembler once input ends or the stream
/// closes; consuming `finish`/`abort` make a second close impossible.
pub struct InputAssembler {
    sink: Box<dyn BodySink>,
}

impl std::fmt::Debug for InputAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputAssembler").finish()
    }
}

impl InputAssembler {
    pub fn new(sink: impl BodySink) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    /// Write one payload. Empty payloads never reach the sink.
    pub async fn write(&mut self, data: &Bytes) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.sink.write(data.clone()).await
    }

    /// End of input: close the sink without error.
    pub fn finish(mut self) {
        self.sink.close(None);
    }

    /// Stream closed before input ended.
    pub fn abort(mut self, error: Option<Error>) {
        self.sink.close(error);
    }
}
