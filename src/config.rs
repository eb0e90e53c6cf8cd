//! Per-stream settings taken from the connection.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default SETTINGS_MAX_FRAME_SIZE (RFC 9113 Section 6.5.2).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Largest SETTINGS_MAX_FRAME_SIZE a peer may advertise.
pub const MAX_MAX_FRAME_SIZE: u32 = 16_777_215;

/// Default number of received chunks buffered ahead of the application.
pub const DEFAULT_INPUT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Peer's SETTINGS_MAX_FRAME_SIZE; no DATA frame sent is larger.
    pub max_frame_size: u32,
    /// Capacity, in chunks, of the channel carrying received body data.
    pub input_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            input_buffer: DEFAULT_INPUT_BUFFER,
        }
    }
}

impl StreamConfig {
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn with_input_buffer(mut self, input_buffer: usize) -> Self {
        self.input_buffer = input_buffer;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(DEFAULT_MAX_FRAME_SIZE..=MAX_MAX_FRAME_SIZE).contains(&self.max_frame_size) {
            return Err(Error::protocol(format!(
                "max_frame_size {} outside {}..={}",
                self.max_frame_size, DEFAULT_MAX_FRAME_SIZE, MAX_MAX_FRAME_SIZE
            )));
        }
        if self.input_buffer == 0 {
            return Err(Error::internal("input_buffer must be at least 1"));
        }
        Ok(())
    }
}
