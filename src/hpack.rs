//! Header block compression at the connection boundary (RFC 7541).
//!
//! Thin wrapper around `fluke-hpack`. The decoder and encoder keep dynamic
//! table state, so the connection owns one of each and lends them to
//! streams as header blocks arrive or leave.

use crate::error::{Error, Result};

/// A single decoded header field, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.name.starts_with(':')
    }

    fn from_wire((name, value): (Vec<u8>, Vec<u8>)) -> Self {
        Field {
            name: String::from_utf8_lossy(&name).into_owned(),
            value: String::from_utf8_lossy(&value).into_owned(),
        }
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for Field {
    fn from((name, value): (N, V)) -> Self {
        Field::new(name, value)
    }
}

/// Connection-wide header block decoder; streams borrow it per block.
pub struct HpackDecoder(fluke_hpack::Decoder<'static>);

/// Connection-wide header block encoder.
pub struct HpackEncoder(fluke_hpack::Encoder<'static>);

impl HpackDecoder {
    pub fn new() -> Self {
        HpackDecoder(fluke_hpack::Decoder::new())
    }

    /// Decode one complete header block into fields, in wire order.
    ///
    /// A failure leaves the shared dynamic table in an unknown state, so it
    /// is reported as [`Error::Compression`] and is fatal to the connection.
    pub fn decode(&mut self, block: &[u8]) -> Result<Vec<Field>> {
        match self.0.decode(block) {
            Ok(pairs) => Ok(pairs.into_iter().map(Field::from_wire).collect()),
            Err(err) => Err(Error::Compression(format!(
                "header block of {} bytes: {:?}",
                block.len(),
                err
            ))),
        }
    }
}

impl HpackEncoder {
    pub fn new() -> Self {
        HpackEncoder(fluke_hpack::Encoder::new())
    }

    pub fn encode(&mut self, fields: &[Field]) -> Vec<u8> {
        self.0.encode(
            fields
                .iter()
                .map(|field| (field.name.as_bytes(), field.value.as_bytes())),
        )
    }
}

impl Default for HpackDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for HpackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HpackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HpackDecoder")
    }
}

impl std::fmt::Debug for HpackEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HpackEncoder")
    }
}
