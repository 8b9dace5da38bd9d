//! Wire format for [`RpcData`].
//!
//! A message is a sequence of tagged records, all integers little-endian:
//!
//! ```text
//! Text(name) Int(argc) arg_0 .. arg_argc
//! ```
//!
//! | tag    | kind   | payload                                        |
//! |--------|--------|------------------------------------------------|
//! | `0x01` | Bool   | one byte, `0` or `1`                           |
//! | `0x02` | Int    | `i64`                                          |
//! | `0x03` | Float  | `f64` bit pattern                              |
//! | `0x04` | Text   | `u32` length, UTF-8 bytes                      |
//! | `0x05` | Bytes  | `u32` length, bytes                            |
//! | `0x10` | Struct | `u32` name length, name, `u32` field count, fields |
//!
//! Structured values are identified by their registered name and their fields
//! are encoded with the same tagged records, so they nest arbitrarily.

mod decoder;
mod encoder;

use crate::{
    config::CodecConfig,
    error::{DecodeError, EncodeError},
    message::RpcData,
    registry::Registry,
};
use std::sync::Arc;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tag {
    Bool = 0x01,
    Int = 0x02,
    Float = 0x03,
    Text = 0x04,
    Bytes = 0x05,
    Struct = 0x10,
}

impl Tag {
    pub(crate) const fn from_u8(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Tag::Bool),
            0x02 => Some(Tag::Int),
            0x03 => Some(Tag::Float),
            0x04 => Some(Tag::Text),
            0x05 => Some(Tag::Bytes),
            0x10 => Some(Tag::Struct),
            _ => None,
        }
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            Tag::Bool => "Bool",
            Tag::Int => "Int",
            Tag::Float => "Float",
            Tag::Text => "Text",
            Tag::Bytes => "Bytes",
            Tag::Struct => "Struct",
        }
    }
}

/// Encodes `data` with the default limits.
pub fn encode(data: &RpcData, registry: &Registry) -> Result<Vec<u8>, EncodeError> {
    encoder::Encoder::new(&registry.snapshot(), &CodecConfig::default()).message(data)
}

/// Decodes one complete message with the default limits.
pub fn decode(bytes: &[u8], registry: &Registry) -> Result<RpcData, DecodeError> {
    decoder::Decoder::new(bytes, &registry.snapshot(), &CodecConfig::default()).message()
}

/// A registry paired with codec limits; the context handed to whichever
/// layer sends and receives messages.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    registry: Arc<Registry>,
    config: CodecConfig,
}

impl Codec {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, data: &RpcData) -> Result<Vec<u8>, EncodeError> {
        encoder::Encoder::new(&self.registry.snapshot(), &self.config).message(data)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RpcData, DecodeError> {
        decoder::Decoder::new(bytes, &self.registry.snapshot(), &self.config).message()
    }
}
