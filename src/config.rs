use serde::{Deserialize, Serialize};

/// Limits applied by the encoder and decoder.
///
/// The default accepts everything the wire format can represent. Peers
/// decoding input they do not trust should start from [`untrusted`](Self::untrusted).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Maximum nesting of structured values.
    pub max_depth: usize,
    /// Maximum number of arguments in one message.
    pub max_args: usize,
    /// Maximum length of a single text or byte-sequence payload.
    pub max_len: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_args: i64::MAX as usize,
            max_len: u32::MAX as usize,
        }
    }
}

impl CodecConfig {
    /// Tighter limits for decoding untrusted input: 65 535 arguments and
    /// 16 MiB per payload.
    pub fn untrusted() -> Self {
        Self {
            max_depth: 32,
            max_args: u16::MAX as usize,
            max_len: 16 * 1024 * 1024,
        }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_args(mut self, max_args: usize) -> Self {
        self.max_args = max_args;
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        // Lengths are u32 on the wire.
        self.max_len = max_len.min(u32::MAX as usize);
        self
    }
}
