use super::Tag;
use crate::{
    config::CodecConfig,
    error::DecodeError,
    message::RpcData,
    registry::Snapshot,
    types::{StructValue, Value},
};
use tracing::trace;

/// Read position within a borrowed input buffer.
struct Cursor<'a> {
    slice: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(slice: &'a [u8]) -> Self {
        Self { slice, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.slice.len() - self.pos
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.slice[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Start,
    ReadName,
    ReadArgCount,
    ReadArg { index: usize, count: usize },
    Done,
}

pub(crate) struct Decoder<'a> {
    cursor: Cursor<'a>,
    types: &'a Snapshot,
    config: &'a CodecConfig,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(bytes: &'a [u8], types: &'a Snapshot, config: &'a CodecConfig) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            types,
            config,
        }
    }

    /// Parses exactly one message. Any failure discards everything read so far.
    pub(crate) fn message(mut self) -> Result<RpcData, DecodeError> {
        let mut data = RpcData::default();
        let mut state = State::Start;

        loop {
            trace!(?state, pos = self.cursor.pos, "decoding");
            state = match state {
                State::Start => {
                    if self.cursor.remaining() == 0 {
                        return Err(DecodeError::Empty);
                    }
                    State::ReadName
                }
                State::ReadName => {
                    self.expect_tag(Tag::Text)?;
                    data.name = self.text("name")?;
                    State::ReadArgCount
                }
                State::ReadArgCount => {
                    let count = self.arg_count()?;
                    // Every record is at least two bytes; never reserve past the input.
                    data.args.reserve(count.min(self.cursor.remaining() / 2));
                    match count {
                        0 => State::Done,
                        count => State::ReadArg { index: 0, count },
                    }
                }
                State::ReadArg { index, count } => {
                    data.args.push(self.value(0)?);
                    match index + 1 {
                        next if next == count => State::Done,
                        next => State::ReadArg { index: next, count },
                    }
                }
                State::Done => {
                    let trailing = self.cursor.remaining();
                    if trailing > 0 {
                        return Err(DecodeError::TrailingBytes(trailing));
                    }
                    return Ok(data);
                }
            };
        }
    }

    fn arg_count(&mut self) -> Result<usize, DecodeError> {
        self.expect_tag(Tag::Int)?;
        let raw = i64::from_le_bytes(self.cursor.read_array()?);
        let count = usize::try_from(raw).map_err(|_| DecodeError::InvalidCount(raw))?;
        if count > self.config.max_args {
            return Err(DecodeError::TooLarge {
                what: "argument count",
                len: count,
                limit: self.config.max_args,
            });
        }
        Ok(count)
    }

    fn tag(&mut self) -> Result<Tag, DecodeError> {
        let byte = self.cursor.read_byte()?;
        Tag::from_u8(byte).ok_or(DecodeError::InvalidTag(byte))
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<(), DecodeError> {
        let found = self.tag()?;
        if found != expected {
            return Err(DecodeError::UnexpectedTag {
                expected: expected.name(),
                found: found.name(),
            });
        }
        Ok(())
    }

    fn value(&mut self, depth: usize) -> Result<Value, DecodeError> {
        Ok(match self.tag()? {
            Tag::Bool => match self.cursor.read_byte()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                b => return Err(DecodeError::InvalidBool(b)),
            },
            Tag::Int => Value::Int(i64::from_le_bytes(self.cursor.read_array()?)),
            Tag::Float => Value::Float(f64::from_bits(u64::from_le_bytes(
                self.cursor.read_array()?,
            ))),
            Tag::Text => Value::Text(self.text("text")?),
            Tag::Bytes => Value::Bytes(self.blob("byte sequence")?.to_vec()),
            Tag::Struct => Value::Struct(self.structured(depth)?),
        })
    }

    fn structured(&mut self, depth: usize) -> Result<StructValue, DecodeError> {
        if depth >= self.config.max_depth {
            return Err(DecodeError::TooDeep(self.config.max_depth));
        }

        let types = self.types;
        let type_name = self.text("type name")?;
        let descriptor = types
            .get(&type_name)
            .ok_or_else(|| DecodeError::UnknownType(type_name.clone()))?;

        let found = u32::from_le_bytes(self.cursor.read_array()?) as usize;
        if found != descriptor.fields.len() {
            return Err(DecodeError::FieldCount {
                type_name,
                expected: descriptor.fields.len(),
                found,
            });
        }

        let mut fields = Vec::with_capacity(found);
        for field in &descriptor.fields {
            let value = self.value(depth + 1)?;
            let found = value.rpc_type();
            if found != field.ty {
                return Err(DecodeError::FieldType {
                    type_name,
                    field: field.name.clone(),
                    expected: field.ty.clone(),
                    found,
                });
            }
            fields.push(value);
        }

        Ok(StructValue { type_name, fields })
    }

    fn len(&mut self, what: &'static str) -> Result<usize, DecodeError> {
        let len = u32::from_le_bytes(self.cursor.read_array()?) as usize;
        if len > self.config.max_len {
            return Err(DecodeError::TooLarge {
                what,
                len,
                limit: self.config.max_len,
            });
        }
        Ok(len)
    }

    fn blob(&mut self, what: &'static str) -> Result<&'a [u8], DecodeError> {
        let len = self.len(what)?;
        self.cursor.read_bytes(len)
    }

    fn text(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let bytes = self.blob(what)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}
