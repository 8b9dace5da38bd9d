use crate::types::Type;
use thiserror::Error;

/// An argument could not be represented on the wire.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("type {0:?} is not registered")]
    UnregisteredType(String),

    #[error("value of {type_name} does not match its descriptor: {reason}")]
    FieldMismatch { type_name: String, reason: String },

    #[error("{what} of {len} exceeds the limit of {limit}")]
    TooLarge {
        what: &'static str,
        len: usize,
        limit: usize,
    },

    #[error("values nested deeper than {0} levels")]
    TooDeep(usize),
}

/// The byte stream was not a valid encoded message. Any of these aborts the
/// whole parse.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("empty input")]
    Empty,

    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("unrecognized tag {0:#04x}")]
    InvalidTag(u8),

    #[error("expected {expected} record, found {found}")]
    UnexpectedTag {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("text is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid count {0}")]
    InvalidCount(i64),

    #[error("{what} of {len} exceeds the limit of {limit}")]
    TooLarge {
        what: &'static str,
        len: usize,
        limit: usize,
    },

    #[error("type {0:?} is not registered")]
    UnknownType(String),

    #[error("{type_name} has {expected} fields, stream carries {found}")]
    FieldCount {
        type_name: String,
        expected: usize,
        found: usize,
    },

    #[error("field {field} of {type_name}: expected {expected}, found {found}")]
    FieldType {
        type_name: String,
        field: String,
        expected: Type,
        found: Type,
    },

    #[error("values nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("type {0:?} is already registered with a different shape")]
    Conflict(String),
}
