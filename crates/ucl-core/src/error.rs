//! Error types for object-model access and MessagePack decoding.

use crate::types::ValueKind;
use thiserror::Error;

/// Errors that can occur while reading a value tree or decoding MessagePack.
#[derive(Error, Debug)]
pub enum UclError {
    /// The lead byte at `offset` does not match any MessagePack format.
    #[error("unknown msgpack format: 0x{byte:02x} at offset {offset}")]
    Format { byte: u8, offset: usize },

    /// A length, value or payload field runs past the end of the buffer.
    #[error(
        "not enough data remain to read object at offset {offset}: {remain} remain, {needed} needed"
    )]
    Truncated {
        offset: usize,
        remain: usize,
        needed: usize,
    },

    /// Well-formed bytes that do not form a valid document (bare top-level
    /// scalar, non-string map key, extension in key position).
    #[error("bad msgpack structure at offset {offset}: {message}")]
    Structure { offset: usize, message: String },

    /// A `uint64` payload that does not fit the signed integer node.
    #[error("integer {value} at offset {offset} does not fit into a signed 64-bit value")]
    IntegerOverflow { value: u64, offset: usize },

    /// Decoding was requested on an empty buffer.
    #[error("cannot decode an empty msgpack buffer")]
    EmptyInput,

    /// A typed accessor was used against a node of another type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    /// A string node was read as text but holds invalid UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// JSON input or output failed in the serde bridge.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UclError {
    pub(crate) fn structure(offset: usize, message: impl Into<String>) -> Self {
        UclError::Structure {
            offset,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout ucl-core.
pub type Result<T> = std::result::Result<T, UclError>;
