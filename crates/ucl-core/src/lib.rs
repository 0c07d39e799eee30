//! # ucl-core
//!
//! The UCL object model together with a MessagePack codec for it.
//!
//! Configuration readers produce a generic, dynamically typed [`Value`] tree;
//! this crate lets a host build and inspect that tree, write it out as
//! MessagePack, and read MessagePack back into a tree, without losing integer
//! width, key order or duplicate keys along the way.
//!
//! ## Quick start
//!
//! ```rust
//! use ucl_core::{decode, encode, Object, Value};
//!
//! let mut server = Object::new();
//! server.insert("host", "example.org");
//! server.insert("port", 8080);
//! let doc = Value::Object(server);
//!
//! // tree → MessagePack
//! let bytes = encode(&doc);
//! assert_eq!(bytes[0], 0x82);
//!
//! // MessagePack → tree (roundtrip)
//! let back = decode(&bytes).unwrap();
//! assert_eq!(back, doc);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: `Value`, `Object` and child iteration
//! - [`encoder`]: value tree → MessagePack bytes through a [`Sink`]
//! - [`decoder`]: MessagePack bytes → value tree
//! - [`format`]: lead-byte format table used by the decoder
//! - [`endian`]: big-endian wire conversions
//! - [`sink`]: output abstraction for the encoder
//! - [`json`]: serde/JSON bridge
//! - [`error`]: Error types for decode failures and typed access

pub mod decoder;
pub mod encoder;
pub mod endian;
pub mod error;
pub mod format;
pub mod json;
pub mod sink;
pub mod types;

pub use decoder::{decode, decode_into, decode_prefix, Decoder};
pub use encoder::{encode, encode_to};
pub use error::UclError;
pub use sink::{Sink, WriteSink};
pub use types::{Children, Object, Value, ValueKind};
