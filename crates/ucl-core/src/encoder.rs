//! MessagePack emitter. Converts a value tree into its minimal MessagePack
//! encoding.
//!
//! Emission is a pure function of the value: every scalar picks the shortest
//! wire form that holds it losslessly, and bytes are handed to a caller-supplied
//! [`Sink`]. The rules:
//!
//! - **Integers**: positive fixint up to 127, negative fixint down to -32, then
//!   the smallest of `uint8/16/32/64` for non-negative values and of
//!   `int8/16/32/64` for negative ones
//! - **Floats and time**: always `float64` (`0xcb`), never narrowed
//! - **Booleans / null**: single-byte tags `0xc3`, `0xc2`, `0xc0`
//! - **Strings**: `fixstr` up to 31 bytes, then `str8/16/32`
//! - **Userdata**: `bin8/16/32`
//! - **Arrays / objects**: `fixarray`/`fixmap` up to 15 children, then the 16 and
//!   32-bit count forms; object keys are written as strings before each value
//!
//! # Example
//! ```
//! use ucl_core::{encode, Object, Value};
//!
//! let mut obj = Object::new();
//! obj.insert("a", 1);
//! assert_eq!(encode(&Value::Object(obj)), vec![0x81, 0xa1, 0x61, 0x01]);
//! ```

use crate::endian::{to_wire16, to_wire32, to_wire64, to_wire_f64};
use crate::sink::Sink;
use crate::types::{Children, Value};

const POSITIVE_FIXINT_MAX: i64 = 0x7f;
const NEGATIVE_FIXINT_MIN: i64 = -0x20;
const FIXSTR_MASK: u8 = 0xa0;
const FIXSTR_MAX: usize = 0x1f;
const FIXARRAY_MASK: u8 = 0x90;
const FIXMAP_MASK: u8 = 0x80;
const FIXCOUNT_MAX: usize = 0x0f;

const NIL: u8 = 0xc0;
const FALSE: u8 = 0xc2;
const TRUE: u8 = 0xc3;
const BIN8: u8 = 0xc4;
const BIN16: u8 = 0xc5;
const BIN32: u8 = 0xc6;
const FLOAT64: u8 = 0xcb;
const UINT8: u8 = 0xcc;
const UINT16: u8 = 0xcd;
const UINT32: u8 = 0xce;
const UINT64: u8 = 0xcf;
const INT8: u8 = 0xd0;
const INT16: u8 = 0xd1;
const INT32: u8 = 0xd2;
const INT64: u8 = 0xd3;
const STR8: u8 = 0xd9;
const STR16: u8 = 0xda;
const STR32: u8 = 0xdb;
const ARRAY16: u8 = 0xdc;
const ARRAY32: u8 = 0xdd;
const MAP16: u8 = 0xde;
const MAP32: u8 = 0xdf;

/// Encode a value tree into a fresh byte vector.
///
/// [`Value::Time`] nodes are written as plain `float64`, so decoding the
/// result yields [`Value::Float`] in their place; every other node type comes
/// back unchanged.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_to(value, &mut out);
    out
}

/// Encode a value tree into `sink`.
///
/// Containers are walked with an explicit stack of child iterators, so the
/// emitter's own call depth does not grow with the nesting depth of the tree.
/// Keys are printed only for children of objects.
pub fn encode_to<S: Sink + ?Sized>(value: &Value, sink: &mut S) {
    let mut stack: Vec<Children<'_>> = Vec::new();
    emit_node(value, sink, &mut stack);

    while let Some(children) = stack.last_mut() {
        match children.next() {
            Some((key, child)) => {
                emit_key(key.is_some(), key.unwrap_or_default(), sink);
                emit_node(child, sink, &mut stack);
            }
            None => {
                stack.pop();
            }
        }
    }
}

/// Emit a scalar completely, or a container's header followed by pushing its
/// children onto the walker stack.
fn emit_node<'a, S: Sink + ?Sized>(value: &'a Value, sink: &mut S, stack: &mut Vec<Children<'a>>) {
    match value {
        Value::Null => emit_null(sink),
        Value::Boolean(b) => emit_bool(*b, sink),
        Value::Integer(i) => emit_int(*i, sink),
        Value::Float(f) | Value::Time(f) => emit_double(*f, sink),
        Value::String(s) => emit_string(s, sink),
        Value::Userdata(d) => emit_binary(d, sink),
        Value::Object(obj) => {
            emit_object_header(obj.len(), sink);
            stack.push(value.children());
        }
        Value::Array(items) => {
            emit_array_header(items.len(), sink);
            stack.push(value.children());
        }
    }
}

/// Emit an integer in the shortest form that holds it.
///
/// Non-negative values above the fixint range always use the unsigned tags;
/// negative values below the fixint range always use the signed tags.
pub fn emit_int<S: Sink + ?Sized>(val: i64, sink: &mut S) {
    if val >= 0 {
        if val <= POSITIVE_FIXINT_MAX {
            sink.append_bytes(&[val as u8]);
        } else if val <= i64::from(u8::MAX) {
            sink.append_bytes(&[UINT8, val as u8]);
        } else if val <= i64::from(u16::MAX) {
            emit_tagged(UINT16, &to_wire16(val as u16), sink);
        } else if val <= i64::from(u32::MAX) {
            emit_tagged(UINT32, &to_wire32(val as u32), sink);
        } else {
            emit_tagged(UINT64, &to_wire64(val as u64), sink);
        }
    } else if val >= NEGATIVE_FIXINT_MIN {
        // Two's complement of -1..=-32 is exactly 0xff..=0xe0.
        sink.append_bytes(&[val as i8 as u8]);
    } else if val >= i64::from(i8::MIN) {
        sink.append_bytes(&[INT8, val as i8 as u8]);
    } else if val >= i64::from(i16::MIN) {
        emit_tagged(INT16, &to_wire16(val as i16 as u16), sink);
    } else if val >= i64::from(i32::MIN) {
        emit_tagged(INT32, &to_wire32(val as i32 as u32), sink);
    } else {
        emit_tagged(INT64, &to_wire64(val as u64), sink);
    }
}

/// Emit a double as `float64`.
pub fn emit_double<S: Sink + ?Sized>(val: f64, sink: &mut S) {
    emit_tagged(FLOAT64, &to_wire_f64(val), sink);
}

pub fn emit_bool<S: Sink + ?Sized>(val: bool, sink: &mut S) {
    sink.append_repeated_byte(if val { TRUE } else { FALSE }, 1);
}

pub fn emit_null<S: Sink + ?Sized>(sink: &mut S) {
    sink.append_repeated_byte(NIL, 1);
}

/// Emit a length-prefixed string.
///
/// MessagePack cannot express lengths above `u32::MAX`; longer payloads are
/// cut at that length so the output stays well-formed.
pub fn emit_string<S: Sink + ?Sized>(s: &[u8], sink: &mut S) {
    let len = s.len();
    if len <= FIXSTR_MAX {
        sink.append_bytes(&[FIXSTR_MASK | len as u8]);
    } else if len <= usize::from(u8::MAX) {
        sink.append_bytes(&[STR8, len as u8]);
    } else if len <= usize::from(u16::MAX) {
        emit_tagged(STR16, &to_wire16(len as u16), sink);
    } else {
        emit_tagged(STR32, &to_wire32(wire_len(len)), sink);
    }
    sink.append_bytes(&s[..wire_len(len) as usize]);
}

/// Emit a length-prefixed binary blob. There is no fixed-size bin form.
pub fn emit_binary<S: Sink + ?Sized>(data: &[u8], sink: &mut S) {
    let len = data.len();
    if len <= usize::from(u8::MAX) {
        sink.append_bytes(&[BIN8, len as u8]);
    } else if len <= usize::from(u16::MAX) {
        emit_tagged(BIN16, &to_wire16(len as u16), sink);
    } else {
        emit_tagged(BIN32, &to_wire32(wire_len(len)), sink);
    }
    sink.append_bytes(&data[..wire_len(len) as usize]);
}

/// Emit an object key when `print_key` is set. Keys use the string rules.
pub fn emit_key<S: Sink + ?Sized>(print_key: bool, key: &str, sink: &mut S) {
    if print_key {
        emit_string(key.as_bytes(), sink);
    }
}

/// Emit an array header for `len` elements.
pub fn emit_array_header<S: Sink + ?Sized>(len: usize, sink: &mut S) {
    emit_container_header(len, FIXARRAY_MASK, ARRAY16, ARRAY32, sink);
}

/// Emit an object header for `len` key/value pairs.
pub fn emit_object_header<S: Sink + ?Sized>(len: usize, sink: &mut S) {
    emit_container_header(len, FIXMAP_MASK, MAP16, MAP32, sink);
}

fn emit_container_header<S: Sink + ?Sized>(
    len: usize,
    fix_mask: u8,
    tag16: u8,
    tag32: u8,
    sink: &mut S,
) {
    if len <= FIXCOUNT_MAX {
        sink.append_bytes(&[fix_mask | len as u8]);
    } else if len <= usize::from(u16::MAX) {
        emit_tagged(tag16, &to_wire16(len as u16), sink);
    } else {
        emit_tagged(tag32, &to_wire32(wire_len(len)), sink);
    }
}

/// Tag byte followed by a fixed-width big-endian field, written in one call.
fn emit_tagged<S: Sink + ?Sized>(tag: u8, field: &[u8], sink: &mut S) {
    let mut buf = [0u8; 9];
    buf[0] = tag;
    buf[1..=field.len()].copy_from_slice(field);
    sink.append_bytes(&buf[..=field.len()]);
}

fn wire_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
