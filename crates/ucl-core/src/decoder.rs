//! MessagePack decoder. Rebuilds a value tree from a MessagePack buffer.
//!
//! The decoder is a three-state machine driven once per value:
//!
//! - **read_type**: take the lead byte and classify it through
//!   [`classify`](crate::format::classify)
//! - **read_length**: read the explicit big-endian field that follows (a length,
//!   a count or a fixed-width number), or take it from the lead byte's low bits
//! - **read_value**: materialize a scalar, open a container frame, or skip an
//!   extension payload
//!
//! Open containers live on an explicit stack of frames rather than on the call
//! stack, so nesting depth is bounded by memory only. Every read is checked
//! against the end of the buffer; running out of input anywhere before the
//! top-level value closes is a [`UclError::Truncated`].
//!
//! # Key design decisions
//!
//! - **Fresh documents must be containers**: [`decode`] rejects a bare scalar at
//!   the top level. Streaming scalars into an existing array or object goes
//!   through [`decode_into`].
//! - **Map keys are pending state**: a map frame alternates between expecting a
//!   key and holding one; the key is never a sibling node.
//! - **Extensions are skipped**: they consume a slot of their container but
//!   produce no node. A skipped map value drops its pending key.
//! - **Bounded preallocation**: declared counts are trusted only up to the
//!   number of bytes left, so a hostile header cannot force a huge allocation.

use crate::endian::from_wire_var;
use crate::error::{Result, UclError};
use crate::format::{classify, Format, FormatDescriptor};
use crate::types::{Object, Value, ValueKind};

/// Decode a single MessagePack document. Trailing bytes are ignored.
///
/// ```
/// use ucl_core::{decode, Value};
///
/// let value = decode(&[0x81, 0xa1, 0x61, 0x01]).unwrap();
/// assert_eq!(value.get("a"), Some(&Value::Integer(1)));
/// ```
pub fn decode(bytes: &[u8]) -> Result<Value> {
    decode_prefix(bytes).map(|(value, _)| value)
}

/// Decode a single document and report how many bytes it occupied.
pub fn decode_prefix(bytes: &[u8]) -> Result<(Value, usize)> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_document()?;
    Ok((value, decoder.position()))
}

/// Decode every value in `bytes` and append it to `target`, which must be an
/// array or an object. Object targets read alternating keys and values.
///
/// Returns the number of children appended. On error, children appended
/// before the failing value stay in `target`.
pub fn decode_into(target: &mut Value, bytes: &[u8]) -> Result<usize> {
    if bytes.is_empty() {
        return Err(UclError::EmptyInput);
    }
    let container = match target {
        Value::Array(items) => Container::Array(std::mem::take(items)),
        Value::Object(object) => Container::Object {
            object: std::mem::take(object),
            key: None,
        },
        other => {
            return Err(UclError::TypeMismatch {
                expected: ValueKind::Array,
                found: other.kind(),
            });
        }
    };
    let before = container.len();

    let mut decoder = Decoder::new(bytes);
    decoder.stack.push(Frame {
        container,
        remaining: None,
    });
    let result = decoder.run();

    decoder.stack.truncate(1);
    if let Some(frame) = decoder.stack.pop() {
        *target = frame.container.into_value();
    }
    result?;
    Ok(target.len() - before)
}

/// Stateful MessagePack reader over one immutable buffer.
///
/// Successive calls to [`Decoder::decode_document`] read consecutive
/// documents from the same buffer.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
}

#[derive(Debug, Clone, Copy)]
enum State {
    ReadType,
    ReadLength {
        desc: &'static FormatDescriptor,
        lead: u8,
        offset: usize,
    },
    ReadValue {
        desc: &'static FormatDescriptor,
        lead: u8,
        offset: usize,
        len: u64,
    },
}

/// An in-progress container and the number of children it still expects.
/// `remaining` is `None` for an open-ended target of [`decode_into`].
#[derive(Debug)]
struct Frame {
    container: Container,
    remaining: Option<u64>,
}

#[derive(Debug)]
enum Container {
    Array(Vec<Value>),
    Object { object: Object, key: Option<String> },
}

impl Container {
    fn len(&self) -> usize {
        match self {
            Container::Array(items) => items.len(),
            Container::Object { object, .. } => object.len(),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Container::Array(items) => Value::Array(items),
            Container::Object { object, .. } => Value::Object(object),
        }
    }
}

impl Frame {
    fn expects_key(&self) -> bool {
        matches!(self.container, Container::Object { key: None, .. })
    }

    fn has_pending_key(&self) -> bool {
        matches!(self.container, Container::Object { key: Some(_), .. })
    }

    fn is_complete(&self) -> bool {
        self.remaining == Some(0)
    }

    fn consume_slot(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Attach a decoded node: as an array element, as the pending key of a
    /// map, or as the value paired with that key.
    fn accept(&mut self, value: Value, offset: usize) -> Result<()> {
        match &mut self.container {
            Container::Array(items) => {
                items.push(value);
                self.consume_slot();
            }
            Container::Object { object, key } => match key.take() {
                Some(k) => {
                    object.insert(k, value);
                    self.consume_slot();
                }
                None => *key = Some(map_key(value, offset)?),
            },
        }
        Ok(())
    }

    /// Account for a skipped extension value.
    fn skip(&mut self, offset: usize) -> Result<()> {
        if self.expects_key() {
            return Err(UclError::structure(
                offset,
                "extension type cannot be used as a map key",
            ));
        }
        if let Container::Object { key, .. } = &mut self.container {
            *key = None;
        }
        self.consume_slot();
        Ok(())
    }
}

fn map_key(mut value: Value, offset: usize) -> Result<String> {
    match &mut value {
        Value::String(bytes) | Value::Userdata(bytes) => String::from_utf8(std::mem::take(bytes))
            .map_err(|_| UclError::structure(offset, "map key is not valid UTF-8")),
        other => Err(UclError::structure(
            offset,
            format!("map key must be a string, found {}", other.kind()),
        )),
    }
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            stack: Vec::new(),
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Decode the next top-level document, which must be a map or an array.
    pub fn decode_document(&mut self) -> Result<Value> {
        let offset = self.pos;
        let lead = *self.buf.get(offset).ok_or(UclError::EmptyInput)?;
        let desc = classify(lead).ok_or(UclError::Format { byte: lead, offset })?;
        if !desc.is_container() {
            return Err(UclError::structure(
                offset,
                format!(
                    "bad top level object for msgpack: expected map or array, found {:?}",
                    desc.format
                ),
            ));
        }

        self.stack.clear();
        match self.run()? {
            Some(value) => Ok(value),
            None => Err(self.truncated(1)),
        }
    }

    /// Drive the state machine until the bottom frame closes (returning the
    /// finished value) or, for an open-ended frame, until the buffer ends on
    /// a value boundary (returning `None`).
    fn run(&mut self) -> Result<Option<Value>> {
        let mut state = State::ReadType;
        loop {
            state = match state {
                State::ReadType => {
                    if self.is_finished() {
                        return self.finish_at_end();
                    }
                    let offset = self.pos;
                    let lead = self.buf[offset];
                    self.pos += 1;
                    let desc =
                        classify(lead).ok_or(UclError::Format { byte: lead, offset })?;
                    State::ReadLength { desc, lead, offset }
                }
                State::ReadLength { desc, lead, offset } => {
                    let len = self.read_length(desc, lead)?;
                    State::ReadValue {
                        desc,
                        lead,
                        offset,
                        len,
                    }
                }
                State::ReadValue {
                    desc,
                    lead,
                    offset,
                    len,
                } => {
                    if let Some(root) = self.read_value(desc, lead, offset, len)? {
                        return Ok(Some(root));
                    }
                    State::ReadType
                }
            };
        }
    }

    /// The buffer ended between values. That is only acceptable when the one
    /// frame left is an open-ended target without a dangling key.
    fn finish_at_end(&self) -> Result<Option<Value>> {
        match self.stack.as_slice() {
            [frame] if frame.remaining.is_none() && !frame.has_pending_key() => Ok(None),
            _ => Err(self.truncated(1)),
        }
    }

    fn read_length(&mut self, desc: &FormatDescriptor, lead: u8) -> Result<u64> {
        if desc.len == 0 {
            return Ok(u64::from(desc.embedded(lead)));
        }
        if desc.is_fixed() && desc.is_ext() {
            // fixext: one type byte plus a payload of the declared size
            return Ok(u64::from(desc.len) + 1);
        }
        let field = self.take(usize::from(desc.len))?;
        Ok(from_wire_var(field).unwrap_or_default())
    }

    /// Produce the node for one value and hand it to the frame stack.
    fn read_value(
        &mut self,
        desc: &FormatDescriptor,
        lead: u8,
        offset: usize,
        len: u64,
    ) -> Result<Option<Value>> {
        let value = match desc.format {
            Format::PositiveFixint => Value::Integer(i64::from(lead)),
            Format::NegativeFixint => Value::Integer(i64::from(lead as i8)),
            Format::Nil => Value::Null,
            Format::False => Value::Boolean(false),
            Format::True => Value::Boolean(true),
            Format::Uint8 | Format::Uint16 | Format::Uint32 => Value::Integer(len as i64),
            Format::Uint64 => Value::Integer(
                i64::try_from(len)
                    .map_err(|_| UclError::IntegerOverflow { value: len, offset })?,
            ),
            Format::Int8 => Value::Integer(i64::from(len as u8 as i8)),
            Format::Int16 => Value::Integer(i64::from(len as u16 as i16)),
            Format::Int32 => Value::Integer(i64::from(len as u32 as i32)),
            Format::Int64 => Value::Integer(len as i64),
            Format::Float32 => Value::Float(f64::from(f32::from_bits(len as u32))),
            Format::Float64 => Value::Float(f64::from_bits(len)),
            Format::Fixstr | Format::Str8 | Format::Str16 | Format::Str32 => {
                Value::String(self.take_len(len)?.to_vec())
            }
            Format::Bin8 | Format::Bin16 | Format::Bin32 => {
                Value::Userdata(self.take_len(len)?.to_vec())
            }
            Format::Fixarray | Format::Array16 | Format::Array32 => {
                let capacity = self.capacity_hint(len, 1);
                return self.open(Container::Array(Vec::with_capacity(capacity)), len, offset);
            }
            Format::Fixmap | Format::Map16 | Format::Map32 => {
                let capacity = self.capacity_hint(len, 2);
                let container = Container::Object {
                    object: Object::with_capacity(capacity),
                    key: None,
                };
                return self.open(container, len, offset);
            }
            Format::Fixext1
            | Format::Fixext2
            | Format::Fixext4
            | Format::Fixext8
            | Format::Fixext16 => {
                self.take_len(len)?;
                return self.skip_value(offset);
            }
            Format::Ext8 | Format::Ext16 | Format::Ext32 => {
                self.take_len(len.saturating_add(1))?;
                return self.skip_value(offset);
            }
        };
        self.complete(value, offset)
    }

    /// Push a container frame. Empty containers are complete immediately.
    fn open(&mut self, container: Container, count: u64, offset: usize) -> Result<Option<Value>> {
        if self.stack.last().is_some_and(Frame::expects_key) {
            return Err(UclError::structure(
                offset,
                "map key must be a string, found a container",
            ));
        }
        if count == 0 {
            return self.complete(container.into_value(), offset);
        }
        self.stack.push(Frame {
            container,
            remaining: Some(count),
        });
        Ok(None)
    }

    fn skip_value(&mut self, offset: usize) -> Result<Option<Value>> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(None);
        };
        frame.skip(offset)?;
        if frame.is_complete() {
            return self.close_top(offset);
        }
        Ok(None)
    }

    /// Attach a finished node to the innermost open container, closing every
    /// container that becomes full as a result. Returns the root once the
    /// bottom frame closes.
    fn complete(&mut self, mut value: Value, offset: usize) -> Result<Option<Value>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(Some(value));
            };
            frame.accept(value, offset)?;
            if !frame.is_complete() {
                return Ok(None);
            }
            value = match self.stack.pop() {
                Some(done) => done.container.into_value(),
                None => return Ok(None),
            };
        }
    }

    /// Pop a full frame and attach its container to the one below.
    fn close_top(&mut self, offset: usize) -> Result<Option<Value>> {
        match self.stack.pop() {
            Some(done) => self.complete(done.container.into_value(), offset),
            None => Ok(None),
        }
    }

    /// Children cannot be smaller than `min_size` bytes each, which bounds
    /// how many can really follow.
    fn capacity_hint(&self, count: u64, min_size: usize) -> usize {
        let plausible = self.remaining() / min_size;
        usize::try_from(count).map_or(plausible, |count| count.min(plausible))
    }

    fn take_len(&mut self, len: u64) -> Result<&'a [u8]> {
        self.take(usize::try_from(len).unwrap_or(usize::MAX))
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8]> {
        let remain = self.remaining();
        if remain < needed {
            return Err(self.truncated(needed));
        }
        let bytes = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(bytes)
    }

    fn truncated(&self, needed: usize) -> UclError {
        UclError::Truncated {
            offset: self.pos,
            remain: self.remaining(),
            needed,
        }
    }
}
