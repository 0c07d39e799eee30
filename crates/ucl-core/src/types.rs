//! The UCL object model: a dynamically typed value tree shared by every reader
//! and writer.
//!
//! A tree is single-owner. Containers own their children through `Vec`, so a
//! child never outlives its parent and a cycle cannot be constructed. When a
//! tree has to be shared between independent consumers, wrap the root in an
//! `Arc<Value>`.
//!
//! Objects keep their entries in insertion order and preserve duplicate keys;
//! the key of a node lives next to it in its parent's entry list, and array
//! elements carry no key at all.

use crate::error::{Result, UclError};
use std::borrow::Cow;
use std::fmt;

/// The tag of a [`Value`], used in accessor errors and for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    String,
    Boolean,
    Time,
    Object,
    Array,
    Userdata,
    Null,
}

impl ValueKind {
    /// The lowercase type name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Time => "time",
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::Userdata => "userdata",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the document tree.
///
/// Strings are byte sequences and are not required to be valid UTF-8; use
/// [`Value::as_str`] when text is needed.
///
/// Dropping, cloning and comparing walk the tree with a heap-allocated work
/// list, so a tree of any depth the decoder can produce is safe to release,
/// copy and compare. `Debug` formatting and serde serialization still recurse
/// once per nesting level and need a stack deep enough for the tree.
#[derive(Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Seconds, stored as a floating point number.
    ///
    /// MessagePack has no time type: the encoder writes this as a `float64`,
    /// so it decodes back as [`Value::Float`].
    Time(f64),
    String(Vec<u8>),
    /// Opaque binary blob.
    Userdata(Vec<u8>),
    Object(Object),
    Array(Vec<Value>),
}

impl Value {
    /// Build a string node from raw bytes.
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Value::String(bytes.into())
    }

    /// Build a userdata (binary) node.
    pub fn userdata(bytes: impl Into<Vec<u8>>) -> Self {
        Value::Userdata(bytes.into())
    }

    /// Build a time node from seconds.
    pub fn time(seconds: f64) -> Self {
        Value::Time(seconds)
    }

    /// An empty object node.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// An empty array node.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Time(_) => ValueKind::Time,
            Value::String(_) => ValueKind::String,
            Value::Userdata(_) => ValueKind::Userdata,
            Value::Object(_) => ValueKind::Object,
            Value::Array(_) => ValueKind::Array,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for objects and arrays.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    fn mismatch(&self, expected: ValueKind) -> UclError {
        UclError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_time(&self) -> Result<f64> {
        match self {
            Value::Time(t) => Ok(*t),
            other => Err(other.mismatch(ValueKind::Time)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Boolean)),
        }
    }

    /// Raw bytes of a string node.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    /// A string node as text. Fails with [`UclError::Utf8`] when the bytes
    /// are not valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        Ok(std::str::from_utf8(self.as_bytes()?)?)
    }

    pub fn as_userdata(&self) -> Result<&[u8]> {
        match self {
            Value::Userdata(d) => Ok(d),
            other => Err(other.mismatch(ValueKind::Userdata)),
        }
    }

    pub fn as_object(&self) -> Result<&Object> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut Object> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(other.mismatch(ValueKind::Object)),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Ok(a),
            other => Err(other.mismatch(ValueKind::Array)),
        }
    }

    /// Render a scalar as text.
    ///
    /// Strings are returned as-is (invalid UTF-8 sequences are replaced),
    /// booleans render as `"true"`/`"false"`, numbers and time through their
    /// `Display` form and null as `"null"`. Containers and userdata have no
    /// textual form and fail with a type mismatch.
    pub fn to_string_forced(&self) -> Result<Cow<'_, str>> {
        match self {
            Value::String(s) => Ok(String::from_utf8_lossy(s)),
            Value::Boolean(true) => Ok(Cow::Borrowed("true")),
            Value::Boolean(false) => Ok(Cow::Borrowed("false")),
            Value::Integer(i) => Ok(Cow::Owned(i.to_string())),
            Value::Float(f) | Value::Time(f) => Ok(Cow::Owned(f.to_string())),
            Value::Null => Ok(Cow::Borrowed("null")),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    /// Append an element to an array node.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.as_array_mut()?.push(value.into());
        Ok(())
    }

    /// Append a keyed entry to an object node. Existing entries with the same
    /// key are kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.as_object_mut()?.insert(key, value);
        Ok(())
    }

    /// First entry under `key` when this node is an object.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(o) => o.get(key),
            _ => None,
        }
    }

    /// Number of direct children; zero for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Object(o) => o.len(),
            Value::Array(a) => a.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the direct children as `(key, child)` pairs in insertion order.
    ///
    /// Object children carry their key, array elements yield `None`. Scalars
    /// have no children. The iterator is lazy and can be restarted by cloning
    /// it before use or by calling `children` again.
    pub fn children(&self) -> Children<'_> {
        let inner = match self {
            Value::Object(o) => ChildrenInner::Object(o.entries.iter()),
            Value::Array(a) => ChildrenInner::Array(a.iter()),
            _ => ChildrenInner::Empty,
        };
        Children { inner }
    }

    /// Walk a dotted path such as `"servers.0.host"`.
    ///
    /// Object segments match the first entry with that key; array segments are
    /// decimal indices.
    pub fn lookup_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| match node {
                Value::Object(o) => o.get(segment),
                Value::Array(a) => segment.parse::<usize>().ok().and_then(|i| a.get(i)),
                _ => None,
            })
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = match self {
            Value::Array(items) if !items.is_empty() => std::mem::take(items),
            Value::Object(obj) if !obj.is_empty() => obj.take_values(),
            _ => return,
        };
        // Each child is emptied before it goes out of scope, so its own drop
        // never descends further.
        while let Some(mut child) = pending.pop() {
            match &mut child {
                Value::Array(items) => pending.append(items),
                Value::Object(obj) => pending.extend(obj.take_values()),
                _ => {}
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Value::Null, Value::Null) => {}
                (Value::Boolean(a), Value::Boolean(b)) if a == b => {}
                (Value::Integer(a), Value::Integer(b)) if a == b => {}
                (Value::Float(a), Value::Float(b)) | (Value::Time(a), Value::Time(b))
                    if a == b => {}
                (Value::String(a), Value::String(b)) | (Value::Userdata(a), Value::Userdata(b))
                    if a == b => {}
                (Value::Array(a), Value::Array(b)) if a.len() == b.len() => {
                    pending.extend(a.iter().zip(b));
                }
                (Value::Object(a), Value::Object(b)) if a.len() == b.len() => {
                    for ((ka, va), (kb, vb)) in a.entries.iter().zip(&b.entries) {
                        if ka != kb {
                            return false;
                        }
                        pending.push((va, vb));
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

/// A container being copied: the partial copy, the source children not yet
/// visited and the key of the child currently being copied.
struct CloneFrame<'a> {
    copy: Value,
    source: Children<'a>,
    key: Option<&'a str>,
}

impl CloneFrame<'_> {
    fn attach(&mut self, child: Value) {
        match &mut self.copy {
            Value::Array(items) => items.push(child),
            Value::Object(obj) => obj.insert(self.key.unwrap_or_default(), child),
            _ => {}
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let mut stack: Vec<CloneFrame<'_>> = Vec::new();
        let mut node = self;
        loop {
            let mut finished = match node {
                Value::Array(items) => {
                    stack.push(CloneFrame {
                        copy: Value::Array(Vec::with_capacity(items.len())),
                        source: node.children(),
                        key: None,
                    });
                    None
                }
                Value::Object(obj) => {
                    stack.push(CloneFrame {
                        copy: Value::Object(Object::with_capacity(obj.len())),
                        source: node.children(),
                        key: None,
                    });
                    None
                }
                Value::Null => Some(Value::Null),
                Value::Boolean(b) => Some(Value::Boolean(*b)),
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Float(f) => Some(Value::Float(*f)),
                Value::Time(t) => Some(Value::Time(*t)),
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Userdata(d) => Some(Value::Userdata(d.clone())),
            };

            loop {
                let Some(frame) = stack.last_mut() else {
                    return finished.unwrap_or_default();
                };
                if let Some(child) = finished.take() {
                    frame.attach(child);
                }
                if let Some((key, child)) = frame.source.next() {
                    frame.key = key;
                    node = child;
                    break;
                }
                finished = stack.pop().map(|done| done.copy);
            }
        }
    }
}

/// Lazy iterator over the children of a [`Value`].
#[derive(Debug, Clone)]
pub struct Children<'a> {
    inner: ChildrenInner<'a>,
}

#[derive(Debug, Clone)]
enum ChildrenInner<'a> {
    Object(std::slice::Iter<'a, (String, Value)>),
    Array(std::slice::Iter<'a, Value>),
    Empty,
}

impl<'a> Iterator for Children<'a> {
    type Item = (Option<&'a str>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            ChildrenInner::Object(it) => it.next().map(|(k, v)| (Some(k.as_str()), v)),
            ChildrenInner::Array(it) => it.next().map(|v| (None, v)),
            ChildrenInner::Empty => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            ChildrenInner::Object(it) => it.size_hint(),
            ChildrenInner::Array(it) => it.size_hint(),
            ChildrenInner::Empty => (0, Some(0)),
        }
    }
}

impl ExactSizeIterator for Children<'_> {}

/// Insertion-ordered mapping from string keys to values.
///
/// Duplicate keys are allowed and kept in the order they were inserted;
/// [`Object::get`] returns the first one, [`Object::get_all`] all of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry, keeping any earlier entries under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Overwrite the first entry under `key`, or append when there is none.
    /// Returns the replaced value.
    pub fn replace(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        if let Some(idx) = self.entries.iter().position(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut self.entries[idx].1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Every value stored under `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Move every value out, leaving the object empty.
    fn take_values(&mut self) -> Vec<Value> {
        self.entries.drain(..).map(|(_, v)| v).collect()
    }

    /// Remove and return the first entry under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + Clone {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + Clone {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Object {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}
