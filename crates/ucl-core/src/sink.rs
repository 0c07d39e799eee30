//! Byte sinks the emitter writes through.
//!
//! The emitter itself never fails: a sink that can fail records the error and
//! reports it when the caller finishes with it.

use std::io;

/// Output abstraction used by the MessagePack emitter.
pub trait Sink {
    /// Append a run of bytes.
    fn append_bytes(&mut self, bytes: &[u8]);

    /// Append `byte` repeated `count` times.
    fn append_repeated_byte(&mut self, byte: u8, count: usize);
}

impl Sink for Vec<u8> {
    fn append_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn append_repeated_byte(&mut self, byte: u8, count: usize) {
        self.resize(self.len() + count, byte);
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn append_bytes(&mut self, bytes: &[u8]) {
        (**self).append_bytes(bytes);
    }

    fn append_repeated_byte(&mut self, byte: u8, count: usize) {
        (**self).append_repeated_byte(byte, count);
    }
}

/// Adapts any [`io::Write`] into a [`Sink`].
///
/// The first write error is latched; every later append is dropped. Call
/// [`WriteSink::finish`] after emission to flush and collect that error.
///
/// ```
/// use ucl_core::{encode_to, Value, WriteSink};
///
/// let mut sink = WriteSink::new(Vec::new());
/// encode_to(&Value::array(), &mut sink);
/// let bytes = sink.finish().unwrap();
/// assert_eq!(bytes, vec![0x90]);
/// ```
#[derive(Debug)]
pub struct WriteSink<W: io::Write> {
    writer: W,
    error: Option<io::Error>,
    written: usize,
}

impl<W: io::Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
            written: 0,
        }
    }

    /// Bytes successfully handed to the writer so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// True once a write has failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Flush the writer and return it, or the first error seen.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        match self.writer.write_all(bytes) {
            Ok(()) => self.written += bytes.len(),
            Err(err) => self.error = Some(err),
        }
    }
}

impl<W: io::Write> Sink for WriteSink<W> {
    fn append_bytes(&mut self, bytes: &[u8]) {
        self.write(bytes);
    }

    fn append_repeated_byte(&mut self, byte: u8, count: usize) {
        let chunk = [byte; 64];
        let mut left = count;
        while left > 0 {
            let n = left.min(chunk.len());
            self.write(&chunk[..n]);
            left -= n;
        }
    }
}
