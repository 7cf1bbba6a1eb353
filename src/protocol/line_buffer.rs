//! Fixed-capacity buffer for accumulating partial reads into lines.
//!
//! Bytes arrive from a transport in arbitrary chunks. The buffer keeps them
//! at the front of a fixed-size array and hands out one line at a time:
//! - A line ends at the first `\n`; a single `\r` before it is stripped.
//! - After a line is taken, the unread remainder is shifted to offset 0.
//! - When the array fills up without a `\n`, [`LineBuffer::force_line`] cuts
//!   a line of `capacity - 1` bytes so the stream keeps moving.
//!
//! # Example
//!
//! ```
//! use linepipe::protocol::LineBuffer;
//!
//! let mut buffer = LineBuffer::new(8);
//!
//! let chunk = b"ab\r\ncd";
//! buffer.spare_mut()[..chunk.len()].copy_from_slice(chunk);
//! buffer.commit(chunk.len());
//!
//! assert_eq!(&buffer.take_line().unwrap()[..], b"ab");
//! assert!(buffer.take_line().is_none());
//! assert_eq!(buffer.as_slice(), b"cd");
//! ```

use bytes::Bytes;

use super::line_ending::{CR, LF};

/// Buffer for accumulating incoming bytes and extracting complete lines.
///
/// Memory is bounded by the capacity given at construction; the buffer
/// never grows.
pub struct LineBuffer {
    /// Backing storage, `capacity` bytes long.
    buf: Box<[u8]>,
    /// Number of valid unread bytes at the front of `buf`.
    filled: usize,
}

impl LineBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            filled: 0,
        }
    }

    /// Try to extract a single line from the buffer.
    ///
    /// Returns `None` if the buffered bytes contain no `\n`. The returned
    /// payload excludes the terminator and one trailing `\r`, if any.
    pub fn take_line(&mut self) -> Option<Bytes> {
        let pos = self.as_slice().iter().position(|&b| b == LF)?;

        let mut end = pos;
        if end > 0 && self.buf[end - 1] == CR {
            end -= 1;
        }
        let line = Bytes::copy_from_slice(&self.buf[..end]);

        self.consume(pos + 1);
        Some(line)
    }

    /// Cut a line out of a full buffer that holds no terminator.
    ///
    /// Returns the first `capacity - 1` bytes and keeps only the last byte,
    /// moved to offset 0. The returned bytes are a truncation artifact, not a
    /// line the peer actually terminated; no `\r` stripping is applied.
    ///
    /// Callers must check [`is_full`](Self::is_full) first.
    pub fn force_line(&mut self) -> Bytes {
        debug_assert!(self.is_full(), "force_line on a buffer that is not full");

        let cut = self.filled.saturating_sub(1);
        let line = Bytes::copy_from_slice(&self.buf[..cut]);

        self.consume(cut);
        line
    }

    /// Writable tail of the buffer, `capacity - len` bytes long.
    ///
    /// Fill a prefix of it and report the count with [`commit`](Self::commit).
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Mark `n` bytes written into [`spare_mut`](Self::spare_mut) as valid.
    ///
    /// `n` is clamped to the remaining capacity.
    pub fn commit(&mut self, n: usize) {
        self.filled = (self.filled + n).min(self.buf.len());
    }

    /// Copy as much of `data` as fits through `spare_mut` and `commit`.
    #[cfg(test)]
    fn extend(&mut self, data: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = data.len().min(spare.len());
        spare[..n].copy_from_slice(&data[..n]);
        self.commit(n);
        n
    }

    /// Valid unread bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.filled
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Check if no more bytes can be accepted.
    pub fn is_full(&self) -> bool {
        self.filled == self.buf.len()
    }

    /// Fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.filled = 0;
    }

    /// Discard the first `n` buffered bytes and shift the rest to offset 0.
    fn consume(&mut self, n: usize) {
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }
}

impl std::fmt::Debug for LineBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineBuffer")
            .field("filled", &self.filled)
            .field("capacity", &self.buf.len())
            .finish()
    }
}
