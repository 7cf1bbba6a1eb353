//! Non-blocking line pipe over a [`Transport`].
//!
//! [`LinePipe`] turns a raw byte stream into discrete lines:
//! 1. [`try_read_line`](LinePipe::try_read_line) returns a buffered line if
//!    one is complete, otherwise performs at most one read from the
//!    transport, and only if the transport reports data ready
//! 2. [`write_line`](LinePipe::write_line) appends the terminator and
//!    flushes before returning
//!
//! An open pipe is a `LinePipe` value; [`close`](LinePipe::close) consumes
//! it, so reading or writing a closed pipe does not compile.
//!
//! # Example
//!
//! ```ignore
//! use linepipe::{LinePipe, StdioTransport};
//! use std::time::Duration;
//!
//! let mut pipe = LinePipe::open(StdioTransport::new()?);
//! loop {
//!     match pipe.try_read_line()? {
//!         None => std::thread::sleep(Duration::from_millis(1)),
//!         Some(line) if line.is_empty() => break,
//!         Some(line) => pipe.write_line(&line)?,
//!     }
//! }
//! pipe.close()?;
//! ```

use std::io;

use bytes::Bytes;

use crate::config::PipeConfig;
use crate::error::{PipeError, Result};
use crate::protocol::{encode_line, LineBuffer, LineEnding};
use crate::transport::Transport;

/// Line-oriented adapter over a byte transport.
///
/// Memory use is bounded by the configured capacity. A line longer than
/// `capacity - 1` bytes is split: the first `capacity - 1` bytes come back
/// as a forced line (see [`try_read_line`](Self::try_read_line)).
pub struct LinePipe<T: Transport> {
    transport: T,
    buffer: LineBuffer,
    line_ending: LineEnding,
    /// Set once a ready read returned zero bytes.
    eof: bool,
    overflows: u64,
    closed: bool,
}

impl<T: Transport> LinePipe<T> {
    /// Open a pipe over `transport` with the default configuration.
    pub fn open(transport: T) -> Self {
        Self::build(transport, PipeConfig::default())
    }

    /// Open a pipe over `transport` with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if the configuration is rejected.
    pub fn with_config(transport: T, config: PipeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    fn build(transport: T, config: PipeConfig) -> Self {
        tracing::debug!(capacity = config.capacity, "line pipe opened");
        Self {
            transport,
            buffer: LineBuffer::new(config.capacity),
            line_ending: config.line_ending,
            eof: false,
            overflows: 0,
            closed: false,
        }
    }

    /// Try to read one line without blocking.
    ///
    /// Returns:
    /// - `Ok(Some(line))` with the bytes before `\n`, minus a trailing `\r`
    /// - `Ok(None)` if no complete line is available yet
    /// - `Err(...)` if the transport read failed
    ///
    /// `Some` with an empty line is a real (empty) line, not "nothing yet".
    ///
    /// When the buffer fills up without a terminator, the first
    /// `capacity - 1` bytes are returned as a forced line and the last byte
    /// stays buffered. Such a line is a truncation artifact, not something
    /// the peer terminated; [`overflow_count`](Self::overflow_count) counts
    /// them.
    pub fn try_read_line(&mut self) -> Result<Option<Bytes>> {
        if let Some(line) = self.buffer.take_line() {
            return Ok(Some(line));
        }

        if self.eof || !self.transport.available().map_err(PipeError::from_transport)? {
            return Ok(None);
        }

        let n = match self.transport.read(self.buffer.spare_mut()) {
            Ok(n) => n,
            Err(e) if is_transient(&e) => return Ok(None),
            Err(e) => return Err(PipeError::from_transport(e)),
        };

        if n == 0 {
            self.eof = true;
            tracing::debug!(buffered = self.buffer.len(), "end of stream");
            return Ok(None);
        }

        self.buffer.commit(n);
        tracing::trace!(bytes = n, buffered = self.buffer.len(), "read from transport");

        if let Some(line) = self.buffer.take_line() {
            return Ok(Some(line));
        }

        if self.buffer.is_full() {
            self.overflows += 1;
            tracing::warn!(
                capacity = self.buffer.capacity(),
                "line exceeds buffer capacity, forcing a line break"
            );
            return Ok(Some(self.buffer.force_line()));
        }

        Ok(None)
    }

    /// Write one line and flush it.
    ///
    /// `payload` must not contain `\n`; it is written as-is if it does, and
    /// the peer will see more than one line.
    pub fn write_line(&mut self, payload: &[u8]) -> Result<()> {
        let frame = encode_line(payload, self.line_ending);
        self.transport
            .write_all(&frame)
            .map_err(PipeError::from_transport)?;
        self.transport.flush().map_err(PipeError::from_transport)
    }

    /// Release the transport and discard buffered bytes.
    ///
    /// Both sides of the transport are released even if one fails; the first
    /// failure is returned.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.buffer.clear();
        tracing::debug!(overflows = self.overflows, "line pipe closed");
        self.transport.close().map_err(PipeError::from_transport)
    }

    /// Check whether the transport reported end of stream.
    ///
    /// Lines already buffered are still returned by `try_read_line`.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Number of forced lines produced so far.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Bytes received but not yet returned as a line.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: Transport> Drop for LinePipe<T> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.transport.close();
        }
    }
}

impl<T: Transport> std::fmt::Debug for LinePipe<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinePipe")
            .field("buffer", &self.buffer)
            .field("line_ending", &self.line_ending)
            .field("eof", &self.eof)
            .field("overflows", &self.overflows)
            .finish_non_exhaustive()
    }
}

/// Read errors that mean "nothing this time" rather than a broken stream.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
