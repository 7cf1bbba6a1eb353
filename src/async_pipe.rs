//! Readiness-driven line pipe on tokio.
//!
//! [`AsyncLinePipe`] applies the same framing rules as
//! [`LinePipe`](crate::LinePipe) (split on `\n`, strip one trailing `\r`,
//! force a line when the buffer fills) but waits on the reader instead of
//! being polled in a sleep loop.
//!
//! # Example
//!
//! ```ignore
//! use linepipe::AsyncLinePipe;
//!
//! #[tokio::main]
//! async fn main() -> linepipe::Result<()> {
//!     let mut pipe = AsyncLinePipe::stdio();
//!     while let Some(line) = pipe.read_line().await? {
//!         if line.is_empty() {
//!             break;
//!         }
//!         pipe.write_line(&line).await?;
//!     }
//!     pipe.close().await
//! }
//! ```

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::PipeConfig;
use crate::error::Result;
use crate::protocol::{encode_line, LineBuffer, LineEnding};

/// Line-oriented adapter over a tokio reader/writer pair.
pub struct AsyncLinePipe<R, W> {
    reader: R,
    writer: W,
    buffer: LineBuffer,
    line_ending: LineEnding,
    eof: bool,
    overflows: u64,
}

impl AsyncLinePipe<tokio::io::Stdin, tokio::io::Stdout> {
    /// Pipe over the current process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> AsyncLinePipe<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a pipe with the default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self::build(reader, writer, PipeConfig::default())
    }

    /// Create a pipe with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`](crate::PipeError::InvalidConfig)
    /// if the configuration is rejected.
    pub fn with_config(reader: R, writer: W, config: PipeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(reader, writer, config))
    }

    fn build(reader: R, writer: W, config: PipeConfig) -> Self {
        Self {
            reader,
            writer,
            buffer: LineBuffer::new(config.capacity),
            line_ending: config.line_ending,
            eof: false,
            overflows: 0,
        }
    }

    /// Wait for the next line.
    ///
    /// Returns `Ok(None)` at end of stream once every complete line has been
    /// returned; an unterminated tail is left in the buffer.
    ///
    /// Cancel safe: bytes read before the future is dropped stay buffered.
    pub async fn read_line(&mut self) -> Result<Option<Bytes>> {
        loop {
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

            if self.eof {
                return Ok(None);
            }

            let n = self.reader.read(self.buffer.spare_mut()).await?;
            if n == 0 {
                self.eof = true;
                tracing::debug!(buffered = self.buffer.len(), "end of stream");
                continue;
            }

            self.buffer.commit(n);
            tracing::trace!(bytes = n, buffered = self.buffer.len(), "read from reader");
        }
    }

    /// Write one line and flush it.
    pub async fn write_line(&mut self, payload: &[u8]) -> Result<()> {
        let frame = encode_line(payload, self.line_ending);
        self.writer.write_all(&frame).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the writer and release both halves.
    pub async fn close(mut self) -> Result<()> {
        self.buffer.clear();
        tracing::debug!(overflows = self.overflows, "async line pipe closed");
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Check whether the reader reached end of stream.
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

    /// Take back the reader and writer, discarding buffered bytes.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
