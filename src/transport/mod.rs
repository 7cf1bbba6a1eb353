//! Transport module - byte sources and sinks for a line pipe.
//!
//! Provides one [`Transport`] contract over:
//! - The current process's stdin/stdout ([`StdioTransport`])
//! - A spawned child process with stderr merged into stdout ([`ChildTransport`])
//! - An in-memory connected pair ([`loopback::pair`])

mod child;
pub mod loopback;
mod readiness;
mod stdio;

pub use child::{ChildCommand, ChildTransport};
pub use loopback::LoopbackTransport;
pub use stdio::StdioTransport;

use std::io;

/// A bidirectional byte stream that can be polled without blocking.
///
/// The input side is only read after [`available`](Transport::available)
/// reports data, so `read` is expected to return promptly. Synchronization
/// between the two sides, if they are driven separately, is the
/// implementation's concern.
pub trait Transport {
    /// Check whether the input side has bytes (or end of stream) ready now.
    ///
    /// Must not block.
    fn available(&mut self) -> io::Result<bool>;

    /// Read up to `buf.len()` bytes from the input side.
    ///
    /// Returns `Ok(0)` at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data` to the output side.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Push buffered output to the peer.
    fn flush(&mut self) -> io::Result<()>;

    /// Release the input and output sides.
    ///
    /// Both sides are released even if releasing one of them fails; the
    /// first failure is returned. Calling any other method afterwards
    /// fails with [`closed_error`].
    fn close(&mut self) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn available(&mut self) -> io::Result<bool> {
        (**self).available()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Error returned by a transport used after [`Transport::close`].
///
/// Converts into [`PipeError::Closed`](crate::PipeError::Closed).
pub fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, ClosedMarker)
}

/// Inner payload of [`closed_error`], recognised when mapping to `PipeError`.
#[derive(Debug)]
pub(crate) struct ClosedMarker;

impl std::fmt::Display for ClosedMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("transport closed")
    }
}

impl std::error::Error for ClosedMarker {}

/// Keep the first error of a multi-step release.
pub(crate) fn first_error(acc: io::Result<()>, next: io::Result<()>) -> io::Result<()> {
    match acc {
        Err(e) => Err(e),
        Ok(()) => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxed_transport() {
        let (a, mut b) = loopback::pair();
        let mut boxed: Box<dyn Transport> = Box::new(a);

        boxed.write_all(b"hi").unwrap();
        boxed.flush().unwrap();
        assert!(b.available().unwrap());

        boxed.close().unwrap();
        assert!(boxed.available().is_err());
    }

    #[test]
    fn test_first_error_keeps_first() {
        let first = io::Error::other("first");
        let second = io::Error::other("second");

        let err = first_error(Err(first), Err(second)).unwrap_err();
        assert_eq!(err.to_string(), "first");
        assert!(first_error(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn test_closed_error_maps_to_pipe_error() {
        let err = crate::PipeError::from_transport(closed_error());
        assert!(matches!(err, crate::PipeError::Closed));

        let err = crate::PipeError::from_transport(io::Error::other("boom"));
        assert!(matches!(err, crate::PipeError::Io(_)));
    }
}
