//! In-memory loopback transport.
//!
//! [`pair`] returns two connected endpoints: bytes written on one become
//! readable on the other. Useful for tests and for wiring two line pipes
//! together inside one process.
//!
//! # Example
//!
//! ```
//! use linepipe::transport::loopback;
//! use linepipe::LinePipe;
//!
//! let (left, right) = loopback::pair();
//! let mut left = LinePipe::open(left);
//! let mut right = LinePipe::open(right);
//!
//! left.write_line(b"ping").unwrap();
//! assert_eq!(&right.try_read_line().unwrap().unwrap()[..], b"ping");
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{closed_error, Transport};

/// One direction of a loopback pair.
#[derive(Debug, Default)]
struct Channel {
    data: VecDeque<u8>,
    /// Set when the writing end is closed or dropped.
    writer_closed: bool,
}

type Shared = Arc<Mutex<Channel>>;

fn lock(channel: &Shared) -> MutexGuard<'_, Channel> {
    channel.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One endpoint of an in-memory loopback pair.
#[derive(Debug)]
pub struct LoopbackTransport {
    rx: Shared,
    tx: Shared,
    read_chunk: usize,
    closed: bool,
}

/// Create two connected loopback endpoints.
pub fn pair() -> (LoopbackTransport, LoopbackTransport) {
    let a_to_b = Shared::default();
    let b_to_a = Shared::default();

    let a = LoopbackTransport::new(b_to_a.clone(), a_to_b.clone());
    let b = LoopbackTransport::new(a_to_b, b_to_a);
    (a, b)
}

impl LoopbackTransport {
    fn new(rx: Shared, tx: Shared) -> Self {
        Self {
            rx,
            tx,
            read_chunk: usize::MAX,
            closed: false,
        }
    }

    /// Cap the number of bytes a single read may return.
    ///
    /// Simulates a transport that delivers data in small fragments.
    pub fn with_read_chunk(mut self, max: usize) -> Self {
        self.read_chunk = max.max(1);
        self
    }

    /// Number of bytes written by the peer and not yet read.
    pub fn pending(&self) -> usize {
        lock(&self.rx).data.len()
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(closed_error())
        } else {
            Ok(())
        }
    }

    fn release(&mut self) {
        self.closed = true;
        lock(&self.tx).writer_closed = true;
    }
}

impl Transport for LoopbackTransport {
    fn available(&mut self) -> io::Result<bool> {
        self.ensure_open()?;
        let rx = lock(&self.rx);
        Ok(!rx.data.is_empty() || rx.writer_closed)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_open()?;
        let mut rx = lock(&self.rx);

        let n = buf.len().min(self.read_chunk).min(rx.data.len());
        for (slot, byte) in buf.iter_mut().zip(rx.data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.ensure_open()?;
        lock(&self.tx).data.extend(data);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_open()
    }

    fn close(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.release();
        Ok(())
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        if !self.closed {
            self.release();
        }
    }
}
