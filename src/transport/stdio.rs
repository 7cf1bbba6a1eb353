//! Ambient stdio transport.
//!
//! Reads from the process's stdin and writes to its stdout.
//!
//! # Important
//!
//! - On Unix and Windows stdin is read through a duplicated handle,
//!   bypassing the standard library's internal stdin buffer, so the
//!   readiness check sees exactly what a read will return
//! - **stdout** carries lines only; logs belong on stderr
//! - Every line is flushed before `write_line` returns

use std::io::{self, Read, Write};

use super::readiness::is_readable;
use super::{closed_error, Transport};

#[cfg(any(unix, windows))]
type Input = std::fs::File;

#[cfg(not(any(unix, windows)))]
type Input = io::Stdin;

/// Transport bound to the current process's stdin and stdout.
#[derive(Debug)]
pub struct StdioTransport {
    input: Option<Input>,
    output: Option<io::Stdout>,
}

impl StdioTransport {
    /// Attach to the current process's stdio.
    ///
    /// # Errors
    ///
    /// Returns IO error if the stdin handle cannot be duplicated.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            input: Some(open_input()?),
            output: Some(io::stdout()),
        })
    }
}

#[cfg(unix)]
fn open_input() -> io::Result<Input> {
    use std::os::fd::AsFd;

    let fd = io::stdin().as_fd().try_clone_to_owned()?;
    Ok(std::fs::File::from(fd))
}

#[cfg(windows)]
fn open_input() -> io::Result<Input> {
    use std::os::windows::io::AsHandle;

    let handle = io::stdin().as_handle().try_clone_to_owned()?;
    Ok(std::fs::File::from(handle))
}

#[cfg(not(any(unix, windows)))]
fn open_input() -> io::Result<Input> {
    Ok(io::stdin())
}

impl Transport for StdioTransport {
    fn available(&mut self) -> io::Result<bool> {
        let input = self.input.as_ref().ok_or_else(closed_error)?;
        is_readable(input)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.as_mut().ok_or_else(closed_error)?.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let output = self.output.as_ref().ok_or_else(closed_error)?;
        output.lock().write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        let output = self.output.as_ref().ok_or_else(closed_error)?;
        output.lock().flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let input = self.input.take();
        let output = self.output.take();
        if input.is_none() && output.is_none() {
            return Err(closed_error());
        }

        drop(input);
        match output {
            Some(out) => out.lock().flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_after_close_fails() {
        let mut transport = StdioTransport::new().unwrap();
        transport.close().unwrap();

        let err = transport.write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert!(transport.available().is_err());
        assert!(transport.close().is_err());
    }

    #[test]
    fn test_flush_does_not_fail() {
        let mut transport = StdioTransport::new().unwrap();
        assert!(transport.flush().is_ok());
    }
}
