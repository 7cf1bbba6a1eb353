//! Zero-timeout readiness check for OS input handles.
//!
//! - Unix: `poll(2)` with a zero timeout
//! - Windows: `PeekNamedPipe` for pipes, the console input queue for
//!   consoles; disk files are always ready
//! - Other platforms: always ready

#[cfg(unix)]
mod unix_impl {
    use std::io;
    use std::os::fd::AsFd;

    use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

    /// Check whether a read on `fd` would return without blocking.
    ///
    /// Hang-up and error conditions count as ready: the next read reports
    /// them as end of stream or as an error.
    pub fn is_readable<F: AsFd>(fd: &F) -> io::Result<bool> {
        let mut fds = [PollFd::new(fd.as_fd(), PollFlags::POLLIN)];

        loop {
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return Ok(false),
                Ok(_) => break,
                Err(nix::errno::Errno::EINTR) => continue,
                Err(errno) => return Err(io::Error::from(errno)),
            }
        }

        let ready = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
        Ok(fds[0]
            .revents()
            .is_some_and(|revents| revents.intersects(ready)))
    }
}

#[cfg(unix)]
pub use unix_impl::is_readable;

#[cfg(windows)]
mod windows_impl {
    use std::io;
    use std::os::windows::io::{AsHandle, AsRawHandle};
    use std::ptr;

    use windows_sys::Win32::Foundation::{ERROR_BROKEN_PIPE, HANDLE};
    use windows_sys::Win32::Storage::FileSystem::{GetFileType, FILE_TYPE_CHAR, FILE_TYPE_PIPE};
    use windows_sys::Win32::System::Console::{GetConsoleMode, GetNumberOfConsoleInputEvents};
    use windows_sys::Win32::System::Pipes::PeekNamedPipe;

    /// Check whether a read on `handle` would return without blocking.
    ///
    /// A pipe whose writer has gone away counts as ready: the next read
    /// reports end of stream.
    pub fn is_readable<H: AsHandle>(handle: &H) -> io::Result<bool> {
        let raw = handle.as_handle().as_raw_handle() as HANDLE;

        // SAFETY: `raw` is borrowed from a live handle for the whole call.
        match unsafe { GetFileType(raw) } {
            FILE_TYPE_PIPE => pipe_readable(raw),
            FILE_TYPE_CHAR => console_readable(raw),
            _ => Ok(true),
        }
    }

    fn pipe_readable(raw: HANDLE) -> io::Result<bool> {
        let mut available: u32 = 0;
        // SAFETY: no buffer is passed; only the byte count is written.
        let ok = unsafe {
            PeekNamedPipe(
                raw,
                ptr::null_mut(),
                0,
                ptr::null_mut(),
                &mut available,
                ptr::null_mut(),
            )
        };
        if ok != 0 {
            return Ok(available > 0);
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(ERROR_BROKEN_PIPE as i32) {
            return Ok(true);
        }
        Err(err)
    }

    fn console_readable(raw: HANDLE) -> io::Result<bool> {
        let mut mode = 0;
        // SAFETY: `mode` outlives the call.
        if unsafe { GetConsoleMode(raw, &mut mode) } == 0 {
            // Character device that is not a console (e.g. NUL).
            return Ok(true);
        }

        let mut events: u32 = 0;
        // SAFETY: `events` outlives the call.
        if unsafe { GetNumberOfConsoleInputEvents(raw, &mut events) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(events > 0)
    }
}

#[cfg(windows)]
pub use windows_impl::is_readable;

/// Always ready on platforms without a zero-timeout peek.
#[cfg(not(any(unix, windows)))]
pub fn is_readable<F>(_handle: &F) -> std::io::Result<bool> {
    Ok(true)
}

#[cfg(all(test, any(unix, windows)))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_pipe_is_not_readable() {
        let (reader, _writer) = std::io::pipe().unwrap();
        assert!(!is_readable(&reader).unwrap());
    }

    #[test]
    fn test_pipe_with_data_is_readable() {
        let (reader, mut writer) = std::io::pipe().unwrap();
        writer.write_all(b"x").unwrap();
        assert!(is_readable(&reader).unwrap());
    }

    #[test]
    fn test_hung_up_pipe_is_readable() {
        let (reader, writer) = std::io::pipe().unwrap();
        drop(writer);
        assert!(is_readable(&reader).unwrap());
    }

    #[test]
    fn test_regular_file_is_readable() {
        let path = std::env::temp_dir().join(format!("linepipe-ready-{}", std::process::id()));
        std::fs::write(&path, b"").unwrap();

        let file = std::fs::File::open(&path).unwrap();
        assert!(is_readable(&file).unwrap());

        drop(file);
        std::fs::remove_file(&path).unwrap();
    }
}
