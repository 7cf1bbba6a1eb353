//! Child process transport.
//!
//! Spawns a program with its stdin piped from us and its stdout and stderr
//! merged into a single pipe that we read from.
//!
//! # Example
//!
//! ```ignore
//! use linepipe::transport::{ChildCommand, ChildTransport};
//! use linepipe::LinePipe;
//!
//! let transport = ChildTransport::spawn(ChildCommand::new("./engine").arg("--quiet"))?;
//! let mut pipe = LinePipe::open(transport);
//! pipe.write_line(b"ucci")?;
//! ```

use std::ffi::{OsStr, OsString};
use std::io::{self, PipeReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use super::readiness::is_readable;
use super::{closed_error, first_error, Transport};
use crate::error::{PipeError, Result};

/// Description of a program to spawn behind a [`ChildTransport`].
///
/// Unless [`current_dir`](Self::current_dir) is set, the child runs in the
/// directory that contains the program, so engines that load data files
/// from their own directory find them.
#[derive(Debug, Clone)]
pub struct ChildCommand {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    current_dir: Option<PathBuf>,
}

impl ChildCommand {
    /// Create a command for `program`.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_owned(), value.as_ref().to_owned()));
        self
    }

    /// Run the child in `dir` instead of the program's own directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name as given.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Build the `std` command, resolving the working directory.
    fn to_command(&self) -> io::Result<Command> {
        let mut program = PathBuf::from(&self.program);
        let mut dir = self.current_dir.clone();

        if dir.is_none() {
            let has_parent = program
                .parent()
                .is_some_and(|p| !p.as_os_str().is_empty());
            if has_parent {
                // The path must stay valid once the working directory changes.
                program = std::path::absolute(&program)?;
                dir = program.parent().map(Path::to_path_buf);
            }
        }

        let mut command = Command::new(&program);
        command.args(&self.args);
        command.envs(self.envs.iter().map(|(k, v)| (k, v)));
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        Ok(command)
    }
}

/// Transport bound to a spawned child's stdio.
///
/// [`close`](Transport::close) releases both pipes but leaves a child that
/// is still running alone. Dropping the transport reaps the child, killing
/// it first if it has not exited; call [`wait`](Self::wait) before that to
/// let it finish on its own.
#[derive(Debug)]
pub struct ChildTransport {
    child: Child,
    /// Read end of the merged stdout/stderr pipe.
    input: Option<PipeReader>,
    output: Option<ChildStdin>,
}

impl ChildTransport {
    /// Spawn the program and connect to its stdio.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::Spawn`] if the program cannot be started and
    /// [`PipeError::Io`] if the pipes cannot be created.
    pub fn spawn(command: ChildCommand) -> Result<Self> {
        let program = command.program().to_string_lossy().into_owned();
        let spawn_err = |source: io::Error| PipeError::Spawn {
            program: program.clone(),
            source,
        };

        let (reader, writer) = io::pipe()?;

        let mut child = {
            let mut cmd = command.to_command().map_err(spawn_err)?;
            cmd.stdin(Stdio::piped())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            // `cmd` is dropped at the end of this block, closing our copies of
            // the write end so the reader sees EOF when the child exits.
            cmd.spawn().map_err(spawn_err)?
        };

        let output = child.stdin.take().ok_or_else(|| {
            spawn_err(io::Error::new(io::ErrorKind::BrokenPipe, "child stdin not captured"))
        })?;

        tracing::debug!(pid = child.id(), program = %program, "spawned child process");

        Ok(Self {
            child,
            input: Some(reader),
            output: Some(output),
        })
    }

    /// OS process id of the child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait for the child to exit.
    ///
    /// Closes the child's stdin first if it is still open, so a child that
    /// exits on end of input does not deadlock the wait.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        drop(self.output.take());
        self.child.wait()
    }
}

impl Transport for ChildTransport {
    fn available(&mut self) -> io::Result<bool> {
        let input = self.input.as_ref().ok_or_else(closed_error)?;
        is_readable(input)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.as_mut().ok_or_else(closed_error)?.read(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.output.as_mut().ok_or_else(closed_error)?.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.as_mut().ok_or_else(closed_error)?.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let input = self.input.take();
        let output = self.output.take();
        if input.is_none() && output.is_none() {
            return Err(closed_error());
        }

        let mut result = match output {
            Some(mut stdin) => stdin.flush(),
            None => Ok(()),
        };
        drop(input);

        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(pid = self.child.id(), %status, "child process exited");
            }
            Ok(None) => {
                tracing::debug!(pid = self.child.id(), "child process still running");
            }
            Err(e) => result = first_error(result, Err(e)),
        }

        result
    }
}

impl Drop for ChildTransport {
    fn drop(&mut self) {
        drop(self.output.take());
        drop(self.input.take());

        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(pid = self.child.id(), "killing child process on drop");
                let reaped = self.child.kill().and_then(|()| self.child.wait());
                if let Err(e) = reaped {
                    tracing::warn!(pid = self.child.id(), error = %e, "failed to reap child process");
                }
            }
            Err(e) => {
                tracing::warn!(pid = self.child.id(), error = %e, "failed to reap child process");
            }
        }
    }
}
