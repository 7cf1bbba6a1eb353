//! # linepipe
//!
//! Non-blocking, line-oriented I/O over stdio or a child process's pipes.
//!
//! A [`LinePipe`] sits on top of a [`Transport`] and turns its byte stream
//! into lines, with a fixed memory bound and no blocking reads.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): fixed-capacity accumulation buffer, `\n`
//!   splitting, `\r` stripping, forced line break on overflow
//! - **Transport** ([`transport`]): ambient stdio, spawned child process
//!   (stderr merged into stdout), in-memory loopback
//! - **Pipes**: [`LinePipe`] for polling loops, [`AsyncLinePipe`] for tokio
//!
//! ## Example
//!
//! ```
//! use linepipe::transport::loopback;
//! use linepipe::LinePipe;
//!
//! let (a, b) = loopback::pair();
//! let mut a = LinePipe::open(a);
//! let mut b = LinePipe::open(b);
//!
//! a.write_line(b"ping").unwrap();
//! let line = b.try_read_line().unwrap();
//! assert_eq!(line.as_deref(), Some(&b"ping"[..]));
//! assert!(b.try_read_line().unwrap().is_none());
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

mod async_pipe;
mod pipe;

pub use async_pipe::AsyncLinePipe;
pub use config::{PipeConfig, DEFAULT_CAPACITY};
pub use error::{PipeError, Result};
pub use pipe::LinePipe;
pub use protocol::LineEnding;
pub use transport::{ChildCommand, ChildTransport, StdioTransport, Transport};
