//! Echo driver - relays every line back until an empty line arrives.
//!
//! This example demonstrates:
//! - Opening a line pipe over stdio, or over a spawned program's pipes
//! - The polling loop: read, sleep briefly when idle, stop on an empty line
//! - Logging to stderr so stdout carries only lines
//!
//! # Running
//!
//! ```text
//! $ printf 'hello\nworld\n\n' | cargo run --example echo
//! hello
//! world
//! ```
//!
//! With an argument, the named program is spawned instead: stdin lines are
//! forwarded to it and its output lines are logged to stderr.

use std::time::Duration;

use linepipe::{ChildCommand, ChildTransport, LinePipe, StdioTransport, Transport};
use tracing_subscriber::EnvFilter;

/// Idle pause between polls when no line is available.
const IDLE: Duration = Duration::from_millis(1);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut stdio = LinePipe::open(StdioTransport::new()?);

    match std::env::args_os().nth(1) {
        None => echo(&mut stdio)?,
        Some(program) => {
            let child = ChildTransport::spawn(ChildCommand::new(program))?;
            let mut child = LinePipe::open(child);
            forward(&mut stdio, &mut child)?;
            child.close()?;
        }
    }

    stdio.close()?;
    Ok(())
}

/// Write every line back to where it came from.
fn echo<T: Transport>(pipe: &mut LinePipe<T>) -> linepipe::Result<()> {
    loop {
        match pipe.try_read_line()? {
            None if pipe.is_eof() => return Ok(()),
            None => std::thread::sleep(IDLE),
            Some(line) if line.is_empty() => return Ok(()),
            Some(line) => pipe.write_line(&line)?,
        }
    }
}

/// Forward stdin lines to the child and report the child's lines.
fn forward<A: Transport, B: Transport>(
    input: &mut LinePipe<A>,
    child: &mut LinePipe<B>,
) -> linepipe::Result<()> {
    loop {
        let mut idle = true;

        match input.try_read_line()? {
            Some(line) if line.is_empty() => return Ok(()),
            Some(line) => {
                child.write_line(&line)?;
                idle = false;
            }
            None if input.is_eof() => return Ok(()),
            None => {}
        }

        if let Some(line) = child.try_read_line()? {
            tracing::info!(line = %String::from_utf8_lossy(&line), "child");
            idle = false;
        }

        if idle {
            std::thread::sleep(IDLE);
        }
    }
}
