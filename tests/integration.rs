//! Integration tests for linepipe.
//!
//! These tests drive line pipes over real transports: loopback pairs and
//! spawned child processes.

use std::time::{Duration, Instant};

use linepipe::transport::loopback;
use linepipe::{
    ChildCommand, ChildTransport, LineEnding, LinePipe, PipeConfig, PipeError, Transport,
};

/// Poll until a line arrives or the deadline passes.
fn read_line_within<T: Transport>(pipe: &mut LinePipe<T>, timeout: Duration) -> Option<Vec<u8>> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(line) = pipe.try_read_line().unwrap() {
            return Some(line.to_vec());
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    None
}

/// Test the basic scenario: two terminated lines, then nothing.
#[test]
fn test_two_lines_small_capacity() {
    let (mut feeder, end) = loopback::pair();
    let config = PipeConfig::default().with_capacity(8);
    let mut pipe = LinePipe::with_config(end, config).unwrap();

    feeder.write_all(b"ab\ncd\n").unwrap();

    assert_eq!(pipe.try_read_line().unwrap().as_deref(), Some(&b"ab"[..]));
    assert_eq!(pipe.try_read_line().unwrap().as_deref(), Some(&b"cd"[..]));
    assert!(pipe.try_read_line().unwrap().is_none());
}

/// Test that a full buffer without a terminator yields C-1 bytes and keeps one.
#[test]
fn test_exact_capacity_overflow() {
    let (mut feeder, end) = loopback::pair();
    let config = PipeConfig::default().with_capacity(8);
    let mut pipe = LinePipe::with_config(end, config).unwrap();

    feeder.write_all(b"abcdefgh").unwrap();

    let forced = pipe.try_read_line().unwrap().unwrap();
    assert_eq!(&forced[..], b"abcdefg");
    assert_eq!(forced.len(), 7);
    assert_eq!(pipe.buffered(), b"h");
}

/// Test sustained unterminated input keeps making progress.
///
/// Every forced break lands wherever the buffer happens to fill, so the
/// lines after an overflow do not line up with what the peer sent. `nex`
/// and `t` are themselves a forced split of `next`.
#[test]
fn test_sustained_overflow_keeps_making_progress() {
    let (mut feeder, end) = loopback::pair();
    let config = PipeConfig::default().with_capacity(4);
    let mut pipe = LinePipe::with_config(end, config).unwrap();

    feeder.write_all(b"0123456789\nnext\n").unwrap();

    let mut lines = Vec::new();
    while let Some(line) = pipe.try_read_line().unwrap() {
        lines.push(line.to_vec());
    }

    assert_eq!(
        lines,
        vec![
            b"012".to_vec(),
            b"345".to_vec(),
            b"678".to_vec(),
            b"9".to_vec(),
            b"nex".to_vec(),
            b"t".to_vec(),
        ]
    );
    assert_eq!(pipe.overflow_count(), 4);
    assert!(pipe.buffered().is_empty());
}

/// Test write then read across a loopback pair, both terminators.
#[test]
fn test_loopback_round_trip() {
    for ending in [LineEnding::Lf, LineEnding::CrLf] {
        let (a, b) = loopback::pair();
        let config = PipeConfig::default().with_line_ending(ending);
        let mut writer = LinePipe::with_config(a, config).unwrap();
        let mut reader = LinePipe::open(b);

        writer.write_line(b"ping").unwrap();
        writer.write_line(b"").unwrap();
        writer.write_line(b"with spaces\tand tabs").unwrap();

        assert_eq!(reader.try_read_line().unwrap().as_deref(), Some(&b"ping"[..]));
        assert_eq!(reader.try_read_line().unwrap().as_deref(), Some(&b""[..]));
        assert_eq!(
            reader.try_read_line().unwrap().as_deref(),
            Some(&b"with spaces\tand tabs"[..])
        );
        assert!(reader.try_read_line().unwrap().is_none());
    }
}

/// Test fragmented delivery reassembles lines in order.
#[test]
fn test_fragmented_delivery() {
    let (mut feeder, end) = loopback::pair();
    let mut pipe = LinePipe::open(end.with_read_chunk(3));

    feeder.write_all(b"first line\r\nsecond\nthird").unwrap();

    let mut lines = Vec::new();
    for _ in 0..32 {
        if let Some(line) = pipe.try_read_line().unwrap() {
            lines.push(line.to_vec());
        }
    }

    assert_eq!(lines, vec![b"first line".to_vec(), b"second".to_vec()]);
    assert_eq!(pipe.buffered(), b"third");
}

/// Test closing a pipe is observed by the peer as end of stream.
#[test]
fn test_close_is_seen_as_eof() {
    let (a, b) = loopback::pair();
    let writer = LinePipe::open(a);
    let mut reader = LinePipe::open(b);

    writer.close().unwrap();

    assert!(reader.try_read_line().unwrap().is_none());
    assert!(reader.is_eof());
    reader.close().unwrap();
}

/// Test a child process echoing lines back.
#[cfg(unix)]
#[test]
fn test_child_process_echo() {
    let transport = ChildTransport::spawn(ChildCommand::new("cat")).unwrap();
    let mut pipe = LinePipe::open(transport);

    pipe.write_line(b"ping").unwrap();
    pipe.write_line(b"pong").unwrap();

    let timeout = Duration::from_secs(5);
    assert_eq!(read_line_within(&mut pipe, timeout).as_deref(), Some(&b"ping"[..]));
    assert_eq!(read_line_within(&mut pipe, timeout).as_deref(), Some(&b"pong"[..]));

    pipe.close().unwrap();
}

/// Test a child's stderr arrives on the same stream as its stdout.
#[cfg(unix)]
#[test]
fn test_child_stderr_merged() {
    let command = ChildCommand::new("sh").args(["-c", "echo out; echo err 1>&2; read x"]);
    let mut pipe = LinePipe::open(ChildTransport::spawn(command).unwrap());

    let timeout = Duration::from_secs(5);
    assert_eq!(read_line_within(&mut pipe, timeout).as_deref(), Some(&b"out"[..]));
    assert_eq!(read_line_within(&mut pipe, timeout).as_deref(), Some(&b"err"[..]));

    pipe.write_line(b"done").unwrap();
    pipe.close().unwrap();
}

/// Test the pipe reports EOF once the child exits.
#[cfg(unix)]
#[test]
fn test_child_exit_is_eof() {
    let command = ChildCommand::new("sh").args(["-c", "printf 'bye\\n'"]);
    let mut pipe = LinePipe::open(ChildTransport::spawn(command).unwrap());

    let timeout = Duration::from_secs(5);
    assert_eq!(read_line_within(&mut pipe, timeout).as_deref(), Some(&b"bye"[..]));

    let deadline = Instant::now() + timeout;
    while !pipe.is_eof() && Instant::now() < deadline {
        assert!(pipe.try_read_line().unwrap().is_none());
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(pipe.is_eof());

    assert!(pipe.transport_mut().wait().unwrap().success());
    pipe.close().unwrap();
}

/// Test spawn errors name the program.
#[test]
fn test_spawn_error() {
    let err = ChildTransport::spawn(ChildCommand::new("linepipe-no-such-program")).unwrap_err();

    assert!(matches!(err, PipeError::Spawn { .. }));
    assert!(err.to_string().contains("linepipe-no-such-program"));
}
