//! Line terminators.

/// Line feed, the byte that ends every line on input.
pub const LF: u8 = b'\n';

/// Carriage return, stripped when it directly precedes [`LF`].
pub const CR: u8 = b'\r';

/// Terminator appended to outgoing lines.
///
/// Input framing always splits on `\n` and accepts either form; this only
/// affects what [`write_line`](crate::LinePipe::write_line) emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Native terminator of the current platform.
    pub const fn platform() -> Self {
        if cfg!(windows) {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// Terminator bytes.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Lf => b"\n",
            Self::CrLf => b"\r\n",
        }
    }
}

/// Append `payload` and the terminator into a single buffer.
///
/// One buffer means one `write_all` on the transport, so a line is never
/// split between two writes on our side.
pub fn encode_line(payload: &[u8], ending: LineEnding) -> Vec<u8> {
    let terminator = ending.as_bytes();
    let mut out = Vec::with_capacity(payload.len() + terminator.len());
    out.extend_from_slice(payload);
    out.extend_from_slice(terminator);
    out
}
