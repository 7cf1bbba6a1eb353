//! Protocol module - line framing.
//!
//! This module implements the byte-level line protocol:
//! - Fixed-capacity accumulation buffer with overflow cut-off
//! - Terminator constants and outgoing line encoding

mod line_buffer;
mod line_ending;

pub use line_buffer::LineBuffer;
pub use line_ending::{encode_line, LineEnding, CR, LF};
