//! Line pipe configuration.

use crate::error::{PipeError, Result};
use crate::protocol::LineEnding;

/// Default accumulation buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Smallest capacity that still makes progress on overflow.
///
/// A forced line is `capacity - 1` bytes long, so anything smaller would
/// emit empty lines forever.
pub const MIN_CAPACITY: usize = 2;

/// Configuration for a [`LinePipe`](crate::LinePipe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Accumulation buffer capacity; also the longest line (minus one byte)
    /// that is delivered intact.
    pub capacity: usize,
    /// Terminator appended by `write_line`.
    pub line_ending: LineEnding,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            line_ending: LineEnding::platform(),
        }
    }
}

impl PipeConfig {
    /// Set the buffer capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the outgoing line terminator.
    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipeError::InvalidConfig`] if the capacity is below
    /// [`MIN_CAPACITY`].
    pub fn validate(&self) -> Result<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(PipeError::InvalidConfig(format!(
                "capacity {} is below minimum {}",
                self.capacity, MIN_CAPACITY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipeConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.line_ending, LineEnding::platform());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = PipeConfig::default()
            .with_capacity(8)
            .with_line_ending(LineEnding::CrLf);

        assert_eq!(config.capacity, 8);
        assert_eq!(config.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn test_capacity_validation() {
        assert!(PipeConfig::default().with_capacity(2).validate().is_ok());

        let err = PipeConfig::default().with_capacity(1).validate().unwrap_err();
        assert!(err.to_string().contains("below minimum"));
    }
}
