//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing allocator refused both in-place growth of the head node
    /// and a fresh node large enough for the request.
    OutOfMemory {
        /// Number of bytes the caller asked for.
        requested: usize,
        /// Alignment the caller asked for.
        align: usize,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) value is out of range.
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested, align } => {
                write!(
                    f,
                    "arena out of memory: requested {requested} bytes at alignment {align}"
                )
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}
