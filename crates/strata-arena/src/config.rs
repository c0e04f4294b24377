//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for node sizing.
///
/// Every node the arena creates on overflow is sized as
///
/// ```text
/// (prev_usable + size + align + node_slack) * growth_percent / 100
/// ```
///
/// where `prev_usable` is the usable length of the node being abandoned.
/// Folding the previous node's size into the next one makes node sizes
/// grow geometrically, so a long allocation sequence costs an amortized
/// constant number of backing-allocator calls.
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Fixed number of bytes added to every new node.
    ///
    /// Default: 32.
    pub node_slack: usize,

    /// Growth factor applied to new nodes, in percent.
    ///
    /// Default: 150. Must be at least 100.
    pub growth_percent: u32,

    /// Usable bytes of a node created eagerly at construction.
    ///
    /// Default: 0 (the first node is created by the first allocation).
    pub initial_capacity: usize,
}

impl ArenaConfig {
    /// Default fixed slack per node.
    pub const DEFAULT_NODE_SLACK: usize = 32;

    /// Default growth factor (×1.5).
    pub const DEFAULT_GROWTH_PERCENT: u32 = 150;

    /// Create a config with default node sizing and no initial node.
    pub fn new() -> Self {
        Self {
            node_slack: Self::DEFAULT_NODE_SLACK,
            growth_percent: Self::DEFAULT_GROWTH_PERCENT,
            initial_capacity: 0,
        }
    }

    /// Default config that pre-allocates `bytes` of usable capacity.
    pub fn with_initial_capacity(bytes: usize) -> Self {
        Self {
            initial_capacity: bytes,
            ..Self::new()
        }
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.growth_percent < 100 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "growth_percent must be >= 100 (got {}); \
                     a smaller node could not hold the request that created it",
                    self.growth_percent,
                ),
            });
        }
        Ok(())
    }

    /// Length of the node created after a node of `prev_usable` bytes
    /// overflowed on a request needing at most `min_size` bytes.
    ///
    /// Returns `None` on arithmetic overflow.
    pub(crate) fn node_len(&self, prev_usable: usize, min_size: usize) -> Option<usize> {
        let big_enough = prev_usable
            .checked_add(min_size)?
            .checked_add(self.node_slack)?;
        let scaled = big_enough as u128 * u128::from(self.growth_percent) / 100;
        usize::try_from(scaled).ok()
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new()
    }
}
