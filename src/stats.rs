//! Point-in-time view of a pool.
//!
//! Block counts come from walking the free lists, so taking a snapshot is
//! O(free blocks). The cumulative counters are plain fields on the pool; the
//! pool is single-threaded so no atomics are involved.

use crate::order::block_size;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
  pub arena_bytes: usize,
  pub free_bytes: usize,
  pub reserved_bytes: usize,
  pub reserved_blocks: usize,
  /// Indexed by order.
  pub free_blocks_per_order: Vec<usize>,
  pub splits: u64,
  pub merges: u64,
  pub failed_allocations: u64,
}

impl PoolStats {
  /// Free and reserved blocks together cover the whole arena. A torn-down
  /// pool reports zero for all three.
  pub fn is_conserved(
    &self,
  ) -> bool {
    self.free_bytes + self.reserved_bytes == self.arena_bytes
  }

  pub fn free_blocks(
    &self,
  ) -> usize {
    self.free_blocks_per_order.iter().sum()
  }

  /// Highest order with a free block, if any.
  pub fn largest_free_order(
    &self,
  ) -> Option<usize> {
    self.free_blocks_per_order.iter().rposition(|&count| count > 0)
  }

  pub(crate) fn free_bytes_from_counts(
    counts: &[usize],
  ) -> usize {
    counts
      .iter()
      .enumerate()
      .map(|(k, &count)| count * block_size(k))
      .sum()
  }
}
