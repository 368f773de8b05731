//! Order arithmetic.
//!
//! A block of order `k` spans `2^k` bytes, header included. Every function in
//! this module is pure.

use crate::block::HEADER_SIZE;

/// Smallest block order. A 64-byte block comfortably holds one header.
pub const SMALLEST_K: usize = 6;

/// Smallest arena order (1 MiB).
pub const MIN_K: usize = 20;

/// Arena order used when the caller asks for zero bytes (1 GiB).
pub const DEFAULT_K: usize = 30;

/// Size of the free-list table. Valid orders are `SMALLEST_K..MAX_K`.
pub const MAX_K: usize = 48;

/// Returned instead of overflowing; always past `MAX_K`.
const OVERFLOW_K: usize = usize::BITS as usize;

/// Bytes spanned by a block of order `k`, header included.
///
/// # Panics
///
/// Panics if `2^k` does not fit in a `usize`.
#[inline]
pub const fn block_size(
  k: usize,
) -> usize {
  assert!(k < OVERFLOW_K, "block order exceeds the address width");
  1 << k
}

/// Bytes a caller may use in a block of order `k`.
///
/// # Panics
///
/// Panics if `k` is outside `SMALLEST_K..MAX_K`.
#[inline]
pub const fn usable_size(
  k: usize,
) -> usize {
  assert!(k >= SMALLEST_K && k < MAX_K, "block order outside SMALLEST_K..MAX_K");
  block_size(k) - HEADER_SIZE
}

/// Smallest order whose block holds `size` payload bytes plus the header.
///
/// # Examples
///
/// ```rust
/// use rbuddy::{SMALLEST_K, order_for, usable_size};
///
/// assert_eq!(order_for(1), SMALLEST_K);
/// assert!(usable_size(order_for(1000)) >= 1000);
/// ```
pub fn order_for(
  size: usize,
) -> usize {
  size
    .checked_add(HEADER_SIZE)
    .and_then(usize::checked_next_power_of_two)
    .map_or(OVERFLOW_K, |bytes| (bytes.trailing_zeros() as usize).max(SMALLEST_K))
}

/// Order of an arena able to hold `bytes`; zero selects [`DEFAULT_K`].
pub fn arena_order(
  bytes: usize,
) -> usize {
  if bytes == 0 {
    return DEFAULT_K;
  }

  bytes
    .checked_next_power_of_two()
    .map_or(OVERFLOW_K, |bytes| (bytes.trailing_zeros() as usize).max(MIN_K))
}

/// Arena offset of the buddy of the order-`k` block at `offset`.
#[inline]
pub const fn buddy_offset(
  offset: usize,
  k: usize,
) -> usize {
  offset ^ block_size(k)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_order_for_small_sizes() {
    assert_eq!(order_for(0), SMALLEST_K);
    assert_eq!(order_for(1), SMALLEST_K);
    assert_eq!(order_for(usable_size(SMALLEST_K)), SMALLEST_K);
    assert_eq!(order_for(usable_size(SMALLEST_K) + 1), SMALLEST_K + 1);
  }

  #[test]
  fn test_order_for_is_tight() {
    for size in 1..20_000 {
      let k = order_for(size);

      assert!(usable_size(k) >= size, "order {k} too small for {size}");

      if k > SMALLEST_K {
        assert!(usable_size(k - 1) < size, "order {k} not minimal for {size}");
      }
    }
  }

  #[test]
  fn test_order_for_exact_powers() {
    for k in SMALLEST_K..MAX_K {
      assert_eq!(order_for(usable_size(k)), k);
      assert_eq!(order_for(usable_size(k) + 1), k + 1);
    }
  }

  #[test]
  fn test_order_for_overflow() {
    assert!(order_for(usize::MAX) >= MAX_K);
    assert!(order_for(usize::MAX - HEADER_SIZE) >= MAX_K);
  }

  #[test]
  fn test_arena_order() {
    assert_eq!(arena_order(0), DEFAULT_K);
    assert_eq!(arena_order(1), MIN_K);
    assert_eq!(arena_order(1 << MIN_K), MIN_K);
    assert_eq!(arena_order((1 << MIN_K) + 1), MIN_K + 1);
    assert_eq!(arena_order(3 << 24), 26);
    assert!(arena_order(usize::MAX) >= MAX_K);
  }

  #[test]
  #[should_panic(expected = "block order outside")]
  fn test_usable_size_below_smallest_order() {
    usable_size(3);
  }

  #[test]
  #[should_panic(expected = "block order outside")]
  fn test_usable_size_past_table() {
    usable_size(MAX_K);
  }

  #[test]
  #[should_panic(expected = "exceeds the address width")]
  fn test_block_size_past_address_width() {
    block_size(usize::BITS as usize);
  }

  #[test]
  fn test_buddy_offset_involution() {
    let top = MIN_K + 2;

    for k in SMALLEST_K..top {
      let mut offset = 0;
      while offset < block_size(top) {
        let buddy = buddy_offset(offset, k);

        assert_ne!(buddy, offset);
        assert_eq!(buddy_offset(buddy, k), offset);
        assert_eq!(buddy.abs_diff(offset), block_size(k));

        offset += block_size(k) * 7;
      }
    }
  }
}
