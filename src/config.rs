use crate::{
  error::{BuddyError, Result},
  order::{MAX_K, arena_order},
};

/// Byte written over released payloads when scrubbing is enabled.
pub const SCRUB_BYTE: u8 = 0xDD;

/// Construction parameters for a [`BuddyPool`](crate::BuddyPool).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolConfig {
  /// Requested arena size, rounded up to a power of two of at least
  /// `2^MIN_K`. Zero selects `2^DEFAULT_K`. Default: 0.
  pub arena_bytes: usize,

  /// Overwrite payloads with [`SCRUB_BYTE`] on release. Default: false.
  pub scrub_on_release: bool,
}

impl PoolConfig {
  pub fn with_arena_bytes(
    mut self,
    bytes: usize,
  ) -> Self {
    self.arena_bytes = bytes;
    self
  }

  pub fn with_scrub_on_release(
    mut self,
    scrub: bool,
  ) -> Self {
    self.scrub_on_release = scrub;
    self
  }

  /// Order of the arena this config describes.
  pub fn arena_order(
    &self,
  ) -> Result<usize> {
    let k = arena_order(self.arena_bytes);

    if k >= MAX_K {
      return Err(BuddyError::ArenaTooLarge {
        requested: self.arena_bytes,
        max_order: MAX_K - 1,
      });
    }

    Ok(k)
  }

  pub fn validate(
    &self,
  ) -> Result<()> {
    self.arena_order().map(|_| ())
  }
}
