use std::io;

use thiserror::Error;

/// Errors reported by a [`BuddyPool`](crate::BuddyPool).
#[derive(Debug, Error)]
pub enum BuddyError {
  /// The operating system refused to map the arena.
  #[error("failed to map a {size}-byte arena: {source}")]
  ArenaMap {
    size: usize,
    #[source]
    source: io::Error,
  },

  /// `munmap` failed while tearing the pool down.
  #[error("failed to unmap the arena: {0}")]
  ArenaUnmap(#[source] io::Error),

  #[error("arena of {requested} bytes exceeds the largest supported order {max_order}")]
  ArenaTooLarge { requested: usize, max_order: usize },

  #[error("zero-byte allocation requested")]
  ZeroSize,

  /// No free block at or above the required order.
  #[error("out of memory (requested: {size} bytes)")]
  OutOfMemory { size: usize },

  /// The pointer was not issued by this pool, or its header is corrupt.
  #[error("invalid handle {addr:#x}")]
  InvalidHandle { addr: usize },

  #[error("double free detected at address {addr:#x}")]
  DoubleFree { addr: usize },

  #[error("pool has been torn down")]
  Destroyed,
}

pub type Result<T> = core::result::Result<T, BuddyError>;
