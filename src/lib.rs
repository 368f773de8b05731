//! # rbuddy - A Buddy-System Memory Pool
//!
//! This crate provides a fixed-capacity **buddy allocator** that carves a single
//! power-of-two arena, mapped once with `mmap(2)`, into power-of-two blocks.
//!
//! ## Overview
//!
//! Every block has an *order* `k` and spans `2^k` bytes. A request is rounded up
//! to the smallest order that fits it plus a block header. Larger free blocks
//! are split in half until the target order is reached; on release a block is
//! merged with its *buddy* for as long as the buddy is free too.
//!
//! ```text
//!   Splitting an order-4 arena to serve an order-2 request:
//!
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                            k = 4                              │
//!   └───────────────────────────────────────────────────────────────┘
//!                                   │ split
//!   ┌───────────────────────────────┬───────────────────────────────┐
//!   │             k = 3             │          k = 3 (free)         │
//!   └───────────────────────────────┴───────────────────────────────┘
//!                   │ split
//!   ┌───────────────┬───────────────┬───────────────────────────────┐
//!   │ k = 2 (used)  │ k = 2 (free)  │          k = 3 (free)         │
//!   └───────────────┴───────────────┴───────────────────────────────┘
//!
//!   The buddy of the block at offset `o` with order `k` sits at `o ^ 2^k`.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rbuddy
//!   ├── order   - Order arithmetic (order_for, arena_order, buddy_offset)
//!   ├── block   - In-place block header (internal)
//!   ├── list    - Intrusive circular free lists (internal)
//!   ├── arena   - mmap-backed memory region (internal)
//!   ├── config  - PoolConfig
//!   ├── stats   - PoolStats
//!   ├── error   - BuddyError
//!   └── buddy   - BuddyPool implementation
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rbuddy::BuddyPool;
//!
//! let mut pool = BuddyPool::new(1 << 20).unwrap();
//!
//! let ptr = pool.malloc(100).unwrap();
//! unsafe {
//!   ptr.as_ptr().write_bytes(0x42, 100);
//!
//!   let grown = pool.realloc(ptr.as_ptr(), 4000).unwrap().unwrap();
//!   assert_eq!(*grown.as_ptr().add(99), 0x42);
//!
//!   pool.free(grown.as_ptr()).unwrap();
//! }
//!
//! assert_eq!(pool.free_blocks(pool.kval_m()), 1);
//! ```
//!
//! ## Block Layout
//!
//! ```text
//!   ┌───────────────────────────┬──────────────────────────────────┐
//!   │       Block Header        │             Payload              │
//!   │  ┌─────────────────────┐  │                                  │
//!   │  │ tag: Reserved/Avail │  │   2^k - HEADER_SIZE bytes usable │
//!   │  │ kval: k             │  │                                  │
//!   │  │ magic               │  │                                  │
//!   │  │ next / prev         │  │                                  │
//!   │  └─────────────────────┘  │                                  │
//!   │      24 bytes             │                                  │
//!   └───────────────────────────┴──────────────────────────────────┘
//!                               ▲
//!                               └── Pointer returned to the caller
//! ```
//!
//! `next` and `prev` thread free blocks into one circular list per order. The
//! lists are anchored by sentinels that live outside the arena.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the pool is `Send` but not `Sync`
//! - **Fixed capacity**: the arena never grows
//! - **No compaction**: free space split across non-buddy blocks cannot
//!   satisfy a larger request
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Safety
//!
//! Releasing and resizing take raw pointers and are `unsafe`. Headers are
//! checked before use, so foreign pointers and most double frees come back as
//! errors instead of corrupting the free lists.

#[cfg(not(unix))]
compile_error!("rbuddy requires a unix target with mmap.");

mod arena;
mod block;
mod buddy;
mod config;
mod error;
mod list;
mod order;
mod stats;

pub use block::HEADER_SIZE;
pub use buddy::BuddyPool;
pub use config::{PoolConfig, SCRUB_BYTE};
pub use error::{BuddyError, Result};
pub use order::{DEFAULT_K, MAX_K, MIN_K, SMALLEST_K, arena_order, block_size, buddy_offset, order_for, usable_size};
pub use stats::PoolStats;
