use std::ptr::{self, NonNull};

use crate::{
  arena::Arena,
  block::{BLOCK_MAGIC, Block, HEADER_SIZE, Tag},
  config::{PoolConfig, SCRUB_BYTE},
  error::{BuddyError, Result},
  list,
  order::{MAX_K, SMALLEST_K, block_size, buddy_offset, order_for, usable_size},
  stats::PoolStats,
};

/// A buddy allocator over one fixed-size arena.
///
/// The pool is not internally synchronized. Share it between threads only
/// behind a lock.
pub struct BuddyPool {
  kval_m: usize,
  numbytes: usize,
  base: *mut u8,
  arena: Option<Arena>,
  /// `MAX_K` sentinels, heap allocated so free blocks can point at them
  /// while the pool itself moves.
  avail: NonNull<Block>,
  scrub_on_release: bool,
  reserved_bytes: usize,
  reserved_blocks: usize,
  splits: u64,
  merges: u64,
  failed_allocations: u64,
}

// Safety: the pool exclusively owns its arena and sentinels.
unsafe impl Send for BuddyPool {}

impl BuddyPool {
  /// Creates a pool whose arena holds at least `bytes` bytes.
  pub fn new(
    bytes: usize,
  ) -> Result<Self> {
    Self::with_config(PoolConfig::default().with_arena_bytes(bytes))
  }

  pub fn with_config(
    config: PoolConfig,
  ) -> Result<Self> {
    let kval_m = config.arena_order()?;
    let numbytes = block_size(kval_m);
    let arena = Arena::map(numbytes)?;
    let base = arena.base().as_ptr();

    let sentinels: Box<[Block]> = (0..MAX_K).map(|k| Block::new(Tag::Unused, k)).collect();
    let avail = NonNull::from(Box::leak(sentinels)).cast::<Block>();

    let pool = Self {
      kval_m,
      numbytes,
      base,
      arena: Some(arena),
      avail,
      scrub_on_release: config.scrub_on_release,
      reserved_bytes: 0,
      reserved_blocks: 0,
      splits: 0,
      merges: 0,
      failed_allocations: 0,
    };

    unsafe {
      for k in 0..MAX_K {
        list::init(pool.sentinel(k));
      }

      let block = base as *mut Block;
      block.write(Block::new(Tag::Avail, kval_m));
      list::push_front(pool.sentinel(kval_m), block);
    }

    log::debug!("[buddy] pool ready base={:p} kval_m={} numbytes={}", base, kval_m, numbytes);

    Ok(pool)
  }

  /// Order of the whole arena.
  pub fn kval_m(
    &self,
  ) -> usize {
    self.kval_m
  }

  /// Arena size in bytes, always `2^kval_m`.
  pub fn numbytes(
    &self,
  ) -> usize {
    self.numbytes
  }

  /// Start of the arena, or `None` after [`destroy`](Self::destroy).
  pub fn base(
    &self,
  ) -> Option<NonNull<u8>> {
    NonNull::new(self.base)
  }

  pub fn is_destroyed(
    &self,
  ) -> bool {
    self.base.is_null()
  }

  /// Reserves a block with room for `size` bytes.
  ///
  /// The returned region holds `2^k - HEADER_SIZE` bytes where
  /// `k = order_for(size)`, and stays valid until it is freed or the pool is
  /// destroyed. On failure the free lists are untouched.
  pub fn malloc(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if self.is_destroyed() {
      return Err(BuddyError::Destroyed);
    }

    if size == 0 {
      return Err(BuddyError::ZeroSize);
    }

    let k = order_for(size);

    if k > self.kval_m {
      return Err(self.out_of_memory(size));
    }

    let found = (k..=self.kval_m).find(|&i| unsafe { !list::is_empty(self.sentinel(i)) });

    let Some(mut i) = found else {
      return Err(self.out_of_memory(size));
    };

    unsafe {
      while i > k {
        self.split(i);
        i -= 1;
      }

      let block = list::pop_front(self.sentinel(k));
      (*block).set_tag(Tag::Reserved);

      self.reserved_bytes += block_size(k);
      self.reserved_blocks += 1;

      let payload = Block::payload(block);
      log::trace!("[buddy] malloc({}) -> {:p} k={}", size, payload, k);

      Ok(NonNull::new_unchecked(payload))
    }
  }

  /// Returns a block to the pool, merging it with free buddies.
  ///
  /// Null is a no-op. Pointers that do not name a reserved block of this
  /// pool are rejected without touching the free lists.
  ///
  /// # Safety
  ///
  /// `ptr` must not be used after a successful call. The header checks catch
  /// foreign and stale pointers in most cases but cannot rule out a pointer
  /// whose block was freed and then handed out again.
  pub unsafe fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<()> {
    if ptr.is_null() {
      return Ok(());
    }

    let block = self
      .reserved_block(ptr)
      .inspect_err(|err| log::warn!("[buddy] free({:p}) rejected: {}", ptr, err))?;

    unsafe { self.release(block) };

    Ok(())
  }

  /// Resizes the block at `ptr`.
  ///
  /// Null behaves as [`malloc`](Self::malloc); a `size` of zero frees the
  /// block and returns `None`. If the current block is big enough the same
  /// pointer comes back. Otherwise the contents move to a fresh block and the
  /// old one is freed. When no fresh block is available the original is left
  /// as it was.
  ///
  /// # Safety
  ///
  /// Same contract as [`free`](Self::free). On a move, `ptr` is dangling
  /// afterwards.
  pub unsafe fn realloc(
    &mut self,
    ptr: *mut u8,
    size: usize,
  ) -> Result<Option<NonNull<u8>>> {
    if size == 0 {
      unsafe { self.free(ptr)? };
      return Ok(None);
    }

    if ptr.is_null() {
      return self.malloc(size).map(Some);
    }

    let block = self
      .reserved_block(ptr)
      .inspect_err(|err| log::warn!("[buddy] realloc({:p}) rejected: {}", ptr, err))?;

    let k = unsafe { (*block).order() };

    if usable_size(k) >= size {
      log::trace!("[buddy] realloc({:p}, {}) fits k={}, same ptr", ptr, size, k);
      return Ok(NonNull::new(ptr));
    }

    let fresh = self.malloc(size)?;

    unsafe {
      ptr::copy_nonoverlapping(ptr, fresh.as_ptr(), usable_size(k).min(size));
      self.release(block);
    }

    log::trace!("[buddy] realloc({:p}, {}) moved to {:p}", ptr, size, fresh);

    Ok(Some(fresh))
  }

  /// Usable bytes behind a pointer returned by this pool.
  pub fn usable_size(
    &self,
    ptr: NonNull<u8>,
  ) -> Result<usize> {
    let block = self.reserved_block(ptr.as_ptr())?;
    Ok(usable_size(unsafe { (*block).order() }))
  }

  /// Unmaps the arena. Calling it again is a no-op.
  ///
  /// Every pointer handed out by the pool dangles afterwards, and further
  /// calls report [`BuddyError::Destroyed`].
  pub fn destroy(
    &mut self,
  ) -> Result<()> {
    let Some(arena) = self.arena.take() else {
      return Ok(());
    };

    log::debug!("[buddy] tearing down pool base={:p} len={}", self.base, arena.len());

    self.base = ptr::null_mut();
    self.reserved_bytes = 0;
    self.reserved_blocks = 0;

    for k in 0..MAX_K {
      unsafe { list::init(self.sentinel(k)) };
    }

    arena.unmap()
  }

  /// Number of free blocks of order `k`.
  pub fn free_blocks(
    &self,
    k: usize,
  ) -> usize {
    if k >= MAX_K {
      return 0;
    }

    unsafe { list::len(self.sentinel(k)) }
  }

  pub fn stats(
    &self,
  ) -> PoolStats {
    let counts: Vec<usize> = (0..MAX_K).map(|k| self.free_blocks(k)).collect();

    // A torn-down pool tracks no bytes at all.
    let arena_bytes = if self.is_destroyed() { 0 } else { self.numbytes };

    PoolStats {
      arena_bytes,
      free_bytes: PoolStats::free_bytes_from_counts(&counts),
      reserved_bytes: self.reserved_bytes,
      reserved_blocks: self.reserved_blocks,
      free_blocks_per_order: counts,
      splits: self.splits,
      merges: self.merges,
      failed_allocations: self.failed_allocations,
    }
  }

  fn sentinel(
    &self,
    k: usize,
  ) -> *mut Block {
    debug_assert!(k < MAX_K);
    unsafe { self.avail.as_ptr().add(k) }
  }

  fn out_of_memory(
    &mut self,
    size: usize,
  ) -> BuddyError {
    self.failed_allocations += 1;
    log::warn!("[buddy] malloc({}) failed: out of memory", size);
    BuddyError::OutOfMemory { size }
  }

  /// Header of the block behind `ptr`, if it is a block this pool reserved.
  fn reserved_block(
    &self,
    ptr: *mut u8,
  ) -> Result<*mut Block> {
    let arena = self.arena.as_ref().ok_or(BuddyError::Destroyed)?;
    let addr = ptr as usize;
    let invalid = || BuddyError::InvalidHandle { addr };

    let Some(header) = addr.checked_sub(HEADER_SIZE).filter(|&h| arena.contains(h)) else {
      return Err(invalid());
    };

    let offset = arena.offset_of(header);
    if offset % block_size(SMALLEST_K) != 0 {
      return Err(invalid());
    }

    unsafe {
      let block = Block::from_payload(ptr);

      if (*block).magic != BLOCK_MAGIC {
        return Err(invalid());
      }

      let k = (*block).order();
      if !(SMALLEST_K..=self.kval_m).contains(&k) || offset % block_size(k) != 0 {
        return Err(invalid());
      }

      match (*block).tag() {
        Some(Tag::Reserved) => Ok(block),
        Some(Tag::Avail) => Err(BuddyError::DoubleFree { addr }),
        _ => Err(invalid()),
      }
    }
  }

  /// Halves the head of list `k` into two blocks on list `k - 1`.
  unsafe fn split(
    &mut self,
    k: usize,
  ) {
    unsafe {
      let block = list::pop_front(self.sentinel(k));
      let half = k - 1;
      let upper = (block as *mut u8).add(block_size(half)) as *mut Block;

      upper.write(Block::new(Tag::Avail, half));
      (*block).set_order(half);
      (*block).set_tag(Tag::Avail);

      // Lower half ends up at the head, so allocations fill from the bottom.
      list::push_front(self.sentinel(half), upper);
      list::push_front(self.sentinel(half), block);

      log::trace!("[buddy] split {:p} k={} -> {:p} + {:p}", block, k, block, upper);
    }

    self.splits += 1;
  }

  /// Marks a reserved block free, coalesces it upward and links the result.
  unsafe fn release(
    &mut self,
    block: *mut Block,
  ) {
    unsafe {
      let mut block = block;
      let mut k = (*block).order();

      self.reserved_bytes -= block_size(k);
      self.reserved_blocks -= 1;

      if self.scrub_on_release {
        ptr::write_bytes(Block::payload(block), SCRUB_BYTE, usable_size(k));
      }

      (*block).set_tag(Tag::Avail);

      while k < self.kval_m {
        let buddy = self.buddy_of(block, k);

        if !(*buddy).is_avail_of(k) {
          break;
        }

        list::unlink(buddy);

        let (lower, upper) = if block < buddy { (block, buddy) } else { (buddy, block) };

        // The absorbed header must never pass as a live block again.
        (*upper).magic = 0;

        block = lower;
        k += 1;
        (*block).set_order(k);
        self.merges += 1;

        log::trace!("[buddy] merged {:p} + {:p} -> k={}", lower, upper, k);
      }

      list::push_front(self.sentinel(k), block);

      log::trace!("[buddy] free -> {:p} k={}", block, k);
    }
  }

  /// The order-`k` buddy of `block`. Only meaningful for `k < kval_m`.
  fn buddy_of(
    &self,
    block: *mut Block,
    k: usize,
  ) -> *mut Block {
    let offset = block as usize - self.base as usize;
    unsafe { self.base.add(buddy_offset(offset, k)) as *mut Block }
  }
}

impl Drop for BuddyPool {
  fn drop(
    &mut self,
  ) {
    if let Err(err) = self.destroy() {
      log::warn!("[buddy] teardown failed: {}", err);
    }

    // Safety: `avail` came from a leaked `Box<[Block]>` of `MAX_K` entries.
    unsafe {
      drop(Box::from_raw(ptr::slice_from_raw_parts_mut(self.avail.as_ptr(), MAX_K)));
    }
  }
}
