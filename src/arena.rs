use std::{io, mem, ptr::NonNull};

use libc::c_void;

use crate::error::{BuddyError, Result};

/// One anonymous, private, read/write mapping owned by a pool.
#[derive(Debug)]
pub struct Arena {
  base: NonNull<u8>,
  len: usize,
}

impl Arena {
  /// Maps `len` bytes of zeroed memory.
  pub fn map(
    len: usize,
  ) -> Result<Self> {
    // Safety: FFI call to mmap with no address hint and no file.
    let addr = unsafe {
      libc::mmap(
        std::ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANON,
        -1,
        0,
      )
    };

    if addr == libc::MAP_FAILED {
      return Err(BuddyError::ArenaMap {
        size: len,
        source: io::Error::last_os_error(),
      });
    }

    let base = NonNull::new(addr as *mut u8).ok_or_else(|| BuddyError::ArenaMap {
      size: len,
      source: io::Error::other("mmap returned null"),
    })?;

    log::debug!("[buddy] mapped arena {:p} len={}", base, len);

    Ok(Self { base, len })
  }

  pub fn base(
    &self,
  ) -> NonNull<u8> {
    self.base
  }

  pub fn len(
    &self,
  ) -> usize {
    self.len
  }

  pub fn contains(
    &self,
    addr: usize,
  ) -> bool {
    let start = self.base.as_ptr() as usize;
    addr >= start && addr - start < self.len
  }

  /// Distance of `addr` from the base. `addr` must be inside the arena.
  pub fn offset_of(
    &self,
    addr: usize,
  ) -> usize {
    addr - self.base.as_ptr() as usize
  }

  /// Returns the mapping to the OS. The arena is gone even on error.
  pub fn unmap(
    self,
  ) -> Result<()> {
    let result = unsafe { munmap(self.base, self.len) };
    mem::forget(self);
    result
  }
}

impl Drop for Arena {
  fn drop(
    &mut self,
  ) {
    if let Err(err) = unsafe { munmap(self.base, self.len) } {
      log::warn!("[buddy] dropping arena {:p}: {}", self.base, err);
    }
  }
}

unsafe fn munmap(
  base: NonNull<u8>,
  len: usize,
) -> Result<()> {
  // Safety: FFI call to munmap on a range we mapped.
  if unsafe { libc::munmap(base.as_ptr() as *mut c_void, len) } != 0 {
    return Err(BuddyError::ArenaUnmap(io::Error::last_os_error()));
  }

  log::debug!("[buddy] unmapped arena {:p} len={}", base, len);

  Ok(())
}
