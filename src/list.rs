//! Intrusive circular doubly linked lists threaded through block headers.
//!
//! Each list is anchored by a sentinel [`Block`] tagged `Unused`. An empty
//! list is a sentinel whose `next` and `prev` point at itself.
//!
//! ```text
//!   sentinel ──next──▶ A ──next──▶ B ──next──┐
//!      ▲ ◀──prev──────   ◀──prev────          │
//!      └──────────────────────────────────────┘
//! ```
//!
//! Every function takes raw pointers; callers guarantee they point at live
//! headers.

use std::ptr;

use crate::block::Block;

pub unsafe fn init(
  sentinel: *mut Block,
) {
  unsafe {
    (*sentinel).next = sentinel;
    (*sentinel).prev = sentinel;
  }
}

pub unsafe fn is_empty(
  sentinel: *mut Block,
) -> bool {
  unsafe { (*sentinel).next == sentinel }
}

pub unsafe fn push_front(
  sentinel: *mut Block,
  block: *mut Block,
) {
  unsafe {
    let first = (*sentinel).next;

    (*block).next = first;
    (*block).prev = sentinel;
    (*first).prev = block;
    (*sentinel).next = block;
  }
}

/// Detaches `block` from whatever list it is on.
pub unsafe fn unlink(
  block: *mut Block,
) {
  unsafe {
    let next = (*block).next;
    let prev = (*block).prev;

    (*prev).next = next;
    (*next).prev = prev;

    (*block).next = ptr::null_mut();
    (*block).prev = ptr::null_mut();
  }
}

/// Removes and returns the head of the list, or null when empty.
pub unsafe fn pop_front(
  sentinel: *mut Block,
) -> *mut Block {
  unsafe {
    if is_empty(sentinel) {
      return ptr::null_mut();
    }

    let block = (*sentinel).next;
    unlink(block);
    block
  }
}

pub unsafe fn len(
  sentinel: *mut Block,
) -> usize {
  unsafe {
    let mut count = 0;
    let mut current = (*sentinel).next;

    while current != sentinel {
      count += 1;
      current = (*current).next;
    }

    count
  }
}
