use std::{mem, ptr};

/// Written into every header the pool creates.
pub const BLOCK_MAGIC: u32 = 0xB0DD_1E5A;

pub const HEADER_SIZE: usize = mem::size_of::<Block>();

/// Occupancy of a block.
#[repr(u16)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
  /// Handed out to a caller, not on any list.
  Reserved = 0,
  /// Free and linked into the list for its order.
  Avail = 1,
  /// List sentinel. Never part of the arena.
  Unused = 3,
}

impl Tag {
  pub fn from_raw(
    raw: u16,
  ) -> Option<Self> {
    match raw {
      0 => Some(Tag::Reserved),
      1 => Some(Tag::Avail),
      3 => Some(Tag::Unused),
      _ => None,
    }
  }
}

/// In-place header at the start of every block.
///
/// `next` and `prev` are meaningful only while the block is `Avail` (or for
/// sentinels). Payload starts right after the header.
#[repr(C)]
pub struct Block {
  pub tag: u16,
  pub kval: u16,
  pub magic: u32,
  pub next: *mut Block,
  pub prev: *mut Block,
}

impl Block {
  pub fn new(
    tag: Tag,
    kval: usize,
  ) -> Self {
    Self {
      tag: tag as u16,
      kval: kval as u16,
      magic: BLOCK_MAGIC,
      next: ptr::null_mut(),
      prev: ptr::null_mut(),
    }
  }

  pub fn tag(
    &self,
  ) -> Option<Tag> {
    Tag::from_raw(self.tag)
  }

  pub fn set_tag(
    &mut self,
    tag: Tag,
  ) {
    self.tag = tag as u16;
  }

  pub fn order(
    &self,
  ) -> usize {
    self.kval as usize
  }

  pub fn set_order(
    &mut self,
    k: usize,
  ) {
    self.kval = k as u16;
  }

  pub fn is_avail_of(
    &self,
    k: usize,
  ) -> bool {
    self.magic == BLOCK_MAGIC && self.tag() == Some(Tag::Avail) && self.order() == k
  }

  /// Payload address of `block`.
  ///
  /// # Safety
  ///
  /// `block` must point at a header inside a live arena.
  pub unsafe fn payload(
    block: *mut Block,
  ) -> *mut u8 {
    unsafe { (block as *mut u8).add(HEADER_SIZE) }
  }

  /// Header address for a payload pointer.
  ///
  /// # Safety
  ///
  /// `payload` must be at least `HEADER_SIZE` bytes past the arena base.
  pub unsafe fn from_payload(
    payload: *mut u8,
  ) -> *mut Block {
    unsafe { payload.sub(HEADER_SIZE) as *mut Block }
  }
}
