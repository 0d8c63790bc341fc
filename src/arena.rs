//! The public allocator surface: an [`Arena`] wraps one region obtained from
//! the host allocator and serves `malloc`/`free` against it.
//!
//! Grounded on `original_source/Allocator/my_allocator.c`'s four-operation
//! API (`init_allocator`/`my_malloc`/`my_free`/`release_allocator`), which
//! keeps all of its bookkeeping in file-scope globals. Here that state lives
//! in an explicit `Arena` value instead — the teacher's own `BumpAllocator`
//! (a struct constructed with `::new()` and threaded through every call) is
//! the Rust-idiom precedent for that shape, and it sidesteps the need for
//! `unsafe impl Sync`/a global mutex to make the original's singleton safe
//! across more than one allocator instance in a process.

use std::ptr;

use crate::block::{self, AllocHeader};
use crate::engine::Engine;
use crate::error::{AllocError, FreeError, InitError};
use crate::freelist::FreeListStore;
use crate::host;
use crate::index::Layout;

/// One arena: a single region acquired from the host allocator, split into
/// power-of-two buckets and served out via `malloc`/`free`.
///
/// Holds a raw `*mut u8` to the region, which makes `Arena` neither `Send`
/// nor `Sync` — there is no synchronization here, so sharing one across
/// threads without external locking would race on the free-list store.
pub struct Arena {
  base: *mut u8,
  length: usize,
  layout: Layout,
  reserved_bucket: u32,
  store: FreeListStore,
  released: bool,
}

/// Picks the smallest bucket whose size can hold the `bucket_count *
/// header_size` bucket-head array.
fn choose_reserved_bucket(
  layout: &Layout,
) -> Option<u32> {
  let needed = (layout.r as usize + 1) * block::HEADER_SIZE;
  (0..=layout.r).find(|&i| layout.size_of(i) >= needed)
}

/// Splits the initial single top-bucket block down the left spine from `r`
/// to `reserved_bucket`, publishing the right half at every level and
/// reserving the final leftmost block (at the arena base) for the bucket-head
/// array. Mirrors `protectFreestoreHeader`'s descent.
///
/// # Safety
/// `base` must be the base of a block of size `layout.size_of(layout.r)`,
/// and `store` must already be reset.
unsafe fn seed_free_lists(
  base: usize,
  layout: &Layout,
  store: &FreeListStore,
  reserved_bucket: u32,
) {
  unsafe {
    let mut cur_bucket = layout.r;
    while cur_bucket > reserved_bucket {
      let half = layout.size_of(cur_bucket) / 2;
      let right = base + half;
      let lower = cur_bucket - 1;
      store.append(lower, right);
      cur_bucket = lower;
    }
  }
}

/// Greedily tiles any tail beyond `size_of(r)` with the largest bucket that
/// fits at each step, publishing each tile to its own bucket. Any residue
/// smaller than `size_of(0)` is left unmanaged and reported.
///
/// # Safety
/// `base + layout.size_of(layout.r) .. base + length` must be valid, writable
/// memory, and `store` must already be seeded.
unsafe fn tile_tail(
  base: usize,
  length: usize,
  layout: &Layout,
  store: &FreeListStore,
) {
  unsafe {
    let top = base + layout.size_of(layout.r);
    let end = base + length;
    if top >= end {
      return;
    }

    let min_size = layout.size_of(0);
    let mut addr = top;
    let mut remaining = end - addr;

    while remaining >= min_size {
      let mut i = layout.r;
      while layout.size_of(i) > remaining {
        if i == 0 {
          break;
        }
        i -= 1;
      }
      let size = layout.size_of(i);
      if size > remaining {
        break;
      }
      store.append(i, addr);
      addr += size;
      remaining -= size;
    }

    if remaining > 0 {
      eprintln!("rbuddy: {remaining} tail bytes do not fit any bucket and are not managed");
    }
  }
}

impl Arena {
  /// Mirrors the original `init_allocator(basic_block_size, length)` →
  /// `bytes_allocated` contract: returns the arena alongside the byte
  /// count that now backs it, or `(None, 0)` on failure. Prefer
  /// [`Arena::try_init`] when you want to know *why* it failed.
  pub fn init(
    basic_block_size: usize,
    length: usize,
  ) -> (Option<Arena>, usize) {
    match Self::try_init(basic_block_size, length) {
      Ok(arena) => {
        let len = arena.length;
        (Some(arena), len)
      }
      Err(_) => (None, 0),
    }
  }

  /// Acquires `length` bytes from the host allocator and carves out the
  /// bucket structure described in the module docs.
  pub fn try_init(
    basic_block_size: usize,
    length: usize,
  ) -> Result<Arena, InitError> {
    if basic_block_size < 1 || basic_block_size >= length {
      return Err(InitError::BasicBlockSizeTooLarge);
    }
    let layout = Layout::new(basic_block_size, length, block::HEADER_SIZE)
      .ok_or(InitError::ArenaTooSmallForHeadArray)?;
    let reserved_bucket = choose_reserved_bucket(&layout).ok_or(InitError::ArenaTooSmallForHeadArray)?;

    let base = host::acquire(length).ok_or(InitError::HostAllocationFailed)?;
    let base_addr = base as usize;

    let store = unsafe { FreeListStore::new(base_addr, (layout.r + 1) as usize) };
    unsafe {
      store.reset();
      seed_free_lists(base_addr, &layout, &store, reserved_bucket);
      tile_tail(base_addr, length, &layout, &store);
    }

    Ok(Arena { base, length, layout, reserved_bucket, store, released: false })
  }

  fn engine(&self) -> Engine<'_> {
    Engine {
      layout: &self.layout,
      store: &self.store,
      base: self.base as usize,
      length: self.length,
      reserved_bucket: self.reserved_bucket,
    }
  }

  /// Mirrors the original `my_malloc` contract: a null pointer on failure.
  /// Prefer [`Arena::try_malloc`] to learn why.
  pub fn malloc(
    &mut self,
    n: usize,
  ) -> *mut u8 {
    self.try_malloc(n).unwrap_or(ptr::null_mut())
  }

  /// Serves `n` bytes from the smallest bucket that fits, splitting a
  /// larger block if none is already free there.
  pub fn try_malloc(
    &mut self,
    n: usize,
  ) -> Result<*mut u8, AllocError> {
    if n == 0 {
      return Err(AllocError::ZeroSizeRequest);
    }
    let top_size = self.layout.size_of(self.layout.r);
    match n.checked_add(block::HEADER_SIZE) {
      Some(needed) if needed <= top_size => {}
      _ => return Err(AllocError::OversizeRequest),
    }

    let target = self.layout.min_bucket_for_request(n, block::HEADER_SIZE);
    let engine = self.engine();
    let base_addr = unsafe { engine.take_block(target) }.ok_or(AllocError::OutOfMemory)?;

    let payload = base_addr + block::HEADER_SIZE;
    unsafe {
      block::write_alloc_header(base_addr, AllocHeader { bucket_index: target as usize, payload_start: payload });
    }
    Ok(payload as *mut u8)
  }

  /// Mirrors the original `my_free` contract: `0` on success, nonzero on
  /// failure. Prefer [`Arena::try_free`] to learn why.
  pub fn free(
    &mut self,
    p: *mut u8,
  ) -> i32 {
    match self.try_free(p) {
      Ok(()) => 0,
      Err(_) => 1,
    }
  }

  /// Returns a pointer previously handed out by [`Arena::malloc`]/
  /// [`Arena::try_malloc`] on this arena to its bucket's free list, then
  /// coalesces with any free buddies. Freeing a null pointer is a no-op.
  pub fn try_free(
    &mut self,
    p: *mut u8,
  ) -> Result<(), FreeError> {
    if p.is_null() {
      return Ok(());
    }
    let payload = p as usize;
    let header_addr = match payload.checked_sub(block::HEADER_SIZE) {
      Some(addr) => addr,
      None => return Err(FreeError::InvalidPointer),
    };
    let base_addr = self.base as usize;
    if header_addr < base_addr || header_addr + block::HEADER_SIZE > base_addr + self.length {
      return Err(FreeError::InvalidPointer);
    }

    let header = unsafe { block::read_alloc_header(header_addr) };
    if header.payload_start != payload || header.bucket_index as u32 > self.layout.r {
      return Err(FreeError::InvalidPointer);
    }
    let bucket = header.bucket_index as u32;

    unsafe {
      block::write_header(header_addr, block::BlockHeader::EMPTY);
      self.store.append(bucket, header_addr);
      self.engine().coalesce_ascent(bucket, header_addr);
    }
    Ok(())
  }

  /// Mirrors the original `release_allocator` contract: `0` on success.
  /// Consumes the arena; equivalent to dropping it.
  pub fn release(self) -> i32 {
    0
  }

  fn release_region(&mut self) {
    if !self.released {
      unsafe { host::release(self.base) };
      self.released = true;
    }
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    self.release_region();
  }
}
