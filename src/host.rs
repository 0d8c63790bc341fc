//! Acquiring and releasing the single contiguous region an [`crate::Arena`]
//! manages.
//!
//! Grounded on `original_source/Allocator/my_allocator.c`'s `init_allocator`
//! (`malloc(length)`) and `release_allocator` (`free(...)`). The teacher
//! reaches for `libc::sbrk` to grow the program break incrementally; a buddy
//! arena instead wants one fixed-size region up front, which is what the
//! original C actually calls `malloc` for, so `libc::malloc`/`libc::free`
//! replace `sbrk` here while keeping the same `libc` dependency.

/// Requests `length` bytes from the host allocator.
///
/// Returns `None` if the host allocator cannot satisfy the request.
pub fn acquire(
  length: usize,
) -> Option<*mut u8> {
  let ptr = unsafe { libc::malloc(length) };
  if ptr.is_null() { None } else { Some(ptr as *mut u8) }
}

/// Returns a region obtained from [`acquire`] to the host allocator.
///
/// # Safety
/// `base` must have been returned by a prior call to [`acquire`] that has
/// not already been released.
pub unsafe fn release(
  base: *mut u8,
) {
  unsafe { libc::free(base as *mut libc::c_void) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acquire_then_release_round_trips() {
    let ptr = acquire(4096).expect("host allocator should satisfy a small request");
    unsafe {
      ptr.write(0xAB);
      assert_eq!(ptr.read(), 0xAB);
      release(ptr);
    }
  }
}
