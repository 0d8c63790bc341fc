//! Pure size/bucket arithmetic: translating between a bucket index and the
//! block size it holds, and back.
//!
//! Grounded on `original_source/Allocator/my_allocator.c`'s
//! `getSizeForFreestoreIndex`/`getFreestoreIndexForSize`/
//! `minFreestoreIndexForSize`/`maxFreestoreIndexForSize` family, which do the
//! same job with a `log2`/`ceil`/`floor` float round trip. Here it's integer
//! arithmetic throughout: the smallest/largest `k` such that `basic_block_size
//! << k` clears a threshold.

/// Smallest `k >= 0` such that `b << k >= n`.
fn ceil_log2_blocks(
  n: usize,
  b: usize,
) -> u32 {
  let mut k = 0u32;
  while let Some(v) = b.checked_shl(k) {
    if v >= n {
      return k;
    }
    k += 1;
  }
  k
}

/// Largest `k >= 0` such that `b << k <= limit`, given `b <= limit`.
fn floor_log2_blocks(
  limit: usize,
  b: usize,
) -> u32 {
  let mut k = 0u32;
  loop {
    let shift = k + 1;
    if shift >= usize::BITS {
      break;
    }
    match b.checked_shl(shift) {
      Some(v) if v <= limit => k = shift,
      _ => break,
    }
  }
  k
}

/// The adjusted-index bucket space: bucket `i` holds blocks of size
/// `basic_block_size << (i + kmin)`, for `i` in `0..=r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
  pub basic_block_size: usize,
  pub kmin: u32,
  pub r: u32,
}

impl Layout {
  /// Derives `kmin` (the smallest bucket that can hold a header plus one
  /// payload byte) and `r` (the largest bucket that fits in `length` bytes
  /// alongside its own header) for an arena of `length` bytes.
  ///
  /// Returns `None` if no bucket at or above `kmin` fits: the arena is too
  /// small to host even one block.
  pub fn new(
    basic_block_size: usize,
    length: usize,
    header_size: usize,
  ) -> Option<Layout> {
    let kmin = ceil_log2_blocks(header_size + 1, basic_block_size);
    let limit = length.checked_sub(header_size)?;
    if basic_block_size > limit {
      return None;
    }
    let kmax = floor_log2_blocks(limit, basic_block_size);
    if kmax < kmin {
      return None;
    }
    Some(Layout { basic_block_size, kmin, r: kmax - kmin })
  }

  /// Size in bytes of a block at bucket `i`.
  ///
  /// # Panics
  /// Panics if `i` is so large that `basic_block_size << (i + kmin)`
  /// overflows `usize`. Every bucket index this type hands out (`0..=r`) is
  /// guaranteed not to by construction.
  pub fn size_of(
    &self,
    i: u32,
  ) -> usize {
    self.basic_block_size
      .checked_shl(i + self.kmin)
      .expect("bucket index out of representable range")
  }

  /// Smallest bucket whose block size is `>= n`, clamped to zero from
  /// below. A request of zero bytes still rounds to bucket zero.
  pub fn bucket_of(
    &self,
    n: usize,
  ) -> u32 {
    ceil_log2_blocks(n, self.basic_block_size).saturating_sub(self.kmin)
  }

  /// Smallest bucket that can satisfy a user request of `n` bytes once the
  /// header overhead is included.
  pub fn min_bucket_for_request(
    &self,
    n: usize,
    header_size: usize,
  ) -> u32 {
    self.bucket_of(n.saturating_add(header_size))
  }
}
