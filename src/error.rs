//! Error enums for the three fallible operations: init, malloc, free.
//!
//! No `thiserror`/`anyhow`: none of the candidate teacher repos pull in an
//! error-derive crate, so these are hand-rolled `Display` + `std::error::Error`
//! impls in the style of the retrieved `Stupremee-windy/windy_kernel` buddy
//! allocator's own `Error` enum. The primitive `init`/`malloc`/`free` API
//! still reports failure the original way (a null pointer, a nonzero status
//! code); these richer variants back the `try_*` counterparts for callers who
//! want to know why.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
  /// `basic_block_size` must be at least 1 and strictly smaller than `length`.
  BasicBlockSizeTooLarge,
  /// `length` cannot host even one block plus the reserved bucket-head array.
  ArenaTooSmallForHeadArray,
  /// The host allocator could not satisfy the request for `length` bytes.
  HostAllocationFailed,
}

impl fmt::Display for InitError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      InitError::BasicBlockSizeTooLarge => {
        write!(f, "basic_block_size must be at least 1 and smaller than length")
      }
      InitError::ArenaTooSmallForHeadArray => {
        write!(f, "length is too small to host a block and its bucket-head array")
      }
      InitError::HostAllocationFailed => write!(f, "host allocator failed to provide the requested region"),
    }
  }
}

impl std::error::Error for InitError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// A request of zero bytes is rejected outright.
  ZeroSizeRequest,
  /// `n + header_size` exceeds the largest bucket the arena has.
  OversizeRequest,
  /// The arena has no free block large enough, even after splitting.
  OutOfMemory,
}

impl fmt::Display for AllocError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      AllocError::ZeroSizeRequest => write!(f, "requested zero bytes"),
      AllocError::OversizeRequest => write!(f, "requested size exceeds the arena's largest bucket"),
      AllocError::OutOfMemory => write!(f, "no free block large enough remains in the arena"),
    }
  }
}

impl std::error::Error for AllocError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeError {
  /// The pointer does not point at a live payload this arena handed out.
  InvalidPointer,
}

impl fmt::Display for FreeError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      FreeError::InvalidPointer => write!(f, "pointer was not allocated by this arena"),
    }
  }
}

impl std::error::Error for FreeError {}
