//! # rbuddy - A Self-Hosting Buddy Allocator
//!
//! This crate provides a **buddy allocator**: one region obtained from the
//! host allocator, carved into power-of-two buckets, with split-on-demand
//! allocation and coalesce-on-free deallocation.
//!
//! ## Overview
//!
//! ```text
//!   Buddy Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         ARENA REGION                                 │
//!   │                                                                      │
//!   │   ┌────────┬───────────────┬───────────────────────────────────────┐ │
//!   │   │ head   │   bucket i    │            bucket i+1                 │ │
//!   │   │ array  │  (2 buddies)  │         (2 buddies, twice the size)   │ │
//!   │   └────────┴───────────────┴───────────────────────────────────────┘ │
//!   │                                                                      │
//!   │   malloc(n): find smallest bucket >= n, split a bigger block down   │
//!   │              if none is free there.                                 │
//!   │   free(p):   return the block, then merge with its buddy while the  │
//!   │              buddy is also free.                                    │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rbuddy
//!   ├── index    - bucket <-> size arithmetic
//!   ├── block    - the shared free-record/alloc-header layout
//!   ├── freelist - the bucket-head array and its chains
//!   ├── engine   - split-on-demand, coalesce-on-free
//!   ├── host     - host-memory acquisition/release
//!   ├── error    - InitError / AllocError / FreeError
//!   └── arena    - Arena: the public init/malloc/free/release surface
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rbuddy::Arena;
//!
//! let mut arena = Arena::try_init(16, 1 << 20).expect("arena should init");
//! let p = arena.malloc(64);
//! unsafe {
//!     p.write(42);
//!     assert_eq!(p.read(), 42);
//! }
//! arena.free(p);
//! ```
//!
//! ## Bucket layout
//!
//! The head array that tracks every bucket's free list lives inside the
//! arena it manages, in a reserved block that is carved out once at init and
//! never handed back out. See [`Arena::try_init`] for the full init sequence.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! The public `Arena` methods are safe to call; what they do internally is
//! not.

mod arena;
mod block;
mod engine;
mod error;
mod freelist;
mod host;
mod index;

pub use arena::Arena;
pub use block::HEADER_SIZE;
pub use error::{AllocError, FreeError, InitError};
