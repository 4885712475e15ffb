//! # docent-vector
//!
//! An exact nearest-neighbor index over fixed-dimension `f32` vectors, ranked
//! by Euclidean (L2) distance.
//!
//! ## Features
//!
//! - **Positional**: every vector is addressed by its dense position
//!   (`0..len`), assigned in insertion order
//! - **Exact**: exhaustive scan, deterministic ordering (distance, then position)
//! - **Removal by position**: deletes compact the storage, preserving the
//!   relative order of the survivors
//! - **Persistence**: the whole index is one binary blob, written atomically
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docent_vector::FlatIndex;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docent_vector::Error> {
//!     let mut index = FlatIndex::load_or_new("./index/index.bin".as_ref(), 768).await?;
//!
//!     let positions = index.add(&[vec![0.1f32; 768], vec![0.2f32; 768]])?;
//!     let hits = index.search(&vec![0.1f32; 768], 5)?;
//!     assert_eq!(hits[0].position, positions.start);
//!
//!     index.remove_positions(&[positions.start]);
//!     index.save("./index/index.bin".as_ref()).await?;
//!     Ok(())
//! }
//! ```
//!
//! The index knows nothing about what a vector means. Owners that attach ids
//! to positions must keep a parallel position-indexed list and filter it with
//! the same position set passed to [`FlatIndex::remove_positions`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod distance;
pub mod error;
pub mod index;
pub mod persistence;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use index::{FlatIndex, DEFAULT_DIMENSIONS};
pub use persistence::write_atomic;
pub use types::{Position, SearchHit};
