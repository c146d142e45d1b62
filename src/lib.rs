//! Fixed-width bit packing for arrays of non-negative 32-bit integers.
//!
//! `wordpack` stores each value in the minimal number of bits needed for
//! the largest one and packs the fields into 32-bit words. Any element can
//! be read back without decoding the rest. Typical inputs are indexes,
//! deltas and counts about to be stored or sent somewhere.
//!
//! # Strategies
//!
//! - **Overlapping**: one continuous bit stream. Densest, but a field may
//!   straddle two words.
//! - **NonOverlapping**: `32 / bits` fields per word, none crossing a word
//!   boundary. Wastes up to `32 % bits` bits per word; every read touches
//!   one word.
//! - **Overflow**: narrow main fields with a flag bit, plus a side table of
//!   raw words for the few values that do not fit. Wins on skewed data and
//!   falls back to the overlapping layout when it cannot.
//!
//! # Metadata
//!
//! The words carry no header. Bit widths, lengths and overflow parameters
//! live in a [`Layout`] next to the words in a [`PackedArray`]; whoever
//! keeps the words must keep the layout too.
//!
//! # Example
//!
//! ```rust
//! use wordpack::{OverflowPacking, PackingStrategy};
//!
//! let data = vec![1, 5, 12, 7, 3, 9, 15, 2, 40_000, 6];
//! let packed = OverflowPacking::new().pack(&data).unwrap();
//!
//! assert_eq!(packed.get(8).unwrap(), 40_000);
//! assert_eq!(packed.unpack().unwrap(), data);
//! ```
//!
//! The stateful form keeps the last result inside the packer:
//!
//! ```rust
//! use wordpack::{create, PackingKind};
//!
//! let mut packer = create(PackingKind::Overlapping);
//! let data = vec![1, 5, 12, 7, 3, 9, 15, 2];
//! let compressed = packer.compress(&data).unwrap();
//!
//! assert_eq!(compressed.len(), 1);
//! assert_eq!(packer.bits_per_value(), Some(4));
//! assert_eq!(packer.get(3).unwrap(), 7);
//! assert_eq!(packer.decompress(&compressed, data.len()).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
mod error;
mod factory;
mod non_overlapping;
mod overflow;
mod overlapping;
mod packed;
mod packer;
mod traits;

pub use error::PackingError;
pub use factory::{create, create_by_name, create_strategy, PackingKind};
pub use non_overlapping::{values_per_word, NonOverlappingPacking};
pub use overflow::{OverflowPacking, OverflowStats, DEFAULT_SEARCH_WINDOW};
pub use overlapping::OverlappingPacking;
pub use packed::{Layout, PackedArray};
pub use packer::BitPacker;
pub use traits::PackingStrategy;
