//! Overlapping packing: maximum density.
//!
//! Values are written back-to-back as one continuous bit stream, so the
//! output is `ceil(len * bits_per_value / 32)` words with no padding.
//! The price is that any access may have to stitch a value together from
//! two words.

use crate::bits;
use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::packed::Layout;
use crate::traits::PackingStrategy;

/// Densest layout; fields may straddle word boundaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct OverlappingPacking;

impl OverlappingPacking {
    /// Create the strategy.
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn word_count(len: usize, bits_per_value: u32) -> Result<usize, PackingError> {
    bits::words_for_fields(len, bits_per_value)
}

#[inline]
pub(crate) fn read_value(words: &[u32], bits_per_value: u32, index: usize) -> u32 {
    bits::read_spanning(words, index * bits_per_value as usize, bits_per_value)
}

impl PackingStrategy for OverlappingPacking {
    fn kind(&self) -> PackingKind {
        PackingKind::Overlapping
    }

    fn encode(
        &self,
        data: &[i32],
        bits_per_value: u32,
    ) -> Result<(Vec<u32>, Layout), PackingError> {
        bits::check_width(bits_per_value)?;
        let mut words = vec![0u32; word_count(data.len(), bits_per_value)?];

        for (i, &value) in data.iter().enumerate() {
            let bit_position = i * bits_per_value as usize;
            bits::write_spanning(&mut words, bit_position, value as u32, bits_per_value);
        }

        Ok((words, Layout::Overlapping { bits_per_value }))
    }
}
