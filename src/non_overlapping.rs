//! Non-overlapping packing: word-aligned fields.
//!
//! Each word holds `32 / bits_per_value` slots and no field ever crosses a
//! word boundary, so every read is one shift and one mask on one word.
//! Up to `32 % bits_per_value` bits per word are left unused.

use crate::bits::{self, WORD_BITS};
use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::packed::Layout;
use crate::traits::PackingStrategy;

/// Layout trading some padding for single-word access.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonOverlappingPacking;

impl NonOverlappingPacking {
    /// Create the strategy.
    pub fn new() -> Self {
        Self
    }
}

/// Number of `bits_per_value`-wide slots in one word.
///
/// # Errors
///
/// [`PackingError::InvalidState`] if no slot fits, i.e. `bits_per_value`
/// is zero or wider than a word.
pub fn values_per_word(bits_per_value: u32) -> Result<u32, PackingError> {
    if bits_per_value == 0 || bits_per_value > WORD_BITS {
        return Err(PackingError::InvalidState(format!(
            "a {}-bit field does not fit in a {}-bit word",
            bits_per_value, WORD_BITS
        )));
    }
    Ok(WORD_BITS / bits_per_value)
}

pub(crate) fn word_count(len: usize, values_per_word: u32) -> usize {
    len.div_ceil(values_per_word as usize)
}

#[inline]
fn slot(index: usize, bits_per_value: u32, values_per_word: u32) -> (usize, u32) {
    let per_word = values_per_word as usize;
    let word_index = index / per_word;
    let bit_offset = (index % per_word) as u32 * bits_per_value;
    (word_index, bit_offset)
}

#[inline]
pub(crate) fn read_value(
    words: &[u32],
    bits_per_value: u32,
    values_per_word: u32,
    index: usize,
) -> u32 {
    let (word_index, bit_offset) = slot(index, bits_per_value, values_per_word);
    bits::read_aligned(words, word_index, bit_offset, bits_per_value)
}

impl PackingStrategy for NonOverlappingPacking {
    fn kind(&self) -> PackingKind {
        PackingKind::NonOverlapping
    }

    fn encode(
        &self,
        data: &[i32],
        bits_per_value: u32,
    ) -> Result<(Vec<u32>, Layout), PackingError> {
        let values_per_word = values_per_word(bits_per_value)?;
        let mut words = vec![0u32; word_count(data.len(), values_per_word)];

        for (i, &value) in data.iter().enumerate() {
            let (word_index, bit_offset) = slot(i, bits_per_value, values_per_word);
            bits::write_aligned(&mut words, word_index, bit_offset, value as u32, bits_per_value);
        }

        Ok((
            words,
            Layout::NonOverlapping {
                bits_per_value,
                values_per_word,
            },
        ))
    }
}
