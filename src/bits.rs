//! Bit-field access over arrays of 32-bit words.
//!
//! Fields are addressed little-endian within the word array: bit `p` of the
//! stream lives in word `p / 32` at bit `p % 32`, counting from the least
//! significant bit. Two access families exist:
//!
//! - **Spanning**: a field of up to 32 bits starting at any bit position.
//!   It may cross exactly one word boundary, so it touches at most two
//!   consecutive words.
//! - **Aligned**: the caller guarantees the field sits inside one word, so
//!   every access is a single shift and mask.
//!
//! The read/write helpers index the slice directly and panic when a field
//! reaches past the end of `words`. Strategies size their buffers before
//! writing and validate caller-supplied buffers before reading.

use crate::error::PackingError;

/// Width of one storage word, in bits.
pub const WORD_BITS: u32 = 32;

/// Minimal number of bits needed to represent `value`.
///
/// Zero still occupies one bit.
///
/// # Errors
///
/// [`PackingError::InvalidArgument`] if `value` is negative.
pub fn bits_needed(value: i32) -> Result<u32, PackingError> {
    if value < 0 {
        return Err(PackingError::InvalidArgument(format!(
            "negative values are not supported, got {}",
            value
        )));
    }
    if value == 0 {
        return Ok(1);
    }
    Ok(WORD_BITS - value.leading_zeros())
}

/// Bits needed for the largest element of `data`, validating every element.
///
/// An empty slice needs one bit (its maximum is taken as zero).
///
/// # Errors
///
/// [`PackingError::InvalidArgument`] naming the first negative element.
pub fn bits_needed_for_slice(data: &[i32]) -> Result<u32, PackingError> {
    let mut max = 0;
    for (i, &value) in data.iter().enumerate() {
        if value < 0 {
            return Err(PackingError::InvalidArgument(format!(
                "negative value {} at index {}",
                value, i
            )));
        }
        max = max.max(value);
    }
    bits_needed(max)
}

/// A `width`-bit all-ones mask.
///
/// `width == 32` is special-cased since `1 << 32` overflows a `u32`.
#[inline]
pub fn mask(width: u32) -> u32 {
    debug_assert!(width <= WORD_BITS);
    if width >= WORD_BITS {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Number of words needed to hold `total_bits` bits.
#[inline]
pub fn words_for_bits(total_bits: usize) -> usize {
    total_bits.div_ceil(WORD_BITS as usize)
}

/// Reject field widths outside `1..=WORD_BITS`.
///
/// # Errors
///
/// [`PackingError::InvalidState`] for a zero or wider-than-word width.
pub fn check_width(width: u32) -> Result<(), PackingError> {
    if width == 0 || width > WORD_BITS {
        return Err(PackingError::InvalidState(format!(
            "field width {} outside 1..={}",
            width, WORD_BITS
        )));
    }
    Ok(())
}

/// Words needed for `len` fields of `width` bits.
///
/// # Errors
///
/// [`PackingError::InvalidArgument`] if the bit count overflows `usize`.
pub fn words_for_fields(len: usize, width: u32) -> Result<usize, PackingError> {
    len.checked_mul(width as usize)
        .map(words_for_bits)
        .ok_or_else(|| {
            PackingError::InvalidArgument(format!(
                "{} fields of {} bits overflow the addressable bit range",
                len, width
            ))
        })
}

/// Read a `width`-bit field starting at absolute bit `bit_position`.
#[inline]
pub fn read_spanning(words: &[u32], bit_position: usize, width: u32) -> u32 {
    debug_assert!((1..=WORD_BITS).contains(&width));
    let word_index = bit_position / WORD_BITS as usize;
    let bit_offset = (bit_position % WORD_BITS as usize) as u32;
    let bits_available = WORD_BITS - bit_offset;

    if bits_available >= width {
        return (words[word_index] >> bit_offset) & mask(width);
    }

    // Low part is the top `bits_available` bits of this word, high part the
    // bottom of the next one.
    let low = words[word_index] >> bit_offset;
    let high = words[word_index + 1] & mask(width - bits_available);
    low | (high << bits_available)
}

/// Write the low `width` bits of `value` at absolute bit `bit_position`.
///
/// Bits outside the targeted range are left untouched.
#[inline]
pub fn write_spanning(words: &mut [u32], bit_position: usize, value: u32, width: u32) {
    debug_assert!((1..=WORD_BITS).contains(&width));
    let word_index = bit_position / WORD_BITS as usize;
    let bit_offset = (bit_position % WORD_BITS as usize) as u32;
    let bits_available = WORD_BITS - bit_offset;
    let field_mask = mask(width);
    let value = value & field_mask;

    if bits_available >= width {
        let clear = !(field_mask << bit_offset);
        words[word_index] = (words[word_index] & clear) | (value << bit_offset);
        return;
    }

    let low_mask = mask(bits_available);
    let high_mask = mask(width - bits_available);

    words[word_index] =
        (words[word_index] & !(low_mask << bit_offset)) | ((value & low_mask) << bit_offset);

    let high = value >> bits_available;
    words[word_index + 1] = (words[word_index + 1] & !high_mask) | (high & high_mask);
}

/// Read a `width`-bit field confined to `words[word_index]`.
///
/// `bit_offset + width` must not exceed [`WORD_BITS`].
#[inline]
pub fn read_aligned(words: &[u32], word_index: usize, bit_offset: u32, width: u32) -> u32 {
    debug_assert!(bit_offset + width <= WORD_BITS);
    (words[word_index] >> bit_offset) & mask(width)
}

/// Write the low `width` bits of `value` into `words[word_index]`.
///
/// `bit_offset + width` must not exceed [`WORD_BITS`].
#[inline]
pub fn write_aligned(words: &mut [u32], word_index: usize, bit_offset: u32, value: u32, width: u32) {
    debug_assert!(bit_offset + width <= WORD_BITS);
    let field_mask = mask(width);
    let clear = !(field_mask << bit_offset);
    words[word_index] = (words[word_index] & clear) | ((value & field_mask) << bit_offset);
}
