//! Packed arrays and the layout metadata needed to read them.
//!
//! The compressed words carry no header. Everything needed to interpret
//! them (bit widths, slots per word, overflow parameters) lives in a
//! [`Layout`] kept next to the words in a [`PackedArray`]. Persisting the
//! words without the layout loses the ability to decode them.

use crate::bits::{self, WORD_BITS};
use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::{non_overlapping, overflow, overlapping};

/// Per-strategy metadata describing how values are laid out in the words.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Back-to-back fields of `bits_per_value` bits; fields may straddle
    /// word boundaries.
    Overlapping {
        /// Width of every field.
        bits_per_value: u32,
    },
    /// `values_per_word` fields of `bits_per_value` bits per word, never
    /// crossing a word boundary.
    NonOverlapping {
        /// Width of every field.
        bits_per_value: u32,
        /// Slots per word, `WORD_BITS / bits_per_value`.
        values_per_word: u32,
    },
    /// Main region of fixed-width fields followed by a side table of raw
    /// outlier words.
    ///
    /// With `overflow_count == 0` the main fields are `main_bits` wide and
    /// hold values directly. Otherwise each field is `main_bits + 1` wide:
    /// the top bit flags an outlier and the low `main_bits` bits hold either
    /// the value or its side-table index.
    Overflow {
        /// Width of the largest input value.
        bits_per_value: u32,
        /// Payload width of a main-region field, excluding the flag bit.
        main_bits: u32,
        /// Values at or above this go to the side table.
        threshold: u64,
        /// Number of side-table words.
        overflow_count: usize,
    },
}

impl Layout {
    /// Strategy that produced this layout.
    pub fn kind(&self) -> PackingKind {
        match self {
            Layout::Overlapping { .. } => PackingKind::Overlapping,
            Layout::NonOverlapping { .. } => PackingKind::NonOverlapping,
            Layout::Overflow { .. } => PackingKind::Overflow,
        }
    }

    /// Bits needed for the largest packed value.
    pub fn bits_per_value(&self) -> u32 {
        match *self {
            Layout::Overlapping { bits_per_value }
            | Layout::NonOverlapping { bits_per_value, .. }
            | Layout::Overflow { bits_per_value, .. } => bits_per_value,
        }
    }

    /// Side-table size; zero for layouts without one.
    pub fn overflow_count(&self) -> usize {
        match *self {
            Layout::Overflow { overflow_count, .. } => overflow_count,
            _ => 0,
        }
    }

    /// Overflow threshold, if this is an overflow layout.
    pub fn threshold(&self) -> Option<u64> {
        match *self {
            Layout::Overflow { threshold, .. } => Some(threshold),
            _ => None,
        }
    }

    /// Number of words this layout occupies for `len` values.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidState`] if the layout widths do not fit in a
    /// word, [`PackingError::InvalidArgument`] if the size of `len` values
    /// overflows `usize`.
    pub fn word_count(&self, len: usize) -> Result<usize, PackingError> {
        self.validate()?;
        match *self {
            Layout::Overlapping { bits_per_value } => overlapping::word_count(len, bits_per_value),
            Layout::NonOverlapping {
                values_per_word, ..
            } => Ok(non_overlapping::word_count(len, values_per_word)),
            Layout::Overflow {
                main_bits,
                overflow_count,
                ..
            } => overflow::main_word_count(len, main_bits, overflow_count)?
                .checked_add(overflow_count)
                .ok_or_else(|| {
                    PackingError::InvalidArgument(format!(
                        "side table of {} words overflows the word count",
                        overflow_count
                    ))
                }),
        }
    }

    /// Check that the layout's widths are usable.
    fn validate(&self) -> Result<(), PackingError> {
        match *self {
            Layout::Overlapping { bits_per_value } => bits::check_width(bits_per_value)?,
            Layout::NonOverlapping {
                bits_per_value,
                values_per_word,
            } => {
                let expected = non_overlapping::values_per_word(bits_per_value)?;
                if expected != values_per_word {
                    return Err(PackingError::InvalidArgument(format!(
                        "{} values per word does not match width {}",
                        values_per_word, bits_per_value
                    )));
                }
            }
            Layout::Overflow {
                main_bits,
                overflow_count,
                ..
            } => {
                let field = overflow::field_bits(main_bits, overflow_count);
                if main_bits == 0 || field > WORD_BITS {
                    return Err(PackingError::InvalidState(format!(
                        "overflow field width {} outside 1..={}",
                        field, WORD_BITS
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate that `words` can hold `len` values under this layout.
    pub(crate) fn check_words(&self, words: &[u32], len: usize) -> Result<(), PackingError> {
        let required = self.word_count(len)?;
        if words.len() < required {
            return Err(PackingError::InvalidArgument(format!(
                "{} values need {} words, buffer holds {}",
                len,
                required,
                words.len()
            )));
        }
        Ok(())
    }

    /// Decode the value at `index`. `words` must already pass
    /// [`Layout::check_words`] for `len`.
    #[inline]
    pub(crate) fn read(&self, words: &[u32], len: usize, index: usize) -> Result<u32, PackingError> {
        match *self {
            Layout::Overlapping { bits_per_value } => {
                Ok(overlapping::read_value(words, bits_per_value, index))
            }
            Layout::NonOverlapping {
                bits_per_value,
                values_per_word,
            } => Ok(non_overlapping::read_value(
                words,
                bits_per_value,
                values_per_word,
                index,
            )),
            Layout::Overflow {
                main_bits,
                overflow_count,
                ..
            } => overflow::read_value(words, main_bits, overflow_count, len, index),
        }
    }

    /// Decode `len` values from `words`.
    pub(crate) fn decode_all(&self, words: &[u32], len: usize) -> Result<Vec<i32>, PackingError> {
        self.check_words(words, len)?;
        (0..len)
            .map(|i| self.read(words, len, i).map(|v| v as i32))
            .collect()
    }
}

/// Result of packing: the compressed words plus their layout.
///
/// A `PackedArray` is immutable; reads take `&self`, so one array can be
/// shared across threads and read concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPackedArray"))]
pub struct PackedArray {
    words: Vec<u32>,
    len: usize,
    layout: Layout,
}

/// Unchecked wire form; deserialization goes through
/// [`PackedArray::from_parts`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPackedArray {
    words: Vec<u32>,
    len: usize,
    layout: Layout,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPackedArray> for PackedArray {
    type Error = PackingError;

    fn try_from(raw: RawPackedArray) -> Result<Self, Self::Error> {
        PackedArray::from_parts(raw.words, raw.len, raw.layout)
    }
}

impl PackedArray {
    pub(crate) fn new(words: Vec<u32>, len: usize, layout: Layout) -> Self {
        debug_assert_eq!(Ok(words.len()), layout.word_count(len));
        Self { words, len, layout }
    }

    /// Rebuild a packed array from words and metadata held out-of-band.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidArgument`] if `words` is too short for `len`
    /// values, [`PackingError::InvalidState`] if the layout widths do not
    /// fit in a word.
    pub fn from_parts(words: Vec<u32>, len: usize, layout: Layout) -> Result<Self, PackingError> {
        if len == 0 {
            return Err(PackingError::InvalidArgument(
                "packed arrays hold at least one value".to_string(),
            ));
        }
        layout.check_words(&words, len)?;
        Ok(Self { words, len, layout })
    }

    /// Compressed words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Take ownership of the compressed words.
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    /// Number of packed values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: empty inputs are rejected at pack time.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Layout metadata.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Strategy that produced this array.
    pub fn kind(&self) -> PackingKind {
        self.layout.kind()
    }

    /// Bits needed for the largest packed value.
    pub fn bits_per_value(&self) -> u32 {
        self.layout.bits_per_value()
    }

    /// Value at `index`, without decoding the rest.
    ///
    /// # Errors
    ///
    /// [`PackingError::OutOfRange`] if `index >= len`.
    pub fn get(&self, index: usize) -> Result<i32, PackingError> {
        if index >= self.len {
            return Err(PackingError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.layout
            .read(&self.words, self.len, index)
            .map(|v| v as i32)
    }

    /// Decode every value.
    pub fn unpack(&self) -> Result<Vec<i32>, PackingError> {
        self.layout.decode_all(&self.words, self.len)
    }

    /// Size of the compressed words, in bits.
    pub fn compressed_bits(&self) -> usize {
        self.words.len() * WORD_BITS as usize
    }

    /// Size of the input as 32-bit integers, in bits.
    pub fn original_bits(&self) -> usize {
        self.len.saturating_mul(WORD_BITS as usize)
    }

    /// Input element count divided by compressed word count.
    ///
    /// Inputs and words are both 32 bits wide, so this equals
    /// `original_bits() / compressed_bits()`. If either width ever changes
    /// the two ratios diverge.
    pub fn compression_ratio(&self) -> f64 {
        self.len as f64 / self.words.len() as f64
    }
}
