//! Overflow packing: two-tier layout for skewed data.
//!
//! When most values are small and a few are large, storing everything at
//! the width of the largest value wastes bits. This strategy picks a
//! narrower main width `main_bits`, stores every value below
//! `2^main_bits` inline, and moves the rest to a side table of raw words
//! appended after the main region.
//!
//! # Layout
//!
//! ```text
//! | flag|payload | flag|payload | ... | pad | outlier 0 | outlier 1 | ...
//!   main region: len * (main_bits + 1) bits  side table: one word each
//! ```
//!
//! A clear flag means the payload is the value itself; a set flag means it
//! is an index into the side table. When no width beats storing everything
//! at full width, the baseline is used instead: `main_bits` equals the full
//! width, there is no flag bit and no side table.
//!
//! # Threshold search
//!
//! Candidate widths run over `max(1, max_bits - window)..max_bits`. A
//! candidate costs `len * (main_bits + 1) + overflow_count * 32` bits and
//! is rejected if a side-table index would not fit in `main_bits` bits.
//! The cheapest candidate wins; ties go to the baseline, then to the
//! narrower width. The window bounds the search, so the result is not
//! guaranteed to be the global optimum.

use crate::bits::{self, WORD_BITS};
use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::packed::Layout;
use crate::traits::PackingStrategy;

/// Default number of candidate widths below the full width.
pub const DEFAULT_SEARCH_WINDOW: u32 = 8;

/// Outcome of the threshold search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverflowStats {
    /// Values at or above this go to the side table.
    pub threshold: u64,
    /// Payload width of a main-region field.
    pub main_bits: u32,
    /// Number of values sent to the side table.
    pub overflow_count: usize,
    /// Total stored bits for this choice.
    pub total_bits: u64,
}

impl OverflowStats {
    /// Whether a side table is used.
    pub fn has_overflow(&self) -> bool {
        self.overflow_count > 0
    }
}

/// Two-tier layout that moves large outliers into a side table.
#[derive(Clone, Copy, Debug)]
pub struct OverflowPacking {
    search_window: u32,
}

impl OverflowPacking {
    /// Create the strategy with [`DEFAULT_SEARCH_WINDOW`].
    pub fn new() -> Self {
        Self {
            search_window: DEFAULT_SEARCH_WINDOW,
        }
    }

    /// Create the strategy with a custom search window.
    ///
    /// # Arguments
    ///
    /// * `window` - Number of widths below the full width to try. Zero
    ///   disables the search and always yields the baseline layout.
    pub fn with_search_window(window: u32) -> Self {
        Self {
            search_window: window,
        }
    }

    /// Configured search window.
    pub fn search_window(&self) -> u32 {
        self.search_window
    }

    /// Run the threshold search on `data` without encoding it.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidArgument`] if `data` is empty or holds a
    /// negative element.
    pub fn analyze(&self, data: &[i32]) -> Result<OverflowStats, PackingError> {
        if data.is_empty() {
            return Err(PackingError::InvalidArgument(
                "data cannot be empty".to_string(),
            ));
        }
        let max_bits = bits::bits_needed_for_slice(data)?;
        Ok(self.search(data, max_bits))
    }

    fn search(&self, data: &[i32], max_bits: u32) -> OverflowStats {
        let len = data.len() as u64;
        let mut best = OverflowStats {
            threshold: 1u64 << max_bits,
            main_bits: max_bits,
            overflow_count: 0,
            total_bits: len * max_bits as u64,
        };

        let lowest = max_bits.saturating_sub(self.search_window).max(1);
        for main_bits in lowest..max_bits {
            let threshold = 1u64 << main_bits;
            let overflow_count = data.iter().filter(|&&v| v as u64 >= threshold).count();

            let index_bits = index_bits(overflow_count);
            if index_bits > main_bits {
                tracing::trace!(main_bits, overflow_count, index_bits, "side-table index too wide");
                continue;
            }

            let total_bits =
                len * (main_bits as u64 + 1) + overflow_count as u64 * WORD_BITS as u64;
            tracing::trace!(main_bits, overflow_count, total_bits, "threshold candidate");

            if total_bits < best.total_bits {
                best = OverflowStats {
                    threshold,
                    main_bits,
                    overflow_count,
                    total_bits,
                };
            }
        }

        tracing::debug!(
            threshold = best.threshold,
            main_bits = best.main_bits,
            overflow_count = best.overflow_count,
            total_bits = best.total_bits,
            baseline_bits = len * max_bits as u64,
            "chose overflow threshold"
        );

        best
    }
}

impl Default for OverflowPacking {
    fn default() -> Self {
        Self::new()
    }
}

/// Bits needed to address a side table of `overflow_count` entries.
fn index_bits(overflow_count: usize) -> u32 {
    usize::BITS - overflow_count.max(1).leading_zeros()
}

/// Main-region field width: a flag bit is added only when a side table exists.
pub(crate) fn field_bits(main_bits: u32, overflow_count: usize) -> u32 {
    if overflow_count > 0 {
        main_bits + 1
    } else {
        main_bits
    }
}

pub(crate) fn main_word_count(
    len: usize,
    main_bits: u32,
    overflow_count: usize,
) -> Result<usize, PackingError> {
    bits::words_for_fields(len, field_bits(main_bits, overflow_count))
}

#[inline]
pub(crate) fn read_value(
    words: &[u32],
    main_bits: u32,
    overflow_count: usize,
    len: usize,
    index: usize,
) -> Result<u32, PackingError> {
    let width = field_bits(main_bits, overflow_count);
    let encoded = bits::read_spanning(words, index * width as usize, width);
    if overflow_count == 0 {
        return Ok(encoded);
    }

    let payload = encoded & bits::mask(main_bits);
    if (encoded >> main_bits) & 1 == 0 {
        return Ok(payload);
    }

    let slot = payload as usize;
    if slot >= overflow_count {
        return Err(PackingError::InvalidArgument(format!(
            "side-table index {} at position {} exceeds {} entries",
            slot, index, overflow_count
        )));
    }
    Ok(words[main_word_count(len, main_bits, overflow_count)? + slot])
}

impl PackingStrategy for OverflowPacking {
    fn kind(&self) -> PackingKind {
        PackingKind::Overflow
    }

    fn encode(
        &self,
        data: &[i32],
        bits_per_value: u32,
    ) -> Result<(Vec<u32>, Layout), PackingError> {
        bits::check_width(bits_per_value)?;
        let stats = self.search(data, bits_per_value);
        let layout = Layout::Overflow {
            bits_per_value,
            main_bits: stats.main_bits,
            threshold: stats.threshold,
            overflow_count: stats.overflow_count,
        };

        let width = field_bits(stats.main_bits, stats.overflow_count);
        let main_words = main_word_count(data.len(), stats.main_bits, stats.overflow_count)?;
        let mut words = vec![0u32; main_words + stats.overflow_count];

        if !stats.has_overflow() {
            for (i, &value) in data.iter().enumerate() {
                bits::write_spanning(&mut words, i * width as usize, value as u32, width);
            }
            return Ok((words, layout));
        }

        let flag = 1u32 << stats.main_bits;
        let mut next_slot = 0usize;
        for (i, &value) in data.iter().enumerate() {
            let encoded = if value as u64 >= stats.threshold {
                words[main_words + next_slot] = value as u32;
                let encoded = flag | next_slot as u32;
                next_slot += 1;
                encoded
            } else {
                value as u32
            };
            bits::write_spanning(&mut words, i * width as usize, encoded, width);
        }
        debug_assert_eq!(next_slot, stats.overflow_count);

        Ok((words, layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OverlappingPacking;

    /// 90% of values in 0..=15, every tenth value in 1000..=10000.
    fn skewed(len: usize) -> Vec<i32> {
        (0..len)
            .map(|i| {
                if i % 10 == 9 {
                    1000 + ((i as i32 * 7919) % 9001)
                } else {
                    (i as i32 * 31) % 16
                }
            })
            .collect()
    }

    #[test]
    fn test_index_bits() {
        assert_eq!(index_bits(0), 1);
        assert_eq!(index_bits(1), 1);
        assert_eq!(index_bits(2), 2);
        assert_eq!(index_bits(20), 5);
        assert_eq!(index_bits(64), 7);
    }

    #[test]
    fn test_skewed_uses_side_table() {
        let data = skewed(200);
        let strategy = OverflowPacking::new();
        let stats = strategy.analyze(&data).unwrap();

        assert!(stats.has_overflow());
        // 20 outliers need a 5-bit index, so 6 is the narrowest candidate
        // of the 6..14 window
        assert_eq!(stats.main_bits, 6);
        assert_eq!(stats.threshold, 64);
        assert_eq!(stats.overflow_count, 20);
        assert_eq!(stats.total_bits, 200 * 7 + 20 * 32);

        let packed = strategy.pack(&data).unwrap();
        let baseline = OverlappingPacking::new().pack(&data).unwrap();
        assert_eq!(packed.bits_per_value(), 14);
        assert_eq!(packed.layout().overflow_count(), 20);
        assert!(packed.words().len() < baseline.words().len());
        assert_eq!(packed.unpack().unwrap(), data);
        for (i, &expected) in data.iter().enumerate() {
            assert_eq!(packed.get(i).unwrap(), expected);
        }
    }

    #[test]
    fn test_side_table_follows_main_region() {
        let data = vec![1, 2, 300, 3, 4, 5, 6, 7];
        let packed = OverflowPacking::new().pack(&data).unwrap();
        let layout = packed.layout();

        assert_eq!(
            layout,
            &Layout::Overflow {
                bits_per_value: 9,
                main_bits: 3,
                threshold: 8,
                overflow_count: 1,
            }
        );
        // 8 fields of 4 bits fill exactly one word; the outlier follows
        assert_eq!(packed.words().len(), 2);
        assert_eq!(packed.words()[1], 300);
        assert_eq!(packed.words()[0], 0x7654_3821);
        assert_eq!(packed.get(2).unwrap(), 300);
    }

    #[test]
    fn test_uniform_uses_baseline() {
        let data: Vec<i32> = (0..1000).map(|i| (i * 2481) % 4096).collect();
        let strategy = OverflowPacking::new();
        let stats = strategy.analyze(&data).unwrap();

        assert!(!stats.has_overflow());
        assert_eq!(stats.main_bits, 12);

        let packed = strategy.pack(&data).unwrap();
        let baseline = OverlappingPacking::new().pack(&data).unwrap();
        assert_eq!(packed.words(), baseline.words());
        assert_eq!(packed.unpack().unwrap(), data);
    }

    #[test]
    fn test_zero_window_always_baseline() {
        let data = skewed(200);
        let strategy = OverflowPacking::with_search_window(0);
        assert_eq!(strategy.search_window(), 0);

        let stats = strategy.analyze(&data).unwrap();
        assert!(!stats.has_overflow());
        assert_eq!(stats.main_bits, 14);
        assert_eq!(strategy.pack(&data).unwrap().unpack().unwrap(), data);
    }

    #[test]
    fn test_narrow_window_limits_candidates() {
        let data = skewed(200);
        let stats = OverflowPacking::with_search_window(2).analyze(&data).unwrap();
        // Only widths 12 and 13 are tried, and too many outliers sit above
        // 2^12 for either to beat the baseline
        assert!(!stats.has_overflow());
        assert_eq!(stats.main_bits, 14);
    }

    #[test]
    fn test_too_many_outliers_rejected() {
        // Most values sit near the top of the range: narrow widths cannot
        // index 48 outliers and wide ones cost more than the baseline
        let data: Vec<i32> = (0..64).map(|i| if i % 4 == 0 { 1 } else { 200 + i }).collect();
        let stats = OverflowPacking::new().analyze(&data).unwrap();
        assert!(!stats.has_overflow());
    }

    #[test]
    fn test_single_and_tiny_inputs() {
        let strategy = OverflowPacking::new();
        for data in [vec![0], vec![1], vec![0, 1, 0, 1]] {
            let packed = strategy.pack(&data).unwrap();
            assert_eq!(packed.bits_per_value(), 1);
            assert_eq!(packed.layout().overflow_count(), 0);
            assert_eq!(packed.unpack().unwrap(), data);
        }
    }

    #[test]
    fn test_corrupt_side_table_index() {
        let data = vec![1, 2, 300, 3, 4, 5, 6, 7];
        let packed = OverflowPacking::new().pack(&data).unwrap();
        let mut words = packed.words().to_vec();
        // Flag slot 0 as an outlier pointing at side-table entry 5
        words[0] = (words[0] & !0xF) | 0b1101;

        let result = OverflowPacking::new().unpack_words(&words, packed.layout(), data.len());
        assert!(matches!(result, Err(PackingError::InvalidArgument(_))));
    }

    #[test]
    fn test_encode_rejects_bad_width() {
        let strategy = OverflowPacking::new();
        assert!(matches!(
            strategy.encode(&[1], 40),
            Err(PackingError::InvalidState(_))
        ));
        assert!(matches!(
            strategy.encode(&[0], 0),
            Err(PackingError::InvalidState(_))
        ));
    }

    #[test]
    fn test_huge_length_is_an_error() {
        let layout = Layout::Overflow {
            bits_per_value: 14,
            main_bits: 6,
            threshold: 64,
            overflow_count: usize::MAX,
        };
        let result = OverflowPacking::new().unpack_words(&[0; 4], &layout, 8);
        assert!(matches!(result, Err(PackingError::InvalidArgument(_))));

        let layout = Layout::Overflow {
            bits_per_value: 14,
            main_bits: 6,
            threshold: 64,
            overflow_count: 1,
        };
        let result = OverflowPacking::new().unpack_words(&[0; 4], &layout, usize::MAX / 4);
        assert!(matches!(result, Err(PackingError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let strategy = OverflowPacking::new();
        assert!(matches!(
            strategy.analyze(&[]),
            Err(PackingError::InvalidArgument(_))
        ));
        assert!(matches!(
            strategy.pack(&[5, -3]),
            Err(PackingError::InvalidArgument(_))
        ));
    }
}
