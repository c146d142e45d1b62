//! Stateful packer: compress once, then read through the same instance.
//!
//! [`BitPacker`] wraps a [`PackingStrategy`] and remembers the last
//! [`PackedArray`] it produced, so callers can compress and then call
//! `get`/`decompress` without carrying the layout around themselves.
//! Each `compress` replaces the previous state entirely.
//!
//! `compress` takes `&mut self`, so the borrow checker rules out a
//! compress racing with reads on the same instance. For read-only sharing
//! across threads, hand out the [`PackedArray`] instead.

use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::packed::PackedArray;
use crate::traits::PackingStrategy;

/// A strategy plus the result of its most recent `compress`.
pub struct BitPacker {
    strategy: Box<dyn PackingStrategy>,
    packed: Option<PackedArray>,
}

impl BitPacker {
    /// Wrap `strategy`; nothing is compressed yet.
    pub fn new(strategy: Box<dyn PackingStrategy>) -> Self {
        Self {
            strategy,
            packed: None,
        }
    }

    /// Compress `data`, replacing any previous state, and return the words.
    ///
    /// On error the previous state is kept.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidArgument`] if `data` is empty or holds a
    /// negative element.
    pub fn compress(&mut self, data: &[i32]) -> Result<Vec<u32>, PackingError> {
        let packed = self.strategy.pack(data)?;
        let words = packed.words().to_vec();
        self.packed = Some(packed);
        Ok(words)
    }

    /// Decode `original_size` values from `compressed` using the layout of
    /// the last `compress`.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidState`] before any successful `compress`;
    /// [`PackingError::InvalidArgument`] if `compressed` is too short.
    pub fn decompress(
        &self,
        compressed: &[u32],
        original_size: usize,
    ) -> Result<Vec<i32>, PackingError> {
        let packed = self.require_packed()?;
        self.strategy
            .unpack_words(compressed, packed.layout(), original_size)
    }

    /// Value at `index` of the last compressed array.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidState`] before any successful `compress`;
    /// [`PackingError::OutOfRange`] if `index` is past the end.
    pub fn get(&self, index: usize) -> Result<i32, PackingError> {
        self.require_packed()?.get(index)
    }

    /// Bits per value of the last compressed array.
    pub fn bits_per_value(&self) -> Option<u32> {
        self.packed.as_ref().map(PackedArray::bits_per_value)
    }

    /// Element count over word count of the last compressed array.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.packed.as_ref().map(PackedArray::compression_ratio)
    }

    /// Strategy identifier.
    pub fn kind(&self) -> PackingKind {
        self.strategy.kind()
    }

    /// Last compressed array, if any.
    pub fn packed(&self) -> Option<&PackedArray> {
        self.packed.as_ref()
    }

    /// Take the last compressed array, leaving the packer empty.
    pub fn take_packed(&mut self) -> Option<PackedArray> {
        self.packed.take()
    }

    fn require_packed(&self) -> Result<&PackedArray, PackingError> {
        self.packed
            .as_ref()
            .ok_or_else(|| PackingError::InvalidState("no data compressed yet".to_string()))
    }
}

impl std::fmt::Debug for BitPacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitPacker")
            .field("kind", &self.kind())
            .field("packed", &self.packed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create;

    #[test]
    fn test_basic_scenario_all_kinds() {
        let data = vec![1, 5, 12, 7, 3, 9, 15, 2];
        for kind in PackingKind::ALL {
            let mut packer = create(kind);
            let compressed = packer.compress(&data).unwrap();

            assert_eq!(packer.bits_per_value(), Some(4));
            assert_eq!(packer.get(3).unwrap(), 7);
            assert_eq!(packer.decompress(&compressed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_single_zero_all_kinds() {
        for kind in PackingKind::ALL {
            let mut packer = create(kind);
            let compressed = packer.compress(&[0]).unwrap();
            assert_eq!(packer.bits_per_value(), Some(1));
            assert_eq!(packer.decompress(&compressed, 1).unwrap(), vec![0]);
        }
    }

    #[test]
    fn test_before_compress() {
        for kind in PackingKind::ALL {
            let packer = create(kind);
            assert!(matches!(packer.get(0), Err(PackingError::InvalidState(_))));
            assert!(matches!(
                packer.decompress(&[0], 1),
                Err(PackingError::InvalidState(_))
            ));
            assert_eq!(packer.bits_per_value(), None);
            assert_eq!(packer.compression_ratio(), None);
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let mut packer = create(PackingKind::NonOverlapping);
        packer.compress(&[4, 8, 15]).unwrap();
        assert_eq!(
            packer.get(3),
            Err(PackingError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_recompress_replaces_state() {
        let mut packer = create(PackingKind::Overlapping);
        packer.compress(&[1000, 2000, 3000]).unwrap();
        assert_eq!(packer.bits_per_value(), Some(12));

        let compressed = packer.compress(&[1, 0]).unwrap();
        assert_eq!(packer.bits_per_value(), Some(1));
        assert_eq!(packer.get(0).unwrap(), 1);
        assert!(matches!(packer.get(2), Err(PackingError::OutOfRange { .. })));
        assert_eq!(packer.decompress(&compressed, 2).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_failed_compress_keeps_state() {
        let mut packer = create(PackingKind::Overflow);
        packer.compress(&[7, 8, 9]).unwrap();

        assert!(packer.compress(&[]).is_err());
        assert!(packer.compress(&[1, -5]).is_err());
        assert_eq!(packer.get(2).unwrap(), 9);
    }

    #[test]
    fn test_decompress_short_buffer() {
        let mut packer = create(PackingKind::Overlapping);
        let data: Vec<i32> = (0..64).collect();
        let compressed = packer.compress(&data).unwrap();

        let result = packer.decompress(&compressed[..1], data.len());
        assert!(matches!(result, Err(PackingError::InvalidArgument(_))));
    }

    #[test]
    fn test_decompress_huge_length() {
        for kind in PackingKind::ALL {
            let mut packer = create(kind);
            let compressed = packer.compress(&[9, 1, 1000, 2]).unwrap();

            for original_size in [usize::MAX, usize::MAX / 3] {
                let result = packer.decompress(&compressed, original_size);
                assert!(matches!(result, Err(PackingError::InvalidArgument(_))));
            }
        }
    }

    #[test]
    fn test_compression_ratio() {
        let mut packer = create(PackingKind::Overlapping);
        let data: Vec<i32> = (0..64).map(|i| i % 4).collect();
        let compressed = packer.compress(&data).unwrap();

        assert_eq!(compressed.len(), 4);
        assert_eq!(packer.compression_ratio(), Some(16.0));
    }

    #[test]
    fn test_take_packed() {
        let mut packer = create(PackingKind::Overflow);
        packer.compress(&[3, 1, 2]).unwrap();

        let packed = packer.take_packed().unwrap();
        assert_eq!(packed.unpack().unwrap(), vec![3, 1, 2]);
        assert!(matches!(packer.get(0), Err(PackingError::InvalidState(_))));
    }
}
