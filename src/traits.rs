//! The contract shared by every packing strategy.

use crate::bits;
use crate::error::PackingError;
use crate::factory::PackingKind;
use crate::packed::{Layout, PackedArray};

/// A fixed-width bit-packing strategy.
///
/// Strategies are stateless: [`pack`](PackingStrategy::pack) returns a
/// [`PackedArray`] holding both the words and the layout needed to read
/// them. Implementors only provide [`encode`](PackingStrategy::encode);
/// input validation and width computation are shared.
pub trait PackingStrategy: Send + Sync {
    /// Identifier of this strategy.
    fn kind(&self) -> PackingKind;

    /// Lay out `data` into words.
    ///
    /// `data` is non-empty and every element fits in `bits_per_value` bits.
    fn encode(&self, data: &[i32], bits_per_value: u32)
        -> Result<(Vec<u32>, Layout), PackingError>;

    /// Pack `data`.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidArgument`] if `data` is empty or holds a
    /// negative element.
    fn pack(&self, data: &[i32]) -> Result<PackedArray, PackingError> {
        if data.is_empty() {
            return Err(PackingError::InvalidArgument(
                "data cannot be empty".to_string(),
            ));
        }

        let bits_per_value = bits::bits_needed_for_slice(data)?;
        let (words, layout) = self.encode(data, bits_per_value)?;

        tracing::debug!(
            kind = %self.kind(),
            len = data.len(),
            bits_per_value,
            words = words.len(),
            "packed values"
        );

        Ok(PackedArray::new(words, data.len(), layout))
    }

    /// Decode `original_size` values from a caller-held word buffer using a
    /// layout previously produced by this strategy.
    ///
    /// # Errors
    ///
    /// [`PackingError::InvalidArgument`] if the layout belongs to another
    /// strategy or `words` is too short for `original_size` values.
    fn unpack_words(
        &self,
        words: &[u32],
        layout: &Layout,
        original_size: usize,
    ) -> Result<Vec<i32>, PackingError> {
        if layout.kind() != self.kind() {
            return Err(PackingError::InvalidArgument(format!(
                "{} layout cannot be decoded by the {} strategy",
                layout.kind(),
                self.kind()
            )));
        }
        layout.decode_all(words, original_size)
    }
}
